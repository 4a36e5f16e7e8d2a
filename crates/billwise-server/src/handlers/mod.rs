//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod bills;
pub mod chat;
pub mod insights;
pub mod status;
pub mod transactions;

// Re-export all handlers for use in router
pub use bills::*;
pub use chat::*;
pub use insights::*;
pub use status::*;
pub use transactions::*;

use billwise_core::ai::AIClient;

use crate::{AppError, AppState, AI_NOT_CONFIGURED_HINT};

/// The configured AI client, or 503 when none is set up
pub(crate) fn require_ai(state: &AppState) -> Result<&AIClient, AppError> {
    state.ai.as_ref().ok_or_else(|| {
        AppError::service_unavailable(&format!(
            "AI backend not configured: {}",
            AI_NOT_CONFIGURED_HINT
        ))
    })
}
