//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Store setup (init) and shared utilities (open_store)
//! - `serve` - Web server command
//! - `insights` - Spending summary
//! - `transactions` - Transaction commands (list, add, delete)
//! - `bill` - Bill image extraction
//! - `ask` - Finance chat over the ledger

pub mod ask;
pub mod bill;
pub mod core;
pub mod insights;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use ask::*;
pub use bill::*;
pub use core::*;
pub use insights::*;
pub use serve::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
