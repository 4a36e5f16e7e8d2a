//! Pluggable AI backend abstraction
//!
//! Bill extraction and finance chat both go through the `AIBackend` trait so
//! the server and CLI never care which model server sits behind them.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the two collaborator operations plus health/identity
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_env();
//!
//! if let Some(ref client) = ai {
//!     let bill = client.extract_bill(&image_bytes, "image/jpeg").await?;
//!     println!("{} spent at {}", bill.total_amount, bill.merchant);
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Chat model name (default: llama3.2)
//! - `OLLAMA_VISION_MODEL`: Vision model for bill images (default: llava)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//! - `AI_TIMEOUT_SECS`: Per-request timeout (default: 120)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::RenderedPrompt;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{BillData, TransactionRecord};

/// Default request timeout for model calls, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Read a bill image and return the structured purchase data
    ///
    /// Empty model output or output without a parseable JSON object is an
    /// error; a partially-filled record is never returned.
    async fn extract_bill(&self, image_data: &[u8], mime_type: &str) -> Result<BillData>;

    /// Answer a free-form question using the given transactions as context
    async fn answer_question(
        &self,
        question: &str,
        transactions: &[TransactionRecord],
    ) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, hosted gateways)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST, OLLAMA_MODEL, OLLAMA_VISION_MODEL
    /// - `openai_compatible` / `openai` / `gemini`: Uses OPENAI_COMPATIBLE_HOST
    ///   and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "gemini" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn extract_bill(&self, image_data: &[u8], mime_type: &str) -> Result<BillData> {
        match self {
            AIClient::Ollama(b) => b.extract_bill(image_data, mime_type).await,
            AIClient::OpenAICompatible(b) => b.extract_bill(image_data, mime_type).await,
            AIClient::Mock(b) => b.extract_bill(image_data, mime_type).await,
        }
    }

    async fn answer_question(
        &self,
        question: &str,
        transactions: &[TransactionRecord],
    ) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.answer_question(question, transactions).await,
            AIClient::OpenAICompatible(b) => b.answer_question(question, transactions).await,
            AIClient::Mock(b) => b.answer_question(question, transactions).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Build the shared HTTP client with the configured request timeout
pub(crate) fn http_client() -> Client {
    let timeout = std::env::var("AI_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
            Client::new()
        })
}
