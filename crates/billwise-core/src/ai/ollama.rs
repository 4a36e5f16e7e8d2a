//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. Bill images go to a
//! vision model; chat questions go to the default text model with the
//! assistant instructions in the `system` field.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{BillData, TransactionRecord};
use crate::prompts::PromptLibrary;

use super::parsing::{finalize_answer, parse_bill_response};
use super::types::RenderedPrompt;
use super::AIBackend;

/// Default chat model
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Default vision model used for bill images
pub const DEFAULT_VISION_MODEL: &str = "llava";

/// Ollama backend
///
/// Uses two models: `default_model` for finance chat and `vision_model` for
/// reading bill images. Both can be overridden at runtime.
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    default_model: String,
    vision_model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, default_model: &str) -> Self {
        Self {
            http_client: super::http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create a new instance with a different vision model
    pub fn with_vision_model(&self, model: &str) -> Self {
        Self {
            vision_model: model.to_string(),
            ..self.clone()
        }
    }

    /// Use a specific prompt library (e.g. embedded-only in tests)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let vision_model = std::env::var("OLLAMA_VISION_MODEL")
            .unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string());
        Some(Self::new(&host, &model).with_vision_model(&vision_model))
    }

    /// Vision model name (for logging)
    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    async fn generate(&self, request: &OllamaRequest) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Base64-encoded images (vision models only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn extract_bill(&self, image_data: &[u8], mime_type: &str) -> Result<BillData> {
        let prompt = RenderedPrompt::extract_bill(&self.prompts)?;
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image_data);

        debug!(
            model = %self.vision_model,
            mime_type,
            bytes = image_data.len(),
            "Sending bill image to Ollama"
        );

        let request = OllamaRequest {
            model: self.vision_model.clone(),
            prompt: prompt.user,
            system: prompt.system,
            images: vec![base64_image],
            format: Some("json"),
            stream: false,
        };

        let response = self.generate(&request).await?;
        debug!("Ollama bill response: {}", response);

        parse_bill_response(&response)
    }

    async fn answer_question(
        &self,
        question: &str,
        transactions: &[TransactionRecord],
    ) -> Result<String> {
        let prompt = RenderedPrompt::finance_assistant(&self.prompts, question, transactions)?;

        let request = OllamaRequest {
            model: self.default_model.clone(),
            prompt: prompt.user,
            system: prompt.system,
            images: Vec::new(),
            format: None,
            stream: false,
        };

        let response = self.generate(&request).await?;
        debug!("Ollama chat response: {}", response);

        Ok(finalize_answer(&response))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockLlmServer, MockReply};

    fn backend(url: &str) -> OllamaBackend {
        OllamaBackend::new(url, "test-model").with_prompts(PromptLibrary::embedded_only())
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.model(), "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.vision_model(), DEFAULT_VISION_MODEL);
    }

    #[test]
    fn test_request_omits_empty_fields() {
        let request = OllamaRequest {
            model: "llama3.2".to_string(),
            prompt: "hi".to_string(),
            system: None,
            images: Vec::new(),
            format: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("images").is_none());
        assert!(json.get("format").is_none());
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockLlmServer::start().await;
        assert!(backend(&server.url()).health_check().await);

        let unreachable = OllamaBackend::new("http://127.0.0.1:1", "llama3.2");
        assert!(!unreachable.health_check().await);
    }

    #[tokio::test]
    async fn test_extract_bill() {
        let server = MockLlmServer::start().await;
        let bill = backend(&server.url())
            .extract_bill(b"fake image data", "image/png")
            .await
            .unwrap();

        assert_eq!(bill.merchant, "FreshMart");
        assert_eq!(bill.category, "Groceries");
        assert_eq!(bill.total_amount, 23.5);
        assert_eq!(bill.items.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_bill_empty_reply_is_error() {
        let server = MockLlmServer::start_with(MockReply::Empty).await;
        let result = backend(&server.url())
            .extract_bill(b"fake image data", "image/png")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_answer_question() {
        let server = MockLlmServer::start().await;
        let records = vec![TransactionRecord {
            total_amount: Some(10.0),
            ..Default::default()
        }];
        let answer = backend(&server.url())
            .answer_question("How much did I spend?", &records)
            .await
            .unwrap();
        assert_eq!(answer, "You have 1 transaction(s) on record.");
    }

    #[tokio::test]
    async fn test_answer_question_empty_reply_uses_fallback() {
        let server = MockLlmServer::start_with(MockReply::Empty).await;
        let answer = backend(&server.url())
            .answer_question("Anything?", &[])
            .await
            .unwrap();
        assert_eq!(answer, "I couldn't process your question.");
    }

    #[tokio::test]
    async fn test_server_error_surfaces() {
        let server = MockLlmServer::start_with(MockReply::ServerError).await;
        let result = backend(&server.url()).answer_question("Anything?", &[]).await;
        assert!(result.is_err());
    }
}
