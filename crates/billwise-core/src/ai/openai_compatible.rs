//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//! - hosted gateways exposing `/v1/chat/completions` (including Gemini's)
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{BillData, TransactionRecord};
use crate::prompts::PromptLibrary;

use super::parsing::{finalize_answer, parse_bill_response};
use super::types::RenderedPrompt;
use super::AIBackend;

/// Default model when `OPENAI_COMPATIBLE_MODEL` is unset
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible backend
///
/// One multimodal model serves both bill extraction and chat.
///
/// # Example
///
/// ```rust,ignore
/// // vLLM
/// export OPENAI_COMPATIBLE_HOST="http://192.168.1.100:8000"
/// export OPENAI_COMPATIBLE_MODEL="Qwen/Qwen2-VL-7B-Instruct"
///
/// // Gemini through its OpenAI endpoint
/// export AI_BACKEND=gemini
/// export OPENAI_COMPATIBLE_HOST="https://generativelanguage.googleapis.com/v1beta/openai"
/// export OPENAI_COMPATIBLE_MODEL="gemini-2.0-flash"
/// ```
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: super::http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Use a specific prompt library (e.g. embedded-only in tests)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create from environment variables
    ///
    /// Required: `OPENAI_COMPATIBLE_HOST`
    /// Optional: `OPENAI_COMPATIBLE_MODEL` (default: gpt-4o-mini)
    /// Optional: `OPENAI_COMPATIBLE_API_KEY`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model =
            std::env::var("OPENAI_COMPATIBLE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY").ok();

        let mut backend = Self::new(&host, &model);
        backend.api_key = api_key;
        Some(backend)
    }

    /// Send a chat completion request and return the first choice's text
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String> {
        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Ai(format!("OpenAI API error {}: {}", status, body)));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| Error::Ai("No response from OpenAI API".into()))
    }
}

fn system_message(system: Option<String>) -> Option<ChatMessage> {
    system.map(|text| ChatMessage {
        role: "system".to_string(),
        content: ChatContent::Text(text),
    })
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

/// Chat message content (text or multimodal)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn extract_bill(&self, image_data: &[u8], mime_type: &str) -> Result<BillData> {
        let prompt = RenderedPrompt::extract_bill(&self.prompts)?;
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image_data);

        let mut messages: Vec<ChatMessage> = system_message(prompt.system).into_iter().collect();
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: ChatContent::Parts(vec![
                ContentPart::Text { text: prompt.user },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{}", mime_type, base64_image),
                    },
                },
            ]),
        });

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.1),
            max_tokens: Some(4096),
            stream: false,
        };

        let response = self.complete(&request).await?;
        debug!("OpenAI-compatible bill response: {}", response);

        parse_bill_response(&response)
    }

    async fn answer_question(
        &self,
        question: &str,
        transactions: &[TransactionRecord],
    ) -> Result<String> {
        let prompt = RenderedPrompt::finance_assistant(&self.prompts, question, transactions)?;

        let mut messages: Vec<ChatMessage> = system_message(prompt.system).into_iter().collect();
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: ChatContent::Text(prompt.user),
        });

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.3),
            max_tokens: None,
            stream: false,
        };

        let response = self.complete(&request).await?;
        debug!("OpenAI-compatible chat response: {}", response);

        Ok(finalize_answer(&response))
    }

    async fn health_check(&self) -> bool {
        // Try /v1/models first (standard OpenAI endpoint)
        if let Ok(resp) = self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
        {
            if resp.status().is_success() {
                return true;
            }
        }

        // Try /health (common for LocalAI, llama-server)
        if let Ok(resp) = self
            .http_client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            if resp.status().is_success() {
                return true;
            }
        }

        false
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockLlmServer, MockReply};

    fn backend(url: &str) -> OpenAICompatibleBackend {
        OpenAICompatibleBackend::new(url, "test-model").with_prompts(PromptLibrary::embedded_only())
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OpenAICompatibleBackend::new("http://localhost:8080/", "llava");
        assert_eq!(backend.model(), "llava");
        assert_eq!(backend.host(), "http://localhost:8080");
    }

    #[test]
    fn test_backend_with_api_key() {
        let backend =
            OpenAICompatibleBackend::with_api_key("http://localhost:8080", "gpt-4o", "sk-test123");
        assert_eq!(backend.api_key, Some("sk-test123".to_string()));
        assert_eq!(backend.model(), "gpt-4o");
    }

    #[test]
    fn test_chat_content_parts_serialization() {
        let content = ChatContent::Parts(vec![
            ContentPart::Text {
                text: "Read this bill".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,abc123".to_string(),
                },
            },
        ]);

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json[0]["type"], "text");
        assert_eq!(json[0]["text"], "Read this bill");
        assert_eq!(json[1]["type"], "image_url");
        assert_eq!(json[1]["image_url"]["url"], "data:image/png;base64,abc123");
    }

    #[test]
    fn test_response_with_null_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockLlmServer::start().await;
        assert!(backend(&server.url()).health_check().await);

        let unreachable = OpenAICompatibleBackend::new("http://127.0.0.1:1", "llava");
        assert!(!unreachable.health_check().await);
    }

    #[tokio::test]
    async fn test_extract_bill_sends_data_url() {
        let server = MockLlmServer::start().await;
        let bill = backend(&server.url())
            .extract_bill(b"fake image data", "image/webp")
            .await
            .unwrap();
        assert_eq!(bill.merchant, "FreshMart");
        assert_eq!(bill.total_amount, 23.5);
    }

    #[tokio::test]
    async fn test_answer_question() {
        let server = MockLlmServer::start().await;
        let records = vec![TransactionRecord::default(), TransactionRecord::default()];
        let answer = backend(&server.url())
            .answer_question("How many purchases?", &records)
            .await
            .unwrap();
        assert_eq!(answer, "You have 2 transaction(s) on record.");
    }

    #[tokio::test]
    async fn test_server_error_is_ai_error() {
        let server = MockLlmServer::start_with(MockReply::ServerError).await;
        let err = backend(&server.url())
            .extract_bill(b"fake image data", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ai(_)));
    }
}
