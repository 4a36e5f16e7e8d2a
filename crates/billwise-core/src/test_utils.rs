//! Test utilities for billwise-core
//!
//! Provides a mock model server speaking both the Ollama (`/api/*`) and the
//! OpenAI-compatible (`/v1/*`) APIs, so the HTTP backends can be exercised
//! end to end without a real model.

use std::net::SocketAddr;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Bill JSON returned for vision requests, wrapped in a code fence the way
/// chatty models tend to answer
pub const MOCK_BILL_REPLY: &str = "```json\n{\"date\": \"2026-03-14\", \"merchant\": \"FreshMart\", \"category\": \"Groceries\", \"total_amount\": \"23.50\", \"items\": [{\"name\": \"Apples\", \"price\": 3.5}, {\"name\": \"Olive Oil\", \"price\": 20}]}\n```";

/// How the mock server answers generation requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockReply {
    /// Canned bill for image requests, a ledger-size answer for chat
    #[default]
    Normal,
    /// Empty model output
    Empty,
    /// HTTP 500 from the generation endpoints
    ServerError,
}

/// Mock model server for testing and development
pub struct MockLlmServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockReply::Normal).await
    }

    /// Start the mock server with a specific reply mode
    pub async fn start_with(reply: MockReply) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat_completions))
            .with_state(reply);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{
            "name": "llava:latest",
            "modified_at": "2024-01-01T00:00:00Z",
            "size": 4_000_000_000u64
        }]
    }))
}

/// Ollama generate endpoint
async fn handle_generate(
    State(reply): State<MockReply>,
    Json(request): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let has_images = request["images"]
        .as_array()
        .is_some_and(|images| !images.is_empty());
    let prompt = request["prompt"].as_str().unwrap_or_default();

    let response = reply_text(reply, has_images, prompt)?;

    Ok(Json(json!({
        "model": request["model"],
        "response": response,
        "done": true
    })))
}

/// OpenAI models endpoint (health check)
async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{"id": "test-model", "object": "model"}]
    }))
}

/// OpenAI chat completions endpoint
async fn handle_chat_completions(
    State(reply): State<MockReply>,
    Json(request): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let messages = request["messages"].as_array().cloned().unwrap_or_default();

    let mut has_images = false;
    let mut prompt = String::new();
    for message in &messages {
        match &message["content"] {
            Value::String(text) => prompt.push_str(text),
            Value::Array(parts) => {
                for part in parts {
                    if let Some(text) = part["text"].as_str() {
                        prompt.push_str(text);
                    }
                    if let Some(url) = part["image_url"]["url"].as_str() {
                        // Images must arrive inline as data URLs
                        if !url.starts_with("data:image/") || !url.contains(";base64,") {
                            return Err(StatusCode::BAD_REQUEST);
                        }
                        has_images = true;
                    }
                }
            }
            _ => {}
        }
    }

    let content = reply_text(reply, has_images, &prompt)?;

    Ok(Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": request["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })))
}

fn reply_text(reply: MockReply, has_images: bool, prompt: &str) -> Result<String, StatusCode> {
    match reply {
        MockReply::ServerError => Err(StatusCode::INTERNAL_SERVER_ERROR),
        MockReply::Empty => Ok(String::new()),
        MockReply::Normal if has_images => Ok(MOCK_BILL_REPLY.to_string()),
        MockReply::Normal => Ok(format!(
            "You have {} transaction(s) on record.",
            count_transactions(prompt)
        )),
    }
}

/// Count the records in the finance assistant prompt's transaction block
fn count_transactions(prompt: &str) -> usize {
    let Some(start) = prompt.find("Transaction Data:") else {
        return 0;
    };
    let after = &prompt[start + "Transaction Data:".len()..];
    let block = match after.find("User Question:") {
        Some(end) => &after[..end],
        None => after,
    };
    serde_json::from_str::<Vec<Value>>(block.trim())
        .map(|records| records.len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_transactions() {
        let prompt = "Transaction Data:\n[\n  {\"a\": 1},\n  {\"b\": 2}\n]\n\nUser Question: hi";
        assert_eq!(count_transactions(prompt), 2);
        assert_eq!(count_transactions("Transaction Data:\n[]\n\nUser Question: x"), 0);
        assert_eq!(count_transactions("no data here"), 0);
    }

    #[tokio::test]
    async fn test_mock_server_starts_and_stops() {
        let mut server = MockLlmServer::start().await;
        let url = server.url();
        assert!(url.starts_with("http://127.0.0.1:"));

        let resp = reqwest::get(format!("{}/api/tags", url)).await.unwrap();
        assert!(resp.status().is_success());

        server.stop();
    }
}
