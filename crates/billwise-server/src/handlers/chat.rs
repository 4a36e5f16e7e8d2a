//! Finance chat handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use billwise_core::ai::AIBackend;
use billwise_core::models::TransactionRecord;
use billwise_core::storage::TransactionStore;

use super::require_ai;
use crate::{AppError, AppState};

/// Request body for POST /api/chat
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// Context to answer from; the stored ledger is used when empty
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
}

/// POST /api/chat - Answer a question about the user's spending
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let ChatRequest {
        question,
        transactions,
    } = request;

    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::bad_request("Question must not be empty"));
    }

    let ai = require_ai(&state)?;

    let transactions = if transactions.is_empty() {
        state.store.load()?
    } else {
        transactions
    };

    tracing::debug!(transactions = transactions.len(), "Answering chat question");

    let response = ai
        .answer_question(question, &transactions)
        .await
        .map_err(|e| AppError::bad_gateway(&format!("Error in chat: {}", e)))?;

    Ok(Json(ChatResponse {
        success: true,
        response,
    }))
}
