//! Finance chat command

use anyhow::{bail, Context, Result};
use billwise_core::ai::{AIBackend, AIClient};
use billwise_core::storage::{Storage, TransactionStore};

pub async fn cmd_ask(store: &Storage, question: &str) -> Result<()> {
    let ai = super::require_ai()?;
    let answer = answer_from_store(store, &ai, question).await?;

    println!();
    println!("💬 {}", answer);
    Ok(())
}

/// Answer a question over everything in the store
pub async fn answer_from_store(store: &Storage, ai: &AIClient, question: &str) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        bail!("Question must not be empty");
    }

    let records = store.load()?;
    tracing::debug!(transactions = records.len(), "Asking AI backend");

    ai.answer_question(question, &records)
        .await
        .context("Error in chat")
}
