//! JSON parsing helpers for AI backend responses
//!
//! Vision models often wrap the JSON payload in markdown code fences or add
//! a sentence before/after it. These helpers dig the object out.

use crate::error::{Error, Result};
use crate::models::BillData;

/// Answer used when the model returns nothing for a chat question
pub const EMPTY_ANSWER_FALLBACK: &str = "I couldn't process your question.";

/// Parse extracted bill data from a model response
pub fn parse_bill_response(response: &str) -> Result<BillData> {
    let response = strip_code_fences(response.trim());
    if response.is_empty() {
        return Err(Error::Ai("Empty response from vision model".into()));
    }

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                Error::Ai(format!(
                    "Invalid bill JSON from AI: {} | Raw: {}",
                    e,
                    truncate(json_str, 200)
                ))
            })
        }
        _ => Err(Error::Ai(format!(
            "No JSON found in AI bill response | Raw: {}",
            truncate(response, 200)
        ))),
    }
}

/// Trim a chat answer, substituting the fallback when it is empty
pub fn finalize_answer(response: &str) -> String {
    let answer = response.trim();
    if answer.is_empty() {
        EMPTY_ANSWER_FALLBACK.to_string()
    } else {
        answer.to_string()
    }
}

/// Remove a surrounding ```json ... ``` fence, if present
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
