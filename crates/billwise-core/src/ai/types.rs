//! Prompt rendering shared by the HTTP backends

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::{TransactionRecord, KNOWN_CATEGORIES};
use crate::prompts::{PromptId, PromptLibrary};

/// A prompt ready to send: optional system text plus the user message
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub system: Option<String>,
    pub user: String,
}

impl RenderedPrompt {
    /// Render the bill extraction prompt
    pub fn extract_bill(prompts: &RwLock<PromptLibrary>) -> Result<Self> {
        let categories = KNOWN_CATEGORIES.join(", ");
        let mut vars = HashMap::new();
        vars.insert("categories", categories.as_str());
        render(prompts, PromptId::ExtractBill, &vars)
    }

    /// Render the finance assistant prompt over a set of transactions
    pub fn finance_assistant(
        prompts: &RwLock<PromptLibrary>,
        question: &str,
        transactions: &[TransactionRecord],
    ) -> Result<Self> {
        let transactions_json = serde_json::to_string_pretty(transactions)?;
        let mut vars = HashMap::new();
        vars.insert("transactions", transactions_json.as_str());
        vars.insert("question", question);
        render(prompts, PromptId::FinanceAssistant, &vars)
    }
}

fn render(
    prompts: &RwLock<PromptLibrary>,
    id: PromptId,
    vars: &HashMap<&str, &str>,
) -> Result<RenderedPrompt> {
    let mut prompts = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    let template = prompts.get(id)?;
    Ok(RenderedPrompt {
        system: template.render_system(vars),
        user: template.render_user(vars),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bill_lists_categories() {
        let prompts = RwLock::new(PromptLibrary::embedded_only());
        let rendered = RenderedPrompt::extract_bill(&prompts).unwrap();
        assert!(rendered.user.contains("Groceries, Transport, Food"));
        assert!(rendered.user.contains("total_amount"));
        assert!(!rendered.user.contains("{{categories}}"));
    }

    #[test]
    fn test_finance_assistant_embeds_transactions() {
        let prompts = RwLock::new(PromptLibrary::embedded_only());
        let records = vec![TransactionRecord {
            total_amount: Some(12.5),
            category: Some("Food".into()),
            merchant: Some("Taqueria".into()),
            ..Default::default()
        }];

        let rendered =
            RenderedPrompt::finance_assistant(&prompts, "Where did I eat?", &records).unwrap();
        assert!(rendered.system.is_some());
        assert!(rendered.user.contains("\"merchant\": \"Taqueria\""));
        assert!(rendered.user.contains("User Question: Where did I eat?"));
    }
}
