//! Mock backend for testing
//!
//! Returns a canned bill and a chat answer derived from the ledger size.
//! Useful for unit tests and development without a running model server.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{BillData, BillItem, TransactionRecord};

use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Whether extraction and chat should fail
    pub failing: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
        }
    }

    /// Create an unhealthy mock backend whose operations all fail
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(Error::Ai("mock backend configured to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn extract_bill(&self, image_data: &[u8], _mime_type: &str) -> Result<BillData> {
        self.check()?;
        if image_data.is_empty() {
            return Err(Error::Ai("Empty image".into()));
        }

        Ok(BillData {
            date: "2024-01-15".to_string(),
            merchant: "Mock Grocer".to_string(),
            category: "Groceries".to_string(),
            total_amount: 27.5,
            items: vec![
                BillItem {
                    name: "Bread".to_string(),
                    price: 4.5,
                },
                BillItem {
                    name: "Coffee".to_string(),
                    price: 23.0,
                },
            ],
        })
    }

    async fn answer_question(
        &self,
        _question: &str,
        transactions: &[TransactionRecord],
    ) -> Result<String> {
        self.check()?;
        let total: f64 = transactions.iter().map(TransactionRecord::amount).sum();
        Ok(format!(
            "You have {} transaction(s) totaling ${:.2}.",
            transactions.len(),
            total
        ))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_extract_bill() {
        let mock = MockBackend::new();
        let bill = mock.extract_bill(b"jpeg bytes", "image/jpeg").await.unwrap();
        assert_eq!(bill.merchant, "Mock Grocer");
        let items_total: f64 = bill.items.iter().map(|i| i.price).sum();
        assert_eq!(items_total, bill.total_amount);
    }

    #[tokio::test]
    async fn test_mock_rejects_empty_image() {
        let mock = MockBackend::new();
        assert!(mock.extract_bill(b"", "image/jpeg").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_answer_mentions_count_and_total() {
        let mock = MockBackend::new();
        let records = vec![
            TransactionRecord {
                total_amount: Some(10.0),
                ..Default::default()
            },
            TransactionRecord {
                total_amount: Some(2.5),
                ..Default::default()
            },
        ];
        let answer = mock.answer_question("total?", &records).await.unwrap();
        assert_eq!(answer, "You have 2 transaction(s) totaling $12.50.");
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing();
        assert!(!mock.health_check().await);
        assert!(matches!(
            mock.extract_bill(b"x", "image/png").await,
            Err(Error::Ai(_))
        ));
        assert!(mock.answer_question("q", &[]).await.is_err());
    }
}
