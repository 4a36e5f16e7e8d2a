//! Billwise Core Library
//!
//! Shared functionality for the Billwise personal finance analyzer:
//! - Transaction records and bill extraction models
//! - Insights engine deriving spending trends from the ledger
//! - Pluggable AI backends (Ollama, OpenAI-compatible, mock) for bill
//!   extraction and finance chat
//! - Transaction stores (flat JSON file or encrypted SQLite)
//! - Prompt library for customizable AI prompts

pub mod ai;
pub mod error;
pub mod insights;
pub mod models;
pub mod prompts;
pub mod storage;

/// Test utilities including mock LLM server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use error::{Error, Result};
pub use insights::{compute_insights, compute_insights_at, InsightsSummary};
pub use models::{BillData, BillItem, NewTransaction, TransactionRecord, TransactionType};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use storage::{Database, JsonFileStore, Storage, StoreKind, TransactionStore};
