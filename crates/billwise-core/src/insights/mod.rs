//! Insights Engine - spending trends from the transaction ledger
//!
//! Turns a list of transaction records into a spending summary plus a short
//! list of human-readable insight statements. The computation is pure: it
//! performs no I/O, holds no state, and never fails on malformed records.
//!
//! ## Time windows
//!
//! Weekly and monthly comparisons are anchored at the evaluation instant, so
//! `compute_insights` returns different results when called at different
//! times. Use `compute_insights_at` with a fixed anchor for reproducible
//! output.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billwise_core::insights::compute_insights;
//!
//! let records = store.load()?;
//! let summary = compute_insights(&records);
//! for line in &summary.insights {
//!     println!("{}", line);
//! }
//! ```

pub mod engine;
pub mod types;

pub use engine::{compute_insights, compute_insights_at, parse_record_datetime};
pub use types::{InsightsSummary, SpendingWindows};
