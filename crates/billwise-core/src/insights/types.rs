//! Insight summary types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Insight shown when the ledger is empty
pub const NO_DATA_INSIGHT: &str = "No transactions yet. Upload your first bill to get started!";

/// Spending summary derived from the ledger
///
/// Recomputed on every request and never persisted. Field names are part of
/// the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsSummary {
    /// Sum of all amounts, rounded to cents
    pub total_spent: f64,
    pub transaction_count: usize,
    /// Category label -> summed amount (only categories that occur)
    pub category_breakdown: BTreeMap<String, f64>,
    /// Category with the largest total; ties go to the alphabetically first
    pub top_category: Option<String>,
    /// Spending in the trailing 7 days
    pub this_week_spending: f64,
    /// Spending in the trailing 30 days
    pub this_month_spending: f64,
    pub average_transaction: f64,
    /// Insight statements, in display order
    pub insights: Vec<String>,
}

impl InsightsSummary {
    /// Summary for an empty ledger
    pub fn empty() -> Self {
        Self {
            total_spent: 0.0,
            transaction_count: 0,
            category_breakdown: BTreeMap::new(),
            top_category: None,
            this_week_spending: 0.0,
            this_month_spending: 0.0,
            average_transaction: 0.0,
            insights: vec![NO_DATA_INSIGHT.to_string()],
        }
    }
}

/// Spending totals for the trailing comparison windows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpendingWindows {
    /// Dated on or after `now - 7 days`
    pub this_week: f64,
    /// Dated in `[now - 14 days, now - 7 days)`
    pub last_week: f64,
    /// Dated on or after `now - 30 days`
    pub this_month: f64,
    /// Dated in `[now - 60 days, now - 30 days)`
    pub last_month: f64,
}

impl SpendingWindows {
    /// Week-over-week change in percent, when both weeks had spending
    pub fn weekly_change(&self) -> Option<f64> {
        percent_change(self.this_week, self.last_week)
    }

    /// Month-over-month change in percent, when both months had spending
    pub fn monthly_change(&self) -> Option<f64> {
        percent_change(self.this_month, self.last_month)
    }
}

fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if current > 0.0 && previous > 0.0 {
        Some((current - previous) / previous * 100.0)
    } else {
        None
    }
}
