//! Insight computation over a transaction history

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};

use crate::models::TransactionRecord;

use super::types::{InsightsSummary, SpendingWindows};

/// Length of the "this week" / "last week" windows
const WEEK_DAYS: i64 = 7;

/// Length of the "this month" / "last month" windows
const MONTH_DAYS: i64 = 30;

/// Minimum absolute percent change worth mentioning
const SIGNIFICANT_CHANGE_PCT: f64 = 10.0;

/// Compute the spending summary anchored at the current local time
///
/// Window boundaries move with the wall clock, so two calls made at
/// different times may disagree on the weekly and monthly figures.
pub fn compute_insights(records: &[TransactionRecord]) -> InsightsSummary {
    compute_insights_at(records, Local::now().naive_local())
}

/// Compute the spending summary with the time windows anchored at `now`
pub fn compute_insights_at(records: &[TransactionRecord], now: NaiveDateTime) -> InsightsSummary {
    if records.is_empty() {
        return InsightsSummary::empty();
    }

    let total_spent: f64 = records.iter().map(TransactionRecord::amount).sum();
    let transaction_count = records.len();

    let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *category_breakdown
            .entry(record.category_label().to_string())
            .or_insert(0.0) += record.amount();
    }

    let top_category = top_category(&category_breakdown);
    let windows = collect_windows(records, now);
    let average_transaction = total_spent / transaction_count as f64;

    let insights = insight_lines(
        total_spent,
        top_category
            .as_deref()
            .map(|c| (c, category_breakdown[c])),
        &windows,
        average_transaction,
    );

    tracing::debug!(
        records = transaction_count,
        categories = category_breakdown.len(),
        insights = insights.len(),
        "Computed spending insights"
    );

    InsightsSummary {
        total_spent: round_cents(total_spent),
        transaction_count,
        category_breakdown,
        top_category,
        this_week_spending: round_cents(windows.this_week),
        this_month_spending: round_cents(windows.this_month),
        average_transaction: round_cents(average_transaction),
        insights,
    }
}

/// Parse a record's date string, returning `None` for anything unrecognized
///
/// Accepts RFC 3339 timestamps with an offset (converted to local time),
/// naive ISO-8601 date-times with `T` or a space separator, and bare dates
/// (taken as midnight).
pub fn parse_record_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Largest category; exact ties resolve to the first name in sort order
fn top_category(breakdown: &BTreeMap<String, f64>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for (category, &amount) in breakdown {
        match best {
            Some((_, best_amount)) if amount <= best_amount => {}
            _ => best = Some((category, amount)),
        }
    }
    best.map(|(category, _)| category.clone())
}

fn collect_windows(records: &[TransactionRecord], now: NaiveDateTime) -> SpendingWindows {
    let week_ago = now - Duration::days(WEEK_DAYS);
    let two_weeks_ago = week_ago - Duration::days(WEEK_DAYS);
    let month_ago = now - Duration::days(MONTH_DAYS);
    let two_months_ago = month_ago - Duration::days(MONTH_DAYS);

    let mut windows = SpendingWindows::default();

    for record in records {
        // Undated or unparsable records still count toward the totals above
        let Some(when) = record.date_field().and_then(parse_record_datetime) else {
            continue;
        };
        let amount = record.amount();

        if when >= week_ago {
            windows.this_week += amount;
        } else if when >= two_weeks_ago {
            windows.last_week += amount;
        }

        if when >= month_ago {
            windows.this_month += amount;
        } else if when >= two_months_ago {
            windows.last_month += amount;
        }
    }

    windows
}

fn insight_lines(
    total_spent: f64,
    top: Option<(&str, f64)>,
    windows: &SpendingWindows,
    average_transaction: f64,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Total spent across all transactions: ${:.2}",
        total_spent
    )];

    if let Some((category, amount)) = top {
        let share = if total_spent > 0.0 {
            amount / total_spent * 100.0
        } else {
            0.0
        };
        lines.push(format!(
            "Your highest spending category is {} at ${:.2} ({:.1}%)",
            category, amount, share
        ));
    }

    if let Some(change) = windows
        .weekly_change()
        .filter(|c| c.abs() >= SIGNIFICANT_CHANGE_PCT)
    {
        let direction = if change > 0.0 { "up" } else { "down" };
        lines.push(format!(
            "Weekly spending is {} {:.1}% compared to last week",
            direction,
            change.abs()
        ));
    }

    if let Some(change) = windows
        .monthly_change()
        .filter(|c| c.abs() >= SIGNIFICANT_CHANGE_PCT)
    {
        let direction = if change > 0.0 { "increased" } else { "decreased" };
        lines.push(format!(
            "Monthly spending {} by {:.1}% compared to last month",
            direction,
            change.abs()
        ));
    }

    lines.push(format!(
        "Average transaction amount: ${:.2}",
        average_transaction
    ));

    lines
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
