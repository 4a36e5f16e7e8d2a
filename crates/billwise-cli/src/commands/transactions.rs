//! Transaction command implementations

use anyhow::{bail, Result};
use billwise_core::models::{NewTransaction, TransactionRecord, TransactionType};
use billwise_core::storage::{Storage, TransactionStore};
use chrono::NaiveDateTime;

use super::truncate;

/// Short display form of a record's date, preferring the save timestamp
fn display_date(tx: &TransactionRecord) -> String {
    match tx.date_field() {
        Some(raw) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| truncate(raw, 16)),
        None => "-".to_string(),
    }
}

pub fn cmd_transactions_list(store: &Storage, limit: usize) -> Result<()> {
    let transactions = store.load()?;

    if transactions.is_empty() {
        println!("No transactions found. Add some with:");
        println!("  billwise bill --file receipt.jpg --save");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    // Newest last in storage, so show the tail
    let skip = transactions.len().saturating_sub(limit);
    for tx in transactions.iter().skip(skip) {
        let amount_str = match tx.transaction_type {
            TransactionType::Expense => format!("\x1b[31m${:.2}\x1b[0m", tx.amount()), // Red for expenses
            TransactionType::Income => format!("\x1b[32m+${:.2}\x1b[0m", tx.amount()), // Green for income
        };

        println!(
            "   {:>4} │ {:<16} │ {:>10} │ {:<14} │ {}",
            tx.id.unwrap_or_default(),
            display_date(tx),
            amount_str,
            truncate(tx.category_label(), 14),
            truncate(tx.merchant.as_deref().unwrap_or(""), 30)
        );
    }

    Ok(())
}

pub fn cmd_transactions_add(
    store: &Storage,
    amount: f64,
    category: Option<&str>,
    merchant: Option<&str>,
    date: Option<&str>,
    income: bool,
) -> Result<()> {
    let tx = NewTransaction {
        total_amount: Some(amount),
        category: category.map(str::to_string),
        merchant: merchant.map(str::to_string),
        date: date.map(str::to_string),
        transaction_type: if income {
            TransactionType::Income
        } else {
            TransactionType::Expense
        },
        ..Default::default()
    };

    let record = store.save(tx)?;
    println!(
        "✅ Recorded transaction #{}: ${:.2} ({})",
        record.id.unwrap_or_default(),
        record.amount(),
        record.category_label()
    );

    Ok(())
}

pub fn cmd_transactions_delete(store: &Storage, id: i64) -> Result<()> {
    if !store.delete(id)? {
        bail!("Transaction {} not found", id);
    }

    println!("🗑️  Deleted transaction #{}", id);
    Ok(())
}
