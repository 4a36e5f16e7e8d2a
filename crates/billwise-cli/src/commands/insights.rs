//! Insights command implementation

use anyhow::Result;
use billwise_core::insights::compute_insights;
use billwise_core::storage::{Storage, TransactionStore};

pub fn cmd_insights(store: &Storage, json: bool) -> Result<()> {
    let records = store.load()?;
    let summary = compute_insights(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("📊 Spending Insights");
    println!("   ─────────────────────────────────────────────");
    println!("   Total spent:      ${:.2}", summary.total_spent);
    println!("   Transactions:     {}", summary.transaction_count);
    println!("   Average:          ${:.2}", summary.average_transaction);
    println!("   This week:        ${:.2}", summary.this_week_spending);
    println!("   This month:       ${:.2}", summary.this_month_spending);
    if let Some(top) = &summary.top_category {
        println!("   Top category:     {}", top);
    }

    if !summary.category_breakdown.is_empty() {
        println!();
        println!("   By category:");
        for (category, amount) in &summary.category_breakdown {
            println!("     {:<16} ${:>10.2}", category, amount);
        }
    }

    println!();
    for line in &summary.insights {
        println!("   💡 {}", line);
    }

    Ok(())
}
