//! Bill extraction command

use std::path::Path;

use anyhow::{bail, Context, Result};
use billwise_core::ai::{AIBackend, AIClient};
use billwise_core::models::{BillData, NewTransaction};
use billwise_core::storage::{Storage, TransactionStore};
use billwise_server::MAX_UPLOAD_SIZE;
use tracing::info;

/// Guess an image MIME type from the file extension
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

pub async fn cmd_bill(store: &Storage, file: &Path, save: bool) -> Result<()> {
    let ai = super::require_ai()?;
    println!("🤖 Using {} (model: {})", ai.host(), ai.model());
    extract_bill_file(store, &ai, file, save).await.map(|_| ())
}

/// Read an image, extract the bill and optionally record it
pub async fn extract_bill_file(
    store: &Storage,
    ai: &AIClient,
    file: &Path,
    save: bool,
) -> Result<BillData> {
    let Some(mime_type) = mime_type_for(file) else {
        bail!("Only image files are accepted: {}", file.display());
    };

    let image = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    if image.is_empty() {
        bail!("{} is empty", file.display());
    }
    if image.len() > MAX_UPLOAD_SIZE {
        bail!("File size exceeds {}MB limit", MAX_UPLOAD_SIZE / 1024 / 1024);
    }

    println!("🧾 Processing {}...", file.display());
    let bill = ai
        .extract_bill(&image, mime_type)
        .await
        .context("Error processing bill")?;

    println!();
    println!("   Merchant: {}", bill.merchant);
    let date = if bill.date.is_empty() { "-" } else { bill.date.as_str() };
    println!("   Date:     {}", date);
    println!("   Category: {}", bill.category);
    println!("   Total:    ${:.2}", bill.total_amount);
    for item in &bill.items {
        println!("     • {:<30} ${:>8.2}", super::truncate(&item.name, 30), item.price);
    }

    if save {
        let record = store.save(NewTransaction::from(bill.clone()))?;
        info!(id = record.id, merchant = %bill.merchant, "Bill saved");
        println!();
        println!("✅ Saved as transaction #{}", record.id.unwrap_or_default());
    } else {
        println!();
        println!("   💡 Re-run with --save to record this bill");
    }

    Ok(bill)
}
