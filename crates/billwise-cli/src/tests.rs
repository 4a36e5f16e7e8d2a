//! CLI command tests

use std::path::{Path, PathBuf};

use billwise_core::ai::{AIClient, MockBackend};
use billwise_core::storage::{Storage, StoreKind, TransactionStore};
use billwise_core::TransactionType;
use tempfile::TempDir;

use crate::commands::{self, truncate, StoreArgs};

fn json_args(dir: &TempDir) -> StoreArgs {
    StoreArgs {
        db: Some(dir.path().join("ledger.json")),
        store: Some("json".to_string()),
        no_encrypt: false,
    }
}

fn setup_test_store() -> (TempDir, Storage) {
    let dir = tempfile::tempdir().unwrap();
    let store = commands::open_store(&json_args(&dir)).unwrap();
    (dir, store)
}

fn write_image(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"fake image bytes").unwrap();
    path
}

// ========== Store Setup Tests ==========

#[test]
fn test_store_args_defaults() {
    let args = StoreArgs {
        store: Some("sqlite".to_string()),
        ..Default::default()
    };
    let kind = args.kind().unwrap();
    assert_eq!(kind, StoreKind::Sqlite);
    assert_eq!(args.path(kind), PathBuf::from("billwise.db"));
    assert_eq!(
        args.path(StoreKind::Json),
        PathBuf::from("transactions.json")
    );
}

#[test]
fn test_store_args_unknown_kind() {
    let args = StoreArgs {
        store: Some("csv".to_string()),
        ..Default::default()
    };
    assert!(args.kind().is_err());
    assert!(commands::open_store(&args).is_err());
}

#[test]
fn test_cmd_init_json() {
    let dir = tempfile::tempdir().unwrap();
    let args = json_args(&dir);

    commands::cmd_init(&args).unwrap();

    let contents = std::fs::read_to_string(dir.path().join("ledger.json")).unwrap();
    assert_eq!(contents.trim(), "[]");
}

#[test]
fn test_cmd_init_unencrypted_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let args = StoreArgs {
        db: Some(dir.path().join("test.db")),
        store: Some("sqlite".to_string()),
        no_encrypt: true,
    };

    commands::cmd_init(&args).unwrap();
    assert!(dir.path().join("test.db").exists());

    let store = commands::open_store(&args).unwrap();
    assert_eq!(store.kind(), StoreKind::Sqlite);
    assert!(store.load().unwrap().is_empty());
}

// ========== Transactions Command Tests ==========

#[test]
fn test_cmd_transactions_add_and_list() {
    let (_dir, store) = setup_test_store();

    commands::cmd_transactions_add(
        &store,
        12.5,
        Some("Transport"),
        Some("Metro"),
        Some("2026-03-14"),
        false,
    )
    .unwrap();
    commands::cmd_transactions_add(&store, 2000.0, None, None, None, true).unwrap();

    let records = store.load().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].category.as_deref(), Some("Transport"));
    assert_eq!(records[0].merchant.as_deref(), Some("Metro"));
    assert_eq!(records[1].transaction_type, TransactionType::Income);
    assert_eq!(records[1].category_label(), "Other");

    assert!(commands::cmd_transactions_list(&store, 20).is_ok());
    assert!(commands::cmd_transactions_list(&store, 1).is_ok());
}

#[test]
fn test_cmd_transactions_list_empty() {
    let (_dir, store) = setup_test_store();
    assert!(commands::cmd_transactions_list(&store, 20).is_ok());
}

#[test]
fn test_cmd_transactions_add_negative() {
    let (_dir, store) = setup_test_store();
    let result = commands::cmd_transactions_add(&store, -3.0, None, None, None, false);
    assert!(result.is_err());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_cmd_transactions_delete() {
    let (_dir, store) = setup_test_store();
    commands::cmd_transactions_add(&store, 5.0, Some("Food"), None, None, false).unwrap();

    commands::cmd_transactions_delete(&store, 1).unwrap();
    assert!(store.load().unwrap().is_empty());

    // Already gone
    assert!(commands::cmd_transactions_delete(&store, 1).is_err());
}

// ========== Insights Command Tests ==========

#[test]
fn test_cmd_insights() {
    let (_dir, store) = setup_test_store();
    assert!(commands::cmd_insights(&store, false).is_ok());
    assert!(commands::cmd_insights(&store, true).is_ok());

    commands::cmd_transactions_add(&store, 30.0, Some("Groceries"), None, None, false).unwrap();
    commands::cmd_transactions_add(&store, 10.0, Some("Food"), None, None, false).unwrap();
    assert!(commands::cmd_insights(&store, false).is_ok());
    assert!(commands::cmd_insights(&store, true).is_ok());
}

// ========== Bill Command Tests ==========

#[test]
fn test_mime_type_for() {
    assert_eq!(
        commands::mime_type_for(Path::new("bill.JPG")),
        Some("image/jpeg")
    );
    assert_eq!(
        commands::mime_type_for(Path::new("scan.png")),
        Some("image/png")
    );
    assert_eq!(
        commands::mime_type_for(Path::new("photo.webp")),
        Some("image/webp")
    );
    assert_eq!(commands::mime_type_for(Path::new("notes.txt")), None);
    assert_eq!(commands::mime_type_for(Path::new("no_extension")), None);
}

#[tokio::test]
async fn test_extract_bill_file_and_save() {
    let (dir, store) = setup_test_store();
    let image = write_image(&dir, "receipt.jpg");

    let bill = commands::extract_bill_file(&store, &AIClient::mock(), &image, true)
        .await
        .unwrap();
    assert_eq!(bill.merchant, "Mock Grocer");

    let records = store.load().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].merchant.as_deref(), Some("Mock Grocer"));
    assert_eq!(records[0].amount(), bill.total_amount);
    assert_eq!(records[0].items.len(), 2);
}

#[tokio::test]
async fn test_extract_bill_file_without_save() {
    let (dir, store) = setup_test_store();
    let image = write_image(&dir, "receipt.png");

    commands::extract_bill_file(&store, &AIClient::mock(), &image, false)
        .await
        .unwrap();
    assert!(store.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_extract_bill_file_rejects_non_image() {
    let (dir, store) = setup_test_store();
    let path = write_image(&dir, "statement.pdf");

    let result = commands::extract_bill_file(&store, &AIClient::mock(), &path, true).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_extract_bill_file_missing() {
    let (dir, store) = setup_test_store();
    let path = dir.path().join("missing.jpg");

    let result = commands::extract_bill_file(&store, &AIClient::mock(), &path, true).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_extract_bill_file_ai_failure() {
    let (dir, store) = setup_test_store();
    let image = write_image(&dir, "receipt.jpg");
    let ai = AIClient::Mock(MockBackend::failing());

    let result = commands::extract_bill_file(&store, &ai, &image, true).await;
    assert!(result.is_err());
    assert!(store.load().unwrap().is_empty());
}

// ========== Ask Command Tests ==========

#[tokio::test]
async fn test_ask_over_store() {
    let (_dir, store) = setup_test_store();
    commands::cmd_transactions_add(&store, 10.0, Some("Food"), None, None, false).unwrap();
    commands::cmd_transactions_add(&store, 2.5, Some("Food"), None, None, false).unwrap();

    let answer = commands::answer_from_store(&store, &AIClient::mock(), "How much on food?")
        .await
        .unwrap();
    assert_eq!(answer, "You have 2 transaction(s) totaling $12.50.");
}

#[tokio::test]
async fn test_ask_empty_question() {
    let (_dir, store) = setup_test_store();
    let result = commands::answer_from_store(&store, &AIClient::mock(), "  ").await;
    assert!(result.is_err());
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long string", 10), "this is...");
    assert_eq!(truncate("café au lait", 7), "café...");
}
