//! SQLite transaction store with connection pooling and migrations

use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, warn};

use super::TransactionStore;
use crate::error::{Error, Result};
use crate::models::{now_timestamp, BillItem, NewTransaction, TransactionRecord};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "BILLWISE_DB_KEY";

const RECORD_COLUMNS: &str = "id, total_amount, category, timestamp, date, merchant, items, type";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this invalidates every existing encrypted database
    const APP_SALT: &[u8; 16] = b"billwise-salt-v1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    db_path: String,
    encrypted: bool,
    /// Directory holding a throwaway database; removed with the last clone.
    /// Declared after `pool` so connections close first.
    scratch_dir: Option<Arc<tempfile::TempDir>>,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `BILLWISE_DB_KEY` to be set. The database is encrypted using
    /// SQLCipher with a key derived from the passphrase via Argon2.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// Only use for development or testing.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Every pooled connection needs the key before first use
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
            encrypted: passphrase.is_some(),
            scratch_dir: None,
        };
        db.run_migrations()?;

        debug!(path, encrypted = db.encrypted, "Opened transaction database");
        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool. The file
    /// lives in its own temp directory, deleted (WAL and SHM files included)
    /// when the last clone is dropped.
    pub fn in_memory() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("billwise_test_")
            .tempdir()?;
        let path = dir.path().join("billwise.db");

        let mut db = Self::new_unencrypted(&path.to_string_lossy())?;
        db.scratch_dir = Some(Arc::new(dir));
        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Whether the database was opened with an encryption key
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                total_amount REAL,
                category TEXT,
                timestamp TEXT NOT NULL,                   -- local ISO-8601, set on save
                date TEXT,                                 -- as printed on the bill
                merchant TEXT,
                items TEXT NOT NULL DEFAULT '[]',          -- JSON array of {name, price}
                type TEXT NOT NULL DEFAULT 'expense',      -- expense, income
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_timestamp ON transactions(timestamp);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category);
            "#,
        )?;

        Ok(())
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
        let id: i64 = row.get(0)?;
        let items_json: String = row.get(6)?;
        let type_str: String = row.get(7)?;

        let items: Vec<BillItem> = serde_json::from_str(&items_json).unwrap_or_else(|e| {
            warn!(id, error = %e, "Unreadable items column, treating as empty");
            Vec::new()
        });

        Ok(TransactionRecord {
            id: Some(id),
            total_amount: row.get(1)?,
            category: row.get(2)?,
            timestamp: row.get(3)?,
            date: row.get(4)?,
            merchant: row.get(5)?,
            items,
            transaction_type: type_str.parse().unwrap_or_default(),
        })
    }
}

impl TransactionStore for Database {
    fn load(&self) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY id",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    fn save(&self, tx: NewTransaction) -> Result<TransactionRecord> {
        tx.validate()?;

        let timestamp = now_timestamp();
        let items_json = serde_json::to_string(&tx.items)?;
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (total_amount, category, timestamp, date, merchant, items, type)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.resolved_amount(),
                tx.category.as_deref().filter(|c| !c.trim().is_empty()),
                timestamp,
                tx.date.as_deref().filter(|d| !d.trim().is_empty()),
                tx.merchant.as_deref().filter(|m| !m.trim().is_empty()),
                items_json,
                tx.transaction_type.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(id, "Saved transaction");
        Ok(tx.into_record(id, timestamp))
    }

    fn get(&self, id: i64) -> Result<Option<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            RECORD_COLUMNS
        ))?;

        let record = stmt
            .query_row(params![id], Self::row_to_record)
            .optional()?;

        Ok(record)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.load().unwrap().is_empty());
        assert!(!db.is_encrypted());
    }

    #[test]
    fn test_in_memory_files_removed_on_drop() {
        let db = Database::in_memory().unwrap();
        db.save(NewTransaction {
            total_amount: Some(1.0),
            ..Default::default()
        })
        .unwrap();

        let dir = std::path::Path::new(db.path()).parent().unwrap().to_path_buf();
        assert!(dir.exists());

        // Clones share the directory
        let clone = db.clone();
        drop(db);
        assert!(dir.exists());
        assert_eq!(clone.load().unwrap().len(), 1);

        drop(clone);
        assert!(!dir.exists());
    }

    #[test]
    fn test_save_and_load_preserves_fields() {
        let db = Database::in_memory().unwrap();

        let saved = db
            .save(NewTransaction {
                total_amount: Some(42.75),
                date: Some("2026-03-14".into()),
                merchant: Some("FreshMart".into()),
                category: Some("Groceries".into()),
                transaction_type: TransactionType::Expense,
                items: vec![
                    BillItem {
                        name: "Apples".into(),
                        price: 3.5,
                    },
                    BillItem {
                        name: "Olive Oil".into(),
                        price: 39.25,
                    },
                ],
                ..Default::default()
            })
            .unwrap();

        assert!(saved.id.unwrap() > 0);
        assert!(saved.timestamp.is_some());

        let records = db.load().unwrap();
        assert_eq!(records, vec![saved.clone()]);
        assert_eq!(records[0].items.len(), 2);
        assert_eq!(records[0].items[1].name, "Olive Oil");
    }

    #[test]
    fn test_income_and_amount_alias() {
        let db = Database::in_memory().unwrap();
        let saved = db
            .save(NewTransaction {
                amount: Some(1500.0),
                transaction_type: TransactionType::Income,
                ..Default::default()
            })
            .unwrap();

        let fetched = db.get(saved.id.unwrap()).unwrap().unwrap();
        assert_eq!(fetched.total_amount, Some(1500.0));
        assert_eq!(fetched.transaction_type, TransactionType::Income);
        assert_eq!(fetched.category, None);
    }

    #[test]
    fn test_get_and_delete_missing() {
        let db = Database::in_memory().unwrap();
        assert!(db.get(999).unwrap().is_none());
        assert!(!db.delete(999).unwrap());
    }

    #[test]
    fn test_delete() {
        let db = Database::in_memory().unwrap();
        let saved = db
            .save(NewTransaction {
                total_amount: Some(9.99),
                ..Default::default()
            })
            .unwrap();

        assert!(db.delete(saved.id.unwrap()).unwrap());
        assert!(db.get(saved.id.unwrap()).unwrap().is_none());
        assert!(db.load().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_negative_amount() {
        let db = Database::in_memory().unwrap();
        let result = db.save(NewTransaction {
            total_amount: Some(-1.0),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidData(_))));
        assert!(db.load().unwrap().is_empty());
    }

    #[test]
    fn test_encrypted_database_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secure.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new_with_key(path, Some("correct horse")).unwrap();
            assert!(db.is_encrypted());
            db.save(NewTransaction {
                total_amount: Some(12.0),
                ..Default::default()
            })
            .unwrap();
        }

        let reopened = Database::new_with_key(path, Some("correct horse")).unwrap();
        assert_eq!(reopened.load().unwrap().len(), 1);

        assert!(Database::new_with_key(path, Some("wrong passphrase")).is_err());
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let a = derive_key("passphrase").unwrap();
        let b = derive_key("passphrase").unwrap();
        let c = derive_key("other").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
