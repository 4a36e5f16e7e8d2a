//! Transaction storage
//!
//! Two interchangeable stores sit behind the `TransactionStore` trait:
//! - `json_file` - a single JSON array on disk, written atomically
//! - `database` - SQLite (optionally SQLCipher-encrypted) with connection pooling
//!
//! The `Storage` enum wraps whichever one the deployment picked and is what
//! the server and CLI hold.

mod database;
mod json_file;

pub use database::{Database, DbConn, DbPool, DB_KEY_ENV};
pub use json_file::JsonFileStore;

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::models::{NewTransaction, TransactionRecord};

/// Environment variable selecting the store kind
pub const STORE_ENV: &str = "BILLWISE_STORE";

/// Persistence for the transaction ledger
pub trait TransactionStore: Send + Sync {
    /// All records, oldest first
    fn load(&self) -> Result<Vec<TransactionRecord>>;

    /// Validate and persist a new transaction, returning the stored record
    /// with its assigned id and timestamp
    fn save(&self, tx: NewTransaction) -> Result<TransactionRecord>;

    /// Look up a single record
    fn get(&self, id: i64) -> Result<Option<TransactionRecord>>;

    /// Remove a record; returns false when no record had that id
    fn delete(&self, id: i64) -> Result<bool>;
}

/// Which store backs the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Sqlite,
    Json,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Json => "json",
        }
    }

    /// Read `BILLWISE_STORE`, ignoring unknown values
    pub fn from_env() -> Option<Self> {
        let value = std::env::var(STORE_ENV).ok()?;
        match value.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!(value = %value, "{}", e);
                None
            }
        }
    }

    /// Default file name for this kind of store
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Sqlite => "billwise.db",
            Self::Json => "transactions.json",
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" => Ok(Self::Sqlite),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown store kind: {} (expected sqlite or json)", s)),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concrete store handle
///
/// Provides Clone and static dispatch over the two store implementations.
#[derive(Clone)]
pub enum Storage {
    Json(JsonFileStore),
    Sqlite(Database),
}

impl Storage {
    /// Open (creating if needed) a store of the given kind at `path`
    ///
    /// SQLite stores are encrypted with `BILLWISE_DB_KEY` unless `encrypt`
    /// is false. JSON stores are never encrypted.
    pub fn open(kind: StoreKind, path: &str, encrypt: bool) -> Result<Self> {
        match kind {
            StoreKind::Json => {
                let store = JsonFileStore::new(path);
                store.init()?;
                Ok(Storage::Json(store))
            }
            StoreKind::Sqlite if encrypt => Ok(Storage::Sqlite(Database::new(path)?)),
            StoreKind::Sqlite => Ok(Storage::Sqlite(Database::new_unencrypted(path)?)),
        }
    }

    /// Fresh throwaway SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        Ok(Storage::Sqlite(Database::in_memory()?))
    }

    pub fn kind(&self) -> StoreKind {
        match self {
            Storage::Json(_) => StoreKind::Json,
            Storage::Sqlite(_) => StoreKind::Sqlite,
        }
    }

    /// Backing file path (for logging)
    pub fn path(&self) -> String {
        match self {
            Storage::Json(s) => s.path().display().to_string(),
            Storage::Sqlite(db) => db.path().to_string(),
        }
    }
}

impl TransactionStore for Storage {
    fn load(&self) -> Result<Vec<TransactionRecord>> {
        match self {
            Storage::Json(s) => s.load(),
            Storage::Sqlite(s) => s.load(),
        }
    }

    fn save(&self, tx: NewTransaction) -> Result<TransactionRecord> {
        match self {
            Storage::Json(s) => s.save(tx),
            Storage::Sqlite(s) => s.save(tx),
        }
    }

    fn get(&self, id: i64) -> Result<Option<TransactionRecord>> {
        match self {
            Storage::Json(s) => s.get(id),
            Storage::Sqlite(s) => s.get(id),
        }
    }

    fn delete(&self, id: i64) -> Result<bool> {
        match self {
            Storage::Json(s) => s.delete(id),
            Storage::Sqlite(s) => s.delete(id),
        }
    }
}
