//! Flat-file transaction store
//!
//! The whole ledger lives in one pretty-printed JSON array. Every write
//! rewrites the file through a temp file + rename so readers never see a
//! half-written ledger.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::TransactionStore;
use crate::error::{Error, Result};
use crate::models::{now_timestamp, NewTransaction, TransactionRecord};

/// JSON file backed store
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty ledger file if none exists yet
    pub fn init(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.write_all(&[])
    }

    /// Read the ledger, treating a missing or unreadable file as empty
    fn read_all(&self) -> Result<Vec<TransactionRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<serde_json::Value> = match serde_json::from_str(&contents) {
            Ok(values) => values,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt ledger file, loading as empty");
                return Ok(Vec::new());
            }
        };

        // Entries that are not objects are skipped rather than failing the load;
        // every object is kept, whatever its field types
        let records = values
            .into_iter()
            .filter(serde_json::Value::is_object)
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Skipping unreadable ledger entry");
                    None
                }
            })
            .collect();

        Ok(records)
    }

    fn write_all(&self, records: &[TransactionRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, records)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::Storage("Ledger write lock poisoned".into()))
    }
}

impl TransactionStore for JsonFileStore {
    fn load(&self) -> Result<Vec<TransactionRecord>> {
        self.read_all()
    }

    fn save(&self, tx: NewTransaction) -> Result<TransactionRecord> {
        tx.validate()?;

        let _guard = self.lock()?;
        let mut records = self.read_all()?;

        let id = records.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
        let record = tx.into_record(id, now_timestamp());
        records.push(record.clone());
        self.write_all(&records)?;

        debug!(id, path = %self.path.display(), "Saved transaction");
        Ok(record)
    }

    fn get(&self, id: i64) -> Result<Option<TransactionRecord>> {
        Ok(self.read_all()?.into_iter().find(|r| r.id == Some(id)))
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let _guard = self.lock()?;
        let mut records = self.read_all()?;

        let before = records.len();
        records.retain(|r| r.id != Some(id));
        if records.len() == before {
            return Ok(false);
        }

        self.write_all(&records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillItem;

    fn store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("transactions.json"));
        (dir, store)
    }

    fn expense(amount: f64, category: &str) -> NewTransaction {
        NewTransaction {
            total_amount: Some(amount),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let (_dir, store) = store();
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_dir, store) = store();
        let saved = store
            .save(NewTransaction {
                items: vec![BillItem {
                    name: "Bus pass".into(),
                    price: 30.0,
                }],
                ..expense(30.0, "Transport")
            })
            .unwrap();

        assert_eq!(saved.id, Some(1));
        assert!(saved.timestamp.is_some());

        let records = store.load().unwrap();
        assert_eq!(records, vec![saved]);
    }

    #[test]
    fn test_ids_continue_after_delete() {
        let (_dir, store) = store();
        let a = store.save(expense(1.0, "Food")).unwrap();
        let b = store.save(expense(2.0, "Food")).unwrap();
        assert_eq!((a.id, b.id), (Some(1), Some(2)));

        assert!(store.delete(1).unwrap());
        let c = store.save(expense(3.0, "Food")).unwrap();
        assert_eq!(c.id, Some(3));

        assert!(store.delete(3).unwrap());
        let d = store.save(expense(4.0, "Food")).unwrap();
        assert_eq!(d.id, Some(3));
    }

    #[test]
    fn test_delete_missing_leaves_file_alone() {
        let (_dir, store) = store();
        store.save(expense(1.0, "Food")).unwrap();
        assert!(!store.delete(42).unwrap());
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_skips_non_object_entries() {
        let (_dir, store) = store();
        fs::write(
            store.path(),
            r#"[{"id": 1, "total_amount": 5, "category": "Food"}, 7, "junk"]"#,
        )
        .unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount(), 5.0);
    }

    #[test]
    fn test_keeps_objects_with_wrong_typed_fields() {
        let (_dir, store) = store();
        fs::write(
            store.path(),
            r#"[{"id": 1, "total_amount": 10, "date": "2026-01-01"},
                {"id": 2, "total_amount": 40, "date": 20260101, "category": 3, "merchant": null}]"#,
        )
        .unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date.as_deref(), Some("20260101"));
        assert_eq!(records[1].category.as_deref(), Some("3"));

        let summary = crate::insights::compute_insights(&records);
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_spent, 50.0);
    }

    #[test]
    fn test_init_creates_empty_array() {
        let (_dir, store) = store();
        store.init().unwrap();
        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.trim(), "[]");
    }

    #[test]
    fn test_concurrent_saves_get_unique_ids() {
        let (_dir, store) = store();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.save(expense(i as f64, "Food")).unwrap())
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .map(|h| h.join().unwrap().id.unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert_eq!(store.load().unwrap().len(), 8);
    }
}
