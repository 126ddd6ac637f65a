//! StateStore — redb-backed persistence for named status records.
//!
//! The [`RecordStore`] trait is the seam status writers program against;
//! `StateStore` is the redb implementation. The store supports both on-disk
//! and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Get/create/update access to named records.
///
/// `get_record` reports an absent record as [`StateError::NotFound`].
/// `create_record` fails with [`StateError::AlreadyExists`] if the name is
/// taken. `update_record` fails with [`StateError::Conflict`] if the
/// record's `version` no longer matches the stored one. Both writes return
/// the record as stored, with its new version.
pub trait RecordStore {
    fn get_record(&self, namespace: &str, name: &str) -> StateResult<StatusRecord>;
    fn create_record(&self, record: &StatusRecord) -> StateResult<StatusRecord>;
    fn update_record(&self, record: &StatusRecord) -> StateResult<StatusRecord>;
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RECORDS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// List all records in a namespace.
    pub fn list_records(&self, namespace: &str) -> StateResult<Vec<StatusRecord>> {
        let prefix = format!("{namespace}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let record: StatusRecord =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Write `record` under its key with a bumped version, provided the
    /// currently stored version satisfies `check`. The check and the write
    /// share one write transaction.
    fn write_checked(
        &self,
        record: &StatusRecord,
        check: impl FnOnce(&str, Option<u64>) -> StateResult<()>,
    ) -> StateResult<StatusRecord> {
        let key = record.table_key();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let stored;
        {
            let mut table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
            let current = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => {
                    let existing: StatusRecord =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    Some(existing.version)
                }
                None => None,
            };
            check(&key, current)?;

            stored = StatusRecord {
                version: current.unwrap_or(0) + 1,
                ..record.clone()
            };
            let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, version = stored.version, "record stored");
        Ok(stored)
    }
}

impl RecordStore for StateStore {
    fn get_record(&self, namespace: &str, name: &str) -> StateResult<StatusRecord> {
        let key = record_key(namespace, name);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RECORDS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))
            }
            None => Err(StateError::NotFound(key)),
        }
    }

    fn create_record(&self, record: &StatusRecord) -> StateResult<StatusRecord> {
        self.write_checked(record, |key, current| match current {
            Some(_) => Err(StateError::AlreadyExists(key.to_string())),
            None => Ok(()),
        })
    }

    fn update_record(&self, record: &StatusRecord) -> StateResult<StatusRecord> {
        self.write_checked(record, |key, current| match current {
            None => Err(StateError::NotFound(key.to_string())),
            Some(found) if found != record.version => Err(StateError::Conflict {
                key: key.to_string(),
                expected: record.version,
                found,
            }),
            Some(_) => Ok(()),
        })
    }
}
