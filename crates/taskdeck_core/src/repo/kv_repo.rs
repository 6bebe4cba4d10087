//! Durable string key-value medium and its SQLite implementation.
//!
//! # Responsibility
//! - Define the persistence port consumed by the lists repository.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Keys are addressed independently; writing one key never touches another.
//! - `set_many` applies all entries or none.
//! - Reading a key that was never written yields `None`, not an error.

use crate::db::verify_kv_schema;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer error for key-value access and snapshot decoding.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite error.
    Sqlite(rusqlite::Error),
    /// File was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// Connection schema is not at the version this build uses.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Stored value under `key` cannot be decoded.
    CorruptState { key: String, message: String },
    /// Value could not be encoded for storage.
    Encode(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "key-value schema version {found} is newer than supported {supported}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "key-value store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "key-value store requires table `{table}`")
            }
            Self::CorruptState { key, message } => {
                write!(f, "corrupt persisted value under `{key}`: {message}")
            }
            Self::Encode(message) => write!(f, "failed to encode value: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Durable string→string mapping addressed by partition key.
pub trait KeyValueStore {
    /// Reads one value. `None` when the key was never written.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Inserts or replaces one value.
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Removes one key. Removing a missing key is a no-op.
    fn remove(&self, key: &str) -> RepoResult<()>;
    /// Writes several keys as one unit.
    fn set_many(&self, entries: &[(&str, &str)]) -> RepoResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        (**self).remove(key)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> RepoResult<()> {
        (**self).set_many(entries)
    }
}

/// SQLite-backed key-value store over the `kv_entries` table.
pub struct SqliteKeyValueStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStore<'conn> {
    /// Creates a store over a connection prepared by `open_db`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the connection did not come from `open_db`.
    /// - `MissingRequiredTable` when `kv_entries` is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        verify_kv_schema(conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKeyValueStore<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        upsert_entry(self.conn, key, value)
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (key, value) in entries {
            upsert_entry(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Process-local store used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `key` currently holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

// `Transaction` derefs to `Connection`, so both write paths share this.
fn upsert_entry(conn: &Connection, key: &str, value: &str) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO kv_entries (key, value)
         VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![key, value],
    )?;
    Ok(())
}
