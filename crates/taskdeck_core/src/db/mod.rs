//! SQLite file backing the durable key-value medium.
//!
//! # Responsibility
//! - Open connections and bring the `kv_entries` schema up to date.
//! - Refuse connections the key-value store cannot safely use.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - A connection handed out by this module passes [`verify_kv_schema`].

mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{stored_schema_version, verify_kv_schema, KV_SCHEMA_VERSION};
