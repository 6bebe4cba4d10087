//! `kv_entries` schema upgrades and readiness check.

use crate::repo::kv_repo::{RepoError, RepoResult};
use log::info;
use rusqlite::Connection;

pub(crate) const KV_TABLE: &str = "kv_entries";

// Step `n` moves `user_version` from `n` to `n + 1`.
const UPGRADE_STEPS: &[&str] = &[include_str!("kv_entries_v1.sql")];

/// Schema version this build reads and writes.
pub const KV_SCHEMA_VERSION: u32 = UPGRADE_STEPS.len() as u32;

/// Reads `PRAGMA user_version`.
pub fn stored_schema_version(conn: &Connection) -> RepoResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Runs the steps above the stored version in one transaction.
///
/// # Errors
/// - `RepoError::SchemaTooNew` when the file was written by a newer build.
pub(crate) fn upgrade_kv_schema(conn: &mut Connection) -> RepoResult<()> {
    let found = stored_schema_version(conn)?;
    if found > KV_SCHEMA_VERSION {
        return Err(RepoError::SchemaTooNew {
            found,
            supported: KV_SCHEMA_VERSION,
        });
    }

    let pending = &UPGRADE_STEPS[found as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for ddl in pending {
        tx.execute_batch(ddl)?;
    }
    tx.pragma_update(None, "user_version", KV_SCHEMA_VERSION)?;
    tx.commit()?;

    info!(
        "event=kv_schema_upgrade module=db status=ok from_version={} to_version={} steps={}",
        found,
        KV_SCHEMA_VERSION,
        pending.len()
    );
    Ok(())
}

/// Fails unless `conn` is at [`KV_SCHEMA_VERSION`] and holds `kv_entries`.
///
/// # Errors
/// - `UninitializedConnection` for any other stored version.
/// - `MissingRequiredTable` when the version matches but the table is gone.
pub fn verify_kv_schema(conn: &Connection) -> RepoResult<()> {
    let actual_version = stored_schema_version(conn)?;
    if actual_version != KV_SCHEMA_VERSION {
        return Err(RepoError::UninitializedConnection {
            expected_version: KV_SCHEMA_VERSION,
            actual_version,
        });
    }

    let table_present: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [KV_TABLE],
        |row| row.get(0),
    )?;
    if !table_present {
        return Err(RepoError::MissingRequiredTable(KV_TABLE));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{stored_schema_version, upgrade_kv_schema, verify_kv_schema, KV_SCHEMA_VERSION};
    use crate::repo::kv_repo::RepoError;
    use rusqlite::Connection;

    #[test]
    fn upgrade_from_empty_file_reaches_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(stored_schema_version(&conn).unwrap(), 0);

        upgrade_kv_schema(&mut conn).unwrap();
        assert_eq!(stored_schema_version(&conn).unwrap(), KV_SCHEMA_VERSION);
        verify_kv_schema(&conn).unwrap();

        upgrade_kv_schema(&mut conn).unwrap();
        assert_eq!(stored_schema_version(&conn).unwrap(), KV_SCHEMA_VERSION);
    }

    #[test]
    fn verify_rejects_fresh_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = verify_kv_schema(&conn).unwrap_err();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }
}
