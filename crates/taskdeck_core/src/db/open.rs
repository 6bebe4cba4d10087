//! Connection setup for the key-value file.

use super::schema::{upgrade_kv_schema, verify_kv_schema};
use crate::repo::kv_repo::{RepoError, RepoResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating when missing) a key-value file ready for
/// [`SqliteKeyValueStore::try_new`](crate::repo::kv_repo::SqliteKeyValueStore::try_new).
pub fn open_db(path: impl AsRef<Path>) -> RepoResult<Connection> {
    let path = path.as_ref();
    prepare("file", || Connection::open(path))
}

/// Same as [`open_db`], but the data dies with the connection.
pub fn open_db_in_memory() -> RepoResult<Connection> {
    prepare("memory", Connection::open_in_memory)
}

fn prepare(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> RepoResult<Connection> {
    let started_at = Instant::now();
    let opened = connect()
        .map_err(RepoError::from)
        .and_then(|mut conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            upgrade_kv_schema(&mut conn)?;
            verify_kv_schema(&conn)?;
            Ok(conn)
        });

    match &opened {
        Ok(_) => info!(
            "event=kv_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=kv_open module=db status=error mode={} duration_ms={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    opened
}
