use rusqlite::Connection;
use taskdeck_core::db::{open_db, open_db_in_memory, stored_schema_version, KV_SCHEMA_VERSION};
use taskdeck_core::{KeyValueStore, RepoError, SqliteKeyValueStore};

#[test]
fn in_memory_connection_is_ready_for_the_store() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(stored_schema_version(&conn).unwrap(), KV_SCHEMA_VERSION);

    let store = SqliteKeyValueStore::try_new(&conn).unwrap();
    store.set("current-list", "null").unwrap();
    assert_eq!(store.get("current-list").unwrap().as_deref(), Some("null"));
}

#[test]
fn reopening_a_file_keeps_entries_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskdeck.db");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteKeyValueStore::try_new(&conn).unwrap();
        store
            .set_many(&[("task-lists", r#"{"Work":[]}"#), ("current-list", r#""Work""#)])
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(stored_schema_version(&conn).unwrap(), KV_SCHEMA_VERSION);
    let store = SqliteKeyValueStore::try_new(&conn).unwrap();
    assert_eq!(
        store.get("task-lists").unwrap().as_deref(),
        Some(r#"{"Work":[]}"#)
    );
    assert_eq!(store.get("current-list").unwrap().as_deref(), Some(r#""Work""#));
}

#[test]
fn file_from_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 999;")
        .unwrap();

    match open_db(&path).unwrap_err() {
        RepoError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, KV_SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn file_at_current_version_without_table_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stripped.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch(&format!("PRAGMA user_version = {KV_SCHEMA_VERSION};"))
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, RepoError::MissingRequiredTable("kv_entries")));
}
