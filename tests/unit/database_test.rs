//! Unit tests for the database layer.

use returnnav::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use returnnav::database::Database;
use returnnav::services::session_storage::{SessionStorage, SqliteSessionStorage};
use std::sync::Arc;

fn table_exists(db: &Database, name: &str) -> bool {
    db.connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
        == 1
}

#[test]
fn test_tables_created() {
    let db = Database::open_in_memory().unwrap();
    assert!(table_exists(&db, "schema_version"));
    assert!(table_exists(&db, "browser_sessions"));
    assert!(table_exists(&db, "session_storage"));
}

#[test]
fn test_schema_version_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_idempotent() {
    let db = Database::open_in_memory().unwrap();
    run_all(db.connection()).unwrap();
    run_all(db.connection()).unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_reopen_on_disk_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("returnnav.db");
    {
        let db = Arc::new(Database::open(&path).unwrap());
        let storage = SqliteSessionStorage::open(db, "tab-1").unwrap();
        storage.set_item("k", "v").unwrap();
    }

    let db = Arc::new(Database::open(&path).unwrap());
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
    let storage = SqliteSessionStorage::open(db, "tab-1").unwrap();
    assert_eq!(storage.get_item("k").unwrap(), Some("v".to_string()));
}

#[test]
fn test_active_sessions() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    assert!(db.active_sessions().unwrap().is_empty());

    let a = SqliteSessionStorage::open(db.clone(), "a").unwrap();
    let _b = SqliteSessionStorage::open(db.clone(), "b").unwrap();
    let mut sessions = db.active_sessions().unwrap();
    sessions.sort();
    assert_eq!(sessions, vec!["a".to_string(), "b".to_string()]);

    a.end_session().unwrap();
    assert_eq!(db.active_sessions().unwrap(), vec!["b".to_string()]);
}
