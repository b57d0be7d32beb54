use caretrack_core::db::migrations::latest_version;
use caretrack_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["clients", "schedules", "visits", "tasks"] {
        assert_object_exists(&conn, "table", table);
    }
    assert_object_exists(&conn, "index", "idx_schedules_caregiver_start");
}

#[test]
fn reopening_file_database_keeps_schema_and_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("caretrack.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let journal_mode: String = second
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_ascii_lowercase(), "wal");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_inverted_schedule_window_and_dangling_client() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO clients (name, address, city, state, zip_code) VALUES ('A', 'B', 'C', 'D', 'E');",
        [],
    )
    .unwrap();
    let client_id = conn.last_insert_rowid();

    let inverted = conn.execute(
        "INSERT INTO schedules (client_id, caregiver_id, start_time, end_time) VALUES (?1, 1, 2000, 1000);",
        [client_id],
    );
    assert!(inverted.is_err());

    let dangling = conn.execute(
        "INSERT INTO schedules (client_id, caregiver_id, start_time, end_time) VALUES (9999, 1, 1000, 2000);",
        [],
    );
    assert!(dangling.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
