use catalog_core::db::migrations::latest_version;
use catalog_core::db::{close_db, open_db, open_db_from_url, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "products");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO products (name, price) VALUES ('kept', '1.5');",
            [],
        )
        .unwrap();
    close_db(conn_first).unwrap();

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM products;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
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
fn open_from_url_resolves_sqlite_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("url.db");
    let url = format!("sqlite://{}", path.display());

    let conn = open_db_from_url(&url).unwrap();
    assert_table_exists(&conn, "products");
    assert!(path.exists());
}

#[test]
fn open_from_url_rejects_other_databases() {
    let err = open_db_from_url("mysql://root@localhost/catalog").unwrap_err();
    assert!(matches!(err, DbError::UnsupportedUrl(_)));
}

#[test]
fn available_defaults_to_true_at_schema_level() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO products (name, price) VALUES ('raw', '3');",
        [],
    )
    .unwrap();
    let available: i64 = conn
        .query_row("SELECT available FROM products;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(available, 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
