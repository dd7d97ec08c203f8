//! SqliteSource against real database files

use rusqlite::Connection;
use serde_json::{json, Value};
use strata_core::{ExErrorKind, TableCatalog, TableSource};
use strata_store::SqliteSource;
use tempfile::TempDir;

fn setup(statements: &str) -> (TempDir, SqliteSource) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("source.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(statements).unwrap();
    drop(conn);

    let source = SqliteSource::open(&path, "created_at").unwrap();
    (dir, source)
}

fn ids(values: &[Value]) -> Vec<i64> {
    values.iter().map(|v| v.as_i64().unwrap()).collect()
}

#[test]
fn test_catalog_skips_internal_tables() {
    let (_dir, source) = setup(
        "CREATE TABLE orders (id INTEGER PRIMARY KEY AUTOINCREMENT, created_at TEXT);
         CREATE TABLE _migrations (version INTEGER);
         CREATE TABLE address (id INTEGER);",
    );

    // AUTOINCREMENT creates sqlite_sequence, which the binding hides
    let raw = source.list_table_names().unwrap();
    assert_eq!(raw, vec!["_migrations", "address", "orders"]);

    let tables = TableCatalog::new(&source).list_tables().unwrap();
    assert_eq!(tables, vec!["address", "orders"]);
}

#[test]
fn test_read_all_orders_by_pivot() {
    let (_dir, source) = setup(
        "CREATE TABLE orders (id INTEGER, created_at TEXT);
         INSERT INTO orders VALUES (2, '2024-01-02');
         INSERT INTO orders VALUES (1, '2024-01-01');
         INSERT INTO orders VALUES (3, '2024-01-03');",
    );

    let snapshot = source.read_all("orders").unwrap();

    assert_eq!(snapshot.column_names().collect::<Vec<_>>(), vec!["id", "created_at"]);
    assert_eq!(ids(snapshot.column("id").unwrap()), vec![1, 2, 3]);
}

#[test]
fn test_read_without_pivot_uses_rowid() {
    let (_dir, source) = setup(
        "CREATE TABLE tags (name TEXT);
         INSERT INTO tags VALUES ('b');
         INSERT INTO tags VALUES ('a');",
    );

    let snapshot = source.read_all("tags").unwrap();
    assert_eq!(snapshot.column("name").unwrap(), &[json!("b"), json!("a")]);
}

#[test]
fn test_offset_slice_lines_up_with_full_read() {
    let (_dir, source) = setup(
        "CREATE TABLE orders (id INTEGER, created_at TEXT);
         INSERT INTO orders VALUES (1, 'a'), (2, 'b'), (3, 'c'), (4, 'd'), (5, 'e');",
    );

    let slice = source.read_from_offset("orders", 3).unwrap();
    assert_eq!(ids(slice.column("id").unwrap()), vec![4, 5]);
    assert_eq!(
        slice.column("created_at").unwrap(),
        &[json!("d"), json!("e")]
    );

    let past_end = source.read_from_offset("orders", 10).unwrap();
    assert_eq!(past_end.row_count(), 0);
    assert_eq!(past_end.column_count(), 2);
}

#[test]
fn test_empty_table_keeps_columns() {
    let (_dir, source) = setup("CREATE TABLE staff (id INTEGER, name TEXT, created_at TEXT);");

    let snapshot = source.read_all("staff").unwrap();

    assert_eq!(snapshot.row_count(), 0);
    assert_eq!(
        snapshot.column_names().collect::<Vec<_>>(),
        vec!["id", "name", "created_at"]
    );
    assert_eq!(source.count("staff").unwrap(), 0);
}

#[test]
fn test_value_types() {
    let (_dir, source) = setup(
        "CREATE TABLE mixed (i INTEGER, r REAL, t TEXT, b BLOB, n TEXT);
         INSERT INTO mixed VALUES (42, 2.5, 'hi', X'CAFE', NULL);",
    );

    let snapshot = source.read_all("mixed").unwrap();

    assert_eq!(snapshot.column("i").unwrap(), &[json!(42)]);
    assert_eq!(snapshot.column("r").unwrap(), &[json!(2.5)]);
    assert_eq!(snapshot.column("t").unwrap(), &[json!("hi")]);
    assert_eq!(snapshot.column("b").unwrap(), &[json!("cafe")]);
    assert_eq!(snapshot.column("n").unwrap(), &[Value::Null]);
}

#[test]
fn test_count() {
    let (_dir, source) = setup(
        "CREATE TABLE orders (id INTEGER, created_at TEXT);
         INSERT INTO orders VALUES (1, 'a'), (2, 'b');",
    );
    assert_eq!(source.count("orders").unwrap(), 2);
}

#[test]
fn test_missing_table_is_source_read_error() {
    let (_dir, source) = setup("CREATE TABLE orders (id INTEGER);");

    let err = source.count("nope").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::SourceRead);
    assert_eq!(err.table(), Some("nope"));

    let err = source.read_all("nope").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::SourceRead);
}

#[test]
fn test_invalid_utf8_text_fails_read() {
    let (_dir, source) = setup(
        "CREATE TABLE notes (id INTEGER, body TEXT);
         INSERT INTO notes VALUES (1, 'fine');
         INSERT INTO notes VALUES (2, CAST(X'61FF62' AS TEXT));",
    );

    let err = source.read_all("notes").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::SourceRead);
    assert_eq!(err.table(), Some("notes"));

    // A slice that starts at the bad row fails the same way
    let err = source.read_from_offset("notes", 1).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::SourceRead);
}

#[test]
fn test_open_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let result = SqliteSource::open(dir.path().join("absent.db"), "created_at");

    let err = result.err().unwrap();
    assert_eq!(err.kind(), ExErrorKind::SourceRead);
}

#[test]
fn test_quoted_table_name() {
    let (_dir, source) = setup(
        "CREATE TABLE \"order items\" (id INTEGER, created_at TEXT);
         INSERT INTO \"order items\" VALUES (1, 'a');",
    );

    assert_eq!(source.count("order items").unwrap(), 1);
    assert_eq!(source.read_all("order items").unwrap().row_count(), 1);
}
