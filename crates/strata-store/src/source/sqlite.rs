//! SQLite binding of `TableSource`
//!
//! Rows are ordered by the pivot column (ties broken by `rowid`) when the
//! table has it, by `rowid` otherwise, so a full read and a later offset read
//! line up. `WITHOUT ROWID` tables are not supported.

use crate::errors::{source_read, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Params};
use serde_json::{Number, Value};
use std::path::Path;
use strata_core::errors::ExError;
use strata_core::{Snapshot, TableSource};

/// Read-only view of a SQLite database as extractable tables
pub struct SqliteSource {
    conn: Connection,
    pivot_column: String,
}

impl SqliteSource {
    /// Open an existing database file read-only
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::SourceRead` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, pivot_column: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| source_read("open_source", &path.display().to_string(), e))?;

        tracing::debug!(path = %path.display(), "Opened source database");
        Ok(Self::from_connection(conn, pivot_column))
    }

    pub fn from_connection(conn: Connection, pivot_column: impl Into<String>) -> Self {
        Self {
            conn,
            pivot_column: pivot_column.into(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn pivot_column(&self) -> &str {
        &self.pivot_column
    }

    fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table));
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| source_read("table_info", table, e))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| source_read("table_info", table, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| source_read("table_info", table, e))?;
        Ok(names)
    }

    fn select_sql(&self, table: &str) -> Result<String> {
        let columns = self.column_names(table)?;
        let order = if columns.iter().any(|c| c == &self.pivot_column) {
            format!("{}, rowid", quote_ident(&self.pivot_column))
        } else {
            "rowid".to_string()
        };
        Ok(format!("SELECT * FROM {} ORDER BY {}", quote_ident(table), order))
    }

    fn query_snapshot<P: Params>(
        &self,
        op: &str,
        table: &str,
        sql: &str,
        params: P,
    ) -> Result<Snapshot> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| source_read(op, table, e))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = names.len();

        let rows = stmt
            .query_map(params, |row| {
                (0..width)
                    .map(|i| row.get_ref(i).and_then(to_json))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })
            .map_err(|e| source_read(op, table, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| source_read(op, table, e))?;

        Snapshot::from_rows(names, rows)
            .map_err(|e| ExError::from(e).with_op(op.to_string()).with_table(table))
    }
}

impl TableSource for SqliteSource {
    fn list_table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
                 ORDER BY name",
            )
            .map_err(|e| source_read("list_table_names", "sqlite_master", e))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| source_read("list_table_names", "sqlite_master", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| source_read("list_table_names", "sqlite_master", e))?;
        Ok(names)
    }

    fn read_all(&self, table: &str) -> Result<Snapshot> {
        let sql = self.select_sql(table)?;
        let snapshot = self.query_snapshot("read_all", table, &sql, params![])?;
        tracing::debug!(table, rows = snapshot.row_count(), "Read full table");
        Ok(snapshot)
    }

    fn read_from_offset(&self, table: &str, offset: usize) -> Result<Snapshot> {
        let sql = format!("{} LIMIT -1 OFFSET ?1", self.select_sql(table)?);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let snapshot = self.query_snapshot("read_from_offset", table, &sql, params![offset])?;
        tracing::debug!(table, offset, rows = snapshot.row_count(), "Read table slice");
        Ok(snapshot)
    }

    fn count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| source_read("count", table, e))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite value to its JSON form. BLOBs become hex strings, non-finite reals
/// their string form. TEXT that is not valid UTF-8 is an error.
fn to_json(value: ValueRef<'_>) -> rusqlite::Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        ValueRef::Text(bytes) => Value::String(
            std::str::from_utf8(bytes)
                .map_err(rusqlite::Error::Utf8Error)?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    })
}
