//! Column-oriented table snapshot.
//!
//! A `Snapshot` is one source table's rows at a point in time, stored as an
//! ordered list of `(column name, values)` pairs. All value sequences have the
//! same length; every constructor enforces this, so a `Snapshot` that exists
//! is always rectangular.
//!
//! ## Wire format
//!
//! A JSON object whose keys are column names and whose values are arrays of
//! equal length. Columns are written in snapshot order and read back in
//! document order, so `from_json_bytes(to_json_bytes(s)) == s`.

use crate::errors::SnapshotError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Immutable column-oriented record of a table's rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    columns: Vec<(String, Vec<Value>)>,
}

impl Snapshot {
    /// Build a snapshot from named columns.
    ///
    /// ## Errors
    ///
    /// - `DuplicateColumn` if a name repeats
    /// - `RaggedColumn` if any column's length differs from the first column's
    pub fn new(columns: Vec<(String, Vec<Value>)>) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for (name, _) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(SnapshotError::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }

        if let Some((_, first)) = columns.first() {
            let expected = first.len();
            for (name, values) in &columns {
                if values.len() != expected {
                    return Err(SnapshotError::RaggedColumn {
                        column: name.clone(),
                        expected,
                        found: values.len(),
                    });
                }
            }
        }

        Ok(Self { columns })
    }

    /// The empty mapping: no columns, no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Zero-row snapshot that still names its columns
    pub fn with_columns<I, S>(names: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| (name.into(), Vec::new()))
                .collect(),
        )
    }

    /// Transpose row-major data into a snapshot.
    ///
    /// ## Errors
    ///
    /// - `RowWidth` if a row does not have one value per column
    /// - `DuplicateColumn` if a column name repeats
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, SnapshotError> {
        let width = names.len();
        let mut columns: Vec<Vec<Value>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(SnapshotError::RowWidth {
                    row: index,
                    expected: width,
                    found: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        Self::new(names.into_iter().zip(columns).collect())
    }

    /// Number of rows (0 for a snapshot without columns)
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Values of one column, if present
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Column names in snapshot order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Columns in snapshot order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Whether both snapshots have the same set of column names (order-insensitive)
    pub fn same_columns(&self, other: &Snapshot) -> bool {
        self.column_set() == other.column_set()
    }

    fn column_set(&self) -> BTreeSet<&str> {
        self.column_names().collect()
    }

    /// Concatenate `tail`'s rows after this snapshot's rows.
    ///
    /// Column order follows `self`; `tail` may list its columns in any order.
    ///
    /// ## Errors
    ///
    /// `ColumnSetMismatch` if the column sets differ. Nothing is merged in
    /// that case.
    pub fn append(&self, tail: &Snapshot) -> Result<Snapshot, SnapshotError> {
        if !self.same_columns(tail) {
            return Err(SnapshotError::ColumnSetMismatch {
                expected: self.column_set().into_iter().map(String::from).collect(),
                found: tail.column_set().into_iter().map(String::from).collect(),
            });
        }

        let columns = self
            .columns
            .iter()
            .map(|(name, head)| {
                let mut merged = head.clone();
                // same_columns guarantees presence
                merged.extend_from_slice(tail.column(name).unwrap_or_default());
                (name.clone(), merged)
            })
            .collect();

        Self::new(columns)
    }

    /// Serialize to the pretty-printed wire format (4-space indent).
    ///
    /// ## Errors
    ///
    /// `Encode` if serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)
            .map_err(|e| SnapshotError::Encode {
                message: e.to_string(),
            })?;
        Ok(buf)
    }

    /// Parse the wire format.
    ///
    /// ## Errors
    ///
    /// `Decode` if the bytes are not a JSON object of equal-length arrays
    /// with unique keys.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
        serde_json::from_slice(bytes).map_err(|e| SnapshotError::Decode {
            message: e.to_string(),
        })
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, values) in &self.columns {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

struct SnapshotVisitor;

impl<'de> Visitor<'de> for SnapshotVisitor {
    type Value = Snapshot;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object mapping column names to equal-length arrays")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Snapshot, A::Error> {
        let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, values)) = access.next_entry::<String, Vec<Value>>()? {
            columns.push((name, values));
        }
        Snapshot::new(columns).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Snapshot, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor)
    }
}
