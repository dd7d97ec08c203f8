//! Bucket key layout
//!
//! | object        | key                              |
//! |---------------|----------------------------------|
//! | live snapshot | `latest/{run_ts}/{table}.json`   |
//! | archive entry | `archive/{run_ts}/{table}.json`  |
//! | run marker    | `latest_date`                    |

use crate::errors::{invalid_key, Result};
use std::fmt;
use strata_core::RunTimestamp;

pub const LIVE_PREFIX: &str = "latest/";
pub const ARCHIVE_PREFIX: &str = "archive/";
pub const MARKER_KEY: &str = "latest_date";
pub const SNAPSHOT_EXT: &str = ".json";

/// Which half of the bucket a snapshot key lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Live,
    Archive,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Live => LIVE_PREFIX,
            Namespace::Archive => ARCHIVE_PREFIX,
        }
    }
}

/// Location of one table's snapshot for one run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    namespace: Namespace,
    run_ts: RunTimestamp,
    table: String,
}

impl SnapshotKey {
    /// # Errors
    ///
    /// Returns `ExErrorKind::InvalidInput` if `table` is empty or contains `/`.
    pub fn new(namespace: Namespace, table: &str, run_ts: &RunTimestamp) -> Result<Self> {
        if table.is_empty() || table.contains('/') {
            return Err(invalid_key(table, "table name must be non-empty and contain no '/'")
                .with_table(table));
        }
        Ok(Self {
            namespace,
            run_ts: run_ts.clone(),
            table: table.to_string(),
        })
    }

    /// # Errors
    ///
    /// See [`SnapshotKey::new`].
    pub fn live(table: &str, run_ts: &RunTimestamp) -> Result<Self> {
        Self::new(Namespace::Live, table, run_ts)
    }

    /// # Errors
    ///
    /// See [`SnapshotKey::new`].
    pub fn archive(table: &str, run_ts: &RunTimestamp) -> Result<Self> {
        Self::new(Namespace::Archive, table, run_ts)
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn run_ts(&self) -> &RunTimestamp {
        &self.run_ts
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Same table and run, other namespace
    pub fn in_namespace(&self, namespace: Namespace) -> Self {
        Self {
            namespace,
            ..self.clone()
        }
    }

    pub fn object_key(&self) -> String {
        format!(
            "{}{}/{}{}",
            self.namespace.prefix(),
            self.run_ts,
            self.table,
            SNAPSHOT_EXT
        )
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_key())
    }
}

/// Prefix of every snapshot of one run in one namespace
pub fn run_prefix(namespace: Namespace, run_ts: &RunTimestamp) -> String {
    format!("{}{}/", namespace.prefix(), run_ts)
}

/// Table name encoded in a key suffix such as `orders.json`
pub fn table_from_suffix(suffix: &str) -> Option<&str> {
    suffix
        .strip_suffix(SNAPSHOT_EXT)
        .filter(|t| !t.is_empty() && !t.contains('/'))
}
