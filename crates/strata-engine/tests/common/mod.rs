//! Shared fixtures for engine tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use strata_core::errors::{ExError, ExErrorKind, Result};
use strata_core::{ObjectStore, RunTimestamp, Snapshot, TableSource};
use strata_store::MemoryObjectStore;

pub const T0: &str = "2024-08-19 09:30";
pub const T1: &str = "2024-08-20 09:30";
pub const T2: &str = "2024-08-21 09:30";

pub fn ts(value: &str) -> RunTimestamp {
    RunTimestamp::parse(value).unwrap()
}

/// `n` rows of `{id, created_at}` with ids 1..=n
pub fn orders(n: i64) -> Snapshot {
    Snapshot::new(vec![
        ("id".to_string(), (1..=n).map(|i| json!(i)).collect()),
        ("created_at".to_string(), (1..=n).map(created_at).collect()),
    ])
    .unwrap()
}

pub fn created_at(i: i64) -> Value {
    json!(format!("2024-01-{:02} 00:00:00", i))
}

/// In-memory source with call counters and failure injection
#[derive(Default)]
pub struct FakeSource {
    tables: RefCell<BTreeMap<String, Snapshot>>,
    fail_on: RefCell<Option<String>>,
    pub full_reads: Cell<usize>,
    pub slice_reads: Cell<usize>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, snapshot: Snapshot) -> Self {
        self.set_table(name, snapshot);
        self
    }

    pub fn set_table(&self, name: &str, snapshot: Snapshot) {
        self.tables.borrow_mut().insert(name.to_string(), snapshot);
    }

    /// Every read of `table` fails with `SourceRead`
    pub fn fail_on(&self, table: &str) {
        *self.fail_on.borrow_mut() = Some(table.to_string());
    }

    pub fn heal(&self) {
        *self.fail_on.borrow_mut() = None;
    }

    fn table(&self, table: &str) -> Result<Snapshot> {
        if self.fail_on.borrow().as_deref() == Some(table) {
            return Err(ExError::new(ExErrorKind::SourceRead)
                .with_op("fake_read")
                .with_message("Failed to get table values, connection reset"));
        }
        self.tables.borrow().get(table).cloned().ok_or_else(|| {
            ExError::new(ExErrorKind::SourceRead).with_message(format!("no such table: {}", table))
        })
    }
}

impl TableSource for FakeSource {
    fn list_table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.borrow().keys().cloned().collect())
    }

    fn read_all(&self, table: &str) -> Result<Snapshot> {
        self.full_reads.set(self.full_reads.get() + 1);
        self.table(table)
    }

    fn read_from_offset(&self, table: &str, offset: usize) -> Result<Snapshot> {
        self.slice_reads.set(self.slice_reads.get() + 1);
        let full = self.table(table)?;
        let columns = full
            .columns()
            .map(|(name, values)| {
                let tail = values.get(offset..).unwrap_or_default().to_vec();
                (name.to_string(), tail)
            })
            .collect();
        Ok(Snapshot::new(columns).unwrap())
    }

    fn count(&self, table: &str) -> Result<usize> {
        Ok(self.table(table)?.row_count())
    }
}

/// Memory store whose writes fail for keys containing a marker string
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryObjectStore,
    fail_puts_containing: RefCell<Option<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts_containing(&self, needle: &str) {
        *self.fail_puts_containing.borrow_mut() = Some(needle.to_string());
    }

    pub fn heal(&self) {
        *self.fail_puts_containing.borrow_mut() = None;
    }

    fn check(&self, op: &str, key: &str) -> Result<()> {
        match self.fail_puts_containing.borrow().as_deref() {
            Some(needle) if key.contains(needle) => Err(ExError::new(ExErrorKind::StoreIo)
                .with_op(op.to_string())
                .with_key(key)
                .with_message("injected write failure")),
            _ => Ok(()),
        }
    }
}

impl ObjectStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.check("put", key)?;
        self.inner.put(key, bytes)
    }

    fn copy(&self, from: &str, to: &str) -> Result<()> {
        self.check("copy", to)?;
        self.inner.copy(from, to)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }
}
