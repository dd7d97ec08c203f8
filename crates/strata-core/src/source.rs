//! Source table interface and catalog filtering.
//!
//! The operational database is reached only through [`TableSource`]. Bindings
//! live in `strata-store`; the engine is generic over the trait.
//!
//! ## Ordering precondition
//!
//! `read_all` followed later by `read_from_offset` must see rows in the same
//! stable order, otherwise the offset slice does not line up with what was
//! already ingested. Implementations must sort explicitly (e.g. by the pivot
//! column) rather than rely on physical storage order.

use crate::errors::Result;
use crate::model::Snapshot;

/// Names starting with this character are internal and never extracted
pub const INTERNAL_PREFIX: char = '_';

/// Read access to the operational database
pub trait TableSource {
    /// All base table names, unfiltered
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::SourceRead` if the catalog query fails.
    fn list_table_names(&self) -> Result<Vec<String>>;

    /// Every row of `table`, column-oriented
    ///
    /// An empty table yields zero-length columns, one per column name.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::SourceRead` if the table cannot be read.
    fn read_all(&self, table: &str) -> Result<Snapshot>;

    /// Rows of `table` from position `offset` onwards, in the same order as
    /// `read_all`
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::SourceRead` if the table cannot be read.
    fn read_from_offset(&self, table: &str, offset: usize) -> Result<Snapshot>;

    /// Current number of rows in `table`
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::SourceRead` if the count query fails.
    fn count(&self, table: &str) -> Result<usize>;
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn list_table_names(&self) -> Result<Vec<String>> {
        (**self).list_table_names()
    }

    fn read_all(&self, table: &str) -> Result<Snapshot> {
        (**self).read_all(table)
    }

    fn read_from_offset(&self, table: &str, offset: usize) -> Result<Snapshot> {
        (**self).read_from_offset(table, offset)
    }

    fn count(&self, table: &str) -> Result<usize> {
        (**self).count(table)
    }
}

/// Whether a table name is eligible for extraction
pub fn is_extractable(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(INTERNAL_PREFIX)
}

/// Lists extractable tables of a source
pub struct TableCatalog<'a, S: TableSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: TableSource + ?Sized> TableCatalog<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Extractable table names, sorted so runs visit tables deterministically
    ///
    /// # Errors
    ///
    /// Propagates the source's `SourceRead` error.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut tables: Vec<String> = self
            .source
            .list_table_names()?
            .into_iter()
            .filter(|name| is_extractable(name))
            .collect();
        tables.sort();
        tables.dedup();
        tracing::debug!(table_count = tables.len(), "Listed extractable tables");
        Ok(tables)
    }
}
