//! Object store interface.
//!
//! Snapshots and the run marker are persisted as opaque byte objects under
//! `/`-separated keys. Bindings live in `strata-store`.

use crate::errors::Result;
use std::sync::Arc;

/// Flat key/value object storage (bucket semantics)
pub trait ObjectStore {
    /// Fetch the bytes stored under `key`, `None` if absent
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::StoreIo` on backend failure.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any existing object
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::StoreIo` on backend failure.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Copy the object at `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::NotFound` if `from` does not exist.
    fn copy(&self, from: &str, to: &str) -> Result<()>;

    /// Remove the object at `key`; removing an absent key succeeds
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::StoreIo` on backend failure.
    fn delete(&self, key: &str) -> Result<()>;

    /// Full keys starting with `prefix`, sorted
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::StoreIo` on backend failure.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).put(key, bytes)
    }

    fn copy(&self, from: &str, to: &str) -> Result<()> {
        (**self).copy(from, to)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).list(prefix)
    }
}

impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).put(key, bytes)
    }

    fn copy(&self, from: &str, to: &str) -> Result<()> {
        (**self).copy(from, to)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).list(prefix)
    }
}
