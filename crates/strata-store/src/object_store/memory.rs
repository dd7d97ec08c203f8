//! In-memory object store

use super::{validate_key, ObjectStore};
use crate::errors::{lock_poisoned, object_missing, Result};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Object store held in a process-local map
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Internal` if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        let objects = self.objects.read().map_err(|_| lock_poisoned("len"))?;
        Ok(objects.len())
    }

    /// # Errors
    ///
    /// Returns `ExErrorKind::Internal` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let objects = self.objects.read().map_err(|_| lock_poisoned("get"))?;
        Ok(objects.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut objects = self.objects.write().map_err(|_| lock_poisoned("put"))?;
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn copy(&self, from: &str, to: &str) -> Result<()> {
        validate_key(from)?;
        validate_key(to)?;
        let mut objects = self.objects.write().map_err(|_| lock_poisoned("copy"))?;
        let bytes = objects
            .get(from)
            .cloned()
            .ok_or_else(|| object_missing("copy", from))?;
        objects.insert(to.to_string(), bytes);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let mut objects = self.objects.write().map_err(|_| lock_poisoned("delete"))?;
        objects.remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().map_err(|_| lock_poisoned("list"))?;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
