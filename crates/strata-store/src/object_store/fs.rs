//! Filesystem-backed object store
//!
//! Each key maps onto a file below the root directory, with `/` separated
//! key segments becoming directories:
//!
//! ```text
//! root/
//!   latest_date
//!   latest/2024-08-19 09:30/orders.json
//!   archive/2024-08-18 09:30/orders.json
//! ```

use super::atomic::{atomic_write, TEMP_SUFFIX};
use super::{validate_key, ObjectStore};
use crate::errors::{object_missing, store_io, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a store rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::StoreIo` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| store_io("open_store", &root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }

    fn walk(&self, dir: &Path, rel: &str, out: &mut Vec<String>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(store_io("list", rel, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| store_io("list", rel, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let key = if rel.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", rel, name)
            };

            let file_type = entry.file_type().map_err(|e| store_io("list", &key, e))?;
            if file_type.is_dir() {
                self.walk(&entry.path(), &key, out)?;
            } else if !name.ends_with(TEMP_SUFFIX) {
                out.push(key);
            }
        }
        Ok(())
    }

    // Empty directories are an artifact of the layout, not objects; remove
    // them so the tree mirrors what a bucket listing would show.
    fn prune_empty_parents(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.root || fs::remove_dir(dir).is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_io("get", key, e)),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        atomic_write(&path, key, bytes)?;
        tracing::debug!(key, bytes = bytes.len(), "Stored object");
        Ok(())
    }

    fn copy(&self, from: &str, to: &str) -> Result<()> {
        let bytes = self.get(from)?.ok_or_else(|| object_missing("copy", from))?;
        let target = self.path_for(to)?;
        atomic_write(&target, to, &bytes)?;
        tracing::debug!(from, to, "Copied object");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                self.prune_empty_parents(&path);
                tracing::debug!(key, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_io("delete", key, e)),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.walk(&self.root, "", &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}
