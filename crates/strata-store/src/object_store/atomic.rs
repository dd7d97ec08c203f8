//! Temp-then-rename writes, so readers never observe a partial object

use crate::errors::{store_io, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of in-flight writes; listings skip these
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Write `content` to `target`, creating parent directories
pub(crate) fn atomic_write(target: &Path, key: &str, content: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| store_io("create_object_dir", key, e))?;
    }

    let temp = temp_path(target);
    fs::write(&temp, content).map_err(|e| store_io("write_object_temp", key, e))?;

    if let Err(e) = fs::rename(&temp, target) {
        let _ = fs::remove_file(&temp);
        return Err(store_io("rename_object_temp", key, e));
    }

    Ok(())
}

// Appends to the full file name; `with_extension` would map "a.json" and
// "a.csv" onto the same temp file.
fn temp_path(target: &Path) -> PathBuf {
    let mut name: OsString = target.file_name().map(OsString::from).unwrap_or_default();
    name.push(TEMP_SUFFIX);
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("latest").join("2024-08-19 09:30").join("orders.json");

        atomic_write(&target, "k", b"{}").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"{}");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("latest_date");

        atomic_write(&target, "latest_date", b"2024-08-19 09:30").unwrap();
        atomic_write(&target, "latest_date", b"2024-08-20 09:30").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"2024-08-20 09:30");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        atomic_write(&dir.path().join("orders.json"), "k", b"[]").unwrap();

        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_temp_path_keeps_extension() {
        let temp = temp_path(Path::new("/bucket/orders.json"));
        assert_eq!(temp, Path::new("/bucket/orders.json.tmp"));
    }
}
