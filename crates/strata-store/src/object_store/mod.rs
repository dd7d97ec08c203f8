//! Object store bindings
//!
//! - `FsObjectStore`: a local directory treated as a bucket
//! - `MemoryObjectStore`: in-process map, for tests and dry runs

mod atomic;
pub mod fs;
pub mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use strata_core::ObjectStore;

use crate::errors::{invalid_key, Result};

/// Reject keys that cannot map onto a bucket path
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(invalid_key(key, "key must not be empty"));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(invalid_key(key, "key must not start or end with '/'"));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid_key(key, "key contains an empty or relative segment"));
    }
    Ok(())
}
