//! Strata Store - object-store and source bindings
//!
//! Provides:
//! - The `ObjectStore` interface with filesystem and in-memory bindings
//! - The bucket key layout (live snapshots, archive, run marker)
//! - `SnapshotStore`, the typed snapshot/marker wrapper the engine writes through
//! - `SqliteSource`, a `TableSource` binding over a SQLite database

pub mod errors;
pub mod keys;
pub mod object_store;
pub mod snapshot_store;
pub mod source;

// Re-export key types
pub use errors::Result;
pub use keys::{Namespace, SnapshotKey};
pub use object_store::{FsObjectStore, MemoryObjectStore, ObjectStore};
pub use snapshot_store::{ArchiveOutcome, SnapshotStore};
pub use source::SqliteSource;
