//! Strata Core - snapshot model, error and logging facilities
//!
//! This crate provides the foundations shared by the store bindings and the
//! reconciliation engine:
//! - `Snapshot`, the validated column-oriented table record, and its JSON codec
//! - `RunTimestamp`, the run identifier used in keys and in the marker
//! - The `TableSource` and `ObjectStore` collaborator interfaces, catalog filtering
//! - The structured error facility (`ExError`, `ExErrorKind`)
//! - The structured logging facility (`log_op_*` macros, test capture)

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod object_store;
pub mod source;

// Used by the exported logging macros
#[doc(hidden)]
pub use strata_core_types as core_types;
#[doc(hidden)]
pub use tracing;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, SnapshotError};
pub use model::{RunTimestamp, Snapshot};
pub use object_store::ObjectStore;
pub use source::{TableCatalog, TableSource};
