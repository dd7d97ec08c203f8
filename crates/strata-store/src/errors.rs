//! Error handling for strata-store
//!
//! Wraps strata-core ExError with store-specific helpers

use strata_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an object-store I/O error
pub fn store_io(op: &str, key: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::StoreIo)
        .with_op(op.to_string())
        .with_key(key)
        .with_message(err.to_string())
}

/// Create a missing-object error (copy source absent)
pub fn object_missing(op: &str, key: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op.to_string())
        .with_key(key)
        .with_message("object does not exist")
}

/// Create an invalid-key error
pub fn invalid_key(key: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("validate_key")
        .with_key(key)
        .with_message(reason.to_string())
}

/// Create an archive collision error
pub fn archive_collision(key: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("archive")
        .with_key(key)
        .with_message("archive entry exists with different content")
}

/// Create a source read error from rusqlite::Error
pub fn source_read(op: &str, table: &str, err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::SourceRead)
        .with_op(op.to_string())
        .with_table(table)
        .with_message(err.to_string())
}

/// Create an error for a poisoned in-memory lock
pub fn lock_poisoned(op: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_message("lock poisoned")
}
