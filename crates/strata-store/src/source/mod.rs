//! Source database bindings

pub mod sqlite;

pub use sqlite::SqliteSource;
