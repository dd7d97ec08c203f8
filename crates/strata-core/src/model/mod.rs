//! Extraction data model: snapshots and run timestamps.

pub mod run_ts;
pub mod snapshot;

pub use run_ts::{RunTimestamp, RUN_TS_FORMAT};
pub use snapshot::Snapshot;
