//! Extraction commands
//!
//! - `reconcile`: per-table CREATE / APPEND / CARRY-FORWARD
//! - `run`: one full extraction run across every table

pub mod reconcile;
pub mod run;
