//! Structured logging facility for Strata
//!
//! This module provides the canonical logging facility with:
//! - Single initialization point via `init(profile)`
//! - Structured lifecycle macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use strata_core::logging_facility::{init, Profile};
//!
//! // Initialize once at process startup
//! init(Profile::Development);
//! ```
//!
//! # Ownership
//!
//! The engine owns lifecycle events (`reconcile_table`, `execute_run`).
//! Store and source bindings only emit `tracing::debug!` detail.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
