//! Strata Engine - snapshot reconciliation and run orchestration
//!
//! The engine layer owns lifecycle logging (`log_op_start!` / `log_op_end!` /
//! `log_op_error!`) for table reconciliation and whole runs. Lower layers
//! only emit `tracing::debug!` detail.

pub mod commands;
pub mod config;
pub mod handler;

pub use commands::reconcile::{ReconcileAction, ReconciliationEngine, TableOutcome};
pub use commands::run::{RunCoordinator, RunFailure, RunReport, RunResult};
pub use config::ExtractConfig;
pub use handler::{handle, HandlerResponse};
