//! Whole-run orchestration.
//!
//! ## Run lifecycle
//!
//! 1. Read the run marker (absent on the first ever run)
//! 2. Reject a run timestamp not strictly after the marker
//! 3. List extractable tables
//! 4. Reconcile tables one at a time; the first failure aborts the run
//! 5. Write the marker, only once every table succeeded
//!
//! A failed run leaves the marker on the previous run, so the next attempt
//! reconciles against the same baseline.

use serde::Serialize;
use std::time::Instant;
use strata_core::errors::{ExError, ExErrorKind, Result};
use strata_core::{log_op_end, log_op_error, log_op_start};
use strata_core::{ObjectStore, RunTimestamp, TableCatalog, TableSource};
use strata_core_types::{RunContext, TraceId};
use strata_store::SnapshotStore;

use super::reconcile::{ReconciliationEngine, TableOutcome};

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_ts: RunTimestamp,
    pub previous_run_ts: Option<RunTimestamp>,
    pub outcomes: Vec<TableOutcome>,
}

impl RunReport {
    /// Tables whose snapshot changed this run, in processing order
    pub fn changed_tables(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.changed())
            .map(|o| o.table.as_str())
            .collect()
    }

    pub fn is_first_run(&self) -> bool {
        self.previous_run_ts.is_none()
    }
}

/// A run that stopped at its first error
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub run_ts: RunTimestamp,
    /// Table being reconciled when the run stopped, if any
    pub table: Option<String>,
    pub error: ExError,
}

impl RunFailure {
    /// Human-readable cause, including every wrapped error
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

#[derive(Debug, Clone)]
pub enum RunResult {
    Succeeded(RunReport),
    Failed(RunFailure),
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Succeeded(_))
    }

    /// Convert into a `Result`, for callers that propagate with `?`
    ///
    /// # Errors
    ///
    /// Returns the failure's error if the run failed.
    pub fn into_result(self) -> Result<RunReport> {
        match self {
            RunResult::Succeeded(report) => Ok(report),
            RunResult::Failed(failure) => Err(failure.error),
        }
    }
}

/// Runs extraction across every table of a source
pub struct RunCoordinator<'a, S: TableSource + ?Sized, O: ObjectStore> {
    source: &'a S,
    store: &'a SnapshotStore<O>,
    pivot_column: String,
    context: RunContext,
}

impl<'a, S: TableSource + ?Sized, O: ObjectStore> RunCoordinator<'a, S, O> {
    pub fn new(
        source: &'a S,
        store: &'a SnapshotStore<O>,
        pivot_column: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            pivot_column: pivot_column.into(),
            context: RunContext::new(),
        }
    }

    /// Use a caller-supplied correlation context
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Execute one run named `run_ts`
    ///
    /// Never panics and never returns early with `Err`: every failure is
    /// reported as `RunResult::Failed`.
    pub fn execute_run(&self, run_ts: &RunTimestamp) -> RunResult {
        log_op_start!(
            "execute_run",
            run_id = self.context.run_id.as_str(),
            trace_id = self.trace_id(),
            run_ts = run_ts.as_str()
        );
        let start = Instant::now();

        match self.execute_run_impl(run_ts) {
            Ok(report) => {
                log_op_end!(
                    "execute_run",
                    duration_ms = start.elapsed().as_millis() as u64,
                    run_id = self.context.run_id.as_str(),
                    trace_id = self.trace_id(),
                    table_count = report.outcomes.len() as u64,
                    changed_count = report.changed_tables().len() as u64
                );
                RunResult::Succeeded(report)
            }
            Err(error) => {
                log_op_error!(
                    "execute_run",
                    error.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    run_id = self.context.run_id.as_str(),
                    trace_id = self.trace_id()
                );
                RunResult::Failed(RunFailure {
                    run_ts: run_ts.clone(),
                    table: error.table().map(str::to_string),
                    error,
                })
            }
        }
    }

    fn trace_id(&self) -> Option<&str> {
        self.context.trace_id.as_ref().map(TraceId::as_str)
    }

    fn execute_run_impl(&self, run_ts: &RunTimestamp) -> Result<RunReport> {
        let previous = self
            .store
            .get_marker()
            .map_err(|e| ExError::wrap(e).with_op("read_marker"))?;

        if let Some(previous) = &previous {
            if run_ts <= previous {
                return Err(ExError::new(ExErrorKind::InvalidInput)
                    .with_op("execute_run")
                    .with_run_ts(run_ts.as_str())
                    .with_message(format!(
                        "run timestamp must be after the last run ({})",
                        previous
                    )));
            }
        }

        let tables = TableCatalog::new(self.source).list_tables()?;
        tracing::info!(
            run_id = self.context.run_id.as_str(),
            table_count = tables.len() as u64,
            first_run = previous.is_none(),
            "Reconciling tables"
        );

        let engine = ReconciliationEngine::new(self.source, self.store, self.pivot_column.as_str());
        let mut outcomes = Vec::with_capacity(tables.len());
        for table in &tables {
            outcomes.push(engine.reconcile_table(table, run_ts, previous.as_ref())?);
        }

        self.store
            .set_marker(run_ts)
            .map_err(|e| ExError::wrap(e).with_op("write_marker"))?;

        Ok(RunReport {
            run_ts: run_ts.clone(),
            previous_run_ts: previous,
            outcomes,
        })
    }
}
