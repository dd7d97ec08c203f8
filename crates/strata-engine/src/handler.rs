//! Invocation entry point for schedulers.
//!
//! Accepts a JSON payload and answers with a JSON-serializable
//! [`HandlerResponse`]; it never returns an error or panics, so a scheduler can
//! treat the `status` field as the only signal.
//!
//! Payload fields (all optional):
//! - `run_ts`: run timestamp override, defaults to the current UTC minute
//! - `trace_id`: scheduler correlation id, logged on the run's lifecycle events

use serde::Serialize;
use serde_json::Value;
use strata_core::errors::{ExError, ExErrorKind, Result};
use strata_core::logging_facility;
use strata_core::RunTimestamp;
use strata_core_types::{RunContext, TraceId};
use strata_store::{FsObjectStore, SnapshotStore, SqliteSource};

use crate::commands::run::{RunCoordinator, RunResult};
use crate::config::ExtractConfig;

pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

/// Structured reply to one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    /// `"ok"` or `"error"`
    pub status: String,
    pub message: String,
    /// Tables whose snapshot changed (empty on error)
    pub tables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl HandlerResponse {
    pub fn ok(run_ts: &RunTimestamp, tables: Vec<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            message: "Ingestion successful".to_string(),
            tables,
            run_ts: Some(run_ts.to_string()),
            error_code: None,
        }
    }

    pub fn error(err: &ExError, run_ts: Option<&RunTimestamp>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: format!("Failed to ingest data: {}", err),
            tables: Vec::new(),
            run_ts: run_ts.map(|ts| ts.to_string()),
            error_code: Some(err.code().to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Run one extraction configured from the environment
pub fn handle(payload: &Value) -> HandlerResponse {
    let config = match ExtractConfig::from_env() {
        Ok(config) => config,
        Err(e) => return HandlerResponse::error(&e, None),
    };

    match config.profile() {
        Ok(profile) => logging_facility::init(profile),
        Err(e) => return HandlerResponse::error(&e, None),
    }

    handle_with_config(&config, payload)
}

/// Run one extraction with an explicit configuration
pub fn handle_with_config(config: &ExtractConfig, payload: &Value) -> HandlerResponse {
    let run_ts = match run_ts_from_payload(payload) {
        Ok(run_ts) => run_ts,
        Err(e) => return HandlerResponse::error(&e, None),
    };
    let context = match trace_id_from_payload(payload) {
        Ok(Some(trace_id)) => RunContext::new().with_trace_id(trace_id),
        Ok(None) => RunContext::new(),
        Err(e) => return HandlerResponse::error(&e, Some(&run_ts)),
    };

    match run(config, &run_ts, context) {
        Ok(RunResult::Succeeded(report)) => {
            let tables = report
                .changed_tables()
                .into_iter()
                .map(str::to_string)
                .collect();
            HandlerResponse::ok(&run_ts, tables)
        }
        Ok(RunResult::Failed(failure)) => HandlerResponse::error(&failure.error, Some(&run_ts)),
        Err(e) => HandlerResponse::error(&e, Some(&run_ts)),
    }
}

fn run(config: &ExtractConfig, run_ts: &RunTimestamp, context: RunContext) -> Result<RunResult> {
    let objects = FsObjectStore::open(&config.bucket_root)?;
    let store = SnapshotStore::new(objects);
    let source = SqliteSource::open(&config.source_db, config.pivot_column.as_str())?;

    let coordinator =
        RunCoordinator::new(&source, &store, config.pivot_column.as_str()).with_context(context);
    Ok(coordinator.execute_run(run_ts))
}

fn run_ts_from_payload(payload: &Value) -> Result<RunTimestamp> {
    match payload.get("run_ts") {
        None | Some(Value::Null) => Ok(RunTimestamp::now()),
        Some(Value::String(value)) => RunTimestamp::parse(value),
        Some(other) => Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("handle")
            .with_message(format!("run_ts must be a string, got {}", other))),
    }
}

fn trace_id_from_payload(payload: &Value) -> Result<Option<TraceId>> {
    match payload.get("trace_id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if !value.trim().is_empty() => {
            Ok(Some(TraceId::from_string(value.trim().to_string())))
        }
        Some(other) => Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("handle")
            .with_message(format!("trace_id must be a non-empty string, got {}", other))),
    }
}
