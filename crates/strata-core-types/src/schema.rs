//! Canonical schema constants for structured logging and events
//!
//! Names of the fields emitted by the lifecycle macros and engine call sites.
//! `tracing` field keys are written as identifiers at the call site, so these
//! constants are what consumers (the test capture, log assertions) look up.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Extraction identifiers
pub const FIELD_TABLE: &str = "table";
pub const FIELD_RUN_TS: &str = "run_ts";
pub const FIELD_ACTION: &str = "action";
pub const FIELD_ROWS_AFTER: &str = "rows_after";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
