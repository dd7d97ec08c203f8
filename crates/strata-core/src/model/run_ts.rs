//! Run timestamps.
//!
//! A run timestamp names one extraction run. It is the directory component of
//! every snapshot key written by that run and the value held by the marker.

use crate::errors::{ExError, ExErrorKind, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// `YYYY-MM-DD HH:MM`, UTC
pub const RUN_TS_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Identifier of one run, ordered chronologically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunTimestamp(String);

impl RunTimestamp {
    /// Timestamp for a run starting now
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(RUN_TS_FORMAT).to_string())
    }

    /// Validate a timestamp read from the marker or supplied by a caller.
    ///
    /// Surrounding whitespace is ignored. Ordering is lexicographic, so only
    /// values in [`RUN_TS_FORMAT`] are accepted.
    ///
    /// ## Errors
    ///
    /// `InvalidInput` if the value is empty or not a `YYYY-MM-DD HH:MM` time.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("parse_run_ts")
                .with_message("run timestamp is empty"));
        }
        let parsed = NaiveDateTime::parse_from_str(trimmed, RUN_TS_FORMAT).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("parse_run_ts")
                .with_run_ts(trimmed)
                .with_message(format!("run timestamp must be YYYY-MM-DD HH:MM: {}", e))
        })?;
        // Re-format so unpadded input still sorts chronologically
        Ok(Self(parsed.format(RUN_TS_FORMAT).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RunTimestamp {
    type Error = ExError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RunTimestamp> for String {
    fn from(ts: RunTimestamp) -> Self {
        ts.0
    }
}
