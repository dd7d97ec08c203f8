//! Extraction configuration.
//!
//! Loaded from `STRATA_`-prefixed environment variables, optionally seeded
//! from a `.env` file:
//!
//! | variable              | field          | default      |
//! |-----------------------|----------------|--------------|
//! | `STRATA_BUCKET_ROOT`  | `bucket_root`  | required     |
//! | `STRATA_SOURCE_DB`    | `source_db`    | required     |
//! | `STRATA_PIVOT_COLUMN` | `pivot_column` | `created_at` |
//! | `STRATA_LOG_PROFILE`  | `log_profile`  | `production` |

use config::{Config, ConfigError, Environment};
use std::collections::HashMap;
use std::path::PathBuf;
use strata_core::errors::{ExError, ExErrorKind, Result};
use strata_core::logging_facility::Profile;

pub const ENV_PREFIX: &str = "STRATA";
pub const DEFAULT_PIVOT_COLUMN: &str = "created_at";
pub const DEFAULT_LOG_PROFILE: &str = "production";

/// Everything a run needs to locate its collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Directory used as the object-store bucket
    pub bucket_root: PathBuf,
    /// SQLite database holding the source tables
    pub source_db: PathBuf,
    /// Column whose length counts ingested rows
    pub pivot_column: String,
    pub log_profile: String,
}

impl ExtractConfig {
    pub fn new(bucket_root: impl Into<PathBuf>, source_db: impl Into<PathBuf>) -> Self {
        Self {
            bucket_root: bucket_root.into(),
            source_db: source_db.into(),
            pivot_column: DEFAULT_PIVOT_COLUMN.to_string(),
            log_profile: DEFAULT_LOG_PROFILE.to_string(),
        }
    }

    pub fn with_pivot_column(mut self, pivot_column: impl Into<String>) -> Self {
        self.pivot_column = pivot_column.into();
        self
    }

    /// Load from the process environment, after applying `.env` if present
    ///
    /// # Errors
    ///
    /// `Configuration` if a required variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit variable map instead of the process environment
    ///
    /// # Errors
    ///
    /// `Configuration` if a required variable is missing or empty.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("pivot_column", DEFAULT_PIVOT_COLUMN)
            .and_then(|b| b.set_default("log_profile", DEFAULT_LOG_PROFILE))
            .map_err(config_error)?
            .add_source(env)
            .build()
            .map_err(config_error)?;

        let config = Self {
            bucket_root: required(&settings, "bucket_root")?.into(),
            source_db: required(&settings, "source_db")?.into(),
            pivot_column: required(&settings, "pivot_column")?,
            log_profile: required(&settings, "log_profile")?,
        };
        tracing::debug!(
            bucket_root = %config.bucket_root.display(),
            source_db = %config.source_db.display(),
            pivot_column = %config.pivot_column,
            "Loaded extract configuration"
        );
        Ok(config)
    }

    /// Parsed logging profile
    ///
    /// # Errors
    ///
    /// `Configuration` if `log_profile` names no known profile.
    pub fn profile(&self) -> Result<Profile> {
        self.log_profile.parse().map_err(|e: String| {
            ExError::new(ExErrorKind::Configuration)
                .with_op("load_config")
                .with_message(e)
        })
    }
}

fn env_name(field: &str) -> String {
    format!("{}_{}", ENV_PREFIX, field.to_ascii_uppercase())
}

fn required(settings: &Config, field: &str) -> Result<String> {
    match settings.get_string(field) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Ok(_) | Err(ConfigError::NotFound(_)) => Err(ExError::new(ExErrorKind::Configuration)
            .with_op("load_config")
            .with_message(format!(
                "Failed to get env {} ({} is not set)",
                field.replace('_', " "),
                env_name(field)
            ))),
        Err(e) => Err(config_error(e)),
    }
}

fn config_error(err: ConfigError) -> ExError {
    ExError::new(ExErrorKind::Configuration)
        .with_op("load_config")
        .with_message(err.to_string())
}
