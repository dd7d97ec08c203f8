//! Extract commands

use clap::{Args, Subcommand};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use strata_core::logging_facility;
use strata_engine::config::ENV_PREFIX;
use strata_engine::handler::handle_with_config;
use strata_engine::ExtractConfig;
use strata_store::{FsObjectStore, SnapshotStore};

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(subcommand)]
    pub command: ExtractCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExtractCommand {
    /// Run one extraction: reconcile every table and advance the marker
    Run(RunArgs),
    /// Show the run marker and the live snapshots under it
    Status(StatusArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Bucket directory (overrides STRATA_BUCKET_ROOT)
    #[arg(long)]
    pub bucket: Option<PathBuf>,

    /// Source SQLite database (overrides STRATA_SOURCE_DB)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Pivot column (overrides STRATA_PIVOT_COLUMN)
    #[arg(long)]
    pub pivot: Option<String>,

    /// Run timestamp, e.g. "2024-08-19 09:30" (defaults to now, UTC)
    #[arg(long)]
    pub run_ts: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long)]
    pub bucket: PathBuf,
}

pub fn execute(args: ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        ExtractCommand::Run(run_args) => execute_run(run_args),
        ExtractCommand::Status(status_args) => execute_status(status_args),
    }
}

fn execute_run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    logging_facility::init(config.profile()?);

    let payload = match &args.run_ts {
        Some(run_ts) => json!({ "run_ts": run_ts }),
        None => json!({}),
    };
    let response = handle_with_config(&config, &payload);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_ok() {
        return Err("extraction failed".into());
    }
    Ok(())
}

/// Environment (and `.env`) first, command-line flags on top
fn load_config(args: &RunArgs) -> Result<ExtractConfig, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let prefix = format!("{}_", ENV_PREFIX);
    let mut vars: HashMap<String, String> = std::env::vars()
        .filter(|(key, _)| key.starts_with(&prefix))
        .collect();

    let overrides = [
        ("BUCKET_ROOT", args.bucket.as_ref().map(|p| p.display().to_string())),
        ("SOURCE_DB", args.db.as_ref().map(|p| p.display().to_string())),
        ("PIVOT_COLUMN", args.pivot.clone()),
    ];
    for (name, value) in overrides {
        if let Some(value) = value {
            vars.insert(format!("{}{}", prefix, name), value);
        }
    }

    Ok(ExtractConfig::from_vars(vars)?)
}

fn execute_status(args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.bucket.is_dir() {
        return Err(format!("Bucket directory not found: {}", args.bucket.display()).into());
    }
    let store = SnapshotStore::new(FsObjectStore::open(&args.bucket)?);

    let status = match store.get_marker()? {
        None => json!({ "marker": null, "tables": [] }),
        Some(marker) => {
            let mut tables = Vec::new();
            for table in store.list_live_tables(&marker)? {
                let snapshot = store.get(&table, &marker)?;
                tables.push(json!({
                    "table": table,
                    "rows": snapshot.map(|s| s.row_count()),
                    "sha256": store.digest(&table, &marker)?,
                }));
            }
            json!({ "marker": marker.as_str(), "tables": tables })
        }
    };

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
