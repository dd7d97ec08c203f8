//! Strata CLI
//!
//! Command-line interface for the extract stage

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "strata")]
#[command(about = "Strata - incremental table snapshot extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extraction runs and bucket inspection
    Extract(commands::extract::ExtractArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract(args) => commands::extract::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
