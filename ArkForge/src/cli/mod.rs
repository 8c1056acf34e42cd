//! ArkForge CLI - Command-line interface for ARK/HDR archives

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

use crate::config::ArkConfig;

#[derive(Parser)]
#[command(name = "arkforge")]
#[command(about = "ArkForge: ARK/HDR archive tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Run the ArkForge CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ArkConfig::load_or_default();
    cli.command.execute(&config)?;

    Ok(())
}
