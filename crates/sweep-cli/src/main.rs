//! sweep - prune stale container package versions.
//!
//! The main entry point for the `sweep` CLI binary.

use anyhow::Result;
use clap::Parser;

use sweep_cli::{Cli, Commands};
use sweep_core::observability::init_logging;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.log_format.into());
    sweep_core::metrics::register_metrics();

    let config = cli.config();

    // Every request is awaited before the next is issued; one thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Prune(args) => sweep_cli::commands::prune::execute(args, &config).await,
            Commands::Plan(args) => sweep_cli::commands::plan::execute(args, &config).await,
        }
    })
}
