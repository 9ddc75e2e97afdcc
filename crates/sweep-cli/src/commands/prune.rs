//! Prune command - delete versions the retention policy marks eligible.

use anyhow::Result;
use clap::Args;

use sweep_core::sweeper::Sweeper;

use super::TargetArgs;
use super::report::render;
use crate::Config;
use crate::client::ApiClient;

/// Arguments for the prune command.
#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Package selection and policy.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Only report what would be deleted.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the prune command.
///
/// Failed deletions are reported but do not fail the command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a listing the
/// decision depends on cannot be fetched.
pub async fn execute(args: PruneArgs, config: &Config) -> Result<()> {
    // Validated before the client exists so a bad configuration never
    // reaches the network.
    let package = args.target.package_ref()?;
    let options = args.target.sweep_options();

    let client = ApiClient::new(config)?;
    let sweeper = Sweeper::new(client, package, options)?;

    let report = if args.dry_run {
        sweeper.plan().await?
    } else {
        sweeper.run().await?
    };

    if report.deletions.has_failures() {
        tracing::warn!(
            failed = report.deletions.failed(),
            "some versions could not be deleted"
        );
    }

    print!("{}", render(&report, &config.format, false)?);
    Ok(())
}
