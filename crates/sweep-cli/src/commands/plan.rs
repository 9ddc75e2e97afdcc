//! Plan command - show what `prune` would delete and why the rest is kept.

use anyhow::Result;
use clap::Args;

use sweep_core::sweeper::Sweeper;

use super::TargetArgs;
use super::report::render;
use crate::Config;
use crate::client::ApiClient;

/// Arguments for the plan command.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Package selection and policy.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Hide the list of retained versions.
    #[arg(long)]
    pub hide_retained: bool,
}

/// Execute the plan command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a listing the
/// decision depends on cannot be fetched.
pub async fn execute(args: PlanArgs, config: &Config) -> Result<()> {
    let package = args.target.package_ref()?;
    let options = args.target.sweep_options();

    let client = ApiClient::new(config)?;
    let sweeper = Sweeper::new(client, package, options)?;
    let report = sweeper.plan().await?;

    print!("{}", render(&report, &config.format, !args.hide_retained)?);
    Ok(())
}
