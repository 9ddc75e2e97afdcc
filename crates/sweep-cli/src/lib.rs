//! # sweep-cli
//!
//! Command-line interface for pruning container registry package versions.
//!
//! ## Commands
//!
//! - `sweep prune` - Delete versions the retention policy marks eligible
//! - `sweep plan` - Show what `prune` would delete, and why the rest is kept
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags for settings:
//!
//! - `GITHUB_API_URL` - API endpoint (default: `https://api.github.com`)
//! - `GITHUB_TOKEN` - API authentication token
//! - `INPUT_USER` / `INPUT_ORG` - Package owner (exactly one)
//! - `INPUT_PACKAGE` - Package name

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod client;
pub mod commands;

use clap::{Parser, Subcommand};
use sweep_core::observability::LogFormat;

/// Default registry API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// sweep - prune stale container package versions.
#[derive(Debug, Parser)]
#[command(name = "sweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API server URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API authentication token.
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Log output format.
    #[arg(long, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            api_url: self.api_url.trim_end_matches('/').to_string(),
            api_token: self.api_token.clone().filter(|t| !t.is_empty()),
            format: self.format.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Delete versions the retention policy marks eligible.
    Prune(commands::prune::PruneArgs),
    /// Show what would be deleted without deleting anything.
    Plan(commands::plan::PlanArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable logs.
    #[default]
    Pretty,
    /// JSON structured logs.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// API server URL, without a trailing slash.
    pub api_url: String,
    /// API authentication token.
    pub api_token: Option<String>,
    /// Output format.
    pub format: OutputFormat,
}
