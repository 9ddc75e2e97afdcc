//! Workspace automation tasks.
//!
//! Run with: `cargo xtask <command>`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::Command;

const CRATE_PREFIX: &str = "sweep-";

#[derive(Parser)]
#[command(name = "xtask", about = "Sweep workspace automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks locally
    Ci,
    /// Validate workspace conventions
    Lint,
    /// Run the retention property tests with more cases
    Props {
        /// Number of generated cases per property
        #[arg(long, default_value_t = 2048)]
        cases: u32,
    },
    /// Generate coverage report
    Coverage,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => run_ci(),
        Commands::Lint => run_lint(),
        Commands::Props { cases } => run_props(cases),
        Commands::Coverage => run_coverage(),
    }
}

fn run_ci() -> Result<()> {
    println!("Running CI checks...\n");

    run_lint()?;
    run_cmd("cargo", &["fmt", "--check"], &[])?;
    run_cmd(
        "cargo",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        &[],
    )?;
    run_cmd("cargo", &["test", "--workspace"], &[])?;
    run_cmd("cargo", &["doc", "--workspace", "--no-deps"], &[])?;

    println!("\nAll CI checks passed!");
    Ok(())
}

/// Every crate is named `sweep-*` and inherits the workspace lints.
fn run_lint() -> Result<()> {
    println!("Validating workspace conventions...\n");

    for entry in std::fs::read_dir("crates").context("Failed to read crates/")? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(CRATE_PREFIX) {
            anyhow::bail!("Crate '{name}' does not follow {CRATE_PREFIX}* naming");
        }

        let manifest = entry.path().join("Cargo.toml");
        if !inherits_workspace_lints(&manifest)? {
            anyhow::bail!("Crate '{name}' does not set `[lints] workspace = true`");
        }
    }

    println!("All conventions validated!");
    Ok(())
}

fn inherits_workspace_lints(manifest: &Path) -> Result<bool> {
    let contents = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    lints_inherited(&contents).with_context(|| format!("Failed to parse {}", manifest.display()))
}

fn lints_inherited(contents: &str) -> Result<bool> {
    let table: toml::Table = toml::from_str(contents)?;
    Ok(table
        .get("lints")
        .and_then(|lints| lints.get("workspace"))
        .and_then(toml::Value::as_bool)
        == Some(true))
}

fn run_props(cases: u32) -> Result<()> {
    let cases = cases.to_string();
    run_cmd(
        "cargo",
        &["test", "-p", "sweep-core", "--test", "property_tests"],
        &[("PROPTEST_CASES", cases.as_str())],
    )
}

fn run_coverage() -> Result<()> {
    run_cmd("cargo", &["llvm-cov", "--workspace", "--html"], &[])?;
    println!("\nCoverage report: target/llvm-cov/html/index.html");
    Ok(())
}

fn run_cmd(cmd: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<()> {
    println!("$ {} {}", cmd, args.join(" "));
    let status = Command::new(cmd)
        .args(args)
        .envs(envs.iter().copied())
        .status()
        .with_context(|| format!("Failed to run: {} {}", cmd, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", cmd, args.join(" "));
    }
    Ok(())
}
