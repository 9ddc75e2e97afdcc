//! Rendering of sweep reports.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled};

use sweep_core::executor::{DeletionOutcome, DeletionStatus};
use sweep_core::policy::RetainedVersion;
use sweep_core::sweeper::SweepReport;

use crate::OutputFormat;

/// Renders a report in the requested format.
///
/// `show_retained` also lists every kept version with its reason.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(report: &SweepReport, format: &OutputFormat, show_retained: bool) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
        OutputFormat::Text => Ok(render_text(report, show_retained)),
        OutputFormat::Table => Ok(render_table(report, show_retained)),
    }
}

fn render_text(report: &SweepReport, show_retained: bool) -> String {
    let mut out = String::new();
    let heading = if report.dry_run {
        "Sweep plan"
    } else {
        "Sweep completed"
    };

    out.push_str(&format!("{heading} for {}\n\n", report.package));
    out.push_str(&format!("  Repository:         {}\n", report.repository));
    out.push_str(&format!("  Versions fetched:   {}\n", report.versions_fetched));
    out.push_str(&format!("  Open pull requests: {}\n", report.open_pull_requests));
    out.push_str(&format!("  Retained:           {}\n", report.retained.len()));
    if report.dry_run {
        out.push_str(&format!(
            "  Would delete:       {}\n",
            report.deletions.planned()
        ));
    } else {
        out.push_str(&format!(
            "  Deleted:            {}\n",
            report.deletions.deleted()
        ));
        out.push_str(&format!("  Failed:             {}\n", report.deletions.failed()));
    }

    if !report.deletions.outcomes.is_empty() {
        out.push('\n');
        for outcome in &report.deletions.outcomes {
            out.push_str(&format!(
                "  {} {} ({}{})\n",
                format_status_colored(&outcome.status),
                outcome.version_id,
                outcome.kind,
                format_tags_suffix(&outcome.tags)
            ));
        }
    }

    if show_retained && !report.retained.is_empty() {
        out.push_str("\nRetained:\n");
        for retained in &report.retained {
            out.push_str(&format!(
                "  {} {} ({})\n",
                "kept".dimmed(),
                retained.version.id,
                retained.reason
            ));
        }
    }

    out
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Version")]
    version: u64,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&DeletionOutcome> for Row {
    fn from(outcome: &DeletionOutcome) -> Self {
        Self {
            version: outcome.version_id,
            kind: outcome.kind.to_string(),
            tags: outcome.tags.join(", "),
            result: status_label(&outcome.status),
        }
    }
}

impl From<&RetainedVersion> for Row {
    fn from(retained: &RetainedVersion) -> Self {
        let kind = if retained.version.is_tagged() {
            "tagged"
        } else {
            "untagged"
        };
        Self {
            version: retained.version.id,
            kind: kind.to_string(),
            tags: retained.version.tags.join(", "),
            result: format!("kept: {}", retained.reason),
        }
    }
}

fn render_table(report: &SweepReport, show_retained: bool) -> String {
    let mut rows: Vec<Row> = report.deletions.outcomes.iter().map(Row::from).collect();
    if show_retained {
        rows.extend(report.retained.iter().map(Row::from));
    }

    if rows.is_empty() {
        return format!("Nothing to delete for {}\n", report.package);
    }
    format!("{}\n", Table::new(rows))
}

fn status_label(status: &DeletionStatus) -> String {
    match status {
        DeletionStatus::Deleted => "deleted".to_string(),
        DeletionStatus::Planned => "would delete".to_string(),
        DeletionStatus::Failed { message, .. } => format!("failed: {message}"),
    }
}

fn format_status_colored(status: &DeletionStatus) -> String {
    let label = status_label(status);
    match status {
        DeletionStatus::Deleted => label.green().to_string(),
        DeletionStatus::Planned => label.yellow().to_string(),
        DeletionStatus::Failed { .. } => label.red().to_string(),
    }
}

fn format_tags_suffix(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(": {}", tags.join(", "))
    }
}
