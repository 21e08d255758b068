//! Human-readable rendering of reconciliation results and their persistence.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::{info, instrument};

use crate::config::ReportConfig;
use crate::error::{Result, ToolError};
use crate::model::{DeviceName, DeviceRecord, ReconciliationResult};

/// Names used for the two authoritative sources in report lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLabels {
    pub cloud: String,
    pub directory: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        ReportLabels::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for ReportLabels {
    fn from(config: &ReportConfig) -> Self {
        Self {
            cloud: config.cloud_label.clone(),
            directory: config.directory_label.clone(),
        }
    }
}

/// Renders the missing and untracked sections of a run.
pub fn render_report(result: &ReconciliationResult, labels: &ReportLabels) -> String {
    let mut out = String::new();

    section(
        &mut out,
        &format!("Missing from {}", labels.cloud),
        &result.missing_from_cloud,
        |name| format!("Device: {name} has NOT yet joined {}...", labels.cloud),
    );
    section(
        &mut out,
        &format!("Missing from {}", labels.directory),
        &result.missing_from_directory,
        |name| format!("Device: {name} has NOT yet joined {}...", labels.directory),
    );
    section(&mut out, "Missing from both", &result.missing_from_both, |name| {
        format!(
            "Device: {name} is missing from both {} and {}...",
            labels.cloud, labels.directory
        )
    });

    let _ = writeln!(out, "== Present but not tracked ==");
    if result.untracked_in_cloud.is_empty() && result.untracked_in_directory.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for name in &result.untracked_in_cloud {
        let _ = writeln!(
            out,
            "Device: {name} is in {} but not tracked in the spreadsheet...",
            labels.cloud
        );
    }
    for name in &result.untracked_in_directory {
        let _ = writeln!(
            out,
            "Device: {name} is in {} but not tracked in the spreadsheet...",
            labels.directory
        );
    }

    out
}

fn section(
    out: &mut String,
    title: &str,
    names: &BTreeSet<DeviceName>,
    line: impl Fn(&str) -> String,
) {
    let _ = writeln!(out, "== {title} ==");
    if names.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for name in names {
        let _ = writeln!(out, "{}", line(name));
    }
    out.push('\n');
}

/// Renders the cloud inventory as a `System Name | ID | Status` table.
pub fn render_device_table(records: &[DeviceRecord]) -> String {
    let rows: Vec<[String; 3]> = records
        .iter()
        .map(|record| {
            [
                record.name.clone(),
                record.attribute("id").unwrap_or("-").to_string(),
                record
                    .status
                    .map(|status| status.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    render_table(["System Name", "ID", "Status"], &rows)
}

/// Renders the per-device flags in spreadsheet order.
pub fn render_status_table(result: &ReconciliationResult, labels: &ReportLabels) -> String {
    let rows: Vec<[String; 3]> = result
        .per_device
        .iter()
        .map(|entry| {
            [
                entry.device.name.clone(),
                yes_no(entry.in_domain).to_string(),
                yes_no(entry.in_cloud).to_string(),
            ]
        })
        .collect();
    let directory_header = format!("In {}", labels.directory);
    let cloud_header = format!("In {}", labels.cloud);
    render_table(["Device", directory_header.as_str(), cloud_header.as_str()], &rows)
}

fn yes_no(present: bool) -> &'static str {
    if present { "Y" } else { "N" }
}

fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|header| header.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &headers.map(str::to_string), &widths);
    let rule = widths.map(|width| "-".repeat(width));
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<const N: usize>(out: &mut String, cells: &[String; N], widths: &[usize; N]) {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Persists the rendered report, creating the destination directory when it
/// does not exist yet.
#[instrument(level = "info", skip_all, fields(output = %path.display()))]
pub fn write_log(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| ToolError::write_failure(path, err))?;
    }
    fs::write(path, text).map_err(|err| ToolError::write_failure(path, err))?;
    info!(bytes = text.len(), "report written");
    Ok(())
}

/// Exports the full result as pretty-printed JSON.
#[instrument(level = "info", skip_all, fields(output = %path.display()))]
pub fn write_json(path: &Path, result: &ReconciliationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    write_log(path, &json)
}
