use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::annotate;
use crate::config::ReconConfig;
use crate::engine;
use crate::error::{Result, ToolError};
use crate::io::{cloud, directory, excel_read, excel_write};
use crate::model::{DeviceRecord, ReconciliationResult, TrackedDevice, WorkbookData};
use crate::report::{self, ReportLabels};

/// Locations of the three inventories for one run.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub workbook: PathBuf,
    pub cloud_export: PathBuf,
    pub directory_export: PathBuf,
}

/// Where a run persists its results.
#[derive(Debug, Clone, Default)]
pub struct PersistOptions {
    /// Annotate the workbook and write the text log.
    pub annotate: bool,
    /// Destination of the annotated workbook. Defaults to the input workbook.
    pub output: Option<PathBuf>,
    /// Optional JSON export of the full result.
    pub json: Option<PathBuf>,
}

/// Fully materialised inputs for the engine.
#[derive(Debug, Clone)]
pub struct LoadedSources {
    pub workbook: WorkbookData,
    pub tracked: Vec<TrackedDevice>,
    pub cloud: Vec<DeviceRecord>,
    pub directory: Vec<DeviceRecord>,
}

/// Result of a run. Persistence failures are collected instead of aborting so
/// the computed result is never lost.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: ReconciliationResult,
    pub report: String,
    pub cell_changes: usize,
    pub failures: Vec<ToolError>,
}

/// Loads the three inventories concurrently. The first unavailable source
/// fails the whole load.
#[instrument(
    level = "info",
    skip_all,
    fields(
        workbook = %paths.workbook.display(),
        cloud = %paths.cloud_export.display(),
        directory = %paths.directory_export.display()
    )
)]
pub fn load_sources(paths: &SourcePaths, config: &ReconConfig) -> Result<LoadedSources> {
    let layout = config.layout()?;

    let (sheet, (cloud, directory)) = rayon::join(
        || excel_read::read_tracked_workbook(&paths.workbook, &layout),
        || {
            rayon::join(
                || cloud::read_devices(&paths.cloud_export),
                || directory::read_devices(&paths.directory_export, &config.directory),
            )
        },
    );

    let (workbook, tracked) = sheet?;
    Ok(LoadedSources {
        workbook,
        tracked,
        cloud: cloud?,
        directory: directory?,
    })
}

/// Loads the sources, reconciles them, and persists what `options` asks for.
#[instrument(level = "info", skip_all, fields(annotate = options.annotate))]
pub fn run_reconcile(
    paths: &SourcePaths,
    config: &ReconConfig,
    options: &PersistOptions,
) -> Result<RunOutcome> {
    let sources = load_sources(paths, config)?;
    reconcile_loaded(sources, &paths.workbook, config, options)
}

/// Reconciles already loaded sources and persists the results.
pub fn reconcile_loaded(
    mut sources: LoadedSources,
    workbook_path: &Path,
    config: &ReconConfig,
    options: &PersistOptions,
) -> Result<RunOutcome> {
    let layout = config.layout()?;
    let labels = ReportLabels::from(&config.report);

    let result = engine::reconcile(&sources.tracked, &sources.cloud, &sources.directory);
    info!(
        tracked = result.per_device.len(),
        missing_from_cloud = result.missing_from_cloud.len(),
        missing_from_directory = result.missing_from_directory.len(),
        missing_from_both = result.missing_from_both.len(),
        untracked = result.untracked_in_cloud.len() + result.untracked_in_directory.len(),
        "reconciliation complete"
    );

    let report_text = report::render_report(&result, &labels);
    let mut failures = Vec::new();
    let mut cell_changes = 0;

    if options.annotate {
        let writes = annotate::plan(&result, &layout)?;
        cell_changes = annotate::apply(&mut sources.workbook, &layout.worksheet, &writes)?;

        let destination = options.output.as_deref().unwrap_or(workbook_path);
        if options.output.is_none() {
            warn!(
                workbook = %destination.display(),
                "rewriting workbook in place; formulas, dates and cell styling are saved as plain values"
            );
        }
        if let Err(err) = excel_write::write_workbook(destination, &sources.workbook) {
            failures.push(ToolError::write_failure(destination, err));
        }

        if let Err(err) = report::write_log(&config.report.log_path, &report_text) {
            failures.push(err);
        }
    }

    if let Some(json_path) = &options.json {
        if let Err(err) = report::write_json(json_path, &result) {
            failures.push(match err {
                ToolError::WriteFailure { .. } => err,
                other => ToolError::write_failure(json_path, other),
            });
        }
    }

    for failure in &failures {
        warn!(error = %failure, "persistence failed");
    }

    Ok(RunOutcome {
        result,
        report: report_text,
        cell_changes,
        failures,
    })
}
