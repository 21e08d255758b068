use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fleet_recon::io::cloud;
use fleet_recon::report::{self, ReportLabels};
use fleet_recon::workflow::{self, PersistOptions, RunOutcome, SourcePaths};
use fleet_recon::{ReconConfig, Result, ToolError};
use tracing_subscriber::EnvFilter;

/// Exit status for runs whose results were computed but not fully persisted.
const EXIT_PERSISTENCE_FAILED: i32 = 2;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing(cli.verbose) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|err| ToolError::Logging(err.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => ReconConfig::load(path)?,
        None => ReconConfig::default(),
    };

    match cli.command {
        Operation::Reconcile(args) => execute_reconcile(args, config, true),
        Operation::Check(args) => execute_reconcile(args, config, false),
        Operation::Devices(args) => execute_devices(args),
    }
}

fn execute_reconcile(args: ReconcileArgs, mut config: ReconConfig, annotate: bool) -> Result<i32> {
    args.apply_overrides(&mut config);
    config.validate()?;

    let paths = SourcePaths {
        workbook: args.workbook,
        cloud_export: args.cloud,
        directory_export: args.directory,
    };
    let options = PersistOptions {
        annotate,
        output: args.output,
        json: args.json,
    };

    let outcome = workflow::run_reconcile(&paths, &config, &options)?;
    print_outcome(&outcome, &ReportLabels::from(&config.report), annotate);

    if outcome.failures.is_empty() {
        Ok(0)
    } else {
        for failure in &outcome.failures {
            eprintln!("warning: {failure}");
        }
        Ok(EXIT_PERSISTENCE_FAILED)
    }
}

fn print_outcome(outcome: &RunOutcome, labels: &ReportLabels, annotated: bool) {
    println!("{}", report::render_status_table(&outcome.result, labels));
    print!("{}", outcome.report);
    if annotated {
        println!("{} status cell(s) changed", outcome.cell_changes);
    }
}

fn execute_devices(args: DevicesArgs) -> Result<i32> {
    let devices = cloud::read_devices(&args.cloud)?;
    if devices.is_empty() {
        println!("There are no devices currently associated with this organization.");
    } else {
        print!("{}", report::render_device_table(&devices));
    }
    Ok(0)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile a device tracking workbook against cloud and directory inventories."
)]
struct Cli {
    /// TOML file describing the workbook layout and report settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Operation,
}

#[derive(Subcommand)]
enum Operation {
    /// Reconcile, annotate the workbook, and write the missing-device log.
    Reconcile(ReconcileArgs),
    /// Reconcile and print the report without touching the workbook or log.
    Check(ReconcileArgs),
    /// List the devices in the cloud export.
    Devices(DevicesArgs),
}

#[derive(clap::Args)]
struct ReconcileArgs {
    /// Tracking workbook (.xlsx).
    #[arg(long, env = "XL_PATH")]
    workbook: PathBuf,

    /// Cloud device export (JSON array).
    #[arg(long)]
    cloud: PathBuf,

    /// Directory computer export (CSV).
    #[arg(long)]
    directory: PathBuf,

    /// Write the annotated workbook here instead of updating it in place.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also export the full result as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Missing-device log destination.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Worksheet holding the tracked devices.
    #[arg(long)]
    worksheet: Option<String>,

    /// Column letter of the system name.
    #[arg(long)]
    name_column: Option<String>,

    /// Column letter of the domain status.
    #[arg(long)]
    domain_column: Option<String>,

    /// Column letter of the cloud status.
    #[arg(long)]
    cloud_column: Option<String>,

    /// Last spreadsheet row to read.
    #[arg(long)]
    last_row: Option<u32>,
}

impl ReconcileArgs {
    fn apply_overrides(&self, config: &mut ReconConfig) {
        if let Some(log) = &self.log {
            config.report.log_path = log.clone();
        }
        if let Some(worksheet) = &self.worksheet {
            config.sheet.worksheet = worksheet.clone();
        }
        if let Some(column) = &self.name_column {
            config.sheet.name_column = column.clone();
        }
        if let Some(column) = &self.domain_column {
            config.sheet.domain_column = column.clone();
        }
        if let Some(column) = &self.cloud_column {
            config.sheet.cloud_column = column.clone();
        }
        if self.last_row.is_some() {
            config.sheet.last_row = self.last_row;
        }
    }
}

#[derive(clap::Args)]
struct DevicesArgs {
    /// Cloud device export (JSON array).
    #[arg(long)]
    cloud: PathBuf,
}
