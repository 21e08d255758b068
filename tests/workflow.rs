use std::fs;
use std::path::Path;

use fleet_recon::annotate;
use fleet_recon::config::{DirectoryConfig, ReconConfig};
use fleet_recon::io::{cloud, directory, excel_read, excel_write};
use fleet_recon::model::{CellValue, DeviceStatus, Marker, SheetGrid, Source, WorkbookData};
use fleet_recon::report::{self, ReportLabels};
use fleet_recon::workflow::{self, PersistOptions, SourcePaths};
use fleet_recon::{ToolError, reconcile};
use tempfile::tempdir;

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn tracking_workbook() -> WorkbookData {
    let mut computers = SheetGrid::new("Computers");
    computers.rows = vec![
        vec![
            text("System Name"),
            text("Asset"),
            text("User"),
            text("In Domain"),
            text("In NinjaOne"),
        ],
        vec![text("WKS01"), CellValue::Number(1001.0), text("alice"), text(""), text("Y")],
        vec![text("WKS02"), CellValue::Number(1002.0), text("bob"), text("Y"), text("Y")],
        vec![CellValue::Empty, CellValue::Empty, text("spare")],
        vec![CellValue::Number(4417.0), CellValue::Bool(true)],
    ];

    let mut notes = SheetGrid::new("Notes");
    notes.set(0, 0, text("kept as-is"));

    WorkbookData {
        sheets: vec![computers, notes],
    }
}

fn write_sources(dir: &Path) -> SourcePaths {
    let workbook = dir.join("inventory.xlsx");
    excel_write::write_workbook(&workbook, &tracking_workbook()).expect("workbook written");

    let cloud_export = dir.join("devices.json");
    let devices = serde_json::json!([
        {"id": 1, "systemName": "WKS01", "offline": false, "os": {"name": "Windows 11"}},
        {"id": 2, "systemName": "4417", "offline": true},
        {"id": 3, "systemName": "ROGUE"},
        {"id": 4, "systemName": ""}
    ]);
    fs::write(&cloud_export, devices.to_string()).expect("cloud export written");

    let directory_export = dir.join("computers.csv");
    fs::write(
        &directory_export,
        "#TYPE Selected.Microsoft.ActiveDirectory.Management.ADComputer\n\
         \"Name\",\"DNSHostName\"\n\
         \"WKS02\",\"wks02.corp.local\"\n\
         \"4417\",\"4417.corp.local\"\n\
         \"\",\"orphan.corp.local\"\n",
    )
    .expect("directory export written");

    SourcePaths {
        workbook,
        cloud_export,
        directory_export,
    }
}

#[test]
fn cloud_export_normalises_devices() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());

    let devices = cloud::read_devices(&paths.cloud_export).expect("cloud export read");
    let names: Vec<&str> = devices.iter().map(|device| device.name.as_str()).collect();
    assert_eq!(names, vec!["WKS01", "4417", "ROGUE"]);
    assert_eq!(devices[0].status, Some(DeviceStatus::Online));
    assert_eq!(devices[1].status, Some(DeviceStatus::Offline));
    assert_eq!(devices[2].status, Some(DeviceStatus::Unknown));
    assert_eq!(devices[0].attribute("os.name"), Some("Windows 11"));
    assert_eq!(devices[0].attribute("id"), Some("1"));
    assert!(devices.iter().all(|device| device.source == Source::Cloud));
}

#[test]
fn missing_cloud_export_is_unavailable_not_empty() {
    let dir = tempdir().expect("temporary directory");
    let error = cloud::read_devices(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(
        error,
        ToolError::SourceUnavailable {
            origin: Source::Cloud,
            ..
        }
    ));
}

#[test]
fn malformed_cloud_export_is_unavailable() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("devices.json");
    fs::write(&path, r#"{"error": "unauthorized"}"#).expect("export written");

    let error = cloud::read_devices(&path).unwrap_err();
    assert!(matches!(error, ToolError::SourceUnavailable { .. }));
}

#[test]
fn empty_cloud_export_is_a_valid_inventory() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("devices.json");
    fs::write(&path, "[]").expect("export written");

    assert!(cloud::read_devices(&path).expect("empty export").is_empty());
}

#[test]
fn directory_export_skips_preamble_and_blank_names() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());

    let devices = directory::read_devices(&paths.directory_export, &DirectoryConfig::default())
        .expect("directory export read");
    let names: Vec<&str> = devices.iter().map(|device| device.name.as_str()).collect();
    assert_eq!(names, vec!["WKS02", "4417"]);
    assert!(devices.iter().all(|device| device.status.is_none()));
}

#[test]
fn directory_export_without_name_column_is_unavailable() {
    let config = DirectoryConfig {
        name_column: "Hostname".to_string(),
    };
    let error = directory::parse_devices("Name\nWKS01\n", &config).unwrap_err();
    assert!(matches!(
        error,
        ToolError::SourceUnavailable {
            origin: Source::Directory,
            ..
        }
    ));
}

#[test]
fn tracked_devices_read_with_row_positions() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());
    let layout = ReconConfig::default().layout().expect("layout");

    let (workbook, devices) =
        excel_read::read_tracked_workbook(&paths.workbook, &layout).expect("workbook read");
    assert_eq!(workbook.sheets.len(), 2);

    let rows: Vec<(&str, u32)> = devices
        .iter()
        .map(|device| (device.name.as_str(), device.row_index))
        .collect();
    assert_eq!(rows, vec![("WKS01", 2), ("WKS02", 3), ("4417", 5)]);
    assert_eq!(devices[0].in_domain, Marker::Unset);
    assert_eq!(devices[0].in_cloud, Marker::Yes);
    assert_eq!(devices[1].in_domain, Marker::Yes);
}

#[test]
fn last_row_limits_tracked_devices() {
    let mut config = ReconConfig::default();
    config.sheet.last_row = Some(3);
    let layout = config.layout().expect("layout");

    let workbook = tracking_workbook();
    let sheet = workbook.sheet("Computers").expect("sheet present");
    let devices = excel_read::tracked_devices(sheet, &layout);
    assert_eq!(devices.len(), 2);
}

#[test]
fn missing_worksheet_is_unavailable() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());
    let mut config = ReconConfig::default();
    config.sheet.worksheet = "Laptops".to_string();
    let layout = config.layout().expect("layout");

    let error = excel_read::read_tracked_workbook(&paths.workbook, &layout).unwrap_err();
    assert!(matches!(
        error,
        ToolError::SourceUnavailable {
            origin: Source::Tracked,
            ..
        }
    ));
}

#[test]
fn annotation_writes_markers_into_configured_columns() {
    let layout = ReconConfig::default().layout().expect("layout");
    let mut workbook = tracking_workbook();
    let devices = excel_read::tracked_devices(
        workbook.sheet("Computers").expect("sheet present"),
        &layout,
    );

    let cloud_records = vec![fleet_recon::model::DeviceRecord::cloud(
        "WKS01",
        DeviceStatus::Online,
    )];
    let result = reconcile(&devices, &cloud_records, &[]);
    let writes = annotate::plan(&result, &layout).expect("writes planned");
    assert_eq!(writes.len(), 6);

    let changed = annotate::apply(&mut workbook, "Computers", &writes).expect("writes applied");
    // WKS01 domain: unset -> N, WKS02 domain: Y -> N, WKS02 cloud: Y -> N,
    // 4417 domain and cloud: unset -> N. WKS01 cloud stays Y.
    assert_eq!(changed, 5);

    let sheet = workbook.sheet("Computers").expect("sheet present");
    assert_eq!(sheet.get(1, 3), Some(&text("N")));
    assert_eq!(sheet.get(1, 4), Some(&text("Y")));
    assert_eq!(sheet.get(2, 4), Some(&text("N")));
    assert_eq!(sheet.get(4, 3), Some(&text("N")));
    assert_eq!(sheet.get(4, 4), Some(&text("N")));
    assert_eq!(sheet.get(3, 2), Some(&text("spare")));
}

#[test]
fn annotation_rejects_header_row() {
    let layout = ReconConfig::default().layout().expect("layout");
    let devices = vec![fleet_recon::model::TrackedDevice::new("HEADER", 1)];
    let result = reconcile(&devices, &[], &[]);

    let error = annotate::plan(&result, &layout).unwrap_err();
    assert!(matches!(error, ToolError::InvalidRow { row_index: 1, .. }));
}

#[test]
fn report_lists_each_category() {
    let devices = vec![
        fleet_recon::model::TrackedDevice::new("WKS01", 2),
        fleet_recon::model::TrackedDevice::new("WKS02", 3),
        fleet_recon::model::TrackedDevice::new("GHOST", 4),
    ];
    let cloud_records = vec![
        fleet_recon::model::DeviceRecord::cloud("WKS01", DeviceStatus::Online),
        fleet_recon::model::DeviceRecord::cloud("X", DeviceStatus::Online),
    ];
    let directory_records = vec![fleet_recon::model::DeviceRecord::new(
        "WKS02",
        Source::Directory,
    )];
    let result = reconcile(&devices, &cloud_records, &directory_records);

    let text = report::render_report(&result, &ReportLabels::default());
    assert!(text.contains("== Missing from NinjaOne =="));
    assert!(text.contains("Device: WKS02 has NOT yet joined NinjaOne..."));
    assert!(text.contains("Device: WKS01 has NOT yet joined the domain..."));
    assert!(text.contains("Device: GHOST is missing from both NinjaOne and the domain..."));
    assert!(text.contains("Device: X is in NinjaOne but not tracked in the spreadsheet..."));
}

#[test]
fn report_marks_empty_sections() {
    let result = reconcile(&[], &[], &[]);
    let text = report::render_report(&result, &ReportLabels::default());
    assert_eq!(text.matches("(none)").count(), 4);
}

#[test]
fn log_writer_creates_missing_directories() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("logs").join("nested").join("missing.txt");

    report::write_log(&path, "Device: A has NOT yet joined NinjaOne...\n").expect("log written");
    let written = fs::read_to_string(&path).expect("log read");
    assert!(written.starts_with("Device: A"));
}

#[test]
fn log_writer_reports_unwritable_destination() {
    let dir = tempdir().expect("temporary directory");
    let blocker = dir.path().join("not-a-directory");
    fs::write(&blocker, "file").expect("blocker written");

    let error = report::write_log(&blocker.join("missing.txt"), "text").unwrap_err();
    assert!(matches!(error, ToolError::WriteFailure { .. }));
}

#[test]
fn reconcile_run_updates_workbook_and_log() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());
    let mut config = ReconConfig::default();
    config.report.log_path = dir.path().join("logs").join("missing.txt");
    let json_path = dir.path().join("result.json");
    let options = PersistOptions {
        annotate: true,
        output: None,
        json: Some(json_path.clone()),
    };

    let outcome = workflow::run_reconcile(&paths, &config, &options).expect("run completes");
    assert!(outcome.failures.is_empty());

    let result = &outcome.result;
    assert!(result.missing_from_cloud.contains("WKS02"));
    assert!(result.missing_from_directory.contains("WKS01"));
    assert!(result.missing_from_both.is_empty());
    assert!(result.untracked_in_cloud.contains("ROGUE"));
    assert!(result.untracked_in_directory.is_empty());

    let layout = config.layout().expect("layout");
    let (workbook, devices) =
        excel_read::read_tracked_workbook(&paths.workbook, &layout).expect("annotated read");
    let markers: Vec<(&str, Marker, Marker)> = devices
        .iter()
        .map(|device| (device.name.as_str(), device.in_domain, device.in_cloud))
        .collect();
    assert_eq!(
        markers,
        vec![
            ("WKS01", Marker::No, Marker::Yes),
            ("WKS02", Marker::Yes, Marker::No),
            ("4417", Marker::Yes, Marker::Yes),
        ]
    );
    assert_eq!(
        workbook.sheet("Notes").and_then(|sheet| sheet.get(0, 0)),
        Some(&text("kept as-is"))
    );

    let log = fs::read_to_string(&config.report.log_path).expect("log read");
    assert_eq!(log, outcome.report);

    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).expect("json read"))
            .expect("json parsed");
    assert_eq!(exported["missing_from_cloud"], serde_json::json!(["WKS02"]));
}

#[test]
fn check_run_leaves_workbook_untouched() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());
    let before = fs::read(&paths.workbook).expect("workbook bytes");
    let mut config = ReconConfig::default();
    config.report.log_path = dir.path().join("missing.txt");

    let outcome = workflow::run_reconcile(&paths, &config, &PersistOptions::default())
        .expect("run completes");
    assert_eq!(outcome.cell_changes, 0);
    assert_eq!(fs::read(&paths.workbook).expect("workbook bytes"), before);
    assert!(!config.report.log_path.exists());
}

#[test]
fn persistence_failure_keeps_computed_result() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "file").expect("blocker written");

    let mut config = ReconConfig::default();
    config.report.log_path = blocker.join("missing.txt");
    let options = PersistOptions {
        annotate: true,
        output: Some(dir.path().join("annotated.xlsx")),
        json: None,
    };

    let outcome = workflow::run_reconcile(&paths, &config, &options).expect("run completes");
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(outcome.failures[0], ToolError::WriteFailure { .. }));
    assert_eq!(outcome.result.per_device.len(), 3);
    assert!(dir.path().join("annotated.xlsx").exists());
}

#[test]
fn unavailable_source_aborts_before_reconciling() {
    let dir = tempdir().expect("temporary directory");
    let mut paths = write_sources(dir.path());
    paths.directory_export = dir.path().join("missing.csv");

    let error = workflow::run_reconcile(&paths, &ReconConfig::default(), &PersistOptions::default())
        .unwrap_err();
    assert!(matches!(
        error,
        ToolError::SourceUnavailable {
            origin: Source::Directory,
            ..
        }
    ));
}

#[test]
fn sheet_names_keep_surrounding_whitespace() {
    let layout = ReconConfig::default().layout().expect("layout");
    let mut sheet = SheetGrid::new("Computers");
    sheet.set(0, 0, text("System Name"));
    sheet.set(1, 0, text("WKS01 "));
    sheet.set(2, 0, text("   "));

    let devices = excel_read::tracked_devices(&sheet, &layout);
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "WKS01 ");

    let cloud_records = vec![fleet_recon::model::DeviceRecord::cloud(
        "WKS01 ",
        DeviceStatus::Online,
    )];
    let directory_records = vec![fleet_recon::model::DeviceRecord::new(
        "WKS01",
        Source::Directory,
    )];
    let result = reconcile(&devices, &cloud_records, &directory_records);

    let entry = &result.per_device[0];
    assert!(entry.in_cloud);
    assert!(!entry.in_domain);
    assert!(result.untracked_in_cloud.is_empty());
    assert!(result.untracked_in_directory.contains("WKS01"));
    assert!(result.missing_from_directory.contains("WKS01 "));
}

#[test]
fn separate_output_leaves_source_workbook_untouched() {
    let dir = tempdir().expect("temporary directory");
    let paths = write_sources(dir.path());
    let before = fs::read(&paths.workbook).expect("workbook bytes");
    let output = dir.path().join("annotated.xlsx");
    let mut config = ReconConfig::default();
    config.report.log_path = dir.path().join("missing.txt");
    let options = PersistOptions {
        annotate: true,
        output: Some(output.clone()),
        json: None,
    };

    let outcome = workflow::run_reconcile(&paths, &config, &options).expect("run completes");
    assert!(outcome.failures.is_empty());
    assert_eq!(fs::read(&paths.workbook).expect("workbook bytes"), before);

    let layout = config.layout().expect("layout");
    let (_, devices) = excel_read::read_tracked_workbook(&output, &layout).expect("output read");
    assert_eq!(devices[0].in_domain, Marker::No);
    assert_eq!(devices[0].in_cloud, Marker::Yes);
}
