use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Natural-language system name. It is the only join key between sources and
/// keeps the exact string as reported by the source.
pub type DeviceName = String;

/// Collaborator that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Remote device-management platform.
    Cloud,
    /// Organizational directory service.
    Directory,
    /// Technician-maintained tracking spreadsheet.
    Tracked,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Cloud => write!(f, "cloud"),
            Source::Directory => write!(f, "directory"),
            Source::Tracked => write!(f, "tracked"),
        }
    }
}

/// Connectivity reported by the cloud platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Unknown,
}

impl DeviceStatus {
    /// Maps the platform's `offline` flag onto a status.
    pub fn from_offline_flag(offline: Option<bool>) -> Self {
        match offline {
            Some(false) => DeviceStatus::Online,
            Some(true) => DeviceStatus::Offline,
            None => DeviceStatus::Unknown,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Online => write!(f, "Online"),
            DeviceStatus::Offline => write!(f, "Offline"),
            DeviceStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One device observed by any of the sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: DeviceName,
    pub source: Source,
    /// Only populated for cloud records.
    pub status: Option<DeviceStatus>,
    /// Extended fields (OS, model, serial, ...). Empty outside the cloud source.
    pub attributes: BTreeMap<String, String>,
}

impl DeviceRecord {
    /// Creates a bare record for the given source.
    pub fn new(name: impl Into<DeviceName>, source: Source) -> Self {
        Self {
            name: name.into(),
            source,
            status: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates a cloud record carrying a status.
    pub fn cloud(name: impl Into<DeviceName>, status: DeviceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::new(name, Source::Cloud)
        }
    }

    /// Inserts or replaces an extended attribute.
    pub fn insert_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Returns the attribute value when present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Content of a Y/N status cell in the tracking spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Yes,
    No,
    Unset,
}

impl Marker {
    pub fn from_presence(present: bool) -> Self {
        if present { Marker::Yes } else { Marker::No }
    }

    /// Parses a cell's text. Anything other than `Y`/`N` is treated as unset.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "Y" | "y" => Marker::Yes,
            "N" | "n" => Marker::No,
            _ => Marker::Unset,
        }
    }

    /// Literal written into the spreadsheet.
    pub fn as_cell_text(&self) -> &'static str {
        match self {
            Marker::Yes => "Y",
            Marker::No => "N",
            Marker::Unset => "",
        }
    }
}

/// A row of the tracking spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDevice {
    pub name: DeviceName,
    /// 1-based spreadsheet row, stable for the duration of one run.
    pub row_index: u32,
    pub in_domain: Marker,
    pub in_cloud: Marker,
}

impl TrackedDevice {
    pub fn new(name: impl Into<DeviceName>, row_index: u32) -> Self {
        Self {
            name: name.into(),
            row_index,
            in_domain: Marker::Unset,
            in_cloud: Marker::Unset,
        }
    }

    /// Returns a copy carrying the markers for the computed presence flags.
    pub fn annotated(&self, in_domain: bool, in_cloud: bool) -> Self {
        Self {
            in_domain: Marker::from_presence(in_domain),
            in_cloud: Marker::from_presence(in_cloud),
            ..self.clone()
        }
    }
}

/// Presence flags computed for a single tracked device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAssessment {
    pub device: TrackedDevice,
    pub in_domain: bool,
    pub in_cloud: bool,
}

/// Output of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// One entry per tracked device, in spreadsheet order.
    pub per_device: Vec<DeviceAssessment>,
    pub missing_from_cloud: BTreeSet<DeviceName>,
    pub missing_from_directory: BTreeSet<DeviceName>,
    pub missing_from_both: BTreeSet<DeviceName>,
    pub untracked_in_cloud: BTreeSet<DeviceName>,
    pub untracked_in_directory: BTreeSet<DeviceName>,
}

impl ReconciliationResult {
    /// True when every tracked device is present everywhere and nothing is
    /// untracked.
    pub fn is_clean(&self) -> bool {
        self.missing_from_cloud.is_empty()
            && self.missing_from_directory.is_empty()
            && self.untracked_in_cloud.is_empty()
            && self.untracked_in_directory.is_empty()
    }
}

/// Represents a single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Renders the cell the way a technician reads it. Whole numbers drop
    /// their fractional part so numeric asset names match their text form.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            CellValue::Number(value) => value.to_string(),
            CellValue::Bool(value) => value.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(value) => value.is_empty(),
            _ => false,
        }
    }
}

/// A worksheet materialised as a dense grid of rows. Row 0 is spreadsheet
/// row 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub sheet_name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            rows: Vec::new(),
        }
    }

    /// Returns the cell at the zero-based position, if the grid covers it.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// Sets a cell, growing the grid with empty cells as needed.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }
}

/// All worksheets of a workbook, in workbook order.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub sheets: Vec<SheetGrid>,
}

impl WorkbookData {
    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|sheet| sheet.sheet_name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetGrid> {
        self.sheets.iter_mut().find(|sheet| sheet.sheet_name == name)
    }
}
