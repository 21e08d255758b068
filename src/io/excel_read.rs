use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::{debug, info, instrument, warn};

use crate::config::SheetLayout;
use crate::error::{Result, ToolError};
use crate::model::{CellValue, Marker, SheetGrid, Source, TrackedDevice, WorkbookData};

/// Reads every worksheet of the workbook into dense grids so the file can be
/// re-emitted after annotation.
#[instrument(level = "info", skip_all, fields(input = %path.display()))]
pub fn read_workbook(path: &Path) -> Result<WorkbookData> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().iter().cloned().collect();

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = read_required_sheet(&mut workbook, &name)?;
        sheets.push(range_to_grid(&name, &range));
    }

    debug!(sheet_count = sheets.len(), "workbook loaded");
    Ok(WorkbookData { sheets })
}

/// Loads the workbook and extracts the tracked devices from the configured
/// worksheet. Any failure is reported as an unavailable tracked inventory.
#[instrument(level = "info", skip_all, fields(input = %path.display(), sheet = %layout.worksheet))]
pub fn read_tracked_workbook(
    path: &Path,
    layout: &SheetLayout,
) -> Result<(WorkbookData, Vec<TrackedDevice>)> {
    let workbook = read_workbook(path).map_err(|err| ToolError::unavailable(Source::Tracked, err))?;
    let sheet = workbook.sheet(&layout.worksheet).ok_or_else(|| {
        ToolError::unavailable(
            Source::Tracked,
            format!("missing sheet '{}'", layout.worksheet),
        )
    })?;
    let devices = tracked_devices(sheet, layout);
    info!(device_count = devices.len(), "read tracked devices");
    Ok((workbook, devices))
}

/// Extracts tracked devices from a grid. Rows with a blank name cell are
/// skipped; names are kept verbatim and `row_index` is the 1-based
/// spreadsheet row.
pub fn tracked_devices(sheet: &SheetGrid, layout: &SheetLayout) -> Vec<TrackedDevice> {
    let first = layout.first_data_row() as usize - 1;
    let end = match layout.last_row {
        Some(last_row) => sheet.rows.len().min(last_row as usize),
        None => sheet.rows.len(),
    };

    let mut devices = Vec::new();
    let mut skipped = 0usize;

    for row in first..end {
        let name = cell_text(sheet, row, layout.name_col);
        if name.trim().is_empty() {
            skipped += 1;
            continue;
        }
        devices.push(TrackedDevice {
            name,
            row_index: (row + 1) as u32,
            in_domain: Marker::parse(&cell_text(sheet, row, layout.domain_col)),
            in_cloud: Marker::parse(&cell_text(sheet, row, layout.cloud_col)),
        });
    }

    if skipped > 0 {
        warn!(skipped, origin = "tracked", "skipped records without a device name");
    }

    devices
}

fn cell_text(sheet: &SheetGrid, row: usize, col: u16) -> String {
    sheet
        .get(row, col as usize)
        .map(CellValue::to_text)
        .unwrap_or_default()
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn range_to_grid(name: &str, range: &Range<DataType>) -> SheetGrid {
    let mut grid = SheetGrid::new(name);
    let Some((start_row, start_col)) = range.start() else {
        return grid;
    };

    for (row, col, cell) in range.cells() {
        let value = to_cell_value(cell);
        if value.is_empty() {
            continue;
        }
        grid.set(start_row as usize + row, start_col as usize + col, value);
    }

    grid
}

fn to_cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::DateTime(value) => CellValue::Number(*value),
        other => CellValue::Text(other.to_string()),
    }
}
