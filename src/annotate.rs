//! Maps reconciliation flags back onto the tracking worksheet.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{SheetLayout, column_letters};
use crate::error::{Result, ToolError};
use crate::model::{CellValue, Marker, ReconciliationResult, WorkbookData};

/// A single `Y`/`N` marker destined for the tracking worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellWrite {
    /// 1-based spreadsheet row.
    pub row_index: u32,
    /// Zero-based column.
    pub column: u16,
    pub marker: Marker,
    /// Marker the cell held when the workbook was read.
    pub previous: Marker,
}

impl CellWrite {
    pub fn is_change(&self) -> bool {
        self.marker != self.previous
    }
}

/// Plans the domain and cloud status writes for every tracked device.
pub fn plan(result: &ReconciliationResult, layout: &SheetLayout) -> Result<Vec<CellWrite>> {
    let mut writes = Vec::with_capacity(result.per_device.len() * 2);

    for entry in &result.per_device {
        let device = &entry.device;
        if device.row_index <= layout.header_row {
            return Err(ToolError::InvalidRow {
                name: device.name.clone(),
                row_index: device.row_index,
            });
        }

        let updated = device.annotated(entry.in_domain, entry.in_cloud);
        writes.push(CellWrite {
            row_index: device.row_index,
            column: layout.domain_col,
            marker: updated.in_domain,
            previous: device.in_domain,
        });
        writes.push(CellWrite {
            row_index: device.row_index,
            column: layout.cloud_col,
            marker: updated.in_cloud,
            previous: device.in_cloud,
        });
    }

    debug!(
        write_count = writes.len(),
        domain_column = %column_letters(layout.domain_col),
        cloud_column = %column_letters(layout.cloud_col),
        "status writes planned"
    );
    Ok(writes)
}

/// Applies planned writes to the named worksheet. Returns how many cells
/// changed value.
#[instrument(level = "debug", skip(workbook, writes), fields(write_count = writes.len()))]
pub fn apply(workbook: &mut WorkbookData, worksheet: &str, writes: &[CellWrite]) -> Result<usize> {
    let sheet = workbook
        .sheet_mut(worksheet)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{worksheet}'")))?;

    for write in writes {
        if write.row_index == 0 {
            return Err(ToolError::InvalidRow {
                name: String::new(),
                row_index: write.row_index,
            });
        }
        sheet.set(
            write.row_index as usize - 1,
            write.column as usize,
            CellValue::Text(write.marker.as_cell_text().to_string()),
        );
    }

    let changed = writes.iter().filter(|write| write.is_change()).count();
    debug!(changed, "status markers applied");
    Ok(changed)
}
