use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::model::{CellValue, WorkbookData};

/// Writes the provided workbook data to the given path, one worksheet per
/// grid in workbook order. Cell styling is not carried over.
#[instrument(level = "info", skip_all, fields(output = %path.display()))]
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for sheet in &workbook.sheets {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&sheet.sheet_name)?;

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let (row_num, col_num) = (row_idx as u32, col_idx as u16);
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(value) => {
                        worksheet.write_string(row_num, col_num, value)?;
                    }
                    CellValue::Number(value) => {
                        worksheet.write_number(row_num, col_num, *value)?;
                    }
                    CellValue::Bool(value) => {
                        worksheet.write_boolean(row_num, col_num, *value)?;
                    }
                }
            }
        }
    }

    debug!(sheet_count = workbook.sheets.len(), "workbook serialised");
    workbook_writer.save(path)?;
    Ok(())
}
