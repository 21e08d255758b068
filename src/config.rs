use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ToolError};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Settings for one reconciliation run, usually loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    pub sheet: SheetConfig,
    pub directory: DirectoryConfig,
    pub report: ReportConfig,
}

/// Where the tracking data lives inside the workbook.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    pub worksheet: String,
    pub name_column: String,
    pub domain_column: String,
    pub cloud_column: String,
    /// 1-based row holding the column headers.
    pub header_row: u32,
    /// Last 1-based row to read. Unset reads the whole used range.
    pub last_row: Option<u32>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            worksheet: "Computers".to_string(),
            name_column: "A".to_string(),
            domain_column: "D".to_string(),
            cloud_column: "E".to_string(),
            header_row: 1,
            last_row: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// CSV header holding the computer name.
    pub name_column: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            name_column: "Name".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub log_path: PathBuf,
    pub cloud_label: String,
    pub directory_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("logs/missing_devices.txt"),
            cloud_label: "NinjaOne".to_string(),
            directory_label: "the domain".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved layout
// ---------------------------------------------------------------------------

/// Zero-based column positions resolved from [`SheetConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub worksheet: String,
    pub name_col: u16,
    pub domain_col: u16,
    pub cloud_col: u16,
    pub header_row: u32,
    pub last_row: Option<u32>,
}

impl SheetLayout {
    /// First 1-based row that can hold a tracked device.
    pub fn first_data_row(&self) -> u32 {
        self.header_row.saturating_add(1)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: ReconConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout().map(|_| ())?;
        if self.directory.name_column.trim().is_empty() {
            return Err(ToolError::InvalidConfig(
                "directory name_column must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolves column letters into positions and checks they do not collide.
    pub fn layout(&self) -> Result<SheetLayout> {
        let sheet = &self.sheet;
        if sheet.worksheet.trim().is_empty() {
            return Err(ToolError::InvalidConfig("worksheet must not be empty".into()));
        }
        if sheet.header_row == 0 {
            return Err(ToolError::InvalidConfig("header_row is 1-based".into()));
        }
        if sheet.header_row == u32::MAX {
            return Err(ToolError::InvalidConfig(
                "header_row leaves no room for device rows".into(),
            ));
        }
        if let Some(last_row) = sheet.last_row {
            if last_row <= sheet.header_row {
                return Err(ToolError::InvalidConfig(format!(
                    "last_row {last_row} must come after header_row {}",
                    sheet.header_row
                )));
            }
        }

        let name_col = column_index(&sheet.name_column)?;
        let domain_col = column_index(&sheet.domain_column)?;
        let cloud_col = column_index(&sheet.cloud_column)?;

        if domain_col == name_col || cloud_col == name_col {
            return Err(ToolError::InvalidConfig(
                "status columns must differ from the name column".into(),
            ));
        }
        if domain_col == cloud_col {
            return Err(ToolError::InvalidConfig(
                "domain and cloud status columns must differ".into(),
            ));
        }

        Ok(SheetLayout {
            worksheet: sheet.worksheet.clone(),
            name_col,
            domain_col,
            cloud_col,
            header_row: sheet.header_row,
            last_row: sheet.last_row,
        })
    }
}

/// Converts a spreadsheet column reference (`A`, `E`, `AA`) into a zero-based
/// index.
pub fn column_index(letters: &str) -> Result<u16> {
    let trimmed = letters.trim();
    if trimmed.is_empty() {
        return Err(ToolError::InvalidColumn(letters.to_string()));
    }

    let mut index: u32 = 0;
    for ch in trimmed.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(ToolError::InvalidColumn(letters.to_string()));
        }
        let digit = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index * 26 + digit;
        // Excel stops at XFD (16384 columns).
        if index > 16_384 {
            return Err(ToolError::InvalidColumn(letters.to_string()));
        }
    }

    Ok((index - 1) as u16)
}

/// Converts a zero-based column index back into its letter form.
pub fn column_letters(index: u16) -> String {
    let mut remaining = index as u32 + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}
