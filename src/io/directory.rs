use std::fs;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::config::DirectoryConfig;
use crate::error::{Result, ToolError};
use crate::model::{DeviceRecord, Source};

/// Reads the directory's computer export from a CSV file.
#[instrument(level = "info", skip_all, fields(input = %path.display()))]
pub fn read_devices(path: &Path, config: &DirectoryConfig) -> Result<Vec<DeviceRecord>> {
    if !path.exists() {
        return Err(ToolError::unavailable(
            Source::Directory,
            format!("export {} not found", path.display()),
        ));
    }
    let data = fs::read_to_string(path).map_err(|err| ToolError::unavailable(Source::Directory, err))?;
    let devices = parse_devices(&data, config)?;
    info!(device_count = devices.len(), "read directory inventory");
    Ok(devices)
}

/// Parses CSV text with a header row. Lines starting with `#` (the
/// `#TYPE` preamble written by PowerShell's `Export-Csv`) are ignored.
pub fn parse_devices(data: &str, config: &DirectoryConfig) -> Result<Vec<DeviceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data.as_bytes());

    let name_idx = reader
        .headers()
        .map_err(|err| ToolError::unavailable(Source::Directory, err))?
        .iter()
        .position(|header| header == config.name_column)
        .ok_or_else(|| {
            ToolError::unavailable(
                Source::Directory,
                format!("missing column '{}'", config.name_column),
            )
        })?;

    let mut devices = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record.map_err(|err| ToolError::unavailable(Source::Directory, err))?;
        match record.get(name_idx) {
            Some(name) if !name.trim().is_empty() => {
                devices.push(DeviceRecord::new(name, Source::Directory));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, origin = "directory", "skipped records without a device name");
    }

    Ok(devices)
}
