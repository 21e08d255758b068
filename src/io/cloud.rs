use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::model::{DeviceRecord, DeviceStatus, Source};

/// Device object as exported from the device-management platform. Only the
/// fields the reconciliation needs are typed; everything else is carried as
/// extended attributes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudDevicePayload {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    system_name: Option<String>,
    #[serde(default)]
    offline: Option<bool>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Reads a cloud device export (a JSON array of device objects).
#[instrument(level = "info", skip_all, fields(input = %path.display()))]
pub fn read_devices(path: &Path) -> Result<Vec<DeviceRecord>> {
    if !path.exists() {
        return Err(ToolError::unavailable(
            Source::Cloud,
            format!("export {} not found", path.display()),
        ));
    }
    let source = fs::read_to_string(path).map_err(|err| ToolError::unavailable(Source::Cloud, err))?;
    let json: Value =
        serde_json::from_str(&source).map_err(|err| ToolError::unavailable(Source::Cloud, err))?;
    let devices = parse_devices(json)?;
    info!(device_count = devices.len(), "read cloud inventory");
    Ok(devices)
}

/// Normalises a parsed export into cloud records, skipping devices without a
/// system name.
pub fn parse_devices(json: Value) -> Result<Vec<DeviceRecord>> {
    let Value::Array(items) = json else {
        return Err(ToolError::unavailable(
            Source::Cloud,
            "expected a JSON array of devices",
        ));
    };

    let mut devices = Vec::with_capacity(items.len());
    let mut skipped = 0usize;

    for item in items {
        let payload: CloudDevicePayload =
            serde_json::from_value(item).map_err(|err| ToolError::unavailable(Source::Cloud, err))?;
        match normalize(payload) {
            Some(record) => devices.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, origin = "cloud", "skipped records without a device name");
    }

    Ok(devices)
}

fn normalize(payload: CloudDevicePayload) -> Option<DeviceRecord> {
    let name = payload.system_name.filter(|name| !name.trim().is_empty())?;
    let mut record = DeviceRecord::cloud(name, DeviceStatus::from_offline_flag(payload.offline));

    if let Some(id) = payload.id.as_ref().and_then(scalar_text) {
        record.insert_attribute("id", id);
    }

    for (key, value) in &payload.extra {
        match value {
            Value::Object(fields) => {
                for (child, nested) in fields {
                    if let Some(text) = scalar_text(nested) {
                        record.insert_attribute(format!("{key}.{child}"), text);
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    record.insert_attribute(key.clone(), text);
                }
            }
        }
    }

    Some(record)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
