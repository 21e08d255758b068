use std::path::PathBuf;

use thiserror::Error;

use crate::model::Source;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool gathers inventories, annotates the tracking workbook, or persists
/// reports.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the directory export cannot be parsed as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the TOML configuration file cannot be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Raised when a parsed configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when a column letter cannot be turned into a column index.
    #[error("invalid column reference '{0}'")]
    InvalidColumn(String),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when one of the three inventories could not be produced.
    #[error("{origin} inventory unavailable: {reason}")]
    SourceUnavailable { origin: Source, reason: String },

    /// Raised when the workbook, log, or JSON export cannot be persisted.
    #[error("failed to write {}: {reason}", path.display())]
    WriteFailure { path: PathBuf, reason: String },

    /// Raised when a tracked device points at a row that cannot hold status
    /// markers.
    #[error("device '{name}' has unusable row index {row_index}")]
    InvalidRow { name: String, row_index: u32 },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Wraps a collaborator failure as an unavailable inventory.
    pub fn unavailable(origin: Source, error: impl std::fmt::Display) -> Self {
        ToolError::SourceUnavailable {
            origin,
            reason: error.to_string(),
        }
    }

    /// Wraps a persistence failure for the given destination.
    pub fn write_failure(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        ToolError::WriteFailure {
            path: path.into(),
            reason: error.to_string(),
        }
    }
}
