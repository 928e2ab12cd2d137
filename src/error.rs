use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Flowmap
#[derive(Error, Debug)]
pub enum FlowmapError {
    /// A required semantic column is absent after renaming
    #[error(
        "Missing \"{column}\" column in {path}: rename your {} column to \"{column}\" \
         or pass a column map such as {}",
        describe_column(.column),
        suggested_column_map(.column, .column_map)
    )]
    MissingRequiredColumn {
        column: String,
        path: PathBuf,
        column_map: BTreeMap<String, String>,
    },

    /// A timestamp cell could not be parsed with the configured format
    #[error("Cannot parse timestamp {value:?} in column \"{column}\" at row {row} (format {format:?}): {source}")]
    TimestampParse {
        row: usize,
        column: String,
        value: String,
        format: String,
        source: chrono::ParseError,
    },

    /// Filter name outside the supported set
    #[error("Unknown filter: {name}")]
    UnknownFilter { name: String },

    /// Request is structurally unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested log file escapes the data directory
    #[error("File is outside the data directory: {file}")]
    FileOutsideDataDir { file: String },

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// CSV reader errors
    #[error("CSV error: {context}: {source}")]
    Csv { source: csv::Error, context: String },

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Human description of a canonical column, used in error hints
fn describe_column(column: &str) -> &'static str {
    match column {
        crate::log::TIMESTAMP => "end time",
        crate::log::CASE_ID => "case identifier",
        crate::log::ACTIVITY => "activity",
        crate::log::START_TIMESTAMP => "start time",
        crate::log::RESOURCE => "resource",
        _ => "matching",
    }
}

/// Column map the user could pass to fix a missing column
fn suggested_column_map(column: &str, column_map: &BTreeMap<String, String>) -> String {
    let mut suggested = column_map.clone();
    let placeholder = format!(
        "your_{}_column",
        describe_column(column).replace(' ', "_")
    );
    suggested.insert(placeholder, column.to_string());
    serde_json::to_string(&suggested).unwrap_or_default()
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for Flowmap operations
pub type Result<T> = std::result::Result<T, FlowmapError>;
