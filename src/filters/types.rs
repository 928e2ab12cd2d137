// Shared types for the filter pipeline
use crate::error::FlowmapError;
use crate::log::Log;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One entry of a request's filter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Closed set of supported filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Timeframe,
    Performance,
    Attribute,
    Endpoints,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Timeframe => "Timeframe",
            FilterKind::Performance => "Performance",
            FilterKind::Attribute => "Attribute",
            FilterKind::Endpoints => "Endpoints",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = FlowmapError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "Timeframe" => Ok(FilterKind::Timeframe),
            "Performance" => Ok(FilterKind::Performance),
            "Attribute" => Ok(FilterKind::Attribute),
            "Endpoints" => Ok(FilterKind::Endpoints),
            other => Err(FlowmapError::UnknownFilter {
                name: other.to_string(),
            }),
        }
    }
}

/// Reason a stage was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub filter: FilterKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(filter: FilterKind, message: impl Into<String>) -> Self {
        Self {
            filter,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} filter not applied: {}", self.filter, self.message)
    }
}

/// Outcome of a single stage: a new log, or the reason it was skipped
pub type StageResult = std::result::Result<Log, Diagnostic>;

/// Per-stage counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub filter: FilterKind,
    pub applied: bool,
    pub events_in: usize,
    pub events_out: usize,
}

/// Output of a full pipeline run
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub log: Log,
    pub diagnostics: Vec<Diagnostic>,
    pub stages: Vec<StageStats>,
    pub processing_time_ms: u64,
}

/// Deserialize a stage's settings, treating a missing value as empty settings
pub(crate) fn settings<T>(kind: FilterKind, value: &serde_json::Value) -> Result<T, Diagnostic>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }

    serde_json::from_value(value.clone())
        .map_err(|e| Diagnostic::new(kind, format!("malformed settings: {}", e)))
}
