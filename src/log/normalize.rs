// Validation and reshaping of a raw table into the canonical log schema
use crate::error::{FlowmapError, Result};
use crate::log::{
    EventRecord, Log, RawTable, ACTIVITY, CASE_ID, RESOURCE, START_TIMESTAMP, TIMESTAMP,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Columns every log must provide after renaming
const REQUIRED_COLUMNS: [&str; 3] = [TIMESTAMP, CASE_ID, ACTIVITY];

/// Keep only rows whose raw `column` equals `equals` (applied before renaming)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub equals: String,
}

impl RowFilter {
    fn matches(&self, index: usize, row: &[String]) -> bool {
        row.get(index).is_some_and(|v| v == &self.equals)
    }
}

/// Parsing policy for [`normalize`]
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// chrono format string for both timestamp columns
    pub timestamp_format: String,
    pub row_filter: Option<RowFilter>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            row_filter: None,
        }
    }
}

/// Non-fatal notice that an optional column is missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingOptionalColumnWarning {
    pub column: String,
    pub rationale: String,
}

impl std::fmt::Display for MissingOptionalColumnWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Missing optional column \"{}\": {}", self.column, self.rationale)
    }
}

/// Output of [`normalize`]
#[derive(Debug, Clone)]
pub struct Normalized {
    pub log: Log,
    pub warnings: Vec<MissingOptionalColumnWarning>,
}

/// Read a log file from disk and normalize it
pub fn load_log(
    path: &Path,
    delimiter: u8,
    column_map: &BTreeMap<String, String>,
    options: &NormalizeOptions,
) -> Result<Normalized> {
    let table = RawTable::from_csv_path(path, delimiter)?;
    normalize(&table, column_map, options)
}

/// Validate `raw` against the canonical schema and build a sorted [`Log`]
///
/// `column_map` renames raw columns (raw name -> canonical name). The row
/// filter, if any, is evaluated against raw column names. `raw` is left untouched.
pub fn normalize(
    raw: &RawTable,
    column_map: &BTreeMap<String, String>,
    options: &NormalizeOptions,
) -> Result<Normalized> {
    let columns: Vec<String> = raw
        .headers
        .iter()
        .map(|h| column_map.get(h).cloned().unwrap_or_else(|| h.clone()))
        .collect();
    let position = |name: &str| columns.iter().position(|c| c == name);

    for required in REQUIRED_COLUMNS {
        if position(required).is_none() {
            return Err(FlowmapError::MissingRequiredColumn {
                column: required.to_string(),
                path: raw.source.clone(),
                column_map: column_map.clone(),
            });
        }
    }

    let mut warnings = Vec::new();
    if position(START_TIMESTAMP).is_none() {
        let warning = MissingOptionalColumnWarning {
            column: START_TIMESTAMP.to_string(),
            rationale: "without a start time column the duration of an activity cannot be \
                        calculated; only the time between activities will be"
                .to_string(),
        };
        tracing::warn!("{}", warning);
        warnings.push(warning);
    }

    let end_idx = position(TIMESTAMP);
    let case_idx = position(CASE_ID);
    let activity_idx = position(ACTIVITY);
    let start_idx = position(START_TIMESTAMP);
    let resource_idx = position(RESOURCE);
    let row_filter = match &options.row_filter {
        Some(filter) => match raw.column_index(&filter.column) {
            Some(idx) => Some((filter, idx)),
            None => {
                return Err(FlowmapError::InvalidConfigValue {
                    path: "row_filter.column".to_string(),
                    message: format!(
                        "Row filter column \"{}\" not found in {}",
                        filter.column,
                        raw.source.display()
                    ),
                })
            }
        },
        None => None,
    };

    let mut events = Vec::with_capacity(raw.rows.len());
    let mut filtered_out = 0usize;
    let mut incomplete = 0usize;

    for (i, row) in raw.rows.iter().enumerate() {
        // Header is line 1
        let line = i + 2;

        if let Some((filter, idx)) = row_filter {
            if !filter.matches(idx, row) {
                filtered_out += 1;
                continue;
            }
        }

        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(|v| v.trim());

        let case_id = cell(case_idx).unwrap_or_default();
        let activity = cell(activity_idx).unwrap_or_default();
        if case_id.is_empty() || activity.is_empty() {
            incomplete += 1;
            continue;
        }

        let timestamp_end = parse_timestamp(
            cell(end_idx).unwrap_or_default(),
            line,
            TIMESTAMP,
            &options.timestamp_format,
        )?;
        let timestamp_start = match cell(start_idx) {
            Some(v) if !v.is_empty() => Some(parse_timestamp(
                v,
                line,
                START_TIMESTAMP,
                &options.timestamp_format,
            )?),
            _ => None,
        };
        let resource = cell(resource_idx)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let attributes = columns
            .iter()
            .zip(row.iter())
            .filter(|(name, _)| !is_canonical(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        events.push(EventRecord {
            case_id: case_id.to_string(),
            activity: activity.to_string(),
            timestamp_end,
            timestamp_start,
            resource,
            attributes,
        });
    }

    if filtered_out > 0 {
        tracing::debug!("Row filter dropped {} rows", filtered_out);
    }
    if incomplete > 0 {
        tracing::warn!(
            "Dropped {} rows without a case id or activity from {}",
            incomplete,
            raw.source.display()
        );
    }

    let log = Log::new(columns, events);
    tracing::debug!(
        "Normalized {} events in {} cases from {}",
        log.len(),
        log.case_count(),
        raw.source.display()
    );

    Ok(Normalized { log, warnings })
}

fn is_canonical(column: &str) -> bool {
    matches!(
        column,
        CASE_ID | ACTIVITY | TIMESTAMP | START_TIMESTAMP | RESOURCE
    )
}

fn parse_timestamp(value: &str, row: usize, column: &str, format: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format).map_err(|source| FlowmapError::TimestampParse {
        row,
        column: column.to_string(),
        value: value.to_string(),
        format: format.to_string(),
        source,
    })
}
