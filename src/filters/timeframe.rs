// Timeframe filter: keeps cases (or events) relative to a [start, end] window
use crate::filters::types::{Diagnostic, FilterKind, StageResult};
use crate::log::{Case, Log};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::str::FromStr;

/// Formats accepted for window bounds, tried in order after RFC 3339
const BOUND_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// How a case is judged against the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeframeMode {
    /// Any event inside the window
    Intersecting,
    /// Every event inside the window
    Contain,
    /// Every event at or before end, at least one at or after start
    CompletedIn,
    /// Every event at or after start, at least one at or before end
    StartedIn,
    /// Event-level: drop events outside the window
    Trim,
}

impl FromStr for TimeframeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intersecting" => Ok(TimeframeMode::Intersecting),
            "contain" => Ok(TimeframeMode::Contain),
            "completed_in" => Ok(TimeframeMode::CompletedIn),
            "started_in" => Ok(TimeframeMode::StartedIn),
            "trim" => Ok(TimeframeMode::Trim),
            other => Err(format!("unknown timeframe mode '{}'", other)),
        }
    }
}

/// Settings of the Timeframe filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeFilter {
    pub mode: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl TimeframeFilter {
    pub fn apply(&self, log: &Log) -> StageResult {
        let diagnostic = |message: String| Diagnostic::new(FilterKind::Timeframe, message);

        let mode: TimeframeMode = self
            .mode
            .as_deref()
            .ok_or_else(|| diagnostic("no mode provided".to_string()))?
            .parse()
            .map_err(diagnostic)?;

        let (start, end) = match (non_empty(&self.start_time), non_empty(&self.end_time)) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(diagnostic("startTime and endTime are both required".to_string())),
        };
        let start = parse_bound(start).map_err(diagnostic)?;
        let end = parse_bound(end).map_err(diagnostic)?;

        Ok(filter_timeframe(log, mode, start, end))
    }
}

/// Apply a timeframe `mode` over the end timestamps of `log`
pub fn filter_timeframe(
    log: &Log,
    mode: TimeframeMode,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Log {
    let after_start = |ts: &NaiveDateTime| *ts >= start;
    let before_end = |ts: &NaiveDateTime| *ts <= end;
    let within = |ts: &NaiveDateTime| after_start(ts) && before_end(ts);

    match mode {
        TimeframeMode::Intersecting => log.retain_cases(|c| any_event(c, &within)),
        TimeframeMode::Contain => log.retain_cases(|c| all_events(c, &within)),
        TimeframeMode::CompletedIn => {
            log.retain_cases(|c| all_events(c, &before_end) && any_event(c, &after_start))
        }
        TimeframeMode::StartedIn => {
            log.retain_cases(|c| all_events(c, &after_start) && any_event(c, &before_end))
        }
        TimeframeMode::Trim => log.retain_events(|e| within(&e.timestamp_end)),
    }
}

fn all_events(case: &Case<'_>, pred: impl Fn(&NaiveDateTime) -> bool) -> bool {
    case.events.iter().all(|e| pred(&e.timestamp_end))
}

fn any_event(case: &Case<'_>, pred: impl Fn(&NaiveDateTime) -> bool) -> bool {
    case.events.iter().any(|e| pred(&e.timestamp_end))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a window bound; RFC 3339 values are converted to UTC
pub fn parse_bound(value: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }

    for format in BOUND_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("cannot parse time bound '{}'", value))
}
