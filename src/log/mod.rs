//! Canonical event log
//!
//! A [`Log`] is an immutable, chronologically sorted sequence of
//! [`EventRecord`]s produced once per request by [`normalize`]. Filters never
//! mutate a log in place; they derive a new one through [`Log::retain_cases`]
//! or [`Log::retain_events`].

mod normalize;
mod table;

pub use normalize::{load_log, normalize, MissingOptionalColumnWarning, NormalizeOptions, Normalized, RowFilter};
pub use table::RawTable;

use ahash::{HashMap, HashMapExt};
use chrono::NaiveDateTime;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Case identifier column
pub const CASE_ID: &str = "case:concept:name";
/// Activity name column
pub const ACTIVITY: &str = "concept:name";
/// End timestamp column
pub const TIMESTAMP: &str = "time:timestamp";
/// Optional start timestamp column
pub const START_TIMESTAMP: &str = "time:timestamp:start";
/// Optional resource column
pub const RESOURCE: &str = "org:resource";

/// Format used when a timestamp is rendered back to text
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recorded activity transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub case_id: String,
    pub activity: String,
    pub timestamp_end: NaiveDateTime,
    pub timestamp_start: Option<NaiveDateTime>,
    pub resource: Option<String>,
    /// Every non-canonical column, keyed by its (renamed) column name
    pub attributes: BTreeMap<String, String>,
}

impl EventRecord {
    /// Value of `column` for this event, canonical columns included
    pub fn attribute(&self, column: &str) -> Option<Cow<'_, str>> {
        match column {
            CASE_ID => Some(Cow::Borrowed(&self.case_id)),
            ACTIVITY => Some(Cow::Borrowed(&self.activity)),
            RESOURCE => self.resource.as_deref().map(Cow::Borrowed),
            TIMESTAMP => Some(Cow::Owned(
                self.timestamp_end
                    .format(DISPLAY_TIMESTAMP_FORMAT)
                    .to_string(),
            )),
            START_TIMESTAMP => self
                .timestamp_start
                .map(|ts| Cow::Owned(ts.format(DISPLAY_TIMESTAMP_FORMAT).to_string())),
            other => self.attributes.get(other).map(|v| Cow::Borrowed(v.as_str())),
        }
    }

    /// Key the log is ordered by
    fn sort_key(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.timestamp_start.unwrap_or(self.timestamp_end),
            self.timestamp_end,
        )
    }
}

/// All events sharing one case id, in log order
#[derive(Debug, Clone)]
pub struct Case<'a> {
    pub id: &'a str,
    pub events: Vec<&'a EventRecord>,
}

impl<'a> Case<'a> {
    pub fn first(&self) -> Option<&'a EventRecord> {
        self.events.first().copied()
    }

    pub fn last(&self) -> Option<&'a EventRecord> {
        self.events.last().copied()
    }

    /// Earliest and latest end timestamp of the case
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.events.iter().map(|e| e.timestamp_end).min()?;
        let max = self.events.iter().map(|e| e.timestamp_end).max()?;
        Some((min, max))
    }

    /// Case duration in seconds (latest minus earliest end timestamp)
    pub fn duration_seconds(&self) -> f64 {
        self.time_span()
            .map(|(min, max)| (max - min).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Activity names in event order
    pub fn trace(&self) -> Vec<&'a str> {
        self.events.iter().map(|e| e.activity.as_str()).collect()
    }
}

/// Ordered, immutable event log
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Log {
    columns: Vec<String>,
    events: Vec<EventRecord>,
}

impl Log {
    /// Build a log, sorting events by (start or end timestamp, end timestamp)
    pub fn new(columns: Vec<String>, mut events: Vec<EventRecord>) -> Self {
        events.sort_by_key(EventRecord::sort_key);
        Self { columns, events }
    }

    /// Derive a log that keeps this log's schema but carries `events`
    ///
    /// `events` must already be in log order (they come from this log).
    fn derive(&self, events: Vec<EventRecord>) -> Self {
        Self {
            columns: self.columns.clone(),
            events,
        }
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Column names after renaming, in source order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True when every event carries a start timestamp
    pub fn has_start_timestamps(&self) -> bool {
        !self.events.is_empty() && self.events.iter().all(|e| e.timestamp_start.is_some())
    }

    /// Group events by case id, cases in order of first appearance
    pub fn cases(&self) -> Vec<Case<'_>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut cases: Vec<Case<'_>> = Vec::new();

        for event in &self.events {
            let slot = *index.entry(event.case_id.as_str()).or_insert_with(|| {
                cases.push(Case {
                    id: event.case_id.as_str(),
                    events: Vec::new(),
                });
                cases.len() - 1
            });
            cases[slot].events.push(event);
        }

        cases
    }

    pub fn case_count(&self) -> usize {
        self.cases().len()
    }

    /// Keep whole cases for which `keep` holds
    pub fn retain_cases(&self, keep: impl Fn(&Case<'_>) -> bool) -> Log {
        let kept: ahash::HashSet<&str> = self
            .cases()
            .iter()
            .filter(|case| keep(case))
            .map(|case| case.id)
            .collect();

        let events = self
            .events
            .iter()
            .filter(|e| kept.contains(e.case_id.as_str()))
            .cloned()
            .collect();

        self.derive(events)
    }

    /// Keep individual events for which `keep` holds
    pub fn retain_events(&self, keep: impl Fn(&EventRecord) -> bool) -> Log {
        let events = self.events.iter().filter(|e| keep(e)).cloned().collect();
        self.derive(events)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DISPLAY_TIMESTAMP_FORMAT).unwrap()
    }

    pub fn event(case_id: &str, activity: &str, end: &str) -> EventRecord {
        EventRecord {
            case_id: case_id.to_string(),
            activity: activity.to_string(),
            timestamp_end: ts(end),
            timestamp_start: None,
            resource: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn log_of(events: Vec<EventRecord>) -> Log {
        Log::new(
            vec![CASE_ID.into(), ACTIVITY.into(), TIMESTAMP.into()],
            events,
        )
    }
}
