// Attribute filter: keep or exclude cases/events by the values of one column
use crate::filters::types::{Diagnostic, FilterKind, StageResult};
use crate::log::Log;
use ahash::HashSet;
use serde::Deserialize;

/// Granularity of the attribute filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMode {
    /// Case-level: judge the whole case by whether any event matches
    Contain,
    /// Event-level: judge each event on its own
    Trim,
}

/// Settings of the Attribute filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    /// Values to match; numbers and booleans are compared by their text form
    pub selected: Option<Vec<serde_json::Value>>,
    pub filter_column: Option<String>,
    pub inverse: Option<bool>,
    pub mode: Option<String>,
}

impl AttributeFilter {
    pub fn apply(&self, log: &Log) -> StageResult {
        let diagnostic = |message: String| Diagnostic::new(FilterKind::Attribute, message);

        let selected = match &self.selected {
            Some(values) if !values.is_empty() => values,
            _ => return Err(diagnostic("no selected values provided".to_string())),
        };
        let column = match self.filter_column.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => return Err(diagnostic("no filterColumn provided".to_string())),
        };
        let mode = match self.mode.as_deref().unwrap_or("contain") {
            "contain" => AttributeMode::Contain,
            "trim" => AttributeMode::Trim,
            other => return Err(diagnostic(format!("unknown attribute mode '{}'", other))),
        };

        let values: Vec<String> = selected.iter().map(value_text).collect();
        Ok(filter_attribute(
            log,
            column,
            &values,
            mode,
            self.inverse.unwrap_or(false),
        ))
    }
}

/// Keep (or with `inverse`, drop) cases/events whose `column` is one of `values`
pub fn filter_attribute(
    log: &Log,
    column: &str,
    values: &[String],
    mode: AttributeMode,
    inverse: bool,
) -> Log {
    let wanted: HashSet<&str> = values.iter().map(String::as_str).collect();
    let matches = |e: &crate::log::EventRecord| {
        e.attribute(column)
            .is_some_and(|v| wanted.contains(v.as_ref()))
    };

    match mode {
        AttributeMode::Contain => {
            log.retain_cases(|case| case.events.iter().any(|e| matches(e)) != inverse)
        }
        AttributeMode::Trim => log.retain_events(|e| matches(e) != inverse),
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::test_support::*;

    fn regional_log() -> Log {
        let mut events = vec![
            event("c1", "a", "2024-01-01 08:00:00"),
            event("c1", "b", "2024-01-01 09:00:00"),
            event("c2", "a", "2024-01-01 10:00:00"),
            event("c2", "b", "2024-01-01 11:00:00"),
        ];
        for (e, region) in events.iter_mut().zip(["North", "South", "South", "South"]) {
            e.attributes.insert("Region".into(), region.into());
        }
        log_of(events)
    }

    fn ids(log: &Log) -> Vec<String> {
        log.cases().iter().map(|c| c.id.to_string()).collect()
    }

    fn filter(values: &[&str], inverse: bool, mode: &str) -> AttributeFilter {
        AttributeFilter {
            selected: Some(values.iter().map(|v| serde_json::json!(v)).collect()),
            filter_column: Some("Region".into()),
            inverse: Some(inverse),
            mode: Some(mode.into()),
        }
    }

    #[test]
    fn test_contain_keeps_whole_case() {
        let kept = filter(&["North"], false, "contain").apply(&regional_log()).unwrap();
        assert_eq!(ids(&kept), vec!["c1"]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_contain_inverse_excludes_case() {
        let kept = filter(&["North"], true, "contain").apply(&regional_log()).unwrap();
        assert_eq!(ids(&kept), vec!["c2"]);
    }

    #[test]
    fn test_trim_keeps_matching_events() {
        let kept = filter(&["South"], false, "trim").apply(&regional_log()).unwrap();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept.cases()[0].trace(), vec!["b"]);
    }

    #[test]
    fn test_trim_inverse_drops_matching_events() {
        let kept = filter(&["South"], true, "trim").apply(&regional_log()).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.events()[0].activity, "a");
    }

    #[test]
    fn test_canonical_column_and_numeric_values() {
        let mut log_events = vec![
            event("1", "a", "2024-01-01 08:00:00"),
            event("2", "a", "2024-01-01 09:00:00"),
        ];
        log_events[0].attributes.insert("Priority".into(), "3".into());
        let log = log_of(log_events);

        let by_activity = AttributeFilter {
            selected: Some(vec![serde_json::json!("a")]),
            filter_column: Some(crate::log::ACTIVITY.into()),
            ..AttributeFilter::default()
        };
        assert_eq!(by_activity.apply(&log).unwrap().len(), 2);

        let by_number = AttributeFilter {
            selected: Some(vec![serde_json::json!(3)]),
            filter_column: Some("Priority".into()),
            ..AttributeFilter::default()
        };
        assert_eq!(ids(&by_number.apply(&log).unwrap()), vec!["1"]);
    }

    #[test]
    fn test_missing_settings_are_diagnostics() {
        let no_column = AttributeFilter {
            selected: Some(vec![serde_json::json!("x")]),
            ..AttributeFilter::default()
        };
        assert!(no_column.apply(&regional_log()).is_err());

        let no_values = AttributeFilter {
            filter_column: Some("Region".into()),
            selected: Some(vec![]),
            ..AttributeFilter::default()
        };
        assert!(no_values.apply(&regional_log()).is_err());
    }
}
