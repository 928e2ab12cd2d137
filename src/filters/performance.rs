// Performance filter: keeps cases whose duration falls inside a range of days
use crate::filters::types::{Diagnostic, FilterKind, StageResult};
use crate::log::Log;
use serde::Deserialize;

pub const SECONDS_IN_DAY: f64 = 86_400.0;

/// Settings of the Performance filter (bounds in days)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceFilter {
    pub min_case_performance: Option<f64>,
    pub max_case_performance: Option<f64>,
}

impl PerformanceFilter {
    pub fn apply(&self, log: &Log) -> StageResult {
        let max_days = self.max_case_performance.ok_or_else(|| {
            Diagnostic::new(FilterKind::Performance, "no maxCasePerformance provided")
        })?;
        let min_days = self.min_case_performance.unwrap_or(0.0);

        Ok(filter_case_performance(
            log,
            min_days * SECONDS_IN_DAY,
            max_days * SECONDS_IN_DAY,
        ))
    }
}

/// Keep cases with `min_seconds <= duration <= max_seconds`
pub fn filter_case_performance(log: &Log, min_seconds: f64, max_seconds: f64) -> Log {
    log.retain_cases(|case| {
        let duration = case.duration_seconds();
        duration >= min_seconds && duration <= max_seconds
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::test_support::*;

    fn durations_log() -> Log {
        log_of(vec![
            // one day exactly
            event("short", "a", "2024-01-01 00:00:00"),
            event("short", "b", "2024-01-02 00:00:00"),
            // three days
            event("long", "a", "2024-01-01 00:00:00"),
            event("long", "b", "2024-01-04 00:00:00"),
            // single event, zero duration
            event("instant", "a", "2024-01-05 00:00:00"),
        ])
    }

    fn ids(log: &Log) -> Vec<String> {
        log.cases().iter().map(|c| c.id.to_string()).collect()
    }

    #[test]
    fn test_range_in_days_inclusive() {
        let filter = PerformanceFilter {
            min_case_performance: Some(1.0),
            max_case_performance: Some(3.0),
        };
        let kept = filter.apply(&durations_log()).unwrap();
        assert_eq!(ids(&kept), vec!["short", "long"]);
    }

    #[test]
    fn test_min_defaults_to_zero() {
        let filter = PerformanceFilter {
            min_case_performance: None,
            max_case_performance: Some(1.0),
        };
        let kept = filter.apply(&durations_log()).unwrap();
        assert_eq!(ids(&kept), vec!["short", "instant"]);
    }

    #[test]
    fn test_missing_max_is_noop() {
        let filter = PerformanceFilter {
            min_case_performance: Some(2.0),
            max_case_performance: None,
        };
        assert!(filter.apply(&durations_log()).is_err());
    }
}
