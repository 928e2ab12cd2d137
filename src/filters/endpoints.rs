// Endpoints filter: keeps cases by their first and last activity
use crate::filters::types::StageResult;
use crate::log::Log;
use ahash::HashSet;
use serde::Deserialize;

/// Settings of the Endpoints filter; an absent or empty list skips that half
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsFilter {
    pub start_activities: Option<Vec<String>>,
    pub end_activities: Option<Vec<String>>,
}

impl EndpointsFilter {
    pub fn apply(&self, log: &Log) -> StageResult {
        let mut log = log.clone();

        if let Some(starts) = non_empty(&self.start_activities) {
            log = filter_start_activities(&log, starts);
        }
        if let Some(ends) = non_empty(&self.end_activities) {
            log = filter_end_activities(&log, ends);
        }

        Ok(log)
    }
}

fn non_empty(list: &Option<Vec<String>>) -> Option<&[String]> {
    list.as_deref().filter(|l| !l.is_empty())
}

/// Keep cases whose first event's activity is in `activities`
pub fn filter_start_activities(log: &Log, activities: &[String]) -> Log {
    let allowed: HashSet<&str> = activities.iter().map(String::as_str).collect();
    log.retain_cases(|case| {
        case.first()
            .is_some_and(|e| allowed.contains(e.activity.as_str()))
    })
}

/// Keep cases whose last event's activity is in `activities`
pub fn filter_end_activities(log: &Log, activities: &[String]) -> Log {
    let allowed: HashSet<&str> = activities.iter().map(String::as_str).collect();
    log.retain_cases(|case| {
        case.last()
            .is_some_and(|e| allowed.contains(e.activity.as_str()))
    })
}
