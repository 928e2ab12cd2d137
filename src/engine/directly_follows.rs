// In-process directly-follows miner
use crate::engine::{business_seconds, Aggregation, MiningEngine, WorkHours};
use crate::error::Result;
use crate::log::{Case, EventRecord, Log, START_TIMESTAMP};
use crate::process_map::metrics::{EdgeKey, FrequencyMap, MetricMap, PerformanceMap};
use ahash::HashSet;

/// First-order directly-follows miner over a canonical log
///
/// Edges are adjacent event pairs within a case in log order. Map order is
/// the order in which each key is first observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectlyFollowsEngine;

impl DirectlyFollowsEngine {
    pub fn new() -> Self {
        Self
    }

    fn pairs<'a>(case: &'a Case<'a>) -> impl Iterator<Item = (&'a EventRecord, &'a EventRecord)> + 'a {
        case.events.windows(2).map(|w| (w[0], w[1]))
    }

    fn key(source: &EventRecord, target: &EventRecord) -> EdgeKey {
        (source.activity.clone(), target.activity.clone())
    }

    fn endpoint_counts<'a>(
        log: &'a Log,
        pick: impl Fn(&Case<'a>) -> Option<&'a EventRecord>,
    ) -> MetricMap<String, u64> {
        let mut counts = MetricMap::new();
        for case in log.cases() {
            if let Some(event) = pick(&case) {
                *counts.entry_or_insert_with(event.activity.clone(), || 0) += 1;
            }
        }
        counts
    }
}

impl MiningEngine for DirectlyFollowsEngine {
    fn edge_frequency(&self, log: &Log, keep_once_per_case: bool) -> Result<FrequencyMap> {
        let mut counts = FrequencyMap::new();

        for case in log.cases() {
            let mut seen_in_case: HashSet<EdgeKey> = HashSet::default();
            for (source, target) in Self::pairs(&case) {
                let key = Self::key(source, target);
                if keep_once_per_case && !seen_in_case.insert(key.clone()) {
                    continue;
                }
                *counts.entry_or_insert_with(key, || 0) += 1;
            }
        }

        Ok(counts)
    }

    fn edge_performance(
        &self,
        log: &Log,
        aggregation: Aggregation,
        start_key: Option<&str>,
    ) -> Result<PerformanceMap> {
        let use_start = match start_key {
            Some(START_TIMESTAMP) => true,
            Some(other) => {
                tracing::debug!("Unsupported start key {}, using end timestamps", other);
                false
            }
            None => false,
        };

        let mut observed: MetricMap<EdgeKey, Vec<f64>> = MetricMap::new();
        for case in log.cases() {
            for (source, target) in Self::pairs(&case) {
                let target_ts = if use_start {
                    target.timestamp_start.unwrap_or(target.timestamp_end)
                } else {
                    target.timestamp_end
                };
                let seconds =
                    ((target_ts - source.timestamp_end).num_milliseconds() as f64 / 1000.0).max(0.0);

                observed
                    .entry_or_insert_with(Self::key(source, target), Vec::new)
                    .push(seconds);
            }
        }

        Ok(observed
            .iter()
            .filter_map(|(key, values)| aggregation.apply(values).map(|v| (key.clone(), v)))
            .collect())
    }

    fn case_durations(
        &self,
        log: &Log,
        business_hours: bool,
        work_hours: WorkHours,
    ) -> Result<Vec<f64>> {
        Ok(log
            .cases()
            .iter()
            .map(|case| match case.time_span() {
                Some((first, last)) if business_hours => business_seconds(first, last, work_hours),
                Some(_) => case.duration_seconds(),
                None => 0.0,
            })
            .collect())
    }

    fn start_activities(&self, log: &Log) -> Result<MetricMap<String, u64>> {
        Ok(Self::endpoint_counts(log, |case| case.first()))
    }

    fn end_activities(&self, log: &Log) -> Result<MetricMap<String, u64>> {
        Ok(Self::endpoint_counts(log, |case| case.last()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::test_support::*;

    fn key(a: &str, b: &str) -> EdgeKey {
        (a.to_string(), b.to_string())
    }

    // c1: a -> b -> a -> b, c2: a -> b -> c
    fn loop_log() -> Log {
        log_of(vec![
            event("c1", "a", "2024-01-01 08:00:00"),
            event("c1", "b", "2024-01-01 08:10:00"),
            event("c1", "a", "2024-01-01 08:20:00"),
            event("c1", "b", "2024-01-01 08:50:00"),
            event("c2", "a", "2024-01-02 08:00:00"),
            event("c2", "b", "2024-01-02 09:00:00"),
            event("c2", "c", "2024-01-02 09:30:00"),
        ])
    }

    #[test]
    fn test_absolute_and_once_per_case_frequency() {
        let engine = DirectlyFollowsEngine::new();
        let absolute = engine.edge_frequency(&loop_log(), false).unwrap();
        let relative = engine.edge_frequency(&loop_log(), true).unwrap();

        assert_eq!(absolute.get(&key("a", "b")), Some(&3));
        assert_eq!(absolute.get(&key("b", "a")), Some(&1));
        assert_eq!(absolute.get(&key("b", "c")), Some(&1));
        assert_eq!(relative.get(&key("a", "b")), Some(&2));

        let order: Vec<&EdgeKey> = absolute.keys().collect();
        assert_eq!(order, vec![&key("a", "b"), &key("b", "a"), &key("b", "c")]);
    }

    #[test]
    fn test_edge_performance_aggregations() {
        let engine = DirectlyFollowsEngine::new();
        let log = loop_log();

        // a -> b observed after 600s, 1800s and 3600s
        let ab = key("a", "b");
        let mean = engine.edge_performance(&log, Aggregation::Mean, None).unwrap();
        let median = engine.edge_performance(&log, Aggregation::Median, None).unwrap();
        let max = engine.edge_performance(&log, Aggregation::Max, None).unwrap();
        assert_eq!(mean.get(&ab), Some(&2000.0));
        assert_eq!(median.get(&ab), Some(&1800.0));
        assert_eq!(max.get(&ab), Some(&3600.0));
    }

    #[test]
    fn test_edge_performance_with_start_key_clips_overlap() {
        let mut a = event("c1", "a", "2024-01-01 09:00:00");
        a.timestamp_start = Some(ts("2024-01-01 08:00:00"));
        let mut b = event("c1", "b", "2024-01-01 10:00:00");
        b.timestamp_start = Some(ts("2024-01-01 09:15:00"));
        let mut c = event("c1", "c", "2024-01-01 10:30:00");
        // starts before b ends
        c.timestamp_start = Some(ts("2024-01-01 09:30:00"));
        let log = log_of(vec![a, b, c]);

        let engine = DirectlyFollowsEngine::new();
        let mean = engine
            .edge_performance(&log, Aggregation::Mean, Some(START_TIMESTAMP))
            .unwrap();
        assert_eq!(mean.get(&key("a", "b")), Some(&900.0));
        // sorted by start: a(08:00), b(09:15), c(09:30)
        assert_eq!(mean.get(&key("b", "c")), Some(&0.0));
    }

    #[test]
    fn test_case_durations() {
        let engine = DirectlyFollowsEngine::new();
        let log = loop_log();

        let calendar = engine.case_durations(&log, false, [9, 17]).unwrap();
        assert_eq!(calendar, vec![3000.0, 5400.0]);

        // 2024-01-02 08:00 -> 09:30 only counts from 09:00
        let business = engine.case_durations(&log, true, [9, 17]).unwrap();
        assert_eq!(business, vec![0.0, 1800.0]);
    }

    #[test]
    fn test_start_and_end_activities() {
        let engine = DirectlyFollowsEngine::new();
        let starts = engine.start_activities(&loop_log()).unwrap();
        let ends = engine.end_activities(&loop_log()).unwrap();

        assert_eq!(starts.get(&"a".to_string()), Some(&2));
        assert_eq!(starts.len(), 1);
        assert_eq!(ends.get(&"b".to_string()), Some(&1));
        assert_eq!(ends.get(&"c".to_string()), Some(&1));
    }
}
