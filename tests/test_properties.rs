// Property tests for filter, map and distribution invariants
use chrono::{Duration, NaiveDate, NaiveDateTime};
use flowmap::engine::{DirectlyFollowsEngine, MiningEngine};
use flowmap::filters::{apply_filters, filter_timeframe, TimeframeMode};
use flowmap::log::{EventRecord, Log, ACTIVITY, CASE_ID, TIMESTAMP};
use flowmap::process_map::{self, BuildOptions, EdgeType, ProcessMapInputs};
use flowmap::statistics;
use proptest::prelude::*;
use std::collections::BTreeMap;

const ACTIVITIES: [&str; 4] = ["a", "b", "c", "d"];

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

// Strategy: up to 40 events spread over 6 cases and roughly a week
fn arb_log() -> impl Strategy<Value = Log> {
    prop::collection::vec((0usize..6, 0usize..ACTIVITIES.len(), 0i64..10_000), 0..40).prop_map(
        |rows| {
            let events = rows
                .into_iter()
                .map(|(case, activity, minutes)| EventRecord {
                    case_id: format!("case-{}", case),
                    activity: ACTIVITIES[activity].to_string(),
                    timestamp_end: base() + Duration::minutes(minutes),
                    timestamp_start: None,
                    resource: None,
                    attributes: BTreeMap::new(),
                })
                .collect();
            Log::new(
                vec![CASE_ID.into(), ACTIVITY.into(), TIMESTAMP.into()],
                events,
            )
        },
    )
}

fn arb_window() -> impl Strategy<Value = (NaiveDateTime, NaiveDateTime)> {
    (0i64..10_000, 0i64..5_000).prop_map(|(from, len)| {
        let start = base() + Duration::minutes(from);
        (start, start + Duration::minutes(len))
    })
}

fn case_ids(log: &Log) -> Vec<String> {
    log.cases().iter().map(|c| c.id.to_string()).collect()
}

fn inputs(log: &Log) -> ProcessMapInputs {
    let engine = DirectlyFollowsEngine::new();
    ProcessMapInputs {
        frequency: engine.edge_frequencies(log).unwrap(),
        performance: engine.edge_performances(log, None).unwrap(),
        nodes: process_map::node_performance(log),
    }
}

proptest! {
    #[test]
    fn prop_empty_pipeline_is_identity(log in arb_log()) {
        let outcome = apply_filters(&log, &[]).unwrap();
        prop_assert_eq!(outcome.log, log);
    }

    #[test]
    fn prop_trim_keeps_a_subset_inside_the_window(log in arb_log(), (start, end) in arb_window()) {
        let trimmed = filter_timeframe(&log, TimeframeMode::Trim, start, end);

        prop_assert!(trimmed.len() <= log.len());
        for event in trimmed.events() {
            prop_assert!(log.events().contains(event));
            prop_assert!(event.timestamp_end >= start && event.timestamp_end <= end);
        }
    }

    #[test]
    fn prop_contain_is_within_intersecting(log in arb_log(), (start, end) in arb_window()) {
        let contain = case_ids(&filter_timeframe(&log, TimeframeMode::Contain, start, end));
        let intersecting = case_ids(&filter_timeframe(&log, TimeframeMode::Intersecting, start, end));

        for id in &contain {
            prop_assert!(intersecting.contains(id));
        }
    }

    #[test]
    fn prop_case_level_modes_keep_whole_cases(log in arb_log(), (start, end) in arb_window()) {
        for mode in [TimeframeMode::Intersecting, TimeframeMode::CompletedIn, TimeframeMode::StartedIn] {
            let filtered = filter_timeframe(&log, mode, start, end);
            for case in filtered.cases() {
                let original = log.cases().into_iter().find(|c| c.id == case.id).unwrap();
                prop_assert_eq!(case.events.len(), original.events.len());
            }
        }
    }

    #[test]
    fn prop_threshold_is_monotonic(log in arb_log(), k in 1u64..5) {
        let inputs = inputs(&log);
        let loose = process_map::build(&inputs, &BuildOptions { min_edge_occurrences: k, ..BuildOptions::default() });
        let strict = process_map::build(&inputs, &BuildOptions { min_edge_occurrences: k + 1, ..BuildOptions::default() });

        prop_assert!(strict.edges.len() <= loose.edges.len());
        prop_assert!(strict.nodes.len() <= loose.nodes.len());
        for edge in &strict.edges {
            prop_assert!(loose.edges.contains(edge));
            prop_assert!(edge.metrics.frequency.absolute >= k + 1);
        }
    }

    #[test]
    fn prop_self_loop_iff_same_endpoints(log in arb_log(), register_targets in any::<bool>()) {
        let options = BuildOptions { register_target_nodes: register_targets, ..BuildOptions::default() };
        let network = process_map::build(&inputs(&log), &options);

        for edge in &network.edges {
            prop_assert_eq!(edge.edge_type == EdgeType::SelfLoop, edge.source == edge.target);
            prop_assert!(network.nodes.iter().any(|n| n.id == edge.source));
            prop_assert!(edge.metrics.frequency.relative <= edge.metrics.frequency.absolute);
        }
    }

    #[test]
    fn prop_normalize_stays_in_unit_interval(values in prop::collection::vec(-1e6f64..1e6, 0..50)) {
        let normalized = process_map::normalize(&values);

        prop_assert_eq!(normalized.len(), values.len());
        prop_assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn prop_histogram_integrates_to_one(durations in prop::collection::vec(0f64..1e7, 2..60), bins in 1usize..80) {
        let options = statistics::DistributionOptions { bin_count: bins, ..Default::default() };
        let distribution = statistics::compute(&durations, &options).unwrap();
        let histogram = distribution.histogram;

        prop_assert_eq!(histogram.bin_edges.len(), bins + 1);
        let area: f64 = histogram
            .density
            .iter()
            .zip(histogram.bin_edges.windows(2))
            .map(|(d, e)| d * (e[1] - e[0]))
            .sum();
        prop_assert!((area - 1.0).abs() < 1e-6);
        prop_assert_eq!(distribution.line.x.len(), bins * 4);
    }
}
