//! Metric maps exchanged between the mining engine and the map builder
//!
//! Every map remembers insertion order: the builder's node and edge order
//! follows the order in which the engine first produced each key.

use crate::log::Log;
use ahash::{HashMap, HashMapExt};
use std::hash::Hash;

/// Directly-follows edge key: (source activity, target activity)
pub type EdgeKey = (String, String);

/// Insertion-ordered map from a node or edge key to a metric value
#[derive(Debug, Clone)]
pub struct MetricMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> MetricMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or replace; a replaced key keeps its original position
    pub fn insert(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Mutable access, inserting `default()` on first sight
    pub fn entry_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derive a map with the same key order and transformed values
    pub fn map_values<W>(&self, f: impl Fn(&V) -> W) -> MetricMap<K, W> {
        self.iter().map(|(k, v)| (k.clone(), f(v))).collect()
    }
}

impl<K: Eq + Hash + Clone, V> Default for MetricMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V: PartialEq> PartialEq for MetricMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MetricMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Edge occurrence counts
pub type FrequencyMap = MetricMap<EdgeKey, u64>;
/// Edge or node durations in seconds
pub type PerformanceMap = MetricMap<EdgeKey, f64>;
/// Per-activity metric
pub type NodeMetricMap = MetricMap<String, f64>;

/// Absolute and once-per-case edge frequencies
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeFrequency {
    pub absolute: FrequencyMap,
    pub relative: FrequencyMap,
}

/// Edge performance under each aggregation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePerformance {
    pub mean: PerformanceMap,
    pub min: PerformanceMap,
    pub max: PerformanceMap,
    pub median: PerformanceMap,
}

/// Time spent on each activity (end minus start), plus normalized variants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePerformance {
    pub mean: NodeMetricMap,
    pub min: NodeMetricMap,
    pub max: NodeMetricMap,
    pub norm_mean: NodeMetricMap,
    pub norm_min: NodeMetricMap,
    pub norm_max: NodeMetricMap,
}

impl NodePerformance {
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
            && self.min.is_empty()
            && self.max.is_empty()
            && self.norm_mean.is_empty()
            && self.norm_min.is_empty()
            && self.norm_max.is_empty()
    }
}

/// Min-max normalization to [0, 1]
///
/// A constant series maps to all zeros.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|v| {
            if range > 0.0 && range.is_finite() {
                (v - min) / range
            } else {
                0.0
            }
        })
        .collect()
}

/// Normalize the values of a node map, keeping key order
pub fn normalize_map(map: &NodeMetricMap) -> NodeMetricMap {
    let values: Vec<f64> = map.iter().map(|(_, v)| *v).collect();
    map.keys()
        .cloned()
        .zip(normalize(&values))
        .collect()
}

/// Per-activity service time from start and end timestamps
///
/// Empty unless every event carries a start timestamp.
pub fn node_performance(log: &Log) -> NodePerformance {
    if !log.has_start_timestamps() {
        return NodePerformance::default();
    }

    let mut spent: MetricMap<String, Vec<f64>> = MetricMap::new();
    for event in log.events() {
        if let Some(start) = event.timestamp_start {
            let seconds = (event.timestamp_end - start).num_milliseconds() as f64 / 1000.0;
            spent
                .entry_or_insert_with(event.activity.clone(), Vec::new)
                .push(seconds);
        }
    }

    let mean = spent.map_values(|v| v.iter().sum::<f64>() / v.len() as f64);
    let min = spent.map_values(|v| v.iter().copied().fold(f64::INFINITY, f64::min));
    let max = spent.map_values(|v| v.iter().copied().fold(f64::NEG_INFINITY, f64::max));

    NodePerformance {
        norm_mean: normalize_map(&mean),
        norm_min: normalize_map(&min),
        norm_max: normalize_map(&max),
        mean,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::test_support::*;

    #[test]
    fn test_metric_map_keeps_insertion_order() {
        let mut map: MetricMap<String, u64> = MetricMap::new();
        map.insert("b".into(), 1);
        map.insert("a".into(), 2);
        map.insert("b".into(), 3);

        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map.get(&"b".to_string()), Some(&3));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_normalize_series() {
        assert_eq!(normalize(&[0.0, 50.0, 100.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(normalize(&[4.0, 1.0, 2.0]), vec![1.0, 0.0, 1.0 / 3.0]);
    }

    #[test]
    fn test_normalize_constant_and_empty() {
        assert_eq!(normalize(&[7.0, 7.0]), vec![0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_node_performance_from_start_times() {
        let mut a1 = event("c1", "a", "2024-01-01 09:10:00");
        a1.timestamp_start = Some(ts("2024-01-01 09:00:00"));
        let mut a2 = event("c2", "a", "2024-01-01 10:30:00");
        a2.timestamp_start = Some(ts("2024-01-01 10:00:00"));
        let mut b1 = event("c1", "b", "2024-01-01 11:05:00");
        b1.timestamp_start = Some(ts("2024-01-01 11:00:00"));
        let log = log_of(vec![a1, a2, b1]);

        let perf = node_performance(&log);
        let a = "a".to_string();
        let b = "b".to_string();
        assert_eq!(perf.mean.get(&a), Some(&1200.0));
        assert_eq!(perf.min.get(&a), Some(&600.0));
        assert_eq!(perf.max.get(&a), Some(&1800.0));
        assert_eq!(perf.mean.get(&b), Some(&300.0));
        assert_eq!(perf.norm_mean.get(&a), Some(&1.0));
        assert_eq!(perf.norm_mean.get(&b), Some(&0.0));
    }

    #[test]
    fn test_node_performance_requires_start_times() {
        let log = log_of(vec![event("c1", "a", "2024-01-01 09:10:00")]);
        assert!(node_performance(&log).is_empty());
    }
}
