//! Mining engine boundary
//!
//! The graph-mining and statistics primitives live behind [`MiningEngine`]:
//! the rest of the crate only shapes inputs and reshapes outputs.
//! [`DirectlyFollowsEngine`] is the in-process implementation used by default.

mod calendar;
mod directly_follows;

pub use calendar::business_seconds;
pub use directly_follows::DirectlyFollowsEngine;

use crate::error::Result;
use crate::log::Log;
use crate::process_map::metrics::{EdgeFrequency, EdgePerformance, FrequencyMap, MetricMap, PerformanceMap};
use serde::{Deserialize, Serialize};

/// Working day as [start hour, end hour)
pub type WorkHours = [u32; 2];

/// How the durations observed on one edge are summarized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Mean,
    Min,
    Max,
    Median,
}

impl Aggregation {
    /// Summarize `values`; `None` when there is nothing to summarize
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        match self {
            Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Aggregation::Min => values.iter().copied().reduce(f64::min),
            Aggregation::Max => values.iter().copied().reduce(f64::max),
            Aggregation::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
                } else {
                    Some(sorted[mid])
                }
            }
        }
    }
}

/// Trait for process mining backends
pub trait MiningEngine: Send + Sync {
    /// Directly-follows edge counts; with `keep_once_per_case` an edge counts
    /// at most once per case
    fn edge_frequency(&self, log: &Log, keep_once_per_case: bool) -> Result<FrequencyMap>;

    /// Aggregated time between directly-following events, in seconds
    ///
    /// `start_key` names the column holding start timestamps; when given the
    /// time runs from the source's end to the target's start.
    fn edge_performance(
        &self,
        log: &Log,
        aggregation: Aggregation,
        start_key: Option<&str>,
    ) -> Result<PerformanceMap>;

    /// Duration of every case in seconds, in case order
    fn case_durations(&self, log: &Log, business_hours: bool, work_hours: WorkHours)
        -> Result<Vec<f64>>;

    /// First activity of each case with the number of cases starting there
    fn start_activities(&self, log: &Log) -> Result<MetricMap<String, u64>>;

    /// Last activity of each case with the number of cases ending there
    fn end_activities(&self, log: &Log) -> Result<MetricMap<String, u64>>;

    /// Absolute and once-per-case frequencies together
    fn edge_frequencies(&self, log: &Log) -> Result<EdgeFrequency> {
        Ok(EdgeFrequency {
            absolute: self.edge_frequency(log, false)?,
            relative: self.edge_frequency(log, true)?,
        })
    }

    /// Edge performance under every aggregation
    fn edge_performances(&self, log: &Log, start_key: Option<&str>) -> Result<EdgePerformance> {
        Ok(EdgePerformance {
            mean: self.edge_performance(log, Aggregation::Mean, start_key)?,
            min: self.edge_performance(log, Aggregation::Min, start_key)?,
            max: self.edge_performance(log, Aggregation::Max, start_key)?,
            median: self.edge_performance(log, Aggregation::Median, start_key)?,
        })
    }
}
