// Composable filter pipeline over the canonical log
//
// Timeframe:   case- or event-level time window
// Performance: case duration range in days
// Attribute:   keep/exclude by column values
// Endpoints:   first/last activity of each case

mod attribute;
mod endpoints;
mod performance;
mod timeframe;
mod types;

pub use attribute::{filter_attribute, AttributeFilter, AttributeMode};
pub use endpoints::{filter_end_activities, filter_start_activities, EndpointsFilter};
pub use performance::{filter_case_performance, PerformanceFilter, SECONDS_IN_DAY};
pub use timeframe::{filter_timeframe, parse_bound, TimeframeFilter, TimeframeMode};
pub use types::{
    Diagnostic, FilterKind, FilterOutcome, FilterSpec, StageResult, StageStats,
};

use crate::error::Result;
use crate::log::Log;
use std::time::Instant;

/// Ordered list of filter stages
///
/// Construction fails fast on unknown filter names; malformed settings of a
/// known filter only surface as a [`Diagnostic`] when the stage runs.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    stages: Vec<(FilterKind, serde_json::Value)>,
}

impl FilterPipeline {
    /// Build a pipeline from request filter specs
    pub fn from_specs(specs: &[FilterSpec]) -> Result<Self> {
        let stages = specs
            .iter()
            .map(|spec| -> Result<(FilterKind, serde_json::Value)> {
                Ok((spec.name.parse()?, spec.value.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order; each stage sees the previous stage's output
    pub fn apply(&self, log: &Log) -> FilterOutcome {
        let start = Instant::now();
        let mut current = log.clone();
        let mut diagnostics = Vec::new();
        let mut stages = Vec::with_capacity(self.stages.len());

        for (kind, value) in &self.stages {
            let events_in = current.len();

            match run_stage(*kind, value, &current) {
                Ok(next) => {
                    tracing::debug!(
                        "{} filter: {} -> {} events, {} cases left",
                        kind,
                        events_in,
                        next.len(),
                        next.case_count()
                    );
                    stages.push(StageStats {
                        filter: *kind,
                        applied: true,
                        events_in,
                        events_out: next.len(),
                    });
                    current = next;
                }
                Err(diagnostic) => {
                    tracing::warn!("{}", diagnostic);
                    stages.push(StageStats {
                        filter: *kind,
                        applied: false,
                        events_in,
                        events_out: events_in,
                    });
                    diagnostics.push(diagnostic);
                }
            }
        }

        FilterOutcome {
            log: current,
            diagnostics,
            stages,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Dispatch one stage by kind
fn run_stage(kind: FilterKind, value: &serde_json::Value, log: &Log) -> StageResult {
    match kind {
        FilterKind::Timeframe => types::settings::<TimeframeFilter>(kind, value)?.apply(log),
        FilterKind::Performance => types::settings::<PerformanceFilter>(kind, value)?.apply(log),
        FilterKind::Attribute => types::settings::<AttributeFilter>(kind, value)?.apply(log),
        FilterKind::Endpoints => types::settings::<EndpointsFilter>(kind, value)?.apply(log),
    }
}

/// Apply `specs` to `log`; an empty list returns the log unchanged
pub fn apply_filters(log: &Log, specs: &[FilterSpec]) -> Result<FilterOutcome> {
    Ok(FilterPipeline::from_specs(specs)?.apply(log))
}
