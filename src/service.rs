//! Request orchestration
//!
//! [`Analyzer`] wires the pieces together for one request: resolve the file
//! inside the data directory, normalize it, run the filter pipeline, ask the
//! mining engine for metrics, and shape the result.

use crate::config::Config;
use crate::engine::{DirectlyFollowsEngine, MiningEngine, WorkHours};
use crate::error::{FlowmapError, Result};
use crate::filters::{Diagnostic, FilterPipeline, FilterSpec};
use crate::log::{self, Log, MissingOptionalColumnWarning, Normalized, START_TIMESTAMP, TIMESTAMP};
use crate::process_map::{self, BuildOptions, GraphPayload, ProcessMapInputs};
use crate::process_map::metrics::MetricMap;
use crate::statistics::{self, DistributionOptions, DurationDistribution};
use ahash::{HashSet, HashSetExt};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

/// Per-request overrides of the process map settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    /// Wire name keeps the historical spelling; the corrected one is accepted too
    #[serde(
        default,
        rename = "min_edge_occurences",
        alias = "min_edge_occurrences",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_edge_occurrences: Option<u64>,
}

/// Analysis request as received from a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// File name relative to the data directory
    pub file: String,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub controls: Controls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workhours: Option<WorkHours>,
}

impl AnalysisRequest {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterSpec>) -> Self {
        self.filters = filters;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMapResponse {
    pub network: GraphPayload,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<MissingOptionalColumnWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DurationsResponse {
    /// Absent when fewer than two cases survive filtering
    pub distribution: Option<DurationDistribution>,
    pub case_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityCount {
    pub activity: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointActivities {
    pub start_activities: Vec<ActivityCount>,
    pub end_activities: Vec<ActivityCount>,
}

/// One distinct activity sequence and how many cases follow it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseVariant {
    pub activities: Vec<String>,
    pub cases: usize,
}

/// A normalized and filtered log ready for mining
struct Prepared {
    log: Log,
    diagnostics: Vec<Diagnostic>,
    warnings: Vec<MissingOptionalColumnWarning>,
}

/// Entry point for every analysis operation
pub struct Analyzer<E: MiningEngine = DirectlyFollowsEngine> {
    config: Config,
    engine: E,
}

impl Analyzer<DirectlyFollowsEngine> {
    pub fn new(config: Config) -> Self {
        Self::with_engine(config, DirectlyFollowsEngine::new())
    }
}

impl<E: MiningEngine> Analyzer<E> {
    pub fn with_engine(config: Config, engine: E) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a request file name inside the data directory
    ///
    /// Only plain relative names are accepted; absolute paths and any `..`
    /// or root component are rejected.
    pub fn resolve_path(&self, file: &str) -> Result<PathBuf> {
        if file.trim().is_empty() {
            return Err(FlowmapError::InvalidRequest(
                "Request does not name a file".to_string(),
            ));
        }

        let relative = Path::new(file);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_absolute() || !plain {
            return Err(FlowmapError::FileOutsideDataDir {
                file: file.to_string(),
            });
        }

        Ok(self.config.data.dir.join(relative))
    }

    /// Read and normalize a log file from the data directory
    pub fn load(&self, file: &str) -> Result<Normalized> {
        let path = self.resolve_path(file)?;
        log::load_log(
            &path,
            self.config.delimiter_byte()?,
            &self.config.columns,
            &self.config.normalize_options(),
        )
    }

    fn prepare(&self, request: &AnalysisRequest) -> Result<Prepared> {
        // Unknown filter names fail before the file is touched
        let pipeline = FilterPipeline::from_specs(&request.filters)?;
        let Normalized { log, warnings } = self.load(&request.file)?;
        let outcome = pipeline.apply(&log);

        tracing::debug!(
            "Prepared {}: {} -> {} events through {} filter(s) in {}ms",
            request.file,
            log.len(),
            outcome.log.len(),
            pipeline.len(),
            outcome.processing_time_ms
        );

        Ok(Prepared {
            log: outcome.log,
            diagnostics: outcome.diagnostics,
            warnings,
        })
    }

    /// Filtered process map for the request
    pub fn process_map(&self, request: &AnalysisRequest) -> Result<ProcessMapResponse> {
        let started = Instant::now();
        let Prepared {
            log,
            diagnostics,
            warnings,
        } = self.prepare(request)?;

        let start_key = log.has_start_timestamps().then_some(START_TIMESTAMP);
        let inputs = ProcessMapInputs {
            frequency: self.engine.edge_frequencies(&log)?,
            performance: self.engine.edge_performances(&log, start_key)?,
            nodes: if start_key.is_some() {
                process_map::node_performance(&log)
            } else {
                Default::default()
            },
        };

        let options = BuildOptions {
            min_edge_occurrences: request
                .controls
                .min_edge_occurrences
                .unwrap_or(self.config.process_map.min_edge_occurrences),
            register_target_nodes: self.config.process_map.register_target_nodes,
        };
        let network = process_map::build(&inputs, &options);

        tracing::info!(
            "Process map for {}: {} nodes, {} edges from {} cases in {}ms",
            request.file,
            network.nodes.len(),
            network.edges.len(),
            log.case_count(),
            started.elapsed().as_millis()
        );

        Ok(ProcessMapResponse {
            network,
            diagnostics,
            warnings,
        })
    }

    /// Distribution of case durations after filtering
    pub fn case_durations(&self, request: &AnalysisRequest) -> Result<DurationsResponse> {
        let work_hours = request
            .workhours
            .unwrap_or(self.config.durations.work_hours);
        if work_hours[0] >= work_hours[1] || work_hours[1] > 24 {
            return Err(FlowmapError::InvalidRequest(format!(
                "workhours must be [start, end) within 0..=24, got {:?}",
                work_hours
            )));
        }

        let options = DistributionOptions {
            bin_count: self.config.durations.bin_count,
            business_hours: self.config.durations.business_hours,
            work_hours,
        };

        let Prepared {
            log, diagnostics, ..
        } = self.prepare(request)?;
        let durations =
            self.engine
                .case_durations(&log, options.business_hours, options.work_hours)?;
        let distribution = statistics::compute(&durations, &options);

        tracing::info!(
            "Case durations for {}: {} cases, distribution {}",
            request.file,
            durations.len(),
            if distribution.is_some() { "computed" } else { "skipped" }
        );

        Ok(DurationsResponse {
            distribution,
            case_count: durations.len(),
            diagnostics,
        })
    }

    /// Start and end activities of the unfiltered log
    pub fn start_end_activities(&self, file: &str) -> Result<EndpointActivities> {
        let log = self.load(file)?.log;
        Ok(EndpointActivities {
            start_activities: counts(self.engine.start_activities(&log)?),
            end_activities: counts(self.engine.end_activities(&log)?),
        })
    }

    /// Column names available for filtering (everything but the end timestamp)
    pub fn columns(&self, file: &str) -> Result<Vec<String>> {
        let log = self.load(file)?.log;
        Ok(log
            .columns()
            .iter()
            .filter(|c| c.as_str() != TIMESTAMP)
            .cloned()
            .collect())
    }

    /// Distinct values of `column` in order of first appearance
    pub fn column_values(&self, file: &str, column: &str) -> Result<Vec<String>> {
        let log = self.load(file)?.log;
        if !log.has_column(column) {
            return Err(FlowmapError::InvalidRequest(format!(
                "Unknown column \"{}\" in {}",
                column, file
            )));
        }

        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for value in log.events().iter().filter_map(|e| e.attribute(column)) {
            if seen.insert(value.to_string()) {
                values.push(value.into_owned());
            }
        }
        Ok(values)
    }

    /// Distinct activity sequences, most frequent first
    ///
    /// Ties keep the order in which the variant was first seen.
    pub fn case_variants(&self, file: &str) -> Result<Vec<CaseVariant>> {
        let log = self.load(file)?.log;

        let mut variants: MetricMap<Vec<String>, usize> = MetricMap::new();
        for case in log.cases() {
            let trace = case.trace().into_iter().map(str::to_string).collect();
            *variants.entry_or_insert_with(trace, || 0) += 1;
        }

        let mut variants: Vec<CaseVariant> = variants
            .iter()
            .map(|(activities, &cases)| CaseVariant {
                activities: activities.clone(),
                cases,
            })
            .collect();
        variants.sort_by(|a, b| b.cases.cmp(&a.cases));
        Ok(variants)
    }

    /// File names in the data directory, sorted
    pub fn list_files(&self) -> Result<Vec<String>> {
        let dir = &self.config.data.dir;
        let entries = std::fs::read_dir(dir).map_err(|e| FlowmapError::Io {
            source: e,
            context: format!("Failed to read data directory: {}", dir.display()),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FlowmapError::Io {
                source: e,
                context: "Failed to read directory entry".to_string(),
            })?;
            if entry.path().is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        files.sort();
        Ok(files)
    }
}

fn counts(map: MetricMap<String, u64>) -> Vec<ActivityCount> {
    map.iter()
        .map(|(activity, &count)| ActivityCount {
            activity: activity.clone(),
            count,
        })
        .collect()
}
