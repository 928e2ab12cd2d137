// Process map assembly from the engine's metric maps
use crate::process_map::metrics::{EdgeFrequency, EdgeKey, EdgePerformance, NodePerformance};
use crate::process_map::{
    EdgeMetrics, EdgeType, FrequencyMetrics, GraphEdge, GraphNode, GraphPayload,
    NodePerformanceMetrics, PerformanceMetrics,
};
use ahash::HashSet;

/// Everything the builder aggregates
#[derive(Debug, Clone, Default)]
pub struct ProcessMapInputs {
    pub frequency: EdgeFrequency,
    pub performance: EdgePerformance,
    pub nodes: NodePerformance,
}

/// Builder switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Edges seen fewer times than this are dropped
    pub min_edge_occurrences: u64,
    /// Also register nodes that only ever appear as an edge target
    pub register_target_nodes: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            min_edge_occurrences: 1,
            register_target_nodes: false,
        }
    }
}

/// Assemble the graph payload
///
/// Edges follow the absolute-frequency map's order. A node is registered the
/// first time it shows up as the source of a surviving edge; pure targets are
/// only registered when `register_target_nodes` is set. Missing edge metrics
/// default to zero, missing node metrics stay absent.
pub fn build(inputs: &ProcessMapInputs, options: &BuildOptions) -> GraphPayload {
    let mut payload = GraphPayload::default();
    let mut seen: HashSet<String> = HashSet::default();
    let mut skipped = 0usize;

    for (key, &absolute) in inputs.frequency.absolute.iter() {
        if absolute < options.min_edge_occurrences {
            skipped += 1;
            continue;
        }

        let (source, target) = key;
        register_node(&mut payload, &mut seen, source, &inputs.nodes);
        payload.edges.push(edge(key, absolute, inputs));
        if options.register_target_nodes {
            register_node(&mut payload, &mut seen, target, &inputs.nodes);
        }
    }

    tracing::debug!(
        "Built process map: {} nodes, {} edges ({} below threshold {})",
        payload.nodes.len(),
        payload.edges.len(),
        skipped,
        options.min_edge_occurrences
    );

    payload
}

fn register_node(
    payload: &mut GraphPayload,
    seen: &mut HashSet<String>,
    activity: &str,
    nodes: &NodePerformance,
) {
    if seen.contains(activity) {
        return;
    }
    seen.insert(activity.to_string());

    payload.nodes.push(GraphNode {
        id: activity.to_string(),
        label: activity.to_string(),
        performance: node_metrics(nodes, activity),
    });
}

/// Node metrics, or `None` when no node performance was computed at all
fn node_metrics(nodes: &NodePerformance, activity: &str) -> Option<NodePerformanceMetrics> {
    if nodes.is_empty() {
        return None;
    }

    let key = activity.to_string();
    Some(NodePerformanceMetrics {
        mean: nodes.mean.get(&key).copied(),
        min: nodes.min.get(&key).copied(),
        max: nodes.max.get(&key).copied(),
        norm_mean: nodes.norm_mean.get(&key).copied(),
        norm_min: nodes.norm_min.get(&key).copied(),
        norm_max: nodes.norm_max.get(&key).copied(),
    })
}

fn edge(key: &EdgeKey, absolute: u64, inputs: &ProcessMapInputs) -> GraphEdge {
    let (source, target) = key;
    let perf = |map: &crate::process_map::metrics::PerformanceMap| {
        map.get(key).copied().unwrap_or(0.0)
    };

    GraphEdge {
        source: source.clone(),
        target: target.clone(),
        edge_type: if source == target {
            EdgeType::SelfLoop
        } else {
            EdgeType::Normal
        },
        metrics: EdgeMetrics {
            frequency: FrequencyMetrics {
                absolute,
                relative: inputs.frequency.relative.get(key).copied().unwrap_or(0),
            },
            performance: PerformanceMetrics {
                mean: perf(&inputs.performance.mean),
                min: perf(&inputs.performance.min),
                max: perf(&inputs.performance.max),
                median: perf(&inputs.performance.median),
            },
        },
    }
}
