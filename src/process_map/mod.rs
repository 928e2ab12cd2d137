//! Process map aggregation
//!
//! Turns the engine's metric maps into a renderable graph payload: nodes are
//! activities, edges are directly-follows transitions with frequency and
//! performance metrics attached.

mod builder;
pub mod metrics;

pub use builder::{build, BuildOptions, ProcessMapInputs};
pub use metrics::{
    node_performance, normalize, EdgeFrequency, EdgeKey, EdgePerformance, MetricMap,
    NodePerformance,
};

use serde::{Deserialize, Serialize};

/// Renderer hint for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    Normal,
    /// Source equals target
    SelfLoop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePerformanceMetrics {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub norm_mean: Option<f64>,
    pub norm_min: Option<f64>,
    pub norm_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub performance: Option<NodePerformanceMetrics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyMetrics {
    pub absolute: u64,
    pub relative: u64,
}

/// Edge durations in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetrics {
    pub frequency: FrequencyMetrics,
    pub performance: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub metrics: EdgeMetrics,
}

/// Nodes and edges of a process map, in builder order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_serialization_shape() {
        let edge = GraphEdge {
            source: "a".into(),
            target: "a".into(),
            edge_type: EdgeType::SelfLoop,
            metrics: EdgeMetrics {
                frequency: FrequencyMetrics {
                    absolute: 3,
                    relative: 2,
                },
                performance: PerformanceMetrics {
                    mean: 1.5,
                    min: 1.0,
                    max: 2.0,
                    median: 1.5,
                },
            },
        };

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "self-loop");
        assert_eq!(json["metrics"]["frequency"]["absolute"], 3);
        assert_eq!(json["metrics"]["performance"]["median"], 1.5);
    }
}
