use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::cost::{HighwayType, Surface, TechnicalGrade, TravelMode, IMPASSABLE};
use crate::geometry::Coordinate;

/// Identifier of a junction node, taken from the upstream topology.
pub type NodeId = i64;

/// Identifier of a physical segment. Both directed edges of a segment share it.
pub type SegmentId = i64;

/// A junction or endpoint in the trail network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingNode {
    pub id: NodeId,
    pub coordinate: Coordinate,
    /// Metres above sea level; `None` where the elevation lookup had no answer.
    pub elevation_m: Option<f64>,
}

/// Precomputed cost of one directed edge for each travel mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModeCosts {
    pub hiking: f64,
    pub cycling: f64,
}

impl ModeCosts {
    pub const IMPASSABLE: ModeCosts = ModeCosts {
        hiking: IMPASSABLE,
        cycling: IMPASSABLE,
    };

    pub fn get(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Hiking => self.hiking,
            TravelMode::Cycling => self.cycling,
        }
    }
}

/// A directed traversal option between two junction nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingEdge {
    pub segment: SegmentId,
    /// True for the edge that runs against the source chain's node order.
    pub reversed: bool,
    pub from: NodeId,
    pub to: NodeId,
    pub distance_m: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub surface: Surface,
    pub highway: HighwayType,
    pub technical_grade: TechnicalGrade,
    pub trail_name: Option<String>,
    pub one_way: bool,
    pub costs: ModeCosts,
    /// Intermediate coordinates between `from` and `to`, in traversal order.
    pub geometry: Vec<Coordinate>,
    /// Chain in the source topology this segment was cut from.
    pub source_way: i64,
}

impl RoutingEdge {
    pub fn cost(&self, mode: TravelMode) -> f64 {
        self.costs.get(mode)
    }

    pub fn is_passable(&self, mode: TravelMode) -> bool {
        self.cost(mode).is_finite()
    }

    /// The opposite direction of the same segment.
    ///
    /// Gain and loss swap, geometry reverses. Costs are taken from the caller
    /// since the cost model is not symmetric.
    pub fn reverse_with(&self, costs: ModeCosts) -> RoutingEdge {
        let mut geometry = self.geometry.clone();
        geometry.reverse();
        RoutingEdge {
            segment: self.segment,
            reversed: !self.reversed,
            from: self.to,
            to: self.from,
            distance_m: self.distance_m,
            elevation_gain_m: self.elevation_loss_m,
            elevation_loss_m: self.elevation_gain_m,
            surface: self.surface,
            highway: self.highway,
            technical_grade: self.technical_grade,
            trail_name: self.trail_name.clone(),
            one_way: self.one_way,
            costs,
            geometry,
            source_way: self.source_way,
        }
    }
}

/// Summary of how a graph was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub segment_count: usize,
    pub dropped_segments: usize,
    pub source_version: Option<String>,
    pub elevation_source: String,
    /// Unix seconds.
    pub built_at: u64,
}

/// Read-only routing graph for one region.
///
/// Adjacency lists are kept in `(segment, reversed)` order so traversal order,
/// and therefore tie-breaking between equal-cost paths, does not depend on
/// how the graph was assembled or loaded.
#[derive(Debug, Clone, Default)]
pub struct RoutingGraph {
    nodes: Arc<HashMap<NodeId, RoutingNode>>,
    adjacency: Arc<HashMap<NodeId, Vec<RoutingEdge>>>,
    metadata: BuildMetadata,
}

impl RoutingGraph {
    /// Assemble a graph from parts, dropping edges whose endpoints are unknown.
    ///
    /// Node and edge counts in `metadata` are recomputed from what survives.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = RoutingNode>,
        edges: impl IntoIterator<Item = RoutingEdge>,
        mut metadata: BuildMetadata,
    ) -> Self {
        let nodes: HashMap<NodeId, RoutingNode> =
            nodes.into_iter().map(|node| (node.id, node)).collect();

        let mut adjacency: HashMap<NodeId, Vec<RoutingEdge>> = HashMap::new();
        let mut skipped_edges = 0usize;
        let mut edge_count = 0usize;
        for edge in edges {
            if !nodes.contains_key(&edge.from) || !nodes.contains_key(&edge.to) {
                skipped_edges += 1;
                continue;
            }
            edge_count += 1;
            adjacency.entry(edge.from).or_default().push(edge);
        }

        for edges in adjacency.values_mut() {
            edges.sort_by_key(|edge| (edge.segment, edge.reversed));
        }

        if skipped_edges > 0 {
            warn!(skipped_edges, "ignored edges referencing unknown nodes");
        }

        metadata.node_count = nodes.len();
        metadata.edge_count = edge_count;

        Self {
            nodes: Arc::new(nodes),
            adjacency: Arc::new(adjacency),
            metadata,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&RoutingNode> {
        self.nodes.get(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> Vec<&RoutingNode> {
        let mut nodes: Vec<&RoutingNode> = self.nodes.values().collect();
        nodes.sort_by_key(|node| node.id);
        nodes
    }

    /// Outgoing edges for a node; empty for unknown ids.
    pub fn edges_from(&self, id: NodeId) -> &[RoutingEdge] {
        self.adjacency
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every directed edge, grouped by source node in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = &RoutingEdge> {
        self.nodes()
            .into_iter()
            .flat_map(move |node| self.edges_from(node.id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.metadata.edge_count
    }

    pub fn metadata(&self) -> &BuildMetadata {
        &self.metadata
    }
}
