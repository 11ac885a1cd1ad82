//! KD-tree index over junction nodes for nearest-node snapping.
//!
//! Nodes are indexed by their earth-centred cartesian position (metres on a
//! spherical earth). Chord distance in that space is monotonic in great-circle
//! distance, so a radius query using the chord of the snap radius returns
//! exactly the nodes within that great-circle distance. Candidates are then
//! re-measured with haversine so callers see the same metres as everywhere else.

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::info;

use crate::geometry::{chord_length, Coordinate};
use crate::graph::{NodeId, RoutingGraph};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

#[derive(Debug, Clone, Copy)]
struct IndexNode {
    id: NodeId,
    coordinate: Coordinate,
}

/// Static spatial index built once per graph.
pub struct SpatialIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    nodes: Vec<IndexNode>,
}

impl SpatialIndex {
    /// Index every node of the graph that has a valid coordinate.
    pub fn build(graph: &RoutingGraph) -> Self {
        let nodes: Vec<IndexNode> = graph
            .nodes()
            .into_iter()
            .filter(|node| node.coordinate.is_valid())
            .map(|node| IndexNode {
                id: node.id,
                coordinate: node.coordinate,
            })
            .collect();

        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        for (index, node) in nodes.iter().enumerate() {
            tree.add(&node.coordinate.to_cartesian(), index);
        }

        info!(node_count = nodes.len(), "built spatial index");

        Self { tree, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes within `radius_m` great-circle metres, nearest first.
    ///
    /// Equal distances are ordered by node id.
    pub fn within_radius(&self, coordinate: Coordinate, radius_m: f64) -> Vec<(NodeId, f64)> {
        if self.nodes.is_empty() || !coordinate.is_valid() || radius_m.is_nan() || radius_m < 0.0 {
            return Vec::new();
        }

        // Pad the chord slightly so float error at the boundary cannot hide a
        // node; the haversine filter below is the real cut-off.
        let chord = chord_length(radius_m) * (1.0 + 1e-9) + 1e-6;
        let query = coordinate.to_cartesian();
        let candidates = self
            .tree
            .within::<SquaredEuclidean>(&query, chord * chord);

        let mut results: Vec<(NodeId, f64)> = candidates
            .into_iter()
            .map(|neighbour| {
                let node = &self.nodes[neighbour.item];
                (node.id, coordinate.distance_to(&node.coordinate))
            })
            .filter(|(_, distance)| *distance <= radius_m)
            .collect();

        results.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        results
    }

    /// Closest node within `radius_m`, ties broken by the smaller id.
    pub fn nearest_within(&self, coordinate: Coordinate, radius_m: f64) -> Option<(NodeId, f64)> {
        self.within_radius(coordinate, radius_m).into_iter().next()
    }
}
