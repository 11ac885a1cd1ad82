//! Read interface the path search needs from a routing graph.
//!
//! [`GraphStore`] hides where the graph lives. [`InMemoryGraphStore`] serves a
//! built [`RoutingGraph`] directly and is what tests and short-lived tools use;
//! [`crate::db::SqliteGraphStore`] reads the persisted schema on demand.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::geometry::Coordinate;
use crate::graph::{NodeId, RoutingEdge, RoutingGraph, RoutingNode};
use crate::spatial::SpatialIndex;

/// Minimal read access to a routing graph.
///
/// Implementations must be safe to share between threads; concurrent searches
/// only ever read through this trait.
pub trait GraphStore: Send + Sync {
    /// Fetch a node by id.
    fn node(&self, id: NodeId) -> Result<Option<RoutingNode>>;

    /// Outgoing edges of a node, ordered by `(segment, reversed)`.
    ///
    /// Unknown nodes have no edges.
    fn outgoing_edges(&self, id: NodeId) -> Result<Cow<'_, [RoutingEdge]>>;

    /// Closest node within `max_radius_m` great-circle metres of `coordinate`.
    ///
    /// Ties resolve to the smaller node id. `Ok(None)` means nothing in range.
    fn nearest_node(&self, coordinate: Coordinate, max_radius_m: f64)
        -> Result<Option<RoutingNode>>;
}

impl<S: GraphStore + ?Sized> GraphStore for Arc<S> {
    fn node(&self, id: NodeId) -> Result<Option<RoutingNode>> {
        (**self).node(id)
    }

    fn outgoing_edges(&self, id: NodeId) -> Result<Cow<'_, [RoutingEdge]>> {
        (**self).outgoing_edges(id)
    }

    fn nearest_node(
        &self,
        coordinate: Coordinate,
        max_radius_m: f64,
    ) -> Result<Option<RoutingNode>> {
        (**self).nearest_node(coordinate, max_radius_m)
    }
}

/// Graph store over an in-memory [`RoutingGraph`] with a KD-tree for snapping.
pub struct InMemoryGraphStore {
    graph: Arc<RoutingGraph>,
    index: SpatialIndex,
}

impl InMemoryGraphStore {
    pub fn new(graph: RoutingGraph) -> Self {
        Self::from_shared(Arc::new(graph))
    }

    pub fn from_shared(graph: Arc<RoutingGraph>) -> Self {
        let index = SpatialIndex::build(&graph);
        Self { graph, index }
    }

    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }
}

impl GraphStore for InMemoryGraphStore {
    fn node(&self, id: NodeId) -> Result<Option<RoutingNode>> {
        Ok(self.graph.node(id).cloned())
    }

    fn outgoing_edges(&self, id: NodeId) -> Result<Cow<'_, [RoutingEdge]>> {
        Ok(Cow::Borrowed(self.graph.edges_from(id)))
    }

    fn nearest_node(
        &self,
        coordinate: Coordinate,
        max_radius_m: f64,
    ) -> Result<Option<RoutingNode>> {
        let nearest = self.index.nearest_within(coordinate, max_radius_m);
        debug!(
            %coordinate,
            max_radius_m,
            node = ?nearest.map(|(id, _)| id),
            distance_m = ?nearest.map(|(_, distance)| distance),
            "nearest node lookup"
        );
        Ok(nearest.and_then(|(id, _)| self.graph.node(id).cloned()))
    }
}
