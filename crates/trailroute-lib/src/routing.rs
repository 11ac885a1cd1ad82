//! Multi-waypoint route planning.
//!
//! This module provides:
//! - [`RouteRequest`] - start, ordered via-points, end and travel mode
//! - [`ComputedRoute`] - the assembled path with totals and instructions
//! - [`Router`] - entry point tying a [`GraphStore`] to a [`RouterConfig`]
//!
//! # Example
//!
//! ```no_run
//! use trailroute_lib::{load_graph, Coordinate, InMemoryGraphStore, Router, RouterConfig, TravelMode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = load_graph(std::path::Path::new("region.db"))?;
//! let router = Router::new(InMemoryGraphStore::new(graph), RouterConfig::default());
//! let route = router.find_route(
//!     Coordinate::new(46.55, 7.98),
//!     Coordinate::new(46.58, 8.00),
//!     &[],
//!     TravelMode::Hiking,
//! )?;
//! println!("{:.0} m, about {:.0} min", route.total_distance_m, route.estimated_duration_s / 60.0);
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::config::RouterConfig;
use crate::cost::{estimated_duration_s, TravelMode};
use crate::error::{Error, Result};
use crate::geometry::Coordinate;
use crate::graph::{RoutingEdge, RoutingNode};
use crate::instructions::{generate_instructions, TurnInstruction};
use crate::path::{find_path, CancelToken};
use crate::store::GraphStore;

/// A route query.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    pub via: Vec<Coordinate>,
    pub mode: TravelMode,
}

impl RouteRequest {
    pub fn new(start: Coordinate, end: Coordinate, mode: TravelMode) -> Self {
        Self {
            start,
            end,
            via: Vec::new(),
            mode,
        }
    }

    pub fn with_via(mut self, via: impl IntoIterator<Item = Coordinate>) -> Self {
        self.via.extend(via);
        self
    }

    /// All waypoints in travel order.
    pub fn waypoints(&self) -> Vec<Coordinate> {
        let mut points = Vec::with_capacity(self.via.len() + 2);
        points.push(self.start);
        points.extend(self.via.iter().copied());
        points.push(self.end);
        points
    }
}

/// Result of a successful route search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedRoute {
    pub mode: TravelMode,
    pub nodes: Vec<RoutingNode>,
    pub edges: Vec<RoutingEdge>,
    /// Node coordinates interleaved with each edge's geometry, in travel order.
    pub polyline: Vec<Coordinate>,
    pub total_distance_m: f64,
    pub total_cost: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub estimated_duration_s: f64,
    pub instructions: Vec<TurnInstruction>,
}

impl ComputedRoute {
    fn assemble(
        mode: TravelMode,
        nodes: Vec<RoutingNode>,
        edges: Vec<RoutingEdge>,
        config: &RouterConfig,
    ) -> Self {
        let mut polyline = Vec::new();
        if let Some(first) = nodes.first() {
            polyline.push(first.coordinate);
        }
        for (edge, node) in edges.iter().zip(nodes.iter().skip(1)) {
            polyline.extend_from_slice(&edge.geometry);
            polyline.push(node.coordinate);
        }

        let total_distance_m = edges.iter().map(|edge| edge.distance_m).sum();
        let total_cost = edges.iter().map(|edge| edge.cost(mode)).sum();
        let elevation_gain_m = edges.iter().map(|edge| edge.elevation_gain_m).sum();
        let elevation_loss_m = edges.iter().map(|edge| edge.elevation_loss_m).sum();
        let instructions = generate_instructions(&nodes, &edges, config);

        Self {
            mode,
            nodes,
            edges,
            polyline,
            total_distance_m,
            total_cost,
            elevation_gain_m,
            elevation_loss_m,
            estimated_duration_s: estimated_duration_s(total_cost, mode),
            instructions,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Route planner over a graph store.
///
/// A router holds no per-search state, so one instance can serve concurrent
/// searches from several threads.
pub struct Router<S> {
    store: S,
    config: RouterConfig,
}

impl<S: GraphStore> Router<S> {
    pub fn new(store: S, config: RouterConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Lowest-cost route from `start` through each of `via` in order to `end`.
    pub fn find_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        via: &[Coordinate],
        mode: TravelMode,
    ) -> Result<ComputedRoute> {
        let request = RouteRequest::new(start, end, mode).with_via(via.iter().copied());
        self.find_route_with(&request, &CancelToken::new())
    }

    /// Like [`Router::find_route`], checking `cancel` at every search step.
    ///
    /// Any failing leg fails the whole route; partial routes are never returned.
    pub fn find_route_with(
        &self,
        request: &RouteRequest,
        cancel: &CancelToken,
    ) -> Result<ComputedRoute> {
        self.config.validate()?;

        // 1. Snap every waypoint before searching anything.
        let waypoints = request.waypoints();
        let mut snapped = Vec::with_capacity(waypoints.len());
        for (index, waypoint) in waypoints.iter().enumerate() {
            snapped.push(self.snap(index, *waypoint)?);
        }

        // 2. Search each consecutive pair and stitch the legs together.
        let mut nodes: Vec<RoutingNode> = Vec::new();
        let mut edges: Vec<RoutingEdge> = Vec::new();
        for pair in snapped.windows(2) {
            let leg = find_path(&self.store, pair[0].id, pair[1].id, request.mode, cancel)?;
            let skip = usize::from(!nodes.is_empty());
            nodes.extend(leg.nodes.into_iter().skip(skip));
            edges.extend(leg.edges);
        }

        // 3. Aggregate totals and derive instructions.
        let route = ComputedRoute::assemble(request.mode, nodes, edges, &self.config);
        info!(
            mode = %request.mode,
            waypoints = waypoints.len(),
            edges = route.edges.len(),
            distance_m = route.total_distance_m,
            cost = route.total_cost,
            "computed route"
        );
        Ok(route)
    }

    /// Nearest graph node within `max_radius_m` of `coordinate`.
    pub fn nearest_node(
        &self,
        coordinate: Coordinate,
        max_radius_m: f64,
    ) -> Result<Option<RoutingNode>> {
        self.store.nearest_node(coordinate, max_radius_m)
    }

    fn snap(&self, index: usize, waypoint: Coordinate) -> Result<RoutingNode> {
        let radius = self.config.snap_radius_m;
        let not_routable = || Error::PointNotRoutable {
            waypoint: index,
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
            radius_m: radius,
        };
        if !waypoint.is_valid() {
            return Err(not_routable());
        }

        let node = self
            .store
            .nearest_node(waypoint, radius)?
            .ok_or_else(not_routable)?;
        debug!(
            waypoint = index,
            node = node.id,
            distance_m = waypoint.distance_to(&node.coordinate),
            "snapped waypoint"
        );
        Ok(node)
    }
}
