//! Trailroute library entry points.
//!
//! This crate turns trail topology into a weighted routing graph, persists it
//! to SQLite, and answers point-to-point route queries for hiking and cycling.
//! Higher-level consumers (the CLI, embedding services) should only depend on
//! the items exported here instead of reimplementing behavior.
//!
//! The usual flow is:
//!
//! 1. Load a [`Topology`] and an [`ElevationSource`].
//! 2. [`build_graph`] into a [`RoutingGraph`] and [`save_graph`] it.
//! 3. Open it again with [`load_graph`] or [`SqliteGraphStore::open`] and
//!    hand the store to a [`Router`].

pub mod builder;
pub mod config;
pub mod cost;
pub mod db;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod instructions;
pub mod path;
pub mod routing;
pub mod spatial;
pub mod store;
pub mod topology;

pub use builder::{build_graph, GraphBuild};
pub use config::{RouterConfig, TurnThresholds};
pub use cost::{
    edge_cost, estimated_duration_s, AccessRestriction, CostProfile, HighwayType,
    SegmentAttributes, Surface, TechnicalGrade, TravelMode, IMPASSABLE,
};
pub use db::{load_graph, save_graph, SqliteGraphStore, SCHEMA_VERSION};
pub use error::{Error, Result};
pub use geometry::{path_length, Coordinate};
pub use graph::{BuildMetadata, ModeCosts, NodeId, RoutingEdge, RoutingGraph, RoutingNode, SegmentId};
pub use instructions::{generate_instructions, TurnDirection, TurnInstruction};
pub use path::{find_path, CancelToken, PathSegment};
pub use routing::{ComputedRoute, RouteRequest, Router};
pub use spatial::SpatialIndex;
pub use store::{GraphStore, InMemoryGraphStore};
pub use topology::{ChainNode, ElevationSource, ElevationTable, NoElevation, Topology, TrailChain};
