//! Common test utilities and fixture helpers.
//!
//! Fixtures are small synthetic topologies laid out along the prime meridian,
//! where great-circle distance is exactly `EARTH_RADIUS_M` times the latitude
//! difference in radians. That keeps expected lengths easy to state in metres.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use tempfile::TempDir;
use trailroute_lib::geometry::EARTH_RADIUS_M;
use trailroute_lib::{
    build_graph, save_graph, ChainNode, Coordinate, ElevationSource, InMemoryGraphStore, NodeId,
    RoutingGraph, Topology, TrailChain,
};

/// Degrees of latitude spanning `meters` of arc.
pub fn degrees(meters: f64) -> f64 {
    meters / (EARTH_RADIUS_M * std::f64::consts::PI / 180.0)
}

/// Coordinate `north_m` metres north and `east_m` metres east of the origin.
///
/// East offsets are measured along the equator, so keep them small relative
/// to the north offsets when exact lengths matter.
pub fn at(north_m: f64, east_m: f64) -> Coordinate {
    Coordinate::new(degrees(north_m), degrees(east_m))
}

pub fn node(id: NodeId, north_m: f64, east_m: f64) -> ChainNode {
    let coordinate = at(north_m, east_m);
    ChainNode {
        id,
        latitude: coordinate.latitude,
        longitude: coordinate.longitude,
    }
}

pub fn chain(id: i64, nodes: Vec<ChainNode>, tags: &[(&str, &str)]) -> TrailChain {
    TrailChain {
        id,
        nodes,
        tags: tags
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    }
}

pub const PAVED_PATH: &[(&str, &str)] = &[("highway", "path"), ("surface", "paved")];

/// A -(1000 m)- B -(1000 m)- C, split at B, paved and easy.
///
/// Node ids: A = 1, B = 2, C = 3.
pub fn line_topology() -> Topology {
    Topology {
        version: Some("line-fixture".to_string()),
        chains: vec![
            chain(10, vec![node(1, 0.0, 0.0), node(2, 1000.0, 0.0)], PAVED_PATH),
            chain(11, vec![node(2, 1000.0, 0.0), node(3, 2000.0, 0.0)], PAVED_PATH),
        ],
    }
}

/// Two routes from S (1) to G (4): west via 2 on pavement, east via 3 on gravel.
/// Both legs have identical geometry mirrored across the meridian.
pub fn diamond_topology() -> Topology {
    diamond_with_east_surface("gravel")
}

/// The diamond with a chosen surface on the eastern route. With `"paved"`
/// both routes cost exactly the same.
pub fn diamond_with_east_surface(surface: &str) -> Topology {
    let east = [("highway", "path"), ("surface", surface)];
    Topology {
        version: None,
        chains: vec![
            chain(20, vec![node(1, 0.0, 0.0), node(2, 1000.0, -300.0)], PAVED_PATH),
            chain(21, vec![node(2, 1000.0, -300.0), node(4, 2000.0, 0.0)], PAVED_PATH),
            chain(22, vec![node(1, 0.0, 0.0), node(3, 1000.0, 300.0)], &east),
            chain(23, vec![node(3, 1000.0, 300.0), node(4, 2000.0, 0.0)], &east),
        ],
    }
}

/// A `size` x `size` lattice of 250 m cells with one chain per row and
/// column. Surfaces vary by row so costs are not uniform.
///
/// Node `(row, col)` has id `row * size + col + 1`.
pub fn grid_topology(size: usize) -> Topology {
    const SURFACES: [&str; 4] = ["paved", "gravel", "ground", "compacted"];
    let spacing = 250.0;
    let id = |row: usize, col: usize| (row * size + col + 1) as NodeId;
    let mut chains = Vec::new();
    let mut chain_id = 100;

    for row in 0..size {
        let nodes = (0..size)
            .map(|col| node(id(row, col), row as f64 * spacing, col as f64 * spacing))
            .collect();
        let surface = SURFACES[row % SURFACES.len()];
        chains.push(chain(chain_id, nodes, &[("highway", "path"), ("surface", surface)]));
        chain_id += 1;
    }
    for col in 0..size {
        let nodes = (0..size)
            .map(|row| node(id(row, col), row as f64 * spacing, col as f64 * spacing))
            .collect();
        chains.push(chain(chain_id, nodes, &[("highway", "track"), ("surface", "gravel")]));
        chain_id += 1;
    }

    Topology {
        version: Some(format!("grid-{size}")),
        chains,
    }
}

/// The lattice of [`grid_topology`] with every chain paved and easy, so on
/// flat ground each edge costs exactly its length.
pub fn paved_grid_topology(size: usize) -> Topology {
    let mut topology = grid_topology(size);
    for chain in &mut topology.chains {
        chain.tags = PAVED_PATH
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
    }
    topology
}

pub fn flat() -> HashMap<NodeId, f64> {
    HashMap::new()
}

pub fn build<E: ElevationSource + ?Sized>(topology: &Topology, elevation: &E) -> RoutingGraph {
    let build = build_graph(topology, elevation);
    assert!(
        build.dropped.is_empty(),
        "fixture should build cleanly: {:?}",
        build.dropped
    );
    build.graph
}

pub fn memory_store(topology: &Topology) -> InMemoryGraphStore {
    InMemoryGraphStore::new(build(topology, &flat()))
}

/// Graph persisted to a temporary SQLite file.
pub struct PersistedGraph {
    _temp_dir: TempDir,
    pub path: PathBuf,
}

impl PersistedGraph {
    pub fn new(graph: &RoutingGraph) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("graph.db");
        save_graph(graph, &path).expect("save graph");
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }
}
