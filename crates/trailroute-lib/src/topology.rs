//! Input contracts for the graph builder.
//!
//! Raw topology arrives as ordered node chains with a tag map, usually parsed
//! from map data upstream. Elevation arrives through [`ElevationSource`], one
//! value per node id, where a missing value is a normal answer.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Coordinate;
use crate::graph::NodeId;

/// Tag key/value pairs attached to a chain.
pub type TagMap = BTreeMap<String, String>;

/// One position along a chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainNode {
    pub id: NodeId,
    pub latitude: f64,
    pub longitude: f64,
}

impl ChainNode {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// An ordered run of nodes sharing one set of trail tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailChain {
    pub id: i64,
    pub nodes: Vec<ChainNode>,
    #[serde(default)]
    pub tags: TagMap,
}

impl TrailChain {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Complete topology of one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Version string of the source extract, copied into build metadata.
    #[serde(default)]
    pub version: Option<String>,
    pub chains: Vec<TrailChain>,
}

impl Topology {
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }
}

/// Per-node elevation lookup.
pub trait ElevationSource {
    /// Elevation in metres, or `None` when no value is available for the node.
    fn elevation(&self, node: NodeId) -> Option<f64>;

    /// Human-readable name recorded in build metadata.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Elevation source that never has an answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoElevation;

impl ElevationSource for NoElevation {
    fn elevation(&self, _node: NodeId) -> Option<f64> {
        None
    }

    fn name(&self) -> &str {
        "none"
    }
}

impl ElevationSource for HashMap<NodeId, f64> {
    fn elevation(&self, node: NodeId) -> Option<f64> {
        self.get(&node).copied().filter(|value| value.is_finite())
    }

    fn name(&self) -> &str {
        "lookup table"
    }
}

/// Elevation values loaded from a JSON document of the form
/// `{"source": "srtm-30m", "elevations": {"101": 1204.5, ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationTable {
    #[serde(default = "default_table_source")]
    pub source: String,
    pub elevations: HashMap<NodeId, f64>,
}

fn default_table_source() -> String {
    "elevation table".to_string()
}

impl ElevationTable {
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }
}

impl ElevationSource for ElevationTable {
    fn elevation(&self, node: NodeId) -> Option<f64> {
        self.elevations.elevation(node)
    }

    fn name(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_topology_json() {
        let json = r#"{
            "version": "2024-06-01",
            "chains": [
                {
                    "id": 7,
                    "nodes": [
                        {"id": 1, "latitude": 46.0, "longitude": 7.0},
                        {"id": 2, "latitude": 46.01, "longitude": 7.0}
                    ],
                    "tags": {"highway": "path", "surface": "gravel"}
                }
            ]
        }"#;

        let topology = Topology::from_json_reader(json.as_bytes()).expect("valid topology");
        assert_eq!(topology.version.as_deref(), Some("2024-06-01"));
        assert_eq!(topology.chains.len(), 1);
        assert_eq!(topology.chains[0].tag("surface"), Some("gravel"));
        assert_eq!(topology.chains[0].tag("sac_scale"), None);
    }

    #[test]
    fn tags_are_optional() {
        let json = r#"{"chains": [{"id": 1, "nodes": []}]}"#;
        let topology = Topology::from_json_reader(json.as_bytes()).expect("valid topology");
        assert!(topology.version.is_none());
        assert!(topology.chains[0].tags.is_empty());
    }

    #[test]
    fn elevation_table_reads_string_keys() {
        let json = r#"{"source": "srtm", "elevations": {"1": 1200.5, "2": 980.0}}"#;
        let table = ElevationTable::from_json_reader(json.as_bytes()).expect("valid table");
        assert_eq!(table.name(), "srtm");
        assert_eq!(table.elevation(1), Some(1200.5));
        assert_eq!(table.elevation(3), None);
    }

    #[test]
    fn non_finite_elevations_are_absent() {
        let mut lookup = HashMap::new();
        lookup.insert(1, f64::NAN);
        assert_eq!(lookup.elevation(1), None);
        assert_eq!(NoElevation.elevation(1), None);
    }
}
