//! Turns raw trail topology plus elevation into a [`RoutingGraph`].
//!
//! A node becomes a junction when it occurs more than once across all chains
//! or sits at either end of a chain. Chains are cut at every junction; the
//! nodes in between survive only as edge geometry. Each resulting segment is
//! costed in both directions for every travel mode.
//!
//! Bad input never aborts a build. Each chain or segment that cannot be used
//! is logged, counted and reported back in [`GraphBuild::dropped`].

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::cost::{
    edge_cost, AccessRestriction, HighwayType, SegmentAttributes, Surface, TechnicalGrade,
    TravelMode,
};
use crate::error::{Error, Result};
use crate::geometry::{path_length, Coordinate};
use crate::graph::{
    BuildMetadata, ModeCosts, NodeId, RoutingEdge, RoutingGraph, RoutingNode, SegmentId,
};
use crate::topology::{ChainNode, ElevationSource, Topology, TrailChain};

/// Result of a graph build: the usable graph plus every input unit that was skipped.
#[derive(Debug)]
pub struct GraphBuild {
    pub graph: RoutingGraph,
    /// One [`Error::MalformedTopology`] per dropped chain or segment.
    pub dropped: Vec<Error>,
}

/// Direction restriction from the `oneway` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OneWay {
    No,
    Forward,
    Backward,
}

impl OneWay {
    fn from_tag(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("yes") | Some("true") | Some("1") => OneWay::Forward,
            Some("-1") | Some("reverse") => OneWay::Backward,
            _ => OneWay::No,
        }
    }
}

/// Attributes shared by every segment cut from one chain.
struct ChainAttributes {
    surface: Surface,
    highway: HighwayType,
    technical_grade: TechnicalGrade,
    access: AccessRestriction,
    one_way: OneWay,
    trail_name: Option<String>,
}

impl ChainAttributes {
    fn from_chain(chain: &TrailChain) -> Self {
        Self {
            surface: Surface::from_tag(chain.tag("surface")),
            highway: HighwayType::from_tag(chain.tag("highway")),
            technical_grade: TechnicalGrade::from_tag(chain.tag("sac_scale")),
            access: AccessRestriction::from_tags(
                chain.tag("access"),
                chain.tag("foot"),
                chain.tag("bicycle"),
            ),
            one_way: OneWay::from_tag(chain.tag("oneway")),
            trail_name: chain
                .tag("name")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }

    fn segment(&self, distance_m: f64, gain: f64, loss: f64) -> SegmentAttributes {
        SegmentAttributes {
            distance_m,
            elevation_gain_m: gain,
            elevation_loss_m: loss,
            surface: self.surface,
            highway: self.highway,
            technical_grade: self.technical_grade,
            access: self.access,
        }
    }
}

/// Build a routing graph from topology and elevation.
pub fn build_graph<E>(topology: &Topology, elevation: &E) -> GraphBuild
where
    E: ElevationSource + ?Sized,
{
    let mut dropped = Vec::new();

    // 1. Clean chains and count node occurrences.
    let mut chains: Vec<(&TrailChain, Vec<ChainNode>)> = Vec::with_capacity(topology.chains.len());
    for chain in &topology.chains {
        let nodes = collapse_repeats(&chain.nodes);
        if nodes.len() < 2 {
            record(
                &mut dropped,
                Error::malformed(chain.id, "chain has fewer than two distinct nodes"),
            );
            continue;
        }
        chains.push((chain, nodes));
    }

    let mut occurrences: HashMap<NodeId, usize> = HashMap::new();
    let mut positions: HashMap<NodeId, Coordinate> = HashMap::new();
    for (_, nodes) in &chains {
        for node in nodes {
            *occurrences.entry(node.id).or_default() += 1;
            positions.entry(node.id).or_insert_with(|| node.coordinate());
        }
    }

    let mut junctions: HashSet<NodeId> = occurrences
        .iter()
        .filter(|(_, count)| **count >= 2)
        .map(|(id, _)| *id)
        .collect();
    for (_, nodes) in &chains {
        if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
            junctions.insert(first.id);
            junctions.insert(last.id);
        }
    }

    // 2-4. Split at junctions and cost each segment in both directions.
    let mut edges = Vec::new();
    let mut used_nodes: HashSet<NodeId> = HashSet::new();
    let mut next_segment: SegmentId = 1;
    let mut segment_count = 0usize;

    for (chain, nodes) in &chains {
        let attributes = ChainAttributes::from_chain(chain);
        let mut start = 0usize;
        for index in 1..nodes.len() {
            if !junctions.contains(&nodes[index].id) {
                continue;
            }
            let span = &nodes[start..=index];
            start = index;

            match build_segment(
                chain.id,
                span,
                &positions,
                &attributes,
                elevation,
                next_segment,
            ) {
                Ok((forward, reverse)) => {
                    used_nodes.insert(forward.from);
                    used_nodes.insert(forward.to);
                    edges.push(forward);
                    edges.push(reverse);
                    next_segment += 1;
                    segment_count += 1;
                }
                Err(error) => record(&mut dropped, error),
            }
        }
    }

    // 5. Emit nodes and metadata.
    let nodes = used_nodes.iter().filter_map(|id| {
        positions.get(id).map(|coordinate| RoutingNode {
            id: *id,
            coordinate: *coordinate,
            elevation_m: elevation.elevation(*id),
        })
    });

    let metadata = BuildMetadata {
        node_count: 0,
        edge_count: 0,
        segment_count,
        dropped_segments: dropped.len(),
        source_version: topology.version.clone(),
        elevation_source: elevation.name().to_string(),
        built_at: unix_now(),
    };
    let graph = RoutingGraph::from_parts(nodes, edges, metadata);

    info!(
        node_count = graph.node_count(),
        edge_count = graph.edge_count(),
        segment_count,
        dropped = dropped.len(),
        elevation_source = elevation.name(),
        "built routing graph"
    );

    GraphBuild { graph, dropped }
}

fn build_segment<E>(
    chain: i64,
    span: &[ChainNode],
    positions: &HashMap<NodeId, Coordinate>,
    attributes: &ChainAttributes,
    elevation: &E,
    segment: SegmentId,
) -> Result<(RoutingEdge, RoutingEdge)>
where
    E: ElevationSource + ?Sized,
{
    let mut coordinates = Vec::with_capacity(span.len());
    for node in span {
        match positions.get(&node.id) {
            Some(coordinate) if coordinate.is_valid() => coordinates.push(*coordinate),
            _ => {
                return Err(Error::malformed(
                    chain,
                    format!("node {} has no valid coordinate", node.id),
                ))
            }
        }
    }

    let distance_m = path_length(&coordinates);
    if !distance_m.is_finite() {
        return Err(Error::malformed(
            chain,
            format!("segment {segment} has a non-finite length"),
        ));
    }

    let (Some(first), Some(last)) = (span.first(), span.last()) else {
        return Err(Error::malformed(chain, "empty segment"));
    };

    let (gain, loss) = match (elevation.elevation(first.id), elevation.elevation(last.id)) {
        (Some(from), Some(to)) => ((to - from).max(0.0), (from - to).max(0.0)),
        _ => (0.0, 0.0),
    };

    let forward_attributes = attributes.segment(distance_m, gain, loss);
    let reverse_attributes = attributes.segment(distance_m, loss, gain);

    let mut forward_costs = mode_costs(&forward_attributes);
    let mut reverse_costs = mode_costs(&reverse_attributes);
    match attributes.one_way {
        OneWay::No => {}
        OneWay::Forward => reverse_costs = ModeCosts::IMPASSABLE,
        OneWay::Backward => forward_costs = ModeCosts::IMPASSABLE,
    }

    let forward = RoutingEdge {
        segment,
        reversed: false,
        from: first.id,
        to: last.id,
        distance_m,
        elevation_gain_m: gain,
        elevation_loss_m: loss,
        surface: attributes.surface,
        highway: attributes.highway,
        technical_grade: attributes.technical_grade,
        trail_name: attributes.trail_name.clone(),
        one_way: attributes.one_way != OneWay::No,
        costs: forward_costs,
        geometry: coordinates[1..coordinates.len() - 1].to_vec(),
        source_way: chain,
    };
    let reverse = forward.reverse_with(reverse_costs);

    debug!(
        segment,
        chain,
        from = forward.from,
        to = forward.to,
        distance_m,
        "built segment"
    );

    Ok((forward, reverse))
}

fn mode_costs(attributes: &SegmentAttributes) -> ModeCosts {
    ModeCosts {
        hiking: edge_cost(attributes, TravelMode::Hiking),
        cycling: edge_cost(attributes, TravelMode::Cycling),
    }
}

fn collapse_repeats(nodes: &[ChainNode]) -> Vec<ChainNode> {
    let mut collapsed: Vec<ChainNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if collapsed.last().map(|last| last.id) != Some(node.id) {
            collapsed.push(*node);
        }
    }
    collapsed
}

fn record(dropped: &mut Vec<Error>, error: Error) {
    warn!(error = %error, "dropping malformed topology");
    dropped.push(error);
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_node(id: NodeId, latitude: f64) -> ChainNode {
        ChainNode {
            id,
            latitude,
            longitude: 0.0,
        }
    }

    #[test]
    fn collapses_consecutive_duplicates_only() {
        let nodes = vec![
            chain_node(1, 0.0),
            chain_node(1, 0.0),
            chain_node(2, 0.1),
            chain_node(1, 0.0),
        ];
        let ids: Vec<NodeId> = collapse_repeats(&nodes).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 1]);
    }

    #[test]
    fn oneway_tag_values() {
        assert_eq!(OneWay::from_tag(Some("yes")), OneWay::Forward);
        assert_eq!(OneWay::from_tag(Some("-1")), OneWay::Backward);
        assert_eq!(OneWay::from_tag(Some("no")), OneWay::No);
        assert_eq!(OneWay::from_tag(None), OneWay::No);
    }
}
