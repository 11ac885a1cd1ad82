mod common;

use std::collections::HashMap;

use approx::assert_relative_eq;
use common::{build, chain, degrees, diamond_topology, flat, line_topology, node, PAVED_PATH};
use trailroute_lib::{
    build_graph, ChainNode, Error, NoElevation, RoutingGraph, Surface, Topology, TravelMode,
};

fn segment_edges(graph: &RoutingGraph, segment: i64) -> Vec<&trailroute_lib::RoutingEdge> {
    graph.edges().filter(|edge| edge.segment == segment).collect()
}

#[test]
fn every_segment_has_two_directed_edges() {
    let graph = build(&diamond_topology(), &flat());

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 8);
    assert_eq!(graph.metadata().segment_count, 4);

    for segment in 1..=4 {
        let edges = segment_edges(&graph, segment);
        assert_eq!(edges.len(), 2, "segment {segment}");
        let (forward, reverse) = if edges[0].reversed {
            (edges[1], edges[0])
        } else {
            (edges[0], edges[1])
        };
        assert!(!forward.reversed);
        assert!(reverse.reversed);
        assert_eq!(forward.from, reverse.to);
        assert_eq!(forward.to, reverse.from);
        assert_eq!(forward.distance_m, reverse.distance_m);
    }
}

#[test]
fn chains_split_at_shared_nodes() {
    let graph = build(&line_topology(), &flat());

    let ids: Vec<i64> = graph.nodes().iter().map(|node| node.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(graph.edges_from(2).len(), 2);
    for edge in graph.edges() {
        assert_relative_eq!(edge.distance_m, 1000.0, epsilon = 1e-6);
        assert!(edge.geometry.is_empty());
    }
}

#[test]
fn pass_through_nodes_become_geometry() {
    let topology = Topology {
        version: None,
        chains: vec![chain(
            1,
            vec![
                node(1, 0.0, 0.0),
                node(2, 400.0, 0.0),
                node(3, 700.0, 0.0),
                node(4, 1000.0, 0.0),
            ],
            PAVED_PATH,
        )],
    };
    let graph = build(&topology, &flat());

    assert_eq!(graph.node_count(), 2);
    assert!(graph.node(2).is_none());
    assert!(graph.node(3).is_none());

    let forward = &graph.edges_from(1)[0];
    assert_eq!(forward.to, 4);
    assert_eq!(forward.geometry.len(), 2);
    assert_relative_eq!(forward.geometry[0].latitude, degrees(400.0), epsilon = 1e-12);
    assert_relative_eq!(forward.distance_m, 1000.0, epsilon = 1e-6);

    let reverse = &graph.edges_from(4)[0];
    assert_relative_eq!(reverse.geometry[0].latitude, degrees(700.0), epsilon = 1e-12);
}

#[test]
fn node_visited_twice_by_one_chain_is_a_junction() {
    // 1 -> 2 -> 3 -> 2 -> 4: node 2 occurs twice, so it splits the chain.
    let topology = Topology {
        version: None,
        chains: vec![chain(
            1,
            vec![
                node(1, 0.0, 0.0),
                node(2, 500.0, 0.0),
                node(3, 500.0, 300.0),
                node(2, 500.0, 0.0),
                node(4, 1000.0, 0.0),
            ],
            PAVED_PATH,
        )],
    };
    let graph = build(&topology, &flat());

    assert!(graph.node(2).is_some());
    assert!(graph.node(3).is_none());
    assert_eq!(graph.metadata().segment_count, 3);
}

#[test]
fn malformed_chains_are_dropped_without_aborting() {
    let mut topology = line_topology();
    topology.chains.push(chain(90, vec![node(50, 0.0, 0.0)], PAVED_PATH));
    topology.chains.push(chain(
        91,
        vec![
            node(60, 0.0, 0.0),
            ChainNode {
                id: 61,
                latitude: 123.0,
                longitude: 0.0,
            },
        ],
        PAVED_PATH,
    ));
    topology
        .chains
        .push(chain(92, vec![node(70, 0.0, 0.0), node(70, 0.0, 0.0)], PAVED_PATH));

    let build = build_graph(&topology, &NoElevation);

    assert_eq!(build.dropped.len(), 3);
    let mut chains: Vec<i64> = build
        .dropped
        .iter()
        .map(|error| match error {
            Error::MalformedTopology { chain, .. } => *chain,
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    chains.sort();
    assert_eq!(chains, vec![90, 91, 92]);

    assert_eq!(build.graph.node_count(), 3);
    assert_eq!(build.graph.metadata().dropped_segments, 3);
    assert!(build.graph.node(61).is_none());
}

#[test]
fn elevation_gain_and_loss_swap_with_direction() {
    let elevation: HashMap<i64, f64> = [(1, 100.0), (2, 160.0), (3, 130.0)].into_iter().collect();
    let graph = build(&line_topology(), &elevation);

    let up = graph
        .edges_from(1)
        .iter()
        .find(|edge| edge.to == 2)
        .expect("edge 1->2");
    assert_relative_eq!(up.elevation_gain_m, 60.0);
    assert_relative_eq!(up.elevation_loss_m, 0.0);

    let down = graph
        .edges_from(2)
        .iter()
        .find(|edge| edge.to == 1)
        .expect("edge 2->1");
    assert_relative_eq!(down.elevation_gain_m, 0.0);
    assert_relative_eq!(down.elevation_loss_m, 60.0);
    assert!(up.cost(TravelMode::Hiking) > down.cost(TravelMode::Hiking));

    assert_eq!(graph.node(2).and_then(|node| node.elevation_m), Some(160.0));
}

#[test]
fn missing_elevation_means_flat() {
    let elevation: HashMap<i64, f64> = [(1, 100.0)].into_iter().collect();
    let graph = build(&line_topology(), &elevation);

    for edge in graph.edges() {
        assert_eq!(edge.elevation_gain_m, 0.0);
        assert_eq!(edge.elevation_loss_m, 0.0);
    }
    assert_eq!(graph.node(2).and_then(|node| node.elevation_m), None);
}

#[test]
fn oneway_blocks_the_reverse_direction() {
    let topology = Topology {
        version: None,
        chains: vec![chain(
            5,
            vec![node(1, 0.0, 0.0), node(2, 800.0, 0.0)],
            &[("highway", "path"), ("oneway", "yes")],
        )],
    };
    let graph = build(&topology, &flat());

    let forward = &graph.edges_from(1)[0];
    let reverse = &graph.edges_from(2)[0];
    assert!(forward.one_way);
    assert!(forward.is_passable(TravelMode::Hiking));
    assert!(!reverse.is_passable(TravelMode::Hiking));
    assert!(!reverse.is_passable(TravelMode::Cycling));
}

#[test]
fn tags_flow_into_edges() {
    let topology = Topology {
        version: None,
        chains: vec![chain(
            5,
            vec![node(1, 0.0, 0.0), node(2, 800.0, 0.0)],
            &[
                ("highway", "steps"),
                ("surface", "rock"),
                ("name", "Summit Stairs"),
            ],
        )],
    };
    let graph = build(&topology, &flat());

    let edge = &graph.edges_from(1)[0];
    assert_eq!(edge.surface, Surface::Rock);
    assert_eq!(edge.trail_name.as_deref(), Some("Summit Stairs"));
    assert_eq!(edge.source_way, 5);
    assert!(edge.is_passable(TravelMode::Hiking));
    assert!(!edge.is_passable(TravelMode::Cycling));
}

#[test]
fn metadata_describes_the_build() {
    let elevation: HashMap<i64, f64> = HashMap::new();
    let graph = build(&line_topology(), &elevation);
    let metadata = graph.metadata();

    assert_eq!(metadata.node_count, 3);
    assert_eq!(metadata.edge_count, 4);
    assert_eq!(metadata.segment_count, 2);
    assert_eq!(metadata.dropped_segments, 0);
    assert_eq!(metadata.source_version.as_deref(), Some("line-fixture"));
    assert_eq!(metadata.elevation_source, "lookup table");
    assert!(metadata.built_at > 0);
}

#[test]
fn adjacency_order_is_canonical() {
    let graph = build(&diamond_topology(), &flat());
    for node in graph.nodes() {
        let keys: Vec<(i64, bool)> = graph
            .edges_from(node.id)
            .iter()
            .map(|edge| (edge.segment, edge.reversed))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "node {}", node.id);
    }
}
