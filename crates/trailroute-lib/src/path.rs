use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cost::TravelMode;
use crate::error::{Error, Result};
use crate::geometry::Coordinate;
use crate::graph::{NodeId, RoutingEdge, RoutingNode};
use crate::store::GraphStore;

/// Cooperative cancellation signal for long-running searches.
///
/// Clones share the same flag, so a caller can keep one clone and cancel a
/// search running elsewhere. An optional deadline cancels automatically.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that trips once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Relaxed)
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Cheapest path between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub nodes: Vec<RoutingNode>,
    pub edges: Vec<RoutingEdge>,
    pub cost: f64,
}

/// Run A* between two graph nodes for one travel mode.
///
/// The frontier is ordered by `cost + heuristic`, with ties going to the entry
/// pushed first. A node's parent is only replaced by a strictly cheaper
/// path, so among equal-cost paths the first one discovered wins. Edges that
/// are impassable for `mode` are never pushed.
pub fn find_path<S>(
    store: &S,
    start: NodeId,
    goal: NodeId,
    mode: TravelMode,
    cancel: &CancelToken,
) -> Result<PathSegment>
where
    S: GraphStore + ?Sized,
{
    let start_node = require_node(store, start)?;
    if start == goal {
        return Ok(PathSegment {
            nodes: vec![start_node],
            edges: Vec::new(),
            cost: 0.0,
        });
    }
    let goal_node = require_node(store, goal)?;
    let target = goal_node.coordinate;

    let mut positions: HashMap<NodeId, Coordinate> = HashMap::new();
    positions.insert(start, start_node.coordinate);
    positions.insert(goal, target);

    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, (NodeId, usize)> = HashMap::new();
    let mut closed: HashSet<NodeId> = HashSet::new();
    let mut queue = BinaryHeap::new();
    let mut sequence = 0u64;

    g_score.insert(start, 0.0);
    queue.push(AStarEntry::new(
        start,
        0.0,
        heuristic(&start_node.coordinate, &target),
        sequence,
    ));

    while let Some(entry) = queue.pop() {
        if cancel.is_cancelled() {
            debug!(start, goal, expanded = closed.len(), "search cancelled");
            return Err(Error::Cancelled);
        }

        if !closed.insert(entry.node) {
            continue;
        }

        if entry.node == goal {
            debug!(
                start,
                goal,
                %mode,
                cost = entry.cost.0,
                expanded = closed.len(),
                "path found"
            );
            return reconstruct_path(store, &parents, start, goal, entry.cost.0, start_node);
        }

        let edges = store.outgoing_edges(entry.node)?;
        for (index, edge) in edges.iter().enumerate() {
            let step = edge.cost(mode);
            if !step.is_finite() || closed.contains(&edge.to) {
                continue;
            }

            let tentative = entry.cost.0 + step;
            let improves = match g_score.get(&edge.to) {
                Some(known) => tentative < *known,
                None => true,
            };
            if !improves {
                continue;
            }

            let position = match positions.get(&edge.to) {
                Some(position) => *position,
                None => {
                    let node = require_node(store, edge.to)?;
                    positions.insert(edge.to, node.coordinate);
                    node.coordinate
                }
            };

            g_score.insert(edge.to, tentative);
            parents.insert(edge.to, (entry.node, index));
            sequence += 1;
            queue.push(AStarEntry::new(
                edge.to,
                tentative,
                heuristic(&position, &target),
                sequence,
            ));
        }
    }

    debug!(start, goal, %mode, expanded = closed.len(), "no path");
    Err(Error::NoRouteFound {
        from: start,
        to: goal,
    })
}

/// Straight-line haversine metres. Never exceeds true cost because every
/// edge costs at least its length and its length is at least the
/// great-circle distance between its ends.
pub fn heuristic(from: &Coordinate, to: &Coordinate) -> f64 {
    from.distance_to(to)
}

fn require_node<S>(store: &S, id: NodeId) -> Result<RoutingNode>
where
    S: GraphStore + ?Sized,
{
    store
        .node(id)?
        .ok_or_else(|| Error::unavailable(format!("node {id} is referenced but missing")))
}

fn reconstruct_path<S>(
    store: &S,
    parents: &HashMap<NodeId, (NodeId, usize)>,
    start: NodeId,
    goal: NodeId,
    cost: f64,
    start_node: RoutingNode,
) -> Result<PathSegment>
where
    S: GraphStore + ?Sized,
{
    let mut edges = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(&(parent, index)) = parents.get(&current) else {
            return Err(Error::unavailable(format!(
                "search lost the parent of node {current}"
            )));
        };
        let outgoing = store.outgoing_edges(parent)?;
        let edge = outgoing
            .get(index)
            .filter(|edge| edge.to == current)
            .cloned()
            .ok_or_else(|| {
                Error::unavailable(format!("edges of node {parent} changed during search"))
            })?;
        edges.push(edge);
        current = parent;
    }
    edges.reverse();

    let mut nodes = Vec::with_capacity(edges.len() + 1);
    nodes.push(start_node);
    for edge in &edges {
        nodes.push(require_node(store, edge.to)?);
    }

    Ok(PathSegment { nodes, edges, cost })
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry {
    node: NodeId,
    cost: FloatOrd,
    estimate: FloatOrd,
    sequence: u64,
}

impl AStarEntry {
    fn new(node: NodeId, cost: f64, heuristic: f64, sequence: u64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
            sequence,
        }
    }
}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap pops the smallest estimate, and the
        // earliest push among equal estimates.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
