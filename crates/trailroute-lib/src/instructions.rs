//! Turn-by-turn instructions derived from a computed path.
//!
//! Every junction between two consecutive edges yields one instruction. The
//! turn angle is the signed change between the bearing into the junction
//! (measured over roughly the last `bearing_sample_m` of the previous edge)
//! and the bearing out of it (over the first `bearing_sample_m` of the next
//! edge). Positive angles turn right.

use std::fmt;

use serde::Serialize;

use crate::config::{RouterConfig, TurnThresholds};
use crate::geometry::Coordinate;
use crate::graph::{RoutingEdge, RoutingNode};

/// Below this many metres two points are treated as the same place and give
/// no usable bearing.
const MIN_BEARING_SPAN_M: f64 = 0.01;

/// Maneuver classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    Start,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
    SlightRight,
    Right,
    SharpRight,
    UTurn,
    Arrive,
}

impl TurnDirection {
    fn verb(self) -> &'static str {
        match self {
            TurnDirection::Start => "Head",
            TurnDirection::Straight => "Continue straight",
            TurnDirection::SlightLeft => "Turn slight left",
            TurnDirection::Left => "Turn left",
            TurnDirection::SharpLeft => "Turn sharp left",
            TurnDirection::SlightRight => "Turn slight right",
            TurnDirection::Right => "Turn right",
            TurnDirection::SharpRight => "Turn sharp right",
            TurnDirection::UTurn => "Make a U-turn",
            TurnDirection::Arrive => "Arrive at destination",
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TurnDirection::Start => "start",
            TurnDirection::Straight => "straight",
            TurnDirection::SlightLeft => "slight left",
            TurnDirection::Left => "left",
            TurnDirection::SharpLeft => "sharp left",
            TurnDirection::SlightRight => "slight right",
            TurnDirection::Right => "right",
            TurnDirection::SharpRight => "sharp right",
            TurnDirection::UTurn => "u-turn",
            TurnDirection::Arrive => "arrive",
        };
        f.write_str(value)
    }
}

/// One maneuver along a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnInstruction {
    pub coordinate: Coordinate,
    pub direction: TurnDirection,
    /// Outgoing bearing in degrees; the arrival bearing for the final instruction.
    pub bearing_deg: f64,
    /// Signed turn angle in degrees, zero for start and arrive.
    pub turn_angle_deg: f64,
    pub distance_from_previous_m: f64,
    pub cumulative_distance_m: f64,
    pub trail_name: Option<String>,
    pub description: String,
}

/// Signed bearing change from `incoming` to `outgoing`, normalised to (-180, 180].
pub fn bearing_delta(incoming: f64, outgoing: f64) -> f64 {
    let delta = (outgoing - incoming).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Bucket a signed bearing change.
///
/// Each threshold is an exclusive upper bound on `|delta|`, so exactly 15
/// degrees is already a slight turn and exactly 45 a normal one.
pub fn classify_turn(delta: f64, thresholds: &TurnThresholds) -> TurnDirection {
    let magnitude = delta.abs();
    let right = delta > 0.0;
    if magnitude < thresholds.straight {
        TurnDirection::Straight
    } else if magnitude < thresholds.slight {
        if right {
            TurnDirection::SlightRight
        } else {
            TurnDirection::SlightLeft
        }
    } else if magnitude < thresholds.normal {
        if right {
            TurnDirection::Right
        } else {
            TurnDirection::Left
        }
    } else if magnitude < thresholds.sharp {
        if right {
            TurnDirection::SharpRight
        } else {
            TurnDirection::SharpLeft
        }
    } else {
        TurnDirection::UTurn
    }
}

/// Eight-point compass name for a bearing.
pub fn cardinal_direction(bearing: f64) -> &'static str {
    const NAMES: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let sector = ((bearing.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize % 8;
    NAMES[sector]
}

/// Build the instruction list for a path.
///
/// `nodes` must hold one more entry than `edges`, with `edges[i]` running
/// from `nodes[i]` to `nodes[i + 1]`.
pub fn generate_instructions(
    nodes: &[RoutingNode],
    edges: &[RoutingEdge],
    config: &RouterConfig,
) -> Vec<TurnInstruction> {
    let Some(first) = nodes.first() else {
        return Vec::new();
    };
    let sample = config.bearing_sample_m;

    let polylines: Vec<Vec<Coordinate>> = edges
        .iter()
        .zip(nodes.windows(2))
        .map(|(edge, pair)| edge_points(edge, pair[0].coordinate, pair[1].coordinate))
        .collect();

    let mut instructions = Vec::with_capacity(edges.len() + 2);

    let start_bearing = polylines
        .first()
        .and_then(|points| outgoing_bearing(points, sample))
        .unwrap_or(0.0);
    let start_name = edges.first().and_then(|edge| edge.trail_name.clone());
    let start_description = if edges.is_empty() {
        "Start".to_string()
    } else {
        match &start_name {
            Some(name) => format!("Head {} on {name}", cardinal_direction(start_bearing)),
            None => format!("Head {}", cardinal_direction(start_bearing)),
        }
    };
    instructions.push(TurnInstruction {
        coordinate: first.coordinate,
        direction: TurnDirection::Start,
        bearing_deg: start_bearing,
        turn_angle_deg: 0.0,
        distance_from_previous_m: 0.0,
        cumulative_distance_m: 0.0,
        trail_name: start_name,
        description: start_description,
    });

    let mut cumulative = 0.0;
    for index in 1..edges.len() {
        let previous = &edges[index - 1];
        let next = &edges[index];
        cumulative += previous.distance_m;

        let incoming = incoming_bearing(&polylines[index - 1], sample);
        let outgoing = outgoing_bearing(&polylines[index], sample);
        let (delta, bearing) = match (incoming, outgoing) {
            (Some(incoming), Some(outgoing)) => (bearing_delta(incoming, outgoing), outgoing),
            (_, Some(outgoing)) => (0.0, outgoing),
            (Some(incoming), None) => (0.0, incoming),
            (None, None) => (0.0, 0.0),
        };
        let direction = classify_turn(delta, &config.turn_thresholds);

        instructions.push(TurnInstruction {
            coordinate: nodes[index].coordinate,
            direction,
            bearing_deg: bearing,
            turn_angle_deg: delta,
            distance_from_previous_m: previous.distance_m,
            cumulative_distance_m: cumulative,
            trail_name: next.trail_name.clone(),
            description: describe(direction, next.trail_name.as_deref(), bearing),
        });
    }

    let last = nodes.last().unwrap_or(first);
    let (arrival_leg, arrival_bearing) = match (edges.last(), polylines.last()) {
        (Some(edge), Some(points)) => (
            edge.distance_m,
            incoming_bearing(points, sample).unwrap_or(0.0),
        ),
        _ => (0.0, start_bearing),
    };
    cumulative += arrival_leg;
    instructions.push(TurnInstruction {
        coordinate: last.coordinate,
        direction: TurnDirection::Arrive,
        bearing_deg: arrival_bearing,
        turn_angle_deg: 0.0,
        distance_from_previous_m: arrival_leg,
        cumulative_distance_m: cumulative,
        trail_name: None,
        description: TurnDirection::Arrive.verb().to_string(),
    });

    instructions
}

fn describe(direction: TurnDirection, trail_name: Option<&str>, bearing: f64) -> String {
    match trail_name {
        Some(name) => format!("{} onto {name}", direction.verb()),
        None => format!(
            "{} heading {}",
            direction.verb(),
            cardinal_direction(bearing)
        ),
    }
}

fn edge_points(edge: &RoutingEdge, from: Coordinate, to: Coordinate) -> Vec<Coordinate> {
    let mut points = Vec::with_capacity(edge.geometry.len() + 2);
    points.push(from);
    points.extend_from_slice(&edge.geometry);
    points.push(to);
    points
}

/// Bearing from the point roughly `sample_m` before the end of `points` to its end.
fn incoming_bearing(points: &[Coordinate], sample_m: f64) -> Option<f64> {
    let end = *points.last()?;
    let mut travelled = 0.0;
    let mut origin = end;
    for pair in points.windows(2).rev() {
        travelled += pair[0].distance_to(&pair[1]);
        origin = pair[0];
        if travelled >= sample_m {
            break;
        }
    }
    bearing_between(&origin, &end)
}

/// Bearing from the start of `points` to the point roughly `sample_m` along.
fn outgoing_bearing(points: &[Coordinate], sample_m: f64) -> Option<f64> {
    let start = *points.first()?;
    let mut travelled = 0.0;
    let mut target = start;
    for pair in points.windows(2) {
        travelled += pair[0].distance_to(&pair[1]);
        target = pair[1];
        if travelled >= sample_m {
            break;
        }
    }
    bearing_between(&start, &target)
}

fn bearing_between(from: &Coordinate, to: &Coordinate) -> Option<f64> {
    if from.distance_to(to) < MIN_BEARING_SPAN_M {
        None
    } else {
        Some(from.bearing_to(to))
    }
}
