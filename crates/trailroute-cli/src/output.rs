//! Output formatting for command results.
//!
//! Text output is meant for people; JSON output is a stable shape for scripts
//! and is the only thing written to stdout in that mode.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use trailroute_lib::{
    BuildMetadata, ComputedRoute, Coordinate, NodeId, RoutingNode, TravelMode, TurnInstruction,
};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// JSON view of a computed route.
#[derive(Debug, Serialize)]
pub struct RouteOutput<'a> {
    pub mode: TravelMode,
    pub total_distance_m: f64,
    pub total_cost: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub estimated_duration_s: f64,
    pub nodes: Vec<NodeId>,
    pub polyline: &'a [Coordinate],
    pub instructions: &'a [TurnInstruction],
}

impl<'a> From<&'a ComputedRoute> for RouteOutput<'a> {
    fn from(route: &'a ComputedRoute) -> Self {
        Self {
            mode: route.mode,
            total_distance_m: route.total_distance_m,
            total_cost: route.total_cost,
            elevation_gain_m: route.elevation_gain_m,
            elevation_loss_m: route.elevation_loss_m,
            estimated_duration_s: route.estimated_duration_s,
            nodes: route.nodes.iter().map(|node| node.id).collect(),
            polyline: &route.polyline,
            instructions: &route.instructions,
        }
    }
}

/// Summary of a finished graph build.
#[derive(Debug, Serialize)]
pub struct BuildOutput<'a> {
    pub graph: String,
    pub topology_sha256: &'a str,
    pub dropped: Vec<String>,
    pub metadata: &'a BuildMetadata,
}

/// Result of a nearest-node lookup.
#[derive(Debug, Serialize)]
pub struct NearestOutput<'a> {
    pub query: Coordinate,
    pub radius_m: f64,
    pub node: Option<&'a RoutingNode>,
    pub distance_m: Option<f64>,
}

impl OutputFormat {
    pub fn render_route<W: Write>(&self, route: &ComputedRoute, out: &mut W) -> io::Result<()> {
        match self {
            OutputFormat::Json => write_json(out, &RouteOutput::from(route)),
            OutputFormat::Text => render_route_text(route, out),
        }
    }

    pub fn render_build<W: Write>(&self, build: &BuildOutput<'_>, out: &mut W) -> io::Result<()> {
        match self {
            OutputFormat::Json => write_json(out, build),
            OutputFormat::Text => {
                let metadata = build.metadata;
                writeln!(out, "Built routing graph at {}", build.graph)?;
                writeln!(out, "  nodes:    {}", metadata.node_count)?;
                writeln!(out, "  edges:    {}", metadata.edge_count)?;
                writeln!(out, "  segments: {}", metadata.segment_count)?;
                writeln!(out, "  dropped:  {}", metadata.dropped_segments)?;
                writeln!(out, "  elevation source: {}", metadata.elevation_source)?;
                if let Some(version) = &metadata.source_version {
                    writeln!(out, "  source version:   {version}")?;
                }
                writeln!(out, "  topology sha256:  {}", build.topology_sha256)?;
                for reason in &build.dropped {
                    writeln!(out, "  skipped: {reason}")?;
                }
                Ok(())
            }
        }
    }

    pub fn render_nearest<W: Write>(
        &self,
        nearest: &NearestOutput<'_>,
        out: &mut W,
    ) -> io::Result<()> {
        match self {
            OutputFormat::Json => write_json(out, nearest),
            OutputFormat::Text => match (nearest.node, nearest.distance_m) {
                (Some(node), Some(distance)) => {
                    write!(
                        out,
                        "Nearest node {} at {} ({}",
                        node.id,
                        node.coordinate,
                        format_distance(distance)
                    )?;
                    match node.elevation_m {
                        Some(elevation) => writeln!(out, " away, {elevation:.0} m elevation)"),
                        None => writeln!(out, " away)"),
                    }
                }
                _ => writeln!(
                    out,
                    "No trail node within {} of {}",
                    format_distance(nearest.radius_m),
                    nearest.query
                ),
            },
        }
    }
}

fn render_route_text<W: Write>(route: &ComputedRoute, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Route ({}): {} over {} segment(s), about {}",
        route.mode,
        format_distance(route.total_distance_m),
        route.edges.len(),
        format_duration(route.estimated_duration_s)
    )?;
    writeln!(
        out,
        "  ascent {:.0} m, descent {:.0} m, cost {:.1}",
        route.elevation_gain_m, route.elevation_loss_m, route.total_cost
    )?;
    writeln!(out)?;
    for (index, instruction) in route.instructions.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {:>9}  {}",
            index + 1,
            format_distance(instruction.cumulative_distance_m),
            instruction.description
        )?;
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Metres below 1 km, otherwise kilometres with two decimals.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Hours and minutes, rounded to the nearest minute.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round().max(0.0) as u64;
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances_switch_to_kilometres() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(2000.0), "2.00 km");
        assert_eq!(format_distance(12_346.0), "12.35 km");
    }

    #[test]
    fn durations_round_to_minutes() {
        assert_eq!(format_duration(29.0), "0 min");
        assert_eq!(format_duration(1440.0), "24 min");
        assert_eq!(format_duration(3600.0), "1 h");
        assert_eq!(format_duration(5430.0), "1 h 31 min");
    }

    #[test]
    fn nearest_text_reports_misses() {
        let output = NearestOutput {
            query: Coordinate::new(46.0, 7.0),
            radius_m: 250.0,
            node: None,
            distance_m: None,
        };
        let mut buffer = Vec::new();
        OutputFormat::Text
            .render_nearest(&output, &mut buffer)
            .expect("render");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "No trail node within 250 m of 46.000000,7.000000\n"
        );
    }
}
