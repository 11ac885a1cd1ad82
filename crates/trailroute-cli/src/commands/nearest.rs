//! Nearest command handler: which trail node would a coordinate snap to?

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};

use trailroute_lib::{Coordinate, GraphStore, SqliteGraphStore};

use crate::commands::friendly_error;
use crate::output::{NearestOutput, OutputFormat};

/// Handle the nearest subcommand.
pub fn handle_nearest_command(
    graph_path: &Path,
    format: OutputFormat,
    at: Coordinate,
    radius_m: f64,
) -> Result<()> {
    if !radius_m.is_finite() || radius_m < 0.0 {
        bail!("--radius must be a non-negative number of metres, got {radius_m}");
    }

    let store = SqliteGraphStore::open(graph_path).map_err(|err| friendly_error(err, graph_path))?;
    let node = store
        .nearest_node(at, radius_m)
        .map_err(|err| friendly_error(err, graph_path))?;

    let output = NearestOutput {
        query: at,
        radius_m,
        node: node.as_ref(),
        distance_m: node.as_ref().map(|node| at.distance_to(&node.coordinate)),
    };
    format
        .render_nearest(&output, &mut io::stdout().lock())
        .context("failed to write output")
}
