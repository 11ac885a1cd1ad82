// Module exports for CLI subcommands
//
// Each module handles one subcommand. main.rs parses arguments and dispatches
// to these handlers.

pub mod build;
pub mod nearest;
pub mod route;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use trailroute_lib::Error as LibError;

/// Graph database location when `--graph` is not given:
/// `<user data dir>/trailroute/graph.db`.
pub fn default_graph_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "trailroute")
        .context("could not determine a data directory for this user; pass --graph")?;
    Ok(dirs.data_dir().join("graph.db"))
}

pub fn resolve_graph_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_graph_path(),
    }
}

/// Turn library errors into messages that tell the user what to do next.
pub fn friendly_error(err: LibError, graph_path: &Path) -> anyhow::Error {
    match err {
        LibError::PointNotRoutable {
            waypoint,
            latitude,
            longitude,
            radius_m,
        } => anyhow!(
            "Waypoint {} ({latitude:.6},{longitude:.6}) is more than {radius_m} m from any trail. \
             Move it closer to a trail or raise --snap-radius.",
            waypoint_label(waypoint)
        ),
        LibError::NoRouteFound { from, to } => anyhow!(
            "No route found between node {from} and node {to}. The waypoints lie on \
             disconnected trails, or every connection is closed to this travel mode."
        ),
        LibError::GraphUnavailable { message } => anyhow!(
            "Routing graph at {} is unavailable: {message}. Run `trailroute-cli build` first \
             or point --graph at an existing graph.",
            graph_path.display()
        ),
        LibError::Cancelled => anyhow!("Route search timed out; try a larger --timeout-ms."),
        other => anyhow::Error::new(other),
    }
}

fn waypoint_label(index: usize) -> String {
    match index {
        0 => "0 (start)".to_string(),
        other => other.to_string(),
    }
}
