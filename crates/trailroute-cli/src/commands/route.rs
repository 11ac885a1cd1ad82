//! Route command handler for computing trail routes between coordinates.

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use trailroute_lib::{
    CancelToken, Coordinate, RouteRequest, Router, RouterConfig, SqliteGraphStore, TravelMode,
};

use crate::commands::friendly_error;
use crate::output::OutputFormat;

/// Arguments for the route command.
#[derive(Debug, Clone)]
pub struct RouteCommandArgs {
    pub from: Coordinate,
    pub to: Coordinate,
    /// Intermediate waypoints, visited in order.
    pub via: Vec<Coordinate>,
    pub mode: TravelMode,
    /// Overrides the configured snap radius.
    pub snap_radius: Option<f64>,
    /// Abandon the search after this many milliseconds.
    pub timeout_ms: Option<u64>,
}

impl RouteCommandArgs {
    /// Convert CLI args to a library [`RouteRequest`].
    pub fn to_request(&self) -> RouteRequest {
        RouteRequest::new(self.from, self.to, self.mode).with_via(self.via.iter().copied())
    }

    /// Environment configuration with command-line overrides applied.
    pub fn router_config(&self) -> RouterConfig {
        let config = RouterConfig::from_env();
        match self.snap_radius {
            Some(radius) => config.with_snap_radius(radius),
            None => config,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        match self.timeout_ms {
            Some(ms) => CancelToken::with_timeout(Duration::from_millis(ms)),
            None => CancelToken::new(),
        }
    }
}

/// Handle the route subcommand.
pub fn handle_route_command(
    graph_path: &Path,
    format: OutputFormat,
    args: &RouteCommandArgs,
) -> Result<()> {
    let store = SqliteGraphStore::open(graph_path).map_err(|err| friendly_error(err, graph_path))?;
    let router = Router::new(store, args.router_config());

    let route = router
        .find_route_with(&args.to_request(), &args.cancel_token())
        .map_err(|err| friendly_error(err, graph_path))?;

    format
        .render_route(&route, &mut io::stdout().lock())
        .context("failed to write output")
}
