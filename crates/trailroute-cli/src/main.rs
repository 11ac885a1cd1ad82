use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use trailroute_cli::commands::build::{handle_build_command, BuildCommandArgs};
use trailroute_cli::commands::nearest::handle_nearest_command;
use trailroute_cli::commands::resolve_graph_path;
use trailroute_cli::commands::route::{handle_route_command, RouteCommandArgs};
use trailroute_cli::logging::{init_logging, LogFormat, LoggingConfig};
use trailroute_cli::output::OutputFormat;
use trailroute_lib::{Coordinate, TravelMode};

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline trail routing for hiking and cycling")]
struct Cli {
    /// Routing graph database (default: per-user data directory).
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// Log format written to stderr.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a routing graph from topology (and optional elevation) JSON.
    Build {
        /// Topology JSON: `{"version": ..., "chains": [...]}`.
        #[arg(long)]
        topology: PathBuf,
        /// Elevation JSON: `{"source": ..., "elevations": {"<node id>": metres}}`.
        #[arg(long)]
        elevation: Option<PathBuf>,
    },
    /// Compute a route between two coordinates.
    Route {
        /// Start as `lat,lon`.
        #[arg(long = "from", allow_hyphen_values = true)]
        from: Coordinate,
        /// Destination as `lat,lon`.
        #[arg(long = "to", allow_hyphen_values = true)]
        to: Coordinate,
        /// Intermediate waypoint as `lat,lon`; repeat to add more, visited in order.
        #[arg(long = "via", allow_hyphen_values = true)]
        via: Vec<Coordinate>,
        /// Travel mode: hiking or cycling.
        #[arg(long, default_value_t = TravelMode::Hiking)]
        mode: TravelMode,
        /// Maximum waypoint snapping distance in metres.
        #[arg(long)]
        snap_radius: Option<f64>,
        /// Give up after this many milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Find the trail node a coordinate would snap to.
    Nearest {
        /// Query point as `lat,lon`.
        #[arg(long, allow_hyphen_values = true)]
        at: Coordinate,
        /// Search radius in metres.
        #[arg(long, default_value_t = 500.0)]
        radius: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env().with_format(cli.log_format));

    let graph_path = resolve_graph_path(cli.graph.as_deref())?;

    match cli.command {
        Command::Build {
            topology,
            elevation,
        } => handle_build_command(
            &graph_path,
            cli.format,
            &BuildCommandArgs {
                topology,
                elevation,
            },
        ),
        Command::Route {
            from,
            to,
            via,
            mode,
            snap_radius,
            timeout_ms,
        } => handle_route_command(
            &graph_path,
            cli.format,
            &RouteCommandArgs {
                from,
                to,
                via,
                mode,
                snap_radius,
                timeout_ms,
            },
        ),
        Command::Nearest { at, radius } => {
            handle_nearest_command(&graph_path, cli.format, at, radius)
        }
    }
}
