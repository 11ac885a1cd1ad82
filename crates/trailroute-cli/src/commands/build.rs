//! Build command handler: topology JSON in, SQLite routing graph out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::info;

use trailroute_lib::{build_graph, save_graph, ElevationSource, ElevationTable, NoElevation, Topology};

use crate::output::{BuildOutput, OutputFormat};

/// Arguments for the build command.
#[derive(Debug, Clone)]
pub struct BuildCommandArgs {
    /// Topology JSON document.
    pub topology: PathBuf,
    /// Optional elevation table JSON document.
    pub elevation: Option<PathBuf>,
}

/// Handle the build subcommand.
pub fn handle_build_command(
    graph_path: &Path,
    format: OutputFormat,
    args: &BuildCommandArgs,
) -> Result<()> {
    let bytes = fs::read(&args.topology)
        .with_context(|| format!("failed to read topology {}", args.topology.display()))?;
    let checksum = topology_checksum(&bytes);

    let mut topology = Topology::from_json_reader(bytes.as_slice())
        .with_context(|| format!("failed to parse topology {}", args.topology.display()))?;
    if topology.version.is_none() {
        topology.version = Some(format!("sha256:{checksum}"));
    }

    let elevation: Box<dyn ElevationSource> = match &args.elevation {
        Some(path) => Box::new(ElevationTable::from_path(path).with_context(|| {
            format!("failed to load elevation table {}", path.display())
        })?),
        None => Box::new(NoElevation),
    };

    let build = build_graph(&topology, elevation.as_ref());

    if let Some(parent) = graph_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    save_graph(&build.graph, graph_path)
        .with_context(|| format!("failed to write graph to {}", graph_path.display()))?;
    info!(graph = %graph_path.display(), checksum = %checksum, "graph build complete");

    let output = BuildOutput {
        graph: graph_path.display().to_string(),
        topology_sha256: &checksum,
        dropped: build.dropped.iter().map(ToString::to_string).collect(),
        metadata: build.graph.metadata(),
    };
    format
        .render_build(&output, &mut io::stdout().lock())
        .context("failed to write output")
}

/// Hex SHA-256 of the raw topology bytes.
pub fn topology_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
