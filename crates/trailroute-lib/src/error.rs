use thiserror::Error;

use crate::graph::NodeId;

/// Convenient result alias for the trail routing library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A unit of input topology could not be turned into graph segments.
    ///
    /// The graph builder never returns this variant; it records it for each
    /// dropped chain or segment and keeps going.
    #[error("malformed topology in chain {chain}: {reason}")]
    MalformedTopology { chain: i64, reason: String },

    /// A requested waypoint has no graph node within the snap radius.
    #[error(
        "waypoint {waypoint} ({latitude:.6}, {longitude:.6}) has no trail node within {radius_m} m"
    )]
    PointNotRoutable {
        waypoint: usize,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    },

    /// The graph is disconnected between two required waypoints.
    #[error("no route found between node {from} and node {to}")]
    NoRouteFound { from: NodeId, to: NodeId },

    /// The graph store cannot supply data (missing or corrupt persisted graph).
    #[error("routing graph unavailable: {message}")]
    GraphUnavailable { message: String },

    /// The caller cancelled the search or its deadline passed.
    #[error("route search cancelled")]
    Cancelled,

    /// Raised when a request is rejected before any search runs.
    #[error("invalid route request: {message}")]
    InvalidRequest { message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON decoding errors on topology and elevation input.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Error::GraphUnavailable {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(chain: i64, reason: impl Into<String>) -> Self {
        Error::MalformedTopology {
            chain,
            reason: reason.into(),
        }
    }
}
