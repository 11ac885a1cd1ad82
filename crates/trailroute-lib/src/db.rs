//! SQLite persistence for routing graphs.
//!
//! The schema stores one `edges` row per physical segment. Each row carries
//! the forward and reverse cost for every travel mode; loading expands it back
//! into the two directed [`RoutingEdge`]s. Impassable costs are stored as
//! `NULL`. Intermediate geometry is a blob of little-endian `f64`
//! latitude/longitude pairs.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::cost::{HighwayType, Surface, TechnicalGrade, IMPASSABLE};
use crate::error::{Error, Result};
use crate::geometry::{Coordinate, EARTH_RADIUS_M};
use crate::graph::{
    BuildMetadata, ModeCosts, NodeId, RoutingEdge, RoutingGraph, RoutingNode, SegmentId,
};
use crate::store::GraphStore;

/// Bumped whenever the persisted layout changes incompatibly.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
DROP TABLE IF EXISTS edges;
DROP TABLE IF EXISTS nodes;
DROP TABLE IF EXISTS metadata;

CREATE TABLE nodes (
    id INTEGER PRIMARY KEY,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    elevation REAL
);
CREATE INDEX idx_nodes_lat_lon ON nodes (latitude, longitude);

CREATE TABLE edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_node INTEGER NOT NULL REFERENCES nodes (id),
    to_node INTEGER NOT NULL REFERENCES nodes (id),
    distance REAL NOT NULL,
    elevation_gain REAL NOT NULL,
    elevation_loss REAL NOT NULL,
    surface TEXT NOT NULL,
    highway_type TEXT NOT NULL,
    technical_grade TEXT NOT NULL,
    trail_name TEXT,
    hiking_cost REAL,
    hiking_reverse_cost REAL,
    cycling_cost REAL,
    cycling_reverse_cost REAL,
    is_oneway INTEGER NOT NULL DEFAULT 0,
    geometry BLOB,
    source_way_id INTEGER NOT NULL
);
CREATE INDEX idx_edges_from ON edges (from_node);
CREATE INDEX idx_edges_to ON edges (to_node);

CREATE TABLE metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const NODE_COLUMNS: &[&str] = &["id", "latitude", "longitude", "elevation"];

const EDGE_COLUMNS: &[&str] = &[
    "id",
    "from_node",
    "to_node",
    "distance",
    "elevation_gain",
    "elevation_loss",
    "surface",
    "highway_type",
    "technical_grade",
    "trail_name",
    "hiking_cost",
    "hiking_reverse_cost",
    "cycling_cost",
    "cycling_reverse_cost",
    "is_oneway",
    "geometry",
    "source_way_id",
];

/// Write `graph` to a SQLite database at `path`, replacing any previous graph.
pub fn save_graph(graph: &RoutingGraph, path: &Path) -> Result<()> {
    let mut connection = Connection::open(path)?;
    let tx = connection.transaction()?;
    tx.execute_batch(SCHEMA)?;

    {
        let mut insert_node = tx.prepare(
            "INSERT INTO nodes (id, latitude, longitude, elevation) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for node in graph.nodes() {
            insert_node.execute(params![
                node.id,
                node.coordinate.latitude,
                node.coordinate.longitude,
                node.elevation_m
            ])?;
        }

        let insert_sql = format!(
            "INSERT INTO edges ({columns}) VALUES ({placeholders})",
            columns = EDGE_COLUMNS.join(", "),
            placeholders = (1..=EDGE_COLUMNS.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut insert_edge = tx.prepare(&insert_sql)?;
        for (forward, reverse_costs) in segment_rows(graph) {
            insert_edge.execute(params![
                forward.segment,
                forward.from,
                forward.to,
                forward.distance_m,
                forward.elevation_gain_m,
                forward.elevation_loss_m,
                forward.surface.as_str(),
                forward.highway.as_str(),
                forward.technical_grade.as_str(),
                forward.trail_name,
                persisted_cost(forward.costs.hiking),
                persisted_cost(reverse_costs.hiking),
                persisted_cost(forward.costs.cycling),
                persisted_cost(reverse_costs.cycling),
                forward.one_way,
                encode_geometry(&forward.geometry),
                forward.source_way,
            ])?;
        }

        let metadata = graph.metadata();
        let mut insert_meta = tx.prepare("INSERT INTO metadata (key, value) VALUES (?1, ?2)")?;
        let mut entries = vec![
            ("schema_version", SCHEMA_VERSION.to_string()),
            ("node_count", graph.node_count().to_string()),
            ("edge_count", graph.edge_count().to_string()),
            ("segment_count", metadata.segment_count.to_string()),
            ("dropped_segments", metadata.dropped_segments.to_string()),
            ("elevation_source", metadata.elevation_source.clone()),
            ("built_at", metadata.built_at.to_string()),
        ];
        if let Some(version) = &metadata.source_version {
            entries.push(("source_version", version.clone()));
        }
        for (key, value) in entries {
            insert_meta.execute(params![key, value])?;
        }
    }

    tx.commit()?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "saved routing graph"
    );
    Ok(())
}

/// Load a persisted graph fully into memory.
pub fn load_graph(path: &Path) -> Result<RoutingGraph> {
    let connection = open_read_only(path)?;
    verify_schema(&connection)?;
    debug!(path = %path.display(), "loading routing graph");

    let nodes = {
        let sql = format!("SELECT {} FROM nodes", NODE_COLUMNS.join(", "));
        let mut stmt = connection.prepare(&sql).map_err(unavailable)?;
        let rows = stmt.query_map([], row_to_node).map_err(unavailable)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(unavailable)?
    };

    let edge_rows = {
        let sql = format!("SELECT {} FROM edges ORDER BY id", EDGE_COLUMNS.join(", "));
        let mut stmt = connection.prepare(&sql).map_err(unavailable)?;
        let rows = stmt.query_map([], EdgeRow::from_row).map_err(unavailable)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(unavailable)?
    };

    let mut edges = Vec::with_capacity(edge_rows.len() * 2);
    for row in edge_rows {
        let (forward, reverse) = row.into_edges()?;
        edges.push(forward);
        edges.push(reverse);
    }

    let metadata = read_metadata(&connection)?;
    let graph = RoutingGraph::from_parts(nodes, edges, metadata);
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded routing graph"
    );
    Ok(graph)
}

/// Graph store that reads a persisted graph on demand.
///
/// Queries go through one read-only connection guarded by a mutex, so the
/// store can be shared across threads.
pub struct SqliteGraphStore {
    connection: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteGraphStore {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = open_read_only(path)?;
        verify_schema(&connection)?;
        let metadata = read_metadata(&connection)?;
        debug!(
            path = %path.display(),
            nodes = metadata.node_count,
            edges = metadata.edge_count,
            "opened routing graph store"
        );
        Ok(Self {
            connection: Mutex::new(connection),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> Result<BuildMetadata> {
        read_metadata(&*self.lock()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| Error::unavailable("graph store connection lock poisoned"))
    }
}

impl GraphStore for SqliteGraphStore {
    fn node(&self, id: NodeId) -> Result<Option<RoutingNode>> {
        let connection = self.lock()?;
        let mut stmt = connection
            .prepare_cached("SELECT id, latitude, longitude, elevation FROM nodes WHERE id = ?1")
            .map_err(unavailable)?;
        stmt.query_row([id], row_to_node)
            .optional()
            .map_err(unavailable)
    }

    fn outgoing_edges(&self, id: NodeId) -> Result<Cow<'_, [RoutingEdge]>> {
        let rows = {
            let connection = self.lock()?;
            let sql = format!(
                "SELECT {} FROM edges WHERE from_node = ?1 OR to_node = ?1 ORDER BY id",
                EDGE_COLUMNS.join(", ")
            );
            let mut stmt = connection.prepare_cached(&sql).map_err(unavailable)?;
            let rows = stmt.query_map([id], EdgeRow::from_row).map_err(unavailable)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(unavailable)?
        };

        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            let (forward, reverse) = row.into_edges()?;
            if forward.from == id {
                edges.push(forward);
            }
            if reverse.from == id {
                edges.push(reverse);
            }
        }
        Ok(Cow::Owned(edges))
    }

    fn nearest_node(
        &self,
        coordinate: Coordinate,
        max_radius_m: f64,
    ) -> Result<Option<RoutingNode>> {
        if !coordinate.is_valid() || max_radius_m.is_nan() || max_radius_m < 0.0 {
            return Ok(None);
        }

        let bounds = BoundingBox::around(coordinate, max_radius_m);
        let candidates = {
            let connection = self.lock()?;
            let mut stmt = connection
                .prepare_cached(
                    "SELECT id, latitude, longitude, elevation FROM nodes \
                     WHERE latitude BETWEEN ?1 AND ?2 AND longitude BETWEEN ?3 AND ?4",
                )
                .map_err(unavailable)?;
            let rows = stmt
                .query_map(
                    params![
                        bounds.min_latitude,
                        bounds.max_latitude,
                        bounds.min_longitude,
                        bounds.max_longitude
                    ],
                    row_to_node,
                )
                .map_err(unavailable)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(unavailable)?
        };

        let nearest = candidates
            .into_iter()
            .map(|node| (coordinate.distance_to(&node.coordinate), node))
            .filter(|(distance, _)| *distance <= max_radius_m)
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

        debug!(
            %coordinate,
            max_radius_m,
            node = ?nearest.as_ref().map(|(_, node)| node.id),
            "nearest node lookup"
        );
        Ok(nearest.map(|(_, node)| node))
    }
}

/// Latitude/longitude window guaranteed to contain every point within a radius.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundingBox {
    min_latitude: f64,
    max_latitude: f64,
    min_longitude: f64,
    max_longitude: f64,
}

impl BoundingBox {
    fn around(center: Coordinate, radius_m: f64) -> Self {
        let delta_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let min_latitude = center.latitude - delta_lat;
        let max_latitude = center.latitude + delta_lat;

        // Near the poles or across the antimeridian the longitude window
        // degenerates; fall back to the full range.
        if min_latitude <= -90.0 || max_latitude >= 90.0 {
            return Self {
                min_latitude: min_latitude.max(-90.0),
                max_latitude: max_latitude.min(90.0),
                min_longitude: -180.0,
                max_longitude: 180.0,
            };
        }

        let widest = center
            .latitude
            .abs()
            .max(min_latitude.abs())
            .max(max_latitude.abs());
        let delta_lon = delta_lat / widest.to_radians().cos();
        let min_longitude = center.longitude - delta_lon;
        let max_longitude = center.longitude + delta_lon;
        if min_longitude < -180.0 || max_longitude > 180.0 {
            return Self {
                min_latitude,
                max_latitude,
                min_longitude: -180.0,
                max_longitude: 180.0,
            };
        }

        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }
}

/// Raw `edges` row before decoding.
struct EdgeRow {
    segment: SegmentId,
    from: NodeId,
    to: NodeId,
    distance: f64,
    gain: f64,
    loss: f64,
    surface: String,
    highway: String,
    grade: String,
    trail_name: Option<String>,
    hiking: Option<f64>,
    hiking_reverse: Option<f64>,
    cycling: Option<f64>,
    cycling_reverse: Option<f64>,
    one_way: bool,
    geometry: Option<Vec<u8>>,
    source_way: i64,
}

impl EdgeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            segment: row.get(0)?,
            from: row.get(1)?,
            to: row.get(2)?,
            distance: row.get(3)?,
            gain: row.get(4)?,
            loss: row.get(5)?,
            surface: row.get(6)?,
            highway: row.get(7)?,
            grade: row.get(8)?,
            trail_name: row.get(9)?,
            hiking: row.get(10)?,
            hiking_reverse: row.get(11)?,
            cycling: row.get(12)?,
            cycling_reverse: row.get(13)?,
            one_way: row.get(14)?,
            geometry: row.get(15)?,
            source_way: row.get(16)?,
        })
    }

    fn into_edges(self) -> Result<(RoutingEdge, RoutingEdge)> {
        let geometry = decode_geometry(self.segment, self.geometry.as_deref())?;
        let forward = RoutingEdge {
            segment: self.segment,
            reversed: false,
            from: self.from,
            to: self.to,
            distance_m: self.distance,
            elevation_gain_m: self.gain,
            elevation_loss_m: self.loss,
            surface: Surface::from_tag(Some(&self.surface)),
            highway: HighwayType::from_tag(Some(&self.highway)),
            technical_grade: TechnicalGrade::from_tag(Some(&self.grade)),
            trail_name: self.trail_name,
            one_way: self.one_way,
            costs: ModeCosts {
                hiking: self.hiking.unwrap_or(IMPASSABLE),
                cycling: self.cycling.unwrap_or(IMPASSABLE),
            },
            geometry,
            source_way: self.source_way,
        };
        let reverse = forward.reverse_with(ModeCosts {
            hiking: self.hiking_reverse.unwrap_or(IMPASSABLE),
            cycling: self.cycling_reverse.unwrap_or(IMPASSABLE),
        });
        Ok((forward, reverse))
    }
}

/// Pair each segment's forward edge with its reverse costs.
///
/// A segment whose forward edge is missing is rebuilt from its reverse edge
/// with the forward direction impassable.
fn segment_rows(graph: &RoutingGraph) -> Vec<(RoutingEdge, ModeCosts)> {
    let mut segments: BTreeMap<SegmentId, (Option<&RoutingEdge>, Option<&RoutingEdge>)> =
        BTreeMap::new();
    for edge in graph.edges() {
        let entry = segments.entry(edge.segment).or_default();
        if edge.reversed {
            entry.1 = Some(edge);
        } else {
            entry.0 = Some(edge);
        }
    }

    segments
        .into_values()
        .filter_map(|pair| match pair {
            (Some(forward), Some(reverse)) => Some((forward.clone(), reverse.costs)),
            (Some(forward), None) => Some((forward.clone(), ModeCosts::IMPASSABLE)),
            (None, Some(reverse)) => Some((
                reverse.reverse_with(ModeCosts::IMPASSABLE),
                reverse.costs,
            )),
            (None, None) => None,
        })
        .collect()
}

fn persisted_cost(cost: f64) -> Option<f64> {
    Some(cost).filter(|value| value.is_finite())
}

fn encode_geometry(points: &[Coordinate]) -> Option<Vec<u8>> {
    if points.is_empty() {
        return None;
    }
    let mut blob = Vec::with_capacity(points.len() * 16);
    for point in points {
        blob.extend_from_slice(&point.latitude.to_le_bytes());
        blob.extend_from_slice(&point.longitude.to_le_bytes());
    }
    Some(blob)
}

fn decode_geometry(segment: SegmentId, blob: Option<&[u8]>) -> Result<Vec<Coordinate>> {
    let Some(blob) = blob else {
        return Ok(Vec::new());
    };
    if blob.len() % 16 != 0 {
        return Err(Error::unavailable(format!(
            "geometry blob for edge {segment} has {} bytes, expected a multiple of 16",
            blob.len()
        )));
    }

    Ok(blob
        .chunks_exact(16)
        .map(|chunk| {
            let mut latitude = [0u8; 8];
            let mut longitude = [0u8; 8];
            latitude.copy_from_slice(&chunk[..8]);
            longitude.copy_from_slice(&chunk[8..]);
            Coordinate::new(f64::from_le_bytes(latitude), f64::from_le_bytes(longitude))
        })
        .collect())
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<RoutingNode> {
    Ok(RoutingNode {
        id: row.get(0)?,
        coordinate: Coordinate::new(row.get(1)?, row.get(2)?),
        elevation_m: row.get(3)?,
    })
}

fn parse_metadata<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::unavailable(format!("corrupt metadata value {value:?} for {key}")))
}

fn read_metadata(connection: &Connection) -> Result<BuildMetadata> {
    let mut metadata = BuildMetadata::default();
    if !table_exists(connection, "metadata")? {
        warn!("routing graph has no metadata table");
        return Ok(metadata);
    }

    let mut stmt = connection
        .prepare("SELECT key, value FROM metadata")
        .map_err(unavailable)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(unavailable)?;

    for row in rows {
        let (key, value) = row.map_err(unavailable)?;
        match key.as_str() {
            "node_count" => metadata.node_count = parse_metadata(&key, &value)?,
            "edge_count" => metadata.edge_count = parse_metadata(&key, &value)?,
            "segment_count" => metadata.segment_count = parse_metadata(&key, &value)?,
            "dropped_segments" => metadata.dropped_segments = parse_metadata(&key, &value)?,
            "source_version" => metadata.source_version = Some(value),
            "elevation_source" => metadata.elevation_source = value,
            "built_at" => metadata.built_at = parse_metadata(&key, &value)?,
            "schema_version" => {
                if value.parse::<i64>().ok() != Some(SCHEMA_VERSION) {
                    return Err(Error::unavailable(format!(
                        "unsupported graph schema version {value}"
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(metadata)
}

fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(Error::unavailable(format!(
            "no routing graph at {}",
            path.display()
        )));
    }
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|err| {
        Error::unavailable(format!("failed to open {}: {err}", path.display()))
    })
}

fn verify_schema(connection: &Connection) -> Result<()> {
    for (table, columns) in [("nodes", NODE_COLUMNS), ("edges", EDGE_COLUMNS)] {
        if !table_exists(connection, table)? {
            return Err(Error::unavailable(format!("missing table {table}")));
        }
        if !table_has_columns(connection, table, columns)? {
            return Err(Error::unavailable(format!(
                "table {table} is missing required columns"
            )));
        }
    }
    Ok(())
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")
        .map_err(unavailable)?;
    let mut rows = stmt.query([table]).map_err(unavailable)?;
    Ok(rows.next().map_err(unavailable)?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma).map_err(unavailable)?;
    let mut rows = stmt.query([]).map_err(unavailable)?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next().map_err(unavailable)? {
        let name: String = row.get(1).map_err(unavailable)?;
        columns.push(name);
    }

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}

fn unavailable(err: rusqlite::Error) -> Error {
    Error::unavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_blob_round_trips_and_rejects_truncation() {
        let points = vec![Coordinate::new(46.5, 7.25), Coordinate::new(-12.0, 130.5)];
        let blob = encode_geometry(&points).expect("non-empty geometry");
        assert_eq!(blob.len(), 32);
        assert_eq!(decode_geometry(1, Some(&blob)).expect("decodes"), points);

        assert!(encode_geometry(&[]).is_none());
        assert!(decode_geometry(1, None).expect("empty").is_empty());
        assert!(matches!(
            decode_geometry(1, Some(&blob[..20])),
            Err(Error::GraphUnavailable { .. })
        ));
    }

    #[test]
    fn impassable_costs_persist_as_null() {
        assert_eq!(persisted_cost(IMPASSABLE), None);
        assert_eq!(persisted_cost(12.5), Some(12.5));
    }

    #[test]
    fn bounding_box_contains_radius() {
        let center = Coordinate::new(46.0, 7.0);
        let bounds = BoundingBox::around(center, 1000.0);
        for bearing_point in [
            Coordinate::new(46.0089, 7.0),
            Coordinate::new(46.0, 7.0129),
            Coordinate::new(45.995, 6.994),
        ] {
            assert!(center.distance_to(&bearing_point) <= 1000.0);
            assert!(bearing_point.latitude >= bounds.min_latitude);
            assert!(bearing_point.latitude <= bounds.max_latitude);
            assert!(bearing_point.longitude >= bounds.min_longitude);
            assert!(bearing_point.longitude <= bounds.max_longitude);
        }
    }

    #[test]
    fn bounding_box_widens_across_antimeridian() {
        let bounds = BoundingBox::around(Coordinate::new(0.0, 179.999), 1000.0);
        assert_eq!(bounds.min_longitude, -180.0);
        assert_eq!(bounds.max_longitude, 180.0);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let result = SqliteGraphStore::open(Path::new("/definitely/not/here.db"));
        assert!(matches!(result, Err(Error::GraphUnavailable { .. })));
    }
}
