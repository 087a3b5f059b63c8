//! CSV ground-network loader.
//!
//! # CSV format
//!
//! Two files: one row per node, one row per edge.
//!
//! ```csv
//! node_id,lat,lon,capacity,runway
//! 0,52.30800,4.76400,1,0
//! 1,52.30850,4.76450,1,0
//! 2,52.30900,4.76500,1,1
//! ```
//!
//! ```csv
//! from,to,length_m,width_class,oneway
//! 0,1,75.0,3,0
//! 1,2,0,3,1
//! ```
//!
//! - **`runway`**: `1` marks the node runway-exclusive (tower authority).
//! - **`length_m`**: `0` (or negative) means "compute from the two node
//!   positions" — airport data files frequently omit segment lengths.
//! - **`oneway`**: `0` adds the edge in both directions, `1` only `from→to`
//!   (pushback lanes, runway entries).
//!
//! Node ids must be dense `0..node_count`; duplicates or gaps are a
//! [`NetworkError::Parse`] / [`NetworkError::DuplicateNode`].

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use atc_core::{GeoPoint, NodeId};

use crate::{GroundNetwork, GroundNetworkBuilder, NetworkError, NetworkResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    node_id: u32,
    lat: f32,
    lon: f32,
    capacity: u8,
    runway: u8,
}

#[derive(Deserialize)]
struct EdgeRecord {
    from: u32,
    to: u32,
    length_m: f32,
    width_class: u8,
    oneway: u8,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`GroundNetwork`] from a node CSV and an edge CSV.
pub fn load_network_csv(nodes_path: &Path, edges_path: &Path) -> NetworkResult<GroundNetwork> {
    let nodes = std::fs::File::open(nodes_path).map_err(NetworkError::Io)?;
    let edges = std::fs::File::open(edges_path).map_err(NetworkError::Io)?;
    load_network_readers(nodes, edges)
}

/// Like [`load_network_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass `std::io::Cursor`s) or embedded airport data.
pub fn load_network_readers<N: Read, E: Read>(nodes: N, edges: E) -> NetworkResult<GroundNetwork> {
    // ── Parse node rows ───────────────────────────────────────────────────
    let mut node_reader = csv::Reader::from_reader(nodes);
    let mut rows: Vec<NodeRecord> = Vec::new();
    for result in node_reader.deserialize::<NodeRecord>() {
        rows.push(result.map_err(|e| NetworkError::Parse(e.to_string()))?);
    }

    // Node ids must form a dense 0..n range so they can double as indices.
    let node_count = rows.len();
    let mut seen = vec![false; node_count];
    let mut positions = vec![GeoPoint::new(0.0, 0.0); node_count];
    let mut capacities = vec![0u8; node_count];
    let mut runways = vec![false; node_count];
    for row in rows {
        let idx = row.node_id as usize;
        if idx >= node_count {
            return Err(NetworkError::Parse(format!(
                "node_id {} out of range for {node_count} nodes (ids must be dense 0..n)",
                row.node_id
            )));
        }
        if seen[idx] {
            return Err(NetworkError::DuplicateNode(NodeId(row.node_id)));
        }
        seen[idx] = true;
        positions[idx] = GeoPoint::new(row.lat, row.lon);
        capacities[idx] = row.capacity.max(1);
        runways[idx] = row.runway != 0;
    }

    let mut builder = GroundNetworkBuilder::with_capacity(node_count, node_count * 2);
    for i in 0..node_count {
        builder.add_node(positions[i], capacities[i], runways[i]);
    }

    // ── Parse edge rows ───────────────────────────────────────────────────
    let mut edge_reader = csv::Reader::from_reader(edges);
    for result in edge_reader.deserialize::<EdgeRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        let from = NodeId(row.from);
        let to = NodeId(row.to);
        if from.index() >= node_count {
            return Err(NetworkError::UnknownNode(from));
        }
        if to.index() >= node_count {
            return Err(NetworkError::UnknownNode(to));
        }

        // Zero/negative length → derive from node geometry.
        let length_m = if row.length_m > 0.0 {
            row.length_m
        } else {
            builder.node_pos(from).distance_m(builder.node_pos(to))
        };

        if row.oneway != 0 {
            builder.add_directed_edge(from, to, length_m, row.width_class);
        } else {
            builder.add_taxiway(from, to, length_m, row.width_class);
        }
    }

    Ok(builder.build())
}
