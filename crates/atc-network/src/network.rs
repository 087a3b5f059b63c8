//! Ground-network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`,
//! `edge_width_class`) are sorted by source node and indexed by `EdgeId`.
//! Iterating a node's outgoing edges is a contiguous memory scan.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest `NodeId`.  Used
//! to snap aircraft position reports onto the network.
//!
//! # Width classes
//!
//! Edges carry a width class `0..=5` mirroring ICAO aerodrome design groups
//! A–F.  An aircraft may traverse an edge only when its radius (half
//! wingspan) fits the class — see [`GroundNetwork::edge_allows`].

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use atc_core::{EdgeId, GeoPoint, NodeId};

/// Maximum aircraft radius (half wingspan, metres) admitted by each width
/// class.  Index = class; classes above 5 are clamped to class 5.
const CLASS_MAX_RADIUS_M: [f32; 6] = [7.5, 12.0, 18.0, 26.0, 32.5, 40.0];

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[lat, lon]` point with
/// the associated `NodeId`.
#[derive(Clone, Debug)]
struct NodeEntry {
    point: [f32; 2], // [lat, lon]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Sufficient for
    /// nearest-node queries within one airport (error < 0.1 % at ≤ 60° lat).
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── GroundNetwork ─────────────────────────────────────────────────────────────

/// Directed surface-movement graph in CSR format plus a spatial index for
/// snapping position reports.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`GroundNetworkBuilder`].
#[derive(Debug)]
pub struct GroundNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// How many aircraft may occupy each node at once (typically 1).
    pub node_capacity: Vec<u8>,

    /// Marks runway-exclusive nodes — these are under tower authority.
    pub node_runway: Vec<bool>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    /// Source node of each edge.  Redundant with CSR but kept for cheap
    /// reverse lookups when reporting conflicts.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Length of each edge in metres.
    pub edge_length_m: Vec<f32>,

    /// Width class of each edge (`0..=5`, ICAO groups A–F).
    pub edge_width_class: Vec<u8>,

    // ── Spatial index ─────────────────────────────────────────────────────
    spatial_idx: RTree<NodeEntry>,
}

impl GroundNetwork {
    /// Construct an empty network with no nodes or edges.
    ///
    /// Used as the placeholder at airports without ground-network data — the
    /// owning controller then reports `exists() == false`.
    pub fn empty() -> Self {
        GroundNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// `true` if `node` is a valid id in this network.
    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    // ── Node attributes ───────────────────────────────────────────────────
    //
    // The unchecked accessors treat an unknown id as a programming error:
    // they panic in debug builds via slice indexing.  Callers handling
    // untrusted ids use the `try_*` variants.

    #[inline]
    pub fn position(&self, node: NodeId) -> GeoPoint {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn capacity(&self, node: NodeId) -> u8 {
        self.node_capacity[node.index()]
    }

    #[inline]
    pub fn is_runway(&self, node: NodeId) -> bool {
        self.node_runway[node.index()]
    }

    pub fn try_position(&self, node: NodeId) -> Option<GeoPoint> {
        self.node_pos.get(node.index()).copied()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// This is a contiguous index range — no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Out-degree of `node` (number of outgoing edges).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// The edge from `from` to `to`, if one exists.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.out_edges(from).find(|&e| self.edge_to[e.index()] == to)
    }

    /// `true` if an aircraft of the given radius (half wingspan, metres) may
    /// traverse `edge`.
    #[inline]
    pub fn edge_allows(&self, edge: EdgeId, radius: f32) -> bool {
        let class = (self.edge_width_class[edge.index()] as usize).min(5);
        radius <= CLASS_MAX_RADIUS_M[class]
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the `NodeId` of the nearest network node to `pos`.
    ///
    /// Returns `None` only if the network has no nodes.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }
}

// ── GroundNetworkBuilder ──────────────────────────────────────────────────────

/// Construct a [`GroundNetwork`] incrementally, then call
/// [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// sorts edges by source node, constructs the CSR arrays, and bulk-loads the
/// R-tree.
///
/// # Example
///
/// ```
/// use atc_core::GeoPoint;
/// use atc_network::GroundNetworkBuilder;
///
/// let mut b = GroundNetworkBuilder::new();
/// let apron = b.add_node(GeoPoint::new(52.3080, 4.7640), 1, false);
/// let hold  = b.add_node(GeoPoint::new(52.3085, 4.7645), 1, false);
/// b.add_taxiway(apron, hold, 75.0, 3);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct GroundNetworkBuilder {
    nodes: Vec<RawNode>,
    raw_edges: Vec<RawEdge>,
}

struct RawNode {
    pos: GeoPoint,
    capacity: u8,
    runway: bool,
}

struct RawEdge {
    from: NodeId,
    to: NodeId,
    length_m: f32,
    width_class: u8,
}

impl GroundNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of nodes and edges to reduce
    /// reallocations when bulk-loading from CSV.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    ///
    /// `capacity` is the number of aircraft that may occupy the node at once;
    /// `runway` marks it as runway-exclusive (tower authority).
    pub fn add_node(&mut self, pos: GeoPoint, capacity: u8, runway: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RawNode { pos, capacity, runway });
        id
    }

    /// Add a **directed** edge from `from` to `to`.
    ///
    /// - `length_m`: physical length in metres.
    /// - `width_class`: `0..=5`, see [`GroundNetwork::edge_allows`].
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f32, width_class: u8) {
        self.raw_edges.push(RawEdge { from, to, length_m, width_class });
    }

    /// Convenience: add edges in **both directions** for a bidirectional
    /// taxiway segment (the common case).
    pub fn add_taxiway(&mut self, a: NodeId, b: NodeId, length_m: f32, width_class: u8) {
        self.add_directed_edge(a, b, length_m, width_class);
        self.add_directed_edge(b, a, length_m, width_class);
    }

    /// Look up the position of a node added earlier (used by the CSV loader
    /// to compute edge lengths between connected nodes).
    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()].pos
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.raw_edges.len()
    }

    /// Consume the builder and produce a [`GroundNetwork`].
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// load, where N = nodes, E = edges.
    pub fn build(self) -> GroundNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Sort edges by source node for CSR construction.
        let mut raw = self.raw_edges;
        raw.sort_unstable_by_key(|e| e.from.0);

        // Build edge arrays from sorted raw edges.
        let edge_from: Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to: Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f32> = raw.iter().map(|e| e.length_m).collect();
        let edge_width_class: Vec<u8> = raw.iter().map(|e| e.width_class).collect();

        // Build CSR row pointer (node_out_start).
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Bulk-load R-tree for O(N log N) construction (faster than N inserts).
        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| NodeEntry {
                point: [n.pos.lat, n.pos.lon],
                id: NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        GroundNetwork {
            node_pos: self.nodes.iter().map(|n| n.pos).collect(),
            node_capacity: self.nodes.iter().map(|n| n.capacity).collect(),
            node_runway: self.nodes.iter().map(|n| n.runway).collect(),
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_width_class,
            spatial_idx,
        }
    }
}

impl Default for GroundNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
