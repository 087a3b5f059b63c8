//! `atc-network` — the static surface-movement graph for the rust_atc
//! workspace.
//!
//! Nodes are capacity-limited segments of the movement network (taxiway
//! segments, holding points, runway entry/exit points); edges are directed
//! connections carrying a physical width class.  The graph is immutable
//! after [`GroundNetworkBuilder::build`]; controllers only ever read it.
//!
//! Networks load either programmatically (builder) or from a pair of CSV
//! files (see [`loader`]).

pub mod error;
pub mod loader;
pub mod network;


pub use error::{NetworkError, NetworkResult};
pub use loader::{load_network_csv, load_network_readers};
pub use network::{GroundNetwork, GroundNetworkBuilder};
