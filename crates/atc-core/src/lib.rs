//! `atc-core` — foundational types for the `rust_atc` surface-movement
//! coordination workspace.
//!
//! This crate is a dependency of every other `atc-*` crate.  It intentionally
//! has no `atc-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AircraftId`, `NodeId`, `EdgeId`                      |
//! | [`geo`]         | `GeoPoint`, haversine distance                        |
//! | [`time`]        | `SimClock` (dt-accumulating, Unix-anchored)           |
//! | [`instruction`] | `Instruction` (`Proceed` / `Hold` / `SpeedLimit`)     |
//! | [`flight`]      | `FlightKind` (departure / arrival precedence)         |
//! | [`error`]       | `AtcError`, `AtcResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod flight;
pub mod geo;
pub mod ids;
pub mod instruction;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{AtcError, AtcResult};
pub use flight::FlightKind;
pub use geo::GeoPoint;
pub use ids::{AircraftId, EdgeId, NodeId};
pub use instruction::Instruction;
pub use time::SimClock;
