//! `atc-traffic` — mutable per-aircraft state for the rust_atc workspace.
//!
//! A [`TrafficRecord`] is the controller-side view of one AI aircraft: its
//! assigned [`Route`], the latest kinematic report, its priority rank, and
//! the [`Instruction`](atc_core::Instruction) currently published to it.
//!
//! Records live in a [`TrafficRegistry`] owned by exactly one controller at
//! a time.  The ground/tower hand-off moves a record between registries
//! (remove + insert) — records are never shared or duplicated.

pub mod error;
pub mod record;
pub mod registry;
pub mod route;


pub use error::{TrafficError, TrafficResult};
pub use record::{NODE_CAPTURE_RADIUS_M, TaxiState, TrafficRecord};
pub use registry::TrafficRegistry;
pub use route::Route;
