//! `atc-tower` — runway authority for the rust_atc workspace.
//!
//! The tower controller owns only the runway-exclusive nodes of the ground
//! network.  It enforces runway mutual exclusion: an aircraft is accepted
//! from the ground controller only when the whole runway span its route
//! claims is unoccupied, and its [`TrafficRecord`](atc_traffic::TrafficRecord)
//! is owned by the tower registry for the duration of the occupancy.

pub mod tower;


pub use tower::{Handoff, TowerController};
