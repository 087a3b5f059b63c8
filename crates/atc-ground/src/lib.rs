//! `atc-ground` — taxiway authority for the rust_atc workspace.
//!
//! # Tick phases
//!
//! The owning simulation loop calls [`GroundController::update`] once per
//! frame.  Phase order within one tick is a hard guarantee:
//!
//! ```text
//! ① Startup admission — aircraft whose scheduled start time has elapsed
//!                       move from the startup pool to the active pool.
//! ② Tower returns     — aircraft that vacated their runway span re-enter
//!                       the active taxi pool.
//! ③ Conflict checks   — per aircraft, ascending id: hold decision, then
//!                       proportional speed adjustment.
//! ④ Deadlock scan     — wait-for cycles broken by forced movement.
//! ⑤ Hand-offs         — aircraft holding short of a runway are offered to
//!                       the tower; refusal keeps them holding.
//! ```
//!
//! Startup admission must precede the conflict checks so no aircraft enters
//! a cycle scan without a valid route; hand-offs come last so the tower sees
//! post-resolution state.

pub mod airport;
pub mod controller;
pub mod deadlock;

#[cfg(test)]
mod tests;

pub use airport::Airport;
pub use controller::GroundController;
pub use deadlock::{DeadlockPolicy, WaitForGraph};
