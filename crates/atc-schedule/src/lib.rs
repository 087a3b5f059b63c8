//! `atc-schedule` — startup admission for the rust_atc workspace.
//!
//! Aircraft enter the managed network in two stages: a **startup pool**
//! (engines running, not yet cleared to move, gated by a scheduled start
//! time) and the **active pool** (continuously updated by the ground
//! controller).  This crate owns the time-keyed queue that gates the first
//! stage, the priority ranks assigned at admission, and the deterministic
//! jitter that staggers simultaneous pushbacks.

pub mod priority;
pub mod stagger;
pub mod startup;


pub use priority::PriorityAllocator;
pub use stagger::Stagger;
pub use startup::StartupQueue;
