//! Deterministic pushback stagger.
//!
//! When several aircraft share the same scheduled start time (a common
//! artifact of timetable data with minute resolution), admitting them all in
//! the same second produces an instant queue at the first shared node.  The
//! stagger spreads such starts over a short window.
//!
//! The jitter is drawn from a seeded `SmallRng`, so the same run seed always
//! produces the same admission times.

use rand::Rng;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use atc_core::AircraftId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded jitter source for scheduled start times.
pub struct Stagger {
    seed: u64,
}

impl Stagger {
    /// Create a stagger source from the run's global seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Jittered start time for `aircraft`: `base + [0, spread_secs]`.
    ///
    /// The offset depends only on the seed and the aircraft id, so adding or
    /// removing other aircraft never disturbs an aircraft's admission time.
    pub fn start_time(&self, aircraft: AircraftId, base_unix: i64, spread_secs: u32) -> i64 {
        if spread_secs == 0 {
            return base_unix;
        }
        let mixed = self.seed ^ (aircraft.0 as u64).wrapping_mul(MIXING_CONSTANT);
        let mut rng = SmallRng::seed_from_u64(mixed);
        base_unix + rng.gen_range(0..=spread_secs) as i64
    }
}
