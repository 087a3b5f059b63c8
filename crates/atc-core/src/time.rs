//! Simulation time model.
//!
//! # Design
//!
//! Controllers are ticked with a variable `dt` by the owning simulation loop,
//! so — unlike a fixed-step scheduler — the canonical time unit here is
//! fractional seconds accumulated from `dt`, anchored to a Unix start time:
//!
//!   wall_time = start_unix_secs + elapsed_secs
//!
//! Startup admission (pushback gating) compares whole Unix seconds, so the
//! clock also exposes a truncated integer view.  The fractional accumulator
//! is kept separate from the anchor so long runs don't lose sub-second
//! precision to a large f64 magnitude.

use std::fmt;

/// A dt-accumulating simulation clock anchored to Unix wall time.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) at which the clock started.
    pub start_unix_secs: i64,
    /// Simulated seconds elapsed since start, accumulated from `advance(dt)`.
    pub elapsed_secs: f64,
}

impl SimClock {
    /// Create a clock anchored at `start_unix_secs` with zero elapsed time.
    pub fn new(start_unix_secs: i64) -> Self {
        Self { start_unix_secs, elapsed_secs: 0.0 }
    }

    /// Advance the clock by `dt` seconds.  Negative `dt` is ignored — time
    /// never runs backwards.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        if dt > 0.0 {
            self.elapsed_secs += dt;
        }
    }

    /// Current Unix timestamp, truncated to whole seconds.
    #[inline]
    pub fn now_unix_secs(&self) -> i64 {
        self.start_unix_secs + self.elapsed_secs as i64
    }

    /// Break elapsed time into (hour, minute, second) components from clock
    /// start.  Useful for human-readable logging without a datetime library.
    pub fn elapsed_hms(&self) -> (u64, u32, u32) {
        let total_secs = self.elapsed_secs.max(0.0) as u64;
        let hours = total_secs / 3_600;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        let seconds = (total_secs % 60) as u32;
        (hours, minutes, seconds)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.elapsed_hms();
        write!(f, "{h:02}:{m:02}:{s:02} (+{})", self.start_unix_secs)
    }
}
