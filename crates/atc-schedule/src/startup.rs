//! `StartupQueue` — time-gated admission queue for not-yet-moving aircraft.
//!
//! # Why this exists
//!
//! Startup traffic does nothing until its scheduled pushback time.  Scanning
//! every parked aircraft each tick to ask "is it time yet?" costs O(N)
//! regardless of how many are actually due.  `StartupQueue` inverts the
//! problem: each aircraft registers its scheduled Unix start time once, and
//! each tick the controller drains only the entries whose time has elapsed.
//!
//! # Ordering
//!
//! `BTreeMap` keys are whole Unix seconds, so a drain yields aircraft in
//! scheduled order; entries sharing a second come out in push order.  Both
//! properties make admission — and therefore priority assignment — stable
//! and deterministic.

use std::collections::BTreeMap;

use atc_core::AircraftId;

/// A queue mapping scheduled start times (Unix seconds) to aircraft awaiting
/// admission.
#[derive(Default)]
pub struct StartupQueue {
    inner: BTreeMap<i64, Vec<AircraftId>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl StartupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `aircraft` for admission at `when` (Unix seconds).
    pub fn push(&mut self, when: i64, aircraft: AircraftId) {
        self.inner.entry(when).or_default().push(aircraft);
        self.total += 1;
    }

    /// Remove and return all aircraft scheduled at or before `now`, in
    /// scheduled order (stable within one second).
    ///
    /// Returns an empty vec when nothing is due — the common case.
    pub fn drain_due(&mut self, now: i64) -> Vec<AircraftId> {
        if self.next_due().is_none_or(|t| t > now) {
            return Vec::new();
        }
        // Everything strictly after `now` stays queued.
        let later = self.inner.split_off(&(now + 1));
        let due_map = std::mem::replace(&mut self.inner, later);

        let due: Vec<AircraftId> = due_map.into_values().flatten().collect();
        self.total -= due.len();
        due
    }

    /// Drop a single queued aircraft (sign-off before it ever moved).
    ///
    /// Returns `true` if the aircraft was found and removed.
    pub fn cancel(&mut self, aircraft: AircraftId) -> bool {
        for queue in self.inner.values_mut() {
            if let Some(pos) = queue.iter().position(|&a| a == aircraft) {
                queue.remove(pos);
                self.total -= 1;
                return true;
            }
        }
        false
    }

    /// The earliest scheduled time with at least one queued aircraft.
    pub fn next_due(&self) -> Option<i64> {
        self.inner.keys().next().copied()
    }

    /// Total number of queued aircraft across all future times.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
