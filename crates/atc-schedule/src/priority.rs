//! Priority-rank assignment at admission.

use atc_core::FlightKind;

/// Hands out monotone priority ranks (lower value = higher precedence).
///
/// Ranks are assigned in admission order; within one admission batch — all
/// aircraft drained from the [`StartupQueue`](crate::StartupQueue) in the
/// same tick — departures are ranked ahead of arrivals, ties broken by
/// batch position.  Aircraft admitted in earlier batches always outrank
/// later ones: the counter never resets.
#[derive(Default)]
pub struct PriorityAllocator {
    next_rank: u32,
}

impl PriorityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign ranks to one admission batch, given the flight kind of each
    /// member in drain order.  The returned vec is parallel to `kinds`.
    pub fn assign_batch(&mut self, kinds: &[FlightKind]) -> Vec<u32> {
        // Order batch members by (kind precedence, drain position), then
        // hand out consecutive ranks in that order.
        let mut order: Vec<usize> = (0..kinds.len()).collect();
        order.sort_by_key(|&i| (kinds[i].precedence_bit(), i));

        let mut ranks = vec![0u32; kinds.len()];
        for &i in &order {
            ranks[i] = self.next_rank;
            self.next_rank += 1;
        }
        ranks
    }

    /// Assign a rank to a single aircraft admitted outside a batch (e.g. an
    /// aircraft spawning directly onto a taxiway).
    pub fn assign(&mut self, kind: FlightKind) -> u32 {
        self.assign_batch(&[kind])[0]
    }

    /// The rank the next admission will receive.
    pub fn peek_next(&self) -> u32 {
        self.next_rank
    }
}
