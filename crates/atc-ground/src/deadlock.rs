//! Wait-for graph construction and circular-wait resolution policy.
//!
//! Each held aircraft records at most one `blocked_by` edge, so the wait-for
//! graph is functional (out-degree ≤ 1) and every cycle is a simple ring.
//! Detection is therefore a chain walk with visited marking — no recursion,
//! O(V) per full scan.

use rustc_hash::{FxHashMap, FxHashSet};

use atc_core::AircraftId;
use atc_traffic::TrafficRegistry;

// ── DeadlockPolicy ────────────────────────────────────────────────────────────

/// How a detected cycle is broken.
///
/// The member with the numerically lowest priority rank (ties by ascending
/// aircraft id) is granted forced `Proceed`.  The tie-break order is policy,
/// not a constant of the system, hence this struct.
#[derive(Clone, Debug)]
pub struct DeadlockPolicy {
    /// Skip the most recently forced aircraft when any alternative exists,
    /// until a fully cycle-free tick has elapsed.  Prevents the same
    /// aircraft absorbing every resolution in a persistent gridlock.
    pub avoid_repeat_force: bool,
}

impl Default for DeadlockPolicy {
    fn default() -> Self {
        Self { avoid_repeat_force: true }
    }
}

impl DeadlockPolicy {
    /// Pick the cycle member to force, given the previously forced aircraft.
    ///
    /// `members` must be non-empty; returns the chosen aircraft.
    pub fn choose_forced(
        &self,
        members: &[(u32, AircraftId)], // (priority rank, id)
        last_forced: Option<AircraftId>,
    ) -> AircraftId {
        let mut ranked: Vec<(u32, AircraftId)> = members.to_vec();
        ranked.sort_unstable();

        if self.avoid_repeat_force
            && let Some(last) = last_forced
            && ranked.len() > 1
            && ranked[0].1 == last
        {
            return ranked[1].1;
        }
        ranked[0].1
    }
}

// ── WaitForGraph ──────────────────────────────────────────────────────────────

/// The ephemeral per-tick wait-for graph: aircraft → the aircraft blocking
/// it.  Rebuilt from `blocked_by` fields each tick, never persisted.
pub struct WaitForGraph {
    edges: FxHashMap<AircraftId, AircraftId>,
}

impl WaitForGraph {
    /// Collect the `blocked_by` edges of every record in `registry`.
    pub fn from_registry(registry: &TrafficRegistry) -> Self {
        let edges = registry
            .iter()
            .filter_map(|r| r.blocked_by.map(|b| (r.aircraft, b)))
            .collect();
        Self { edges }
    }

    #[cfg(test)]
    pub(crate) fn from_edges(edges: &[(AircraftId, AircraftId)]) -> Self {
        Self { edges: edges.iter().copied().collect() }
    }

    /// `true` iff `id` lies on a wait-for cycle.
    ///
    /// Walks the single outgoing chain with an on-path set: a cycle through
    /// `id` exists exactly when the walk returns to `id`.  Reaching any
    /// other previously seen aircraft means the chain drains into a cycle
    /// that does not contain `id`.
    pub fn on_cycle(&self, id: AircraftId) -> bool {
        let mut seen = FxHashSet::default();
        seen.insert(id);
        let mut cur = id;
        while let Some(&next) = self.edges.get(&cur) {
            if next == id {
                return true;
            }
            if !seen.insert(next) {
                return false;
            }
            cur = next;
        }
        false
    }

    /// All distinct cycles, each as its member list in chain order.
    /// Deterministic: aircraft are scanned in ascending id order and each
    /// cycle is reported exactly once.
    pub fn cycles(&self) -> Vec<Vec<AircraftId>> {
        let mut done: FxHashSet<AircraftId> = FxHashSet::default();
        let mut found = Vec::new();

        let mut roots: Vec<AircraftId> = self.edges.keys().copied().collect();
        roots.sort_unstable();

        for root in roots {
            if done.contains(&root) {
                continue;
            }
            // Walk the chain, recording the path and each member's position.
            let mut path: Vec<AircraftId> = Vec::new();
            let mut on_path: FxHashMap<AircraftId, usize> = FxHashMap::default();
            let mut cur = root;
            loop {
                if let Some(&start) = on_path.get(&cur) {
                    // Entered our own path again: path[start..] is a cycle.
                    found.push(path[start..].to_vec());
                    break;
                }
                if done.contains(&cur) {
                    break; // drains into an already-processed region
                }
                on_path.insert(cur, path.len());
                path.push(cur);
                match self.edges.get(&cur) {
                    Some(&next) => cur = next,
                    None => break, // chain ends at an unblocked aircraft
                }
            }
            done.extend(path);
        }
        found
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }
}
