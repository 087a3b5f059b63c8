//! The tower controller.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use atc_core::{AircraftId, GeoPoint, NodeId};
use atc_network::GroundNetwork;
use atc_traffic::{TaxiState, TrafficRecord, TrafficRegistry};

/// Outcome of a ground → tower hand-off attempt.
///
/// Refusal is not an error: ownership of the record travels straight back to
/// the caller, which keeps the aircraft in `Hold` and retries next tick.
#[must_use]
pub enum Handoff {
    Accepted,
    Refused(TrafficRecord),
}

impl Handoff {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Handoff::Accepted)
    }
}

/// Owns aircraft transitioning onto/through runway-exclusive nodes.
///
/// The claimed runway span is held as one mutual-exclusion unit: every
/// runway node the accepted route crosses stays claimed until the aircraft
/// has vacated the last of them.  Partial release while still rolling is
/// deliberately not attempted.
pub struct TowerController {
    registry: TrafficRegistry,
    /// Runway node → the aircraft currently claiming it.
    claims: FxHashMap<NodeId, AircraftId>,
    frequency_khz: u32,
}

impl TowerController {
    pub fn new(frequency_khz: u32) -> Self {
        Self {
            registry: TrafficRegistry::new(),
            claims: FxHashMap::default(),
            frequency_khz,
        }
    }

    /// The tower's assigned radio frequency (kHz) — a lookup value for the
    /// communication subsystem, nothing more.
    pub fn get_frequency(&self) -> u32 {
        self.frequency_khz
    }

    // ── Hand-off ──────────────────────────────────────────────────────────

    /// Attempt to take ownership of an aircraft whose next node is
    /// runway-exclusive.
    ///
    /// The claim is the contiguous runway-exclusive prefix of the remaining
    /// route.  If any of those nodes is already claimed by another aircraft
    /// the hand-off is refused and the record returned to the caller.
    pub fn accept_handoff(&mut self, network: &GroundNetwork, mut record: TrafficRecord) -> Handoff {
        let span = self.runway_span(network, &record);
        if span.is_empty() {
            // Next node is not runway-exclusive: a programming error in the
            // caller, but not worth dropping the aircraft over.
            warn!(
                "tower: hand-off for {} whose next node is not runway-exclusive",
                record.aircraft
            );
            return Handoff::Refused(record);
        }

        if span
            .iter()
            .any(|n| self.claims.get(n).is_some_and(|&a| a != record.aircraft))
        {
            return Handoff::Refused(record);
        }

        for &node in &span {
            self.claims.insert(node, record.aircraft);
        }
        debug!(
            "tower: accepted {} onto runway span of {} node(s)",
            record.aircraft,
            span.len()
        );
        record.state = TaxiState::RunwayOccupancy;
        record.proceed();
        self.registry.insert(record);
        Handoff::Accepted
    }

    /// Give a record back to ground control, clearing its runway claims.
    ///
    /// Returns `None` (and logs) for an aircraft the tower does not own.
    pub fn release_to_ground(&mut self, id: AircraftId) -> Option<TrafficRecord> {
        let mut record = match self.registry.remove(id) {
            Some(r) => r,
            None => {
                warn!("tower: release requested for unknown aircraft {id}");
                return None;
            }
        };
        self.claims.retain(|_, &mut a| a != id);
        record.state = TaxiState::Taxi;
        record.proceed();
        Some(record)
    }

    // ── Per-tick processing ───────────────────────────────────────────────

    /// Refresh the kinematic snapshot of a tower-owned aircraft and advance
    /// its route leg on node capture.
    ///
    /// Returns `false` if the tower does not own `id` (the caller then tries
    /// the ground controller).
    pub fn update_aircraft_information(
        &mut self,
        network: &GroundNetwork,
        id: AircraftId,
        position: GeoPoint,
        heading: f32,
        speed: f32,
        altitude: f32,
    ) -> bool {
        let Some(record) = self.registry.get_mut(id) else {
            return false;
        };
        record.update_kinematics(position, heading, speed, altitude);
        record.advance_if_captured(network);
        true
    }

    /// Advance all occupants and return the records that have vacated their
    /// runway span: off runway-exclusive nodes with none left ahead on the
    /// route.
    ///
    /// An accepted aircraft still rolling toward the runway from its
    /// hold-short point stays tower-owned — its claim would otherwise be
    /// lost before it ever entered the span.  The caller — the ground
    /// controller's tick — re-absorbs the returned records into the active
    /// taxi pool.
    pub fn update(&mut self, network: &GroundNetwork, _dt: f64) -> Vec<TrafficRecord> {
        let mut vacated = Vec::new();
        for id in self.registry.ids() {
            let done = match self.registry.get(id) {
                Some(record) => {
                    !network.is_runway(record.current_node())
                        && !record.route.remaining().iter().any(|&n| network.is_runway(n))
                }
                None => continue,
            };
            if done {
                if let Some(record) = self.release_to_ground(id) {
                    debug!("tower: {} vacated, returning to ground", id);
                    vacated.push(record);
                }
            }
        }
        vacated
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// `true` if `node` is currently claimed by any tower-owned aircraft.
    pub fn is_claimed(&self, node: NodeId) -> bool {
        self.claims.contains_key(&node)
    }

    pub fn get(&self, id: AircraftId) -> Option<&TrafficRecord> {
        self.registry.get(id)
    }

    pub fn contains(&self, id: AircraftId) -> bool {
        self.registry.contains(id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Remove an aircraft entirely (deleted from the simulation).
    pub fn sign_off(&mut self, id: AircraftId) -> Option<TrafficRecord> {
        self.claims.retain(|_, &mut a| a != id);
        self.registry.remove(id)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// The contiguous runway-exclusive prefix of the record's remaining
    /// route, starting at its next node.
    fn runway_span(&self, network: &GroundNetwork, record: &TrafficRecord) -> Vec<NodeId> {
        record
            .route
            .remaining()
            .iter()
            .copied()
            .take_while(|&n| network.contains(n) && network.is_runway(n))
            .collect()
    }
}
