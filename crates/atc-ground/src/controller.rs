//! The ground controller.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use atc_core::{AircraftId, FlightKind, GeoPoint, Instruction, NodeId, SimClock};
use atc_network::GroundNetwork;
use atc_schedule::{PriorityAllocator, Stagger, StartupQueue};
use atc_tower::{Handoff, TowerController};
use atc_traffic::{Route, TaxiState, TrafficRecord, TrafficRegistry};

use crate::deadlock::{DeadlockPolicy, WaitForGraph};

/// Fastest taxi speed the controller will ever permit, m/s (~23 kt).
const MAX_TAXI_SPEED_MPS: f32 = 12.0;

/// Fixed margin added to the radius-derived minimum separation, metres.
const SEPARATION_MARGIN_M: f32 = 10.0;

/// A speed limit engages below `engage` and only releases above
/// `engage * HYSTERESIS_RELEASE_FACTOR`, so a gap oscillating around the
/// trigger distance cannot flap the instruction.
const HYSTERESIS_RELEASE_FACTOR: f32 = 1.15;

/// Minimum nose-to-tail separation for two aircraft of the given radii.
#[inline]
fn min_separation_m(radius_a: f32, radius_b: f32) -> f32 {
    2.0 * (radius_a + radius_b) + SEPARATION_MARGIN_M
}

/// Owns every aircraft taxiing on the movement network of one airport.
///
/// Constructed from a loaded [`GroundNetwork`]; an airport without network
/// data gets [`GroundController::unavailable`], which answers
/// `exists() == false` and turns every operation into a safe no-op.
pub struct GroundController {
    network: GroundNetwork,
    has_network: bool,

    clock: SimClock,
    /// Idempotence guard: the elapsed-time stamp of the last processed tick.
    /// `update(0)` re-invoked at the same instant is skipped wholesale.
    processed_stamp: Option<f64>,

    /// Aircraft actively taxiing (or holding) under ground authority.
    registry: TrafficRegistry,

    /// Aircraft scheduled but not yet cleared to move.
    startup_pool: TrafficRegistry,
    startup_queue: StartupQueue,
    priorities: PriorityAllocator,
    stagger: Stagger,

    policy: DeadlockPolicy,
    /// The aircraft forced in the most recent resolution; cleared after a
    /// fully cycle-free tick.
    last_forced: Option<AircraftId>,

    render: bool,
    frequency_khz: u32,
    /// Ground-network format version of the loaded airport data.  A
    /// compatibility flag for callers feeding legacy route definitions, not
    /// a wire protocol.
    version: u32,
}

impl GroundController {
    /// Controller for an airport with a loaded ground network.
    pub fn new(network: GroundNetwork, frequency_khz: u32, start_unix_secs: i64, seed: u64) -> Self {
        let has_network = !network.is_empty();
        Self {
            network,
            has_network,
            clock: SimClock::new(start_unix_secs),
            processed_stamp: None,
            registry: TrafficRegistry::new(),
            startup_pool: TrafficRegistry::new(),
            startup_queue: StartupQueue::new(),
            priorities: PriorityAllocator::new(),
            stagger: Stagger::new(seed),
            policy: DeadlockPolicy::default(),
            last_forced: None,
            render: false,
            frequency_khz,
            version: 1,
        }
    }

    /// Controller for an airport without ground-network data: ATC is simply
    /// unavailable there and all operations no-op.
    pub fn unavailable(frequency_khz: u32) -> Self {
        Self::new(GroundNetwork::empty(), frequency_khz, 0, 0)
    }

    /// Replace the deadlock-resolution policy.
    pub fn set_policy(&mut self, policy: DeadlockPolicy) {
        self.policy = policy;
    }

    // ── Availability / lookups ────────────────────────────────────────────

    /// `false` when no traffic network was loaded for this airport; every
    /// other operation is then a safe no-op.
    pub fn exists(&self) -> bool {
        self.has_network
    }

    /// The ground frequency (kHz) — a lookup value for the communication
    /// subsystem.
    pub fn get_frequency(&self) -> u32 {
        self.frequency_khz
    }

    pub fn get_version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, v: u32) {
        self.version = v;
    }

    pub fn add_version(&mut self, v: u32) {
        self.version = v;
    }

    /// The instruction currently published to `id`.  Startup-pool aircraft
    /// are implicitly held: they have not been cleared to move.
    pub fn instruction_for(&self, id: AircraftId) -> Option<Instruction> {
        if let Some(rec) = self.registry.get(id) {
            return Some(rec.instruction);
        }
        if self.startup_pool.contains(id) {
            return Some(Instruction::Hold);
        }
        None
    }

    pub fn record(&self, id: AircraftId) -> Option<&TrafficRecord> {
        self.registry.get(id).or_else(|| self.startup_pool.get(id))
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    pub fn startup_count(&self) -> usize {
        self.startup_pool.len()
    }

    pub fn network(&self) -> &GroundNetwork {
        &self.network
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register an aircraft directly into the active pool, or refresh the
    /// kinematic snapshot of one already known.
    ///
    /// A malformed route (empty, leg out of bounds, disconnected legs, or an
    /// edge too narrow for the aircraft) is logged and the call ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn announce_position(
        &mut self,
        id: AircraftId,
        nodes: Vec<NodeId>,
        leg: usize,
        position: GeoPoint,
        heading: f32,
        speed: f32,
        altitude: f32,
        radius: f32,
        kind: FlightKind,
    ) {
        if !self.has_network {
            return;
        }
        if let Some(rec) = self.registry.get_mut(id) {
            rec.update_kinematics(position, heading, speed, altitude);
            return;
        }

        let Some(route) = self.validate_route(id, nodes, leg, radius) else {
            return;
        };
        // An announcement supersedes any scheduled startup for the same
        // aircraft: it is already moving, so the queued admission is void.
        // Exactly one registry may hold the record.
        if self.startup_pool.remove(id).is_some() {
            self.startup_queue.cancel(id);
            debug!("ground: {id} announced while awaiting startup, promoting");
        }
        let priority = self.priorities.assign(kind);
        let mut rec = TrafficRecord::new(id, route, position, radius, kind, priority);
        rec.update_kinematics(position, heading, speed, altitude);
        debug!("ground: {id} announced at node {}, rank {priority}", rec.current_node());
        self.registry.insert(rec);
    }

    /// Enter an aircraft into the startup pool, gated until its (staggered)
    /// scheduled start time.  Priority is assigned at admission, not here.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule_startup(
        &mut self,
        id: AircraftId,
        nodes: Vec<NodeId>,
        kind: FlightKind,
        radius: f32,
        start_unix_secs: i64,
        stagger_spread_secs: u32,
    ) {
        if !self.has_network {
            return;
        }
        let Some(route) = self.validate_route(id, nodes, 0, radius) else {
            return;
        };
        let position = self.network.position(route.current_node());
        // Rank u32::MAX until admission: startup aircraft outrank nobody.
        let mut rec = TrafficRecord::new(id, route, position, radius, kind, u32::MAX);
        rec.hold(None);
        let when = self.stagger.start_time(id, start_unix_secs, stagger_spread_secs);
        self.startup_pool.insert(rec);
        self.startup_queue.push(when, id);
        debug!("ground: {id} scheduled for startup at {when}");
    }

    /// Refresh an active aircraft's kinematics; advances the route leg on
    /// node capture and retires aircraft whose route is spent.
    ///
    /// Aircraft must `announce_position` (or be admitted from the startup
    /// pool) first; reports for unknown ids are logged and dropped.
    pub fn update_aircraft_information(
        &mut self,
        id: AircraftId,
        position: GeoPoint,
        heading: f32,
        speed: f32,
        altitude: f32,
        _dt: f64,
    ) {
        if !self.has_network {
            return;
        }
        if let Some(rec) = self.startup_pool.get_mut(id) {
            rec.update_kinematics(position, heading, speed, altitude);
            return;
        }
        let Some(rec) = self.registry.get_mut(id) else {
            warn!("ground: position report for unknown aircraft {id}");
            return;
        };
        rec.update_kinematics(position, heading, speed, altitude);
        rec.advance_if_captured(&self.network);

        if rec.route.is_exhausted() && !self.network.is_runway(rec.current_node()) {
            warn!("ground: {id} exhausted its route, leaving the ground network");
            self.registry.remove(id);
        }
    }

    /// Remove an aircraft from whichever pool holds it (deleted from the
    /// simulation, or airborne).  Safe to call between ticks; any published
    /// instruction is simply discarded.
    pub fn sign_off(&mut self, id: AircraftId) -> Option<TrafficRecord> {
        self.startup_queue.cancel(id);
        self.startup_pool.remove(id).or_else(|| self.registry.remove(id))
    }

    // ── Conflict checks ───────────────────────────────────────────────────

    /// Decide `Hold` vs `Proceed` for entering the next route node.
    ///
    /// Holds when the next node is runway-exclusive (tower clearance comes
    /// via hand-off), when its occupancy is at capacity, or when a
    /// better-ranked contender has reserved it.  Reverts a stale hold to
    /// `Proceed` once clear.
    pub fn check_hold_position(&mut self, id: AircraftId) {
        if !self.has_network {
            return;
        }
        let (next, was_held) = match self.registry.get(id) {
            Some(rec) => match rec.next_node() {
                Some(n) => (n, rec.is_held()),
                None => return, // final leg: nothing ahead to contend for
            },
            None => return,
        };

        // Runway-exclusive nodes are the tower's to grant.  Hold short; the
        // hand-off phase of `update` will offer this aircraft to the tower.
        if self.network.is_runway(next) {
            if let Some(rec) = self.registry.get_mut(id) {
                rec.hold(None);
                rec.state = TaxiState::HoldShort;
            }
            return;
        }

        // Occupancy: every active aircraft currently at `next` counts
        // against its capacity.
        let capacity = self.network.capacity(next).max(1) as usize;
        let mut occupants: Vec<(u32, AircraftId)> = self
            .registry
            .iter()
            .filter(|r| r.aircraft != id && r.current_node() == next)
            .map(|r| (r.priority, r.aircraft))
            .collect();
        if occupants.len() >= capacity {
            occupants.sort_unstable();
            let blocker = occupants[0].1;
            if let Some(rec) = self.registry.get_mut(id) {
                rec.hold(Some(blocker));
            }
            return;
        }

        // Reservation: of all aircraft wanting `next` as their next node,
        // only the best-ranked may proceed into it this tick.
        let winner = self
            .registry
            .iter()
            .filter(|r| r.next_node() == Some(next))
            .map(|r| (r.priority, r.aircraft))
            .min();
        if let Some((_, winner_id)) = winner
            && winner_id != id
        {
            if let Some(rec) = self.registry.get_mut(id) {
                rec.hold(Some(winner_id));
            }
            return;
        }

        // Clear: release a stale hold (speed adjustment may still cap us).
        if was_held && let Some(rec) = self.registry.get_mut(id) {
            rec.proceed();
            if rec.state == TaxiState::HoldShort {
                rec.state = TaxiState::Taxi;
            }
        }
    }

    /// Proportional speed control against the aircraft occupying the next
    /// route node.
    ///
    /// The cap scales linearly from `MAX_TAXI_SPEED_MPS` at the engage
    /// distance down to zero at minimum separation, so the instruction is a
    /// monotone function of the gap.  Release uses a wider threshold than
    /// engage (hysteresis) to avoid period-over-period oscillation.
    pub fn check_speed_adjustment(&mut self, id: AircraftId) {
        if !self.has_network {
            return;
        }
        let Some(rec) = self.registry.get(id) else {
            return;
        };
        if rec.is_held() {
            return; // hold dominates any speed cap
        }
        let Some(next) = rec.next_node() else {
            return;
        };

        let limited = matches!(rec.instruction, Instruction::SpeedLimit(_));
        let leader = self
            .registry
            .iter()
            .filter(|r| r.aircraft != id && r.current_node() == next)
            .min_by(|a, b| {
                let da = rec.position.distance_m(a.position);
                let db = rec.position.distance_m(b.position);
                da.total_cmp(&db)
            });

        let Some(leader) = leader else {
            if limited && let Some(rec) = self.registry.get_mut(id) {
                rec.proceed(); // leader gone, cap released
            }
            return;
        };

        let gap = rec.position.distance_m(leader.position) - rec.radius - leader.radius;
        let min_sep = min_separation_m(rec.radius, leader.radius);
        let engage = 2.0 * min_sep;
        let release = engage * HYSTERESIS_RELEASE_FACTOR;

        let threshold = if limited { release } else { engage };
        if gap >= threshold {
            if limited && let Some(rec) = self.registry.get_mut(id) {
                rec.proceed();
            }
            return;
        }

        let ratio = ((gap - min_sep) / (engage - min_sep)).clamp(0.0, 1.0);
        let cap = MAX_TAXI_SPEED_MPS * ratio;
        if let Some(rec) = self.registry.get_mut(id) {
            rec.limit_speed(cap);
        }
    }

    /// `true` iff `id` is part of a cycle in the current wait-for graph.
    pub fn check_for_circular_waits(&self, id: AircraftId) -> bool {
        WaitForGraph::from_registry(&self.registry).on_cycle(id)
    }

    // ── The tick ──────────────────────────────────────────────────────────

    /// One simulation tick.  See the crate docs for the phase order.
    ///
    /// Re-invoking at the same clock instant (`update(0.0)` twice) is a
    /// no-op the second time: admissions and resolutions are never applied
    /// twice for one instant.
    pub fn update(&mut self, dt: f64, tower: &mut TowerController) {
        if !self.has_network {
            return;
        }
        self.clock.advance(dt);
        let stamp = self.clock.elapsed_secs;
        if self.processed_stamp == Some(stamp) {
            return;
        }

        // ① Startup admission.
        self.update_startup_traffic(self.clock.now_unix_secs());

        // ② Aircraft done with their runway span come back to taxi.
        for rec in tower.update(&self.network, dt) {
            self.registry.insert(rec);
        }

        // ③ Per-aircraft conflict resolution, ascending id.
        self.update_active_traffic();

        // ④ Deadlock scan and forced movement.
        self.resolve_circular_waits();

        // ⑤ Offer hold-short aircraft to the tower.
        self.process_handoffs(tower);

        if self.render {
            self.dump_occupancy();
        }
        self.processed_stamp = Some(stamp);
    }

    /// Toggle the diagnostic occupancy dump.  Purely diagnostic — no effect
    /// on scheduling.
    pub fn render(&mut self, enabled: bool) {
        self.render = enabled;
    }

    // ── Tick phases ───────────────────────────────────────────────────────

    /// Phase ①: admit every startup aircraft whose scheduled time elapsed,
    /// assigning priority ranks in admission order (departures first within
    /// the batch).
    fn update_startup_traffic(&mut self, now_unix: i64) {
        let due = self.startup_queue.drain_due(now_unix);
        if due.is_empty() {
            return;
        }

        let mut admitted: Vec<TrafficRecord> = Vec::with_capacity(due.len());
        for id in due {
            match self.startup_pool.remove(id) {
                Some(rec) => admitted.push(rec),
                // Signed off while queued; `cancel` usually catches this.
                None => debug!("ground: startup entry {id} no longer in pool"),
            }
        }

        let kinds: Vec<FlightKind> = admitted.iter().map(|r| r.kind).collect();
        let ranks = self.priorities.assign_batch(&kinds);
        for (mut rec, rank) in admitted.into_iter().zip(ranks) {
            rec.priority = rank;
            rec.proceed();
            debug!("ground: admitted {} with rank {rank}", rec.aircraft);
            self.registry.insert(rec);
        }
    }

    /// Phase ③: hold decisions then speed adjustment for every active
    /// aircraft, in ascending id order.
    fn update_active_traffic(&mut self) {
        for id in self.registry.ids() {
            self.check_hold_position(id);
            self.check_speed_adjustment(id);
        }
    }

    /// Phase ④: break every wait-for cycle by forcing its best-ranked
    /// member to `Proceed` (policy-adjusted, see [`DeadlockPolicy`]).
    fn resolve_circular_waits(&mut self) {
        let graph = WaitForGraph::from_registry(&self.registry);
        let cycles = graph.cycles();
        if cycles.is_empty() {
            // A full cycle-free tick re-arms the repeat-force guard.
            self.last_forced = None;
            return;
        }

        for cycle in cycles {
            let members: Vec<(u32, AircraftId)> = cycle
                .iter()
                .filter_map(|&a| self.registry.get(a).map(|r| (r.priority, a)))
                .collect();
            if members.is_empty() {
                continue;
            }
            let forced = self.policy.choose_forced(&members, self.last_forced);
            if let Some(rec) = self.registry.get_mut(forced) {
                warn!(
                    "ground: breaking {}-aircraft circular wait, forcing {forced} to proceed",
                    members.len()
                );
                rec.proceed();
                self.last_forced = Some(forced);
            }
        }
    }

    /// Phase ⑤: offer every aircraft holding short of a runway-exclusive
    /// node to the tower; refusal keeps it holding for a retry next tick.
    fn process_handoffs(&mut self, tower: &mut TowerController) {
        for id in self.registry.ids() {
            let wants_runway = self
                .registry
                .get(id)
                .and_then(|r| r.next_node())
                .is_some_and(|n| self.network.is_runway(n));
            if !wants_runway {
                continue;
            }
            let Some(mut rec) = self.registry.remove(id) else {
                continue;
            };
            rec.state = TaxiState::HoldShort;
            match tower.accept_handoff(&self.network, rec) {
                Handoff::Accepted => {
                    debug!("ground: handed {id} off to tower");
                }
                Handoff::Refused(mut rec) => {
                    rec.hold(None);
                    self.registry.insert(rec);
                }
            }
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// Validate a raw route: non-empty, leg in bounds, every consecutive
    /// pair connected by an edge wide enough for the aircraft.  Logs and
    /// returns `None` on the first violation.
    fn validate_route(
        &self,
        id: AircraftId,
        nodes: Vec<NodeId>,
        leg: usize,
        radius: f32,
    ) -> Option<Route> {
        for &node in &nodes {
            if !self.network.contains(node) {
                warn!("ground: route for {id} references unknown node {node}");
                return None;
            }
        }
        for pair in nodes.windows(2) {
            let Some(edge) = self.network.edge_between(pair[0], pair[1]) else {
                warn!("ground: route for {id} has no edge {} -> {}", pair[0], pair[1]);
                return None;
            };
            if !self.network.edge_allows(edge, radius) {
                warn!(
                    "ground: edge {} -> {} too narrow for {id} (radius {radius} m)",
                    pair[0], pair[1]
                );
                return None;
            }
        }
        match Route::new(nodes, leg) {
            Ok(route) => Some(route),
            Err(e) => {
                warn!("ground: malformed route for {id}: {e}");
                None
            }
        }
    }

    /// Diagnostic occupancy dump behind `render(true)`.
    fn dump_occupancy(&self) {
        let mut by_node: FxHashMap<NodeId, Vec<AircraftId>> = FxHashMap::default();
        for rec in self.registry.iter() {
            by_node.entry(rec.current_node()).or_default().push(rec.aircraft);
        }
        let mut nodes: Vec<_> = by_node.into_iter().collect();
        nodes.sort_unstable_by_key(|(n, _)| *n);
        for (node, aircraft) in nodes {
            debug!("ground: occupancy {node}: {aircraft:?}");
        }
    }
}
