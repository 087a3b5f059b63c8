//! Per-aircraft controller state.

use atc_core::{AircraftId, FlightKind, GeoPoint, Instruction};
use atc_network::GroundNetwork;

use crate::Route;

/// How close (metres) a position report must be to the next route node for
/// the aircraft to be considered to have reached it.  Matches the coarsest
/// taxiway-centerline node spacing in real airport data.
pub const NODE_CAPTURE_RADIUS_M: f32 = 20.0;

/// Where an aircraft stands relative to the ground/tower boundary.
///
/// ```text
/// Taxi → HoldShort → (accepted) RunwayOccupancy → (vacated) Taxi
///               └──→ (refused)  HoldShort          (retry next tick)
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaxiState {
    /// Moving on taxiways/ramps under ground authority.
    Taxi,
    /// Stopped immediately before a runway-exclusive node, awaiting tower
    /// clearance.
    HoldShort,
    /// On a runway-exclusive segment under tower authority.
    RunwayOccupancy,
}

/// The controller-side state of one AI aircraft.
///
/// Created when the aircraft enters the managed network (pushback or spawn),
/// destroyed when it leaves the network or is deleted from the simulation.
/// Exactly one registry owns a record at any time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficRecord {
    pub aircraft: AircraftId,
    pub route: Route,

    // ── Latest kinematic report ───────────────────────────────────────────
    pub position: GeoPoint,
    /// True heading, degrees.
    pub heading: f32,
    /// Ground speed, m/s.
    pub speed: f32,
    /// Altitude, metres MSL.
    pub altitude: f32,

    /// Aircraft size (half wingspan, metres) — drives separation distances
    /// and edge width-class admission.
    pub radius: f32,

    pub kind: FlightKind,

    /// Priority rank; lower value = higher precedence.  Assigned at
    /// admission, adjustable afterwards.
    pub priority: u32,

    /// The instruction currently published to the aircraft agent.
    pub instruction: Instruction,

    /// Set while halted waiting on another aircraft — the wait-for edge used
    /// by deadlock detection.
    pub blocked_by: Option<AircraftId>,

    pub state: TaxiState,
}

impl TrafficRecord {
    /// A fresh record in `Taxi` state with `Proceed` published and the
    /// position initialized to the current route node's location.
    pub fn new(
        aircraft: AircraftId,
        route: Route,
        position: GeoPoint,
        radius: f32,
        kind: FlightKind,
        priority: u32,
    ) -> Self {
        Self {
            aircraft,
            route,
            position,
            heading: 0.0,
            speed: 0.0,
            altitude: 0.0,
            radius,
            kind,
            priority,
            instruction: Instruction::Proceed,
            blocked_by: None,
            state: TaxiState::Taxi,
        }
    }

    /// Overwrite the kinematic snapshot with a fresh position report.
    pub fn update_kinematics(&mut self, position: GeoPoint, heading: f32, speed: f32, altitude: f32) {
        self.position = position;
        self.heading = heading;
        self.speed = speed;
        self.altitude = altitude;
    }

    #[inline]
    pub fn current_node(&self) -> atc_core::NodeId {
        self.route.current_node()
    }

    #[inline]
    pub fn next_node(&self) -> Option<atc_core::NodeId> {
        self.route.next_node()
    }

    // ── Instruction transitions ───────────────────────────────────────────

    /// Publish `Hold`, recording which aircraft we are waiting on (if known).
    pub fn hold(&mut self, blocked_by: Option<AircraftId>) {
        self.instruction = Instruction::Hold;
        self.blocked_by = blocked_by;
    }

    /// Publish `Proceed` and clear the wait-for edge.
    pub fn proceed(&mut self) {
        self.instruction = Instruction::Proceed;
        self.blocked_by = None;
    }

    /// Publish a speed cap.  Clears the wait-for edge: a speed-limited
    /// aircraft is still moving, not waiting.
    pub fn limit_speed(&mut self, cap: f32) {
        self.instruction = Instruction::SpeedLimit(cap);
        self.blocked_by = None;
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.instruction.is_hold()
    }

    // ── Leg advancement ───────────────────────────────────────────────────

    /// Advance the route leg when the latest position report is within
    /// capture range of the next node.
    ///
    /// A held aircraft never captures — `Hold` means "stop before entering
    /// the next node".  Returns `true` if the leg advanced.
    pub fn advance_if_captured(&mut self, network: &GroundNetwork) -> bool {
        if self.instruction.is_hold() {
            return false;
        }
        let Some(next) = self.route.next_node() else {
            return false;
        };
        let Some(next_pos) = network.try_position(next) else {
            return false;
        };
        if self.position.distance_m(next_pos) <= NODE_CAPTURE_RADIUS_M {
            self.route.advance()
        } else {
            false
        }
    }
}
