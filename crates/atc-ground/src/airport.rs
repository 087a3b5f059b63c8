//! One airport: a ground controller and a tower controller that share a
//! ground network and move aircraft between each other by hand-off.

use atc_core::{AircraftId, GeoPoint, Instruction};
use atc_network::GroundNetwork;
use atc_tower::TowerController;

use crate::GroundController;

/// A single airport's movement-area ATC: the ground controller owns the
/// taxiways, the tower owns the runway-exclusive nodes, and `update` ticks
/// them together so hand-offs happen inside one frame.
pub struct Airport {
    icao: String,
    ground: GroundController,
    tower: TowerController,
}

impl Airport {
    pub fn new(
        icao: impl Into<String>,
        network: GroundNetwork,
        ground_freq_khz: u32,
        tower_freq_khz: u32,
        start_unix_secs: i64,
        seed: u64,
    ) -> Self {
        Self {
            icao: icao.into(),
            ground: GroundController::new(network, ground_freq_khz, start_unix_secs, seed),
            tower: TowerController::new(tower_freq_khz),
        }
    }

    /// An airport with no ground-network data: present in the airport list
    /// but offering no taxi control.
    pub fn without_network(icao: impl Into<String>, ground_freq_khz: u32, tower_freq_khz: u32) -> Self {
        Self {
            icao: icao.into(),
            ground: GroundController::unavailable(ground_freq_khz),
            tower: TowerController::new(tower_freq_khz),
        }
    }

    pub fn icao(&self) -> &str {
        &self.icao
    }

    /// One tick for both controllers.  The ground controller drives the
    /// phase order and borrows the tower for returns and hand-offs.
    pub fn update(&mut self, dt: f64) {
        self.ground.update(dt, &mut self.tower);
    }

    /// Route a position report to whichever controller owns the aircraft.
    /// Tower first: an aircraft on its runway span is the tower's until it
    /// vacates, even though the ground controller admitted it.
    pub fn update_aircraft_information(
        &mut self,
        id: AircraftId,
        position: GeoPoint,
        heading: f32,
        speed: f32,
        altitude: f32,
        dt: f64,
    ) {
        if self
            .tower
            .update_aircraft_information(self.ground.network(), id, position, heading, speed, altitude)
        {
            return;
        }
        self.ground.update_aircraft_information(id, position, heading, speed, altitude, dt);
    }

    /// The instruction currently published to `id` by whichever controller
    /// owns it.
    pub fn instruction_for(&self, id: AircraftId) -> Option<Instruction> {
        if let Some(rec) = self.tower.get(id) {
            return Some(rec.instruction);
        }
        self.ground.instruction_for(id)
    }

    /// Remove an aircraft from the airport entirely.
    pub fn sign_off(&mut self, id: AircraftId) {
        if self.tower.sign_off(id).is_none() {
            self.ground.sign_off(id);
        }
    }

    pub fn ground(&self) -> &GroundController {
        &self.ground
    }

    pub fn ground_mut(&mut self) -> &mut GroundController {
        &mut self.ground
    }

    pub fn tower(&self) -> &TowerController {
        &self.tower
    }

    pub fn tower_mut(&mut self) -> &mut TowerController {
        &mut self.tower
    }
}
