//! Flight-plan precedence class.

/// Whether an aircraft is departing or arriving.
///
/// Used by the startup scheduler to break admission-batch ties: departures
/// are ranked ahead of arrivals contending for the same node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlightKind {
    Departure,
    Arrival,
}

impl FlightKind {
    /// Tie-break bit within one admission batch: departures first.
    #[inline]
    pub fn precedence_bit(self) -> u32 {
        match self {
            FlightKind::Departure => 0,
            FlightKind::Arrival => 1,
        }
    }
}
