//! The control instruction issued to an aircraft each tick.
//!
//! The controller never mutates aircraft physics.  It publishes one
//! `Instruction` per aircraft; the aircraft agent reads it back and adjusts
//! its own kinematics.  A tagged variant rather than trait objects: the set
//! of instructions is closed and matched exhaustively on the hot path.

use std::fmt;

/// What the controller currently wants an aircraft to do.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    /// Continue along the assigned route at the aircraft's own speed.
    Proceed,
    /// Stop before entering the next node and wait for further clearance.
    Hold,
    /// Continue, but no faster than the given ground speed in m/s.
    SpeedLimit(f32),
}

impl Instruction {
    /// `true` for `Hold`.
    #[inline]
    pub fn is_hold(self) -> bool {
        matches!(self, Instruction::Hold)
    }

    /// The speed cap in m/s, or `None` when unrestricted.
    #[inline]
    pub fn speed_cap(self) -> Option<f32> {
        match self {
            Instruction::SpeedLimit(v) => Some(v),
            _ => None,
        }
    }

    /// `true` when the aircraft is allowed to advance onto its next node.
    #[inline]
    pub fn may_advance(self) -> bool {
        !self.is_hold()
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Instruction::Proceed
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Proceed => write!(f, "PROCEED"),
            Instruction::Hold => write!(f, "HOLD"),
            Instruction::SpeedLimit(v) => write!(f, "SPEED_LIMIT({v:.1} m/s)"),
        }
    }
}
