//! Traffic-subsystem error type.

use thiserror::Error;

/// Errors produced by `atc-traffic`.
#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("route is empty")]
    EmptyRoute,

    #[error("leg index {leg} out of bounds for route of {len} nodes")]
    LegOutOfBounds { leg: usize, len: usize },
}

pub type TrafficResult<T> = Result<T, TrafficError>;
