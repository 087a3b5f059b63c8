//! Workspace error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `AtcError` via `From` impls, or keep them separate and wrap `AtcError` as
//! one variant.  Both patterns are acceptable; prefer whichever keeps error
//! sites clean.

use thiserror::Error;

use crate::{AircraftId, NodeId};

/// The top-level error type for `atc-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum AtcError {
    #[error("aircraft {0} not found")]
    AircraftNotFound(AircraftId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `atc-*` crates.
pub type AtcResult<T> = Result<T, AtcError>;
