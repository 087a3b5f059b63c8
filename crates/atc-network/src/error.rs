//! Network-subsystem error type.

use thiserror::Error;

use atc_core::NodeId;

/// Errors produced by `atc-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("node {0} not found in network")]
    UnknownNode(NodeId),

    #[error("duplicate node id {0} in network definition")]
    DuplicateNode(NodeId),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
