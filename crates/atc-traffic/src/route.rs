//! An aircraft's assigned path through the ground network.

use atc_core::NodeId;

use crate::{TrafficError, TrafficResult};

/// An ordered sequence of network nodes assigned to one aircraft, consumed
/// leg by leg.
///
/// The leg index is private and only ever moves forward: `advance()` is the
/// sole mutator.  Re-routing replaces the whole `Route`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    nodes: Vec<NodeId>,
    leg: usize,
}

impl Route {
    /// Construct a route starting at leg `leg`.
    ///
    /// Errors on an empty node list or an out-of-bounds leg index — the
    /// caller (the ground controller) logs and drops malformed routes rather
    /// than aborting the tick.
    pub fn new(nodes: Vec<NodeId>, leg: usize) -> TrafficResult<Self> {
        if nodes.is_empty() {
            return Err(TrafficError::EmptyRoute);
        }
        if leg >= nodes.len() {
            return Err(TrafficError::LegOutOfBounds { leg, len: nodes.len() });
        }
        Ok(Self { nodes, leg })
    }

    /// The node the aircraft currently occupies.
    #[inline]
    pub fn current_node(&self) -> NodeId {
        self.nodes[self.leg]
    }

    /// The node the aircraft needs next, or `None` at the final leg.
    #[inline]
    pub fn next_node(&self) -> Option<NodeId> {
        self.nodes.get(self.leg + 1).copied()
    }

    /// Advance one leg.  Returns `false` (and does nothing) when already at
    /// the final node — the route is then exhausted.
    pub fn advance(&mut self) -> bool {
        if self.leg + 1 < self.nodes.len() {
            self.leg += 1;
            true
        } else {
            false
        }
    }

    /// Current leg index.  Non-decreasing for the life of the route.
    #[inline]
    pub fn leg(&self) -> usize {
        self.leg
    }

    /// `true` once the aircraft has reached the final route node.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.leg + 1 >= self.nodes.len()
    }

    /// All nodes, including already-consumed legs.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The nodes still ahead of the aircraft (excluding the current one).
    pub fn remaining(&self) -> &[NodeId] {
        &self.nodes[self.leg + 1..]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
