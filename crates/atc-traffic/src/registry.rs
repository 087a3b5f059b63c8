//! Controller-owned aircraft registry.

use std::collections::BTreeMap;

use atc_core::AircraftId;

use crate::TrafficRecord;

/// Mapping from aircraft id to [`TrafficRecord`], owned by exactly one
/// controller.
///
/// A `BTreeMap` rather than a hash map: conflict and deadlock tie-breaking
/// iterate the registry, and ascending-id order makes every scan
/// deterministic.  The ground/tower hand-off is `remove` on one registry
/// followed by `insert` on the other — an ownership move, never a copy.
#[derive(Default)]
pub struct TrafficRegistry {
    inner: BTreeMap<AircraftId, TrafficRecord>,
}

impl TrafficRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a record.  Returns the previous record for this
    /// aircraft, if any.
    pub fn insert(&mut self, record: TrafficRecord) -> Option<TrafficRecord> {
        self.inner.insert(record.aircraft, record)
    }

    pub fn get(&self, id: AircraftId) -> Option<&TrafficRecord> {
        self.inner.get(&id)
    }

    pub fn get_mut(&mut self, id: AircraftId) -> Option<&mut TrafficRecord> {
        self.inner.get_mut(&id)
    }

    /// Remove and return a record — the ownership-transfer half of a
    /// hand-off, and the removal path for sign-off.
    pub fn remove(&mut self, id: AircraftId) -> Option<TrafficRecord> {
        self.inner.remove(&id)
    }

    pub fn contains(&self, id: AircraftId) -> bool {
        self.inner.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate records in ascending aircraft-id order (deterministic).
    pub fn iter(&self) -> impl Iterator<Item = &TrafficRecord> {
        self.inner.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrafficRecord> {
        self.inner.values_mut()
    }

    /// All aircraft ids in ascending order.  Collected up front so callers
    /// can mutate the registry while walking the id list.
    pub fn ids(&self) -> Vec<AircraftId> {
        self.inner.keys().copied().collect()
    }
}
