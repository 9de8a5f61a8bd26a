//! StateStore - exclusive owner of the id -> record map.
//!
//! The store itself carries no lock: the gateway wraps it in a single
//! `RwLock` shared with the decoherence sweeper, so composite operations
//! (detect-then-insert, decay-then-evict) run as one critical section and
//! every read observes a consistent whole-store view.
//!
//! Records iterate in id order, which keeps collision detection and the
//! order-dependent merge deterministic for a given store state.

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use crate::types::StateRecord;

/// In-memory id -> record map.
#[derive(Debug, Default)]
pub struct StateStore {
    records: BTreeMap<Uuid, StateRecord>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Insert a record, returning its id.
    pub fn insert(&mut self, record: StateRecord) -> Uuid {
        let id = record.id;
        self.records.insert(id, record);
        id
    }

    /// Look up a record by id.
    pub fn get(&self, id: &Uuid) -> Option<&StateRecord> {
        self.records.get(id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut StateRecord> {
        self.records.get_mut(id)
    }

    /// Whether a record exists under `id`.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.records.contains_key(id)
    }

    /// Remove a record, stripping the symmetric back-link from every
    /// still-present entangled peer.
    pub fn remove(&mut self, id: &Uuid) -> Option<StateRecord> {
        let record = self.records.remove(id)?;
        for peer_id in &record.entangled_with {
            if let Some(peer) = self.records.get_mut(peer_id) {
                peer.entangled_with.remove(id);
            }
        }
        debug!(state_id = %id, "removed state from store");
        Some(record)
    }

    /// Point-in-time copy of every active record.
    pub fn snapshot(&self) -> Vec<StateRecord> {
        self.records.values().cloned().collect()
    }

    /// Iterate records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &StateRecord> {
        self.records.values()
    }

    /// Iterate records mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StateRecord> {
        self.records.values_mut()
    }

    /// Number of active records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean coherence across active records, 0.0 when empty.
    pub fn mean_coherence(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: f64 = self.records.values().map(|r| r.coherence).sum();
        total / self.records.len() as f64
    }
}
