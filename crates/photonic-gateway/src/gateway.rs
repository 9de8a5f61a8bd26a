//! PhotonicGateway - the public facade composing store, detector, resolver,
//! validator, and sweeper.
//!
//! The gateway owns the store behind a single `RwLock` and injects it into
//! the sweeper; nothing here is process-global. Write operations hold the
//! lock for their whole read-modify-write sequence, so detection-then-insert
//! in `create_state` is one atomic critical section and two concurrent
//! creates can never both miss each other.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collision::{detect_collisions, CollisionOutcome};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::metrics::{GatewayMetrics, OperationKind, OperationLog, StatusSnapshot, RECENT_OPERATIONS};
use crate::resolver::resolve;
use crate::store::StateStore;
use crate::sweeper::{self, SweeperHandle};
use crate::types::{shallow_merge, StateRecord};
use crate::validator::{validate_record, ValidationReport};

/// Everything guarded by the gateway's single lock.
#[derive(Debug, Default)]
pub(crate) struct GatewayInner {
    pub(crate) store: StateStore,
    pub(crate) metrics: GatewayMetrics,
    pub(crate) history: OperationLog,
}

impl GatewayInner {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// Per-record introspection returned by [`PhotonicGateway::state_details`].
#[derive(Clone, Debug, Serialize)]
pub struct StateDetails {
    pub state_id: Uuid,
    pub payload: Value,
    pub phase: f64,
    pub amplitude: f64,
    pub frequency: f64,
    pub coherence: f64,
    pub priority: f64,
    pub entangled_with: Vec<Uuid>,
    pub is_coherent: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Conflict-resolution gateway over an in-memory store of photonic states.
#[derive(Debug)]
pub struct PhotonicGateway {
    inner: Arc<RwLock<GatewayInner>>,
    config: GatewayConfig,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl PhotonicGateway {
    /// Validate the configuration, build the store, and start the sweeper.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;

        let inner = Arc::new(RwLock::new(GatewayInner::new()));
        let handle = sweeper::spawn(Arc::clone(&inner), config.clone());

        info!(
            collision_sensitivity = config.collision_sensitivity,
            coherence_threshold = config.coherence_threshold,
            max_concurrent_states = config.max_concurrent_states,
            "photonic gateway initialized"
        );
        Ok(Self {
            inner,
            config,
            sweeper: Mutex::new(Some(handle)),
        })
    }

    /// Admit a new state, resolving collisions against the active set.
    ///
    /// Detection, resolution, and insertion happen under one write-lock
    /// acquisition. Colliding records stay active: the new record is
    /// entangled with them and each receives a symmetric back-link. On any
    /// error nothing is inserted.
    pub async fn create_state(&self, payload: Value, priority: f64) -> GatewayResult<Uuid> {
        let priority = priority.clamp(0.0, 1.0);

        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let active = state.store.len();
        if active >= self.config.max_concurrent_states {
            return Err(GatewayError::CapacityExceeded {
                active,
                max: self.config.max_concurrent_states,
            });
        }

        let candidate = StateRecord::new(payload, priority);
        let outcome = detect_collisions(
            &candidate,
            &state.store,
            None,
            self.config.collision_sensitivity,
        );

        let (record, collided) = match &outcome {
            CollisionOutcome::Clear => (candidate, false),
            CollisionOutcome::Colliding(ids) => {
                state.metrics.collisions_detected += 1;
                debug!(candidate = %candidate.id, colliding = ids.len(), "collision detected");

                let colliding: Vec<&StateRecord> =
                    ids.iter().filter_map(|id| state.store.get(id)).collect();
                let resolved = match resolve(candidate, &colliding) {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        state.metrics.resolution_failures += 1;
                        warn!(error = %err, "failed to resolve state collision");
                        return Err(err);
                    }
                };
                state.metrics.collisions_resolved += 1;
                (resolved, true)
            }
        };

        let id = record.id;
        let peers: Vec<Uuid> = record.entangled_with.iter().copied().collect();
        state.store.insert(record);
        for peer_id in peers {
            if let Some(peer) = state.store.get_mut(&peer_id) {
                peer.entangled_with.insert(id);
            }
        }

        state.metrics.total_states_processed += 1;
        state.metrics.average_coherence = state.store.mean_coherence();
        state.history.record(id, OperationKind::Created, collided);

        debug!(state_id = %id, collided, "created photonic state");
        Ok(id)
    }

    /// Diagnostic validation of a stored record.
    pub async fn validate_state(&self, id: Uuid) -> GatewayResult<ValidationReport> {
        let guard = self.inner.read().await;
        let record = guard
            .store
            .get(&id)
            .ok_or(GatewayError::StateNotFound(id))?;
        Ok(validate_record(
            record,
            &guard.store,
            self.config.coherence_threshold,
        ))
    }

    /// Update a record's payload in place.
    ///
    /// The update payload is layered over the stored payload to form a
    /// transient candidate; detection excludes the record itself. Unlike
    /// `create_state`, the stored record's coherence is preserved and its
    /// entanglements are extended rather than reset.
    pub async fn update_state(&self, id: Uuid, new_payload: Value) -> GatewayResult<()> {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let (merged, priority) = {
            let current = state
                .store
                .get(&id)
                .ok_or(GatewayError::StateNotFound(id))?;
            (shallow_merge(&current.payload, &new_payload)?, current.priority)
        };

        // The candidate never joins the store; it only carries the merged
        // payload through detection and resolution.
        let candidate = StateRecord::new(merged, priority);
        let outcome = detect_collisions(
            &candidate,
            &state.store,
            Some(id),
            self.config.collision_sensitivity,
        );

        let (final_payload, new_links, collided) = match &outcome {
            CollisionOutcome::Clear => (candidate.payload, Vec::new(), false),
            CollisionOutcome::Colliding(ids) => {
                state.metrics.collisions_detected += 1;
                let colliding: Vec<&StateRecord> =
                    ids.iter().filter_map(|peer| state.store.get(peer)).collect();
                let resolved = match resolve(candidate, &colliding) {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        state.metrics.resolution_failures += 1;
                        warn!(state_id = %id, error = %err, "failed to resolve update conflict");
                        return Err(err);
                    }
                };
                state.metrics.collisions_resolved += 1;
                (resolved.payload, ids.clone(), true)
            }
        };

        if let Some(record) = state.store.get_mut(&id) {
            record.set_payload(final_payload);
            for peer_id in &new_links {
                record.entangled_with.insert(*peer_id);
            }
        }
        for peer_id in &new_links {
            if let Some(peer) = state.store.get_mut(peer_id) {
                peer.entangled_with.insert(id);
            }
        }

        state.history.record(id, OperationKind::Updated, collided);
        debug!(state_id = %id, collided, "updated photonic state");
        Ok(())
    }

    /// Remove a record and all symmetric back-links to it.
    ///
    /// Returns whether a record existed under `id`.
    pub async fn remove_state(&self, id: Uuid) -> bool {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        match state.store.remove(&id) {
            Some(_) => {
                state.history.record(id, OperationKind::Removed, false);
                debug!(state_id = %id, "removed photonic state");
                true
            }
            None => false,
        }
    }

    /// Detailed view of one record, `None` when unknown.
    pub async fn state_details(&self, id: Uuid) -> Option<StateDetails> {
        let guard = self.inner.read().await;
        let record = guard.store.get(&id)?;
        Some(StateDetails {
            state_id: record.id,
            payload: record.payload.clone(),
            phase: record.phase,
            amplitude: record.amplitude,
            frequency: record.frequency,
            coherence: record.coherence,
            priority: record.priority,
            entangled_with: record.entangled_with.iter().copied().collect(),
            is_coherent: record.is_coherent(self.config.coherence_threshold),
            created_at: record.created_at,
            last_updated: record.last_updated,
        })
    }

    /// Metrics snapshot: active count, capacity, utilization, counters, and
    /// the tail of the operation log.
    pub async fn status(&self) -> StatusSnapshot {
        let guard = self.inner.read().await;
        let active = guard.store.len();
        StatusSnapshot {
            active_states: active,
            max_concurrent_states: self.config.max_concurrent_states,
            utilization: active as f64 / self.config.max_concurrent_states as f64,
            metrics: guard.metrics.clone(),
            config: self.config.clone(),
            recent_operations: guard.history.recent(RECENT_OPERATIONS),
        }
    }

    /// Stop the sweeper: the in-flight tick completes, then the task exits.
    ///
    /// Facade operations remain usable afterwards; coherence simply stops
    /// decaying. Calling `shutdown` twice is a no-op.
    pub async fn shutdown(&self) {
        let mut slot = self.sweeper.lock().await;
        if let Some(handle) = slot.take() {
            handle.running.store(false, Ordering::Relaxed);
            handle.shutdown.notify_one();
            if let Err(err) = handle.task.await {
                warn!(error = %err, "sweeper task did not shut down cleanly");
            }
            info!("photonic gateway stopped");
        }
    }

    /// The configuration this gateway runs with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
