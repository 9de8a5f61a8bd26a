//! Error types for the photonic gateway.
//!
//! All caller-facing operations return [`GatewayResult`]. The sweeper uses
//! the same error type internally but logs and retries after a backoff
//! instead of surfacing failures to callers.

use thiserror::Error;
use uuid::Uuid;

/// Result alias used throughout the crate.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by gateway operations.
///
/// `create_state` and `update_state` are all-or-nothing: when any variant is
/// returned, no store mutation is observable.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No active record exists under the given id.
    ///
    /// Returned instead of a zero-valued report so callers can distinguish
    /// "invalid record" from "unknown record".
    #[error("state not found: {0}")]
    StateNotFound(Uuid),

    /// The merge step could not reconcile the colliding payloads.
    ///
    /// # When This Occurs
    ///
    /// - A payload on either side of the merge is not a map at the top level
    /// - An update payload cannot be layered onto the stored payload
    #[error("conflict resolution failed: {0}")]
    ConflictResolution(String),

    /// Admitting the record would exceed `max_concurrent_states`.
    #[error("capacity exceeded: {active} active states, limit {max}")]
    CapacityExceeded {
        /// Records currently active in the store
        active: usize,
        /// Configured `max_concurrent_states`
        max: usize,
    },

    /// A configuration value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An in-memory invariant was violated.
    ///
    /// # When This Occurs
    ///
    /// - A stored record's coherence is no longer a finite number
    ///
    /// These indicate corrupted state and should be investigated; the
    /// sweeper logs them and retries after its backoff.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// True for the not-found variant; used by callers that treat a missing
    /// record as a no-op rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::StateNotFound(_))
    }
}
