//! StateRecord - a payload tree plus its derived photonic signature.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::signature::{compute_signature, Signature};

/// An entry in the conflict-resolution store.
///
/// The signature fields (`phase`, `amplitude`, `frequency`) are derived from
/// the payload and recomputed on every payload assignment; they are never set
/// by callers. `coherence` starts at 1.0 and only ever decreases (via the
/// decoherence sweep) until the record is replaced by a fresh merge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateRecord {
    /// Opaque unique token, immutable once assigned
    pub id: Uuid,

    /// Caller-supplied payload tree
    pub payload: Value,

    /// Phase angle in [0, 2π), derived
    pub phase: f64,

    /// Amplitude in [0, 1], derived
    pub amplitude: f64,

    /// Frequency >= 1.0, derived
    pub frequency: f64,

    /// Freshness in [0, 1]; decays each sweep tick, eviction below threshold
    pub coherence: f64,

    /// Caller-supplied priority in [0, 1], used as the merge tie-break
    pub priority: f64,

    /// Ids of records this one was merged with; symmetric among active records
    pub entangled_with: HashSet<Uuid>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last payload assignment time
    pub last_updated: DateTime<Utc>,
}

impl StateRecord {
    /// Create a fresh record with full coherence and no entanglements.
    pub fn new(payload: Value, priority: f64) -> Self {
        let now = Utc::now();
        let Signature {
            phase,
            amplitude,
            frequency,
        } = compute_signature(&payload, now);
        Self {
            id: Uuid::new_v4(),
            payload,
            phase,
            amplitude,
            frequency,
            coherence: 1.0,
            priority,
            entangled_with: HashSet::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Replace the payload and recompute the derived signature.
    pub fn set_payload(&mut self, payload: Value) {
        self.last_updated = Utc::now();
        let Signature {
            phase,
            amplitude,
            frequency,
        } = compute_signature(&payload, self.last_updated);
        self.payload = payload;
        self.phase = phase;
        self.amplitude = amplitude;
        self.frequency = frequency;
    }

    /// Apply one step of coherence decay: `max(0, coherence * (1 - rate))`.
    pub fn decohere(&mut self, rate: f64) {
        self.coherence = (self.coherence * (1.0 - rate)).max(0.0);
    }

    /// Whether the record still clears the coherence threshold.
    pub fn is_coherent(&self, threshold: f64) -> bool {
        self.coherence >= threshold
    }
}
