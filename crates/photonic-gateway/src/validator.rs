//! Diagnostic validation of stored records.

use serde::Serialize;

use crate::collision::mean_interference;
use crate::store::StateStore;
use crate::types::StateRecord;

/// Weight of the coherence check in the overall score.
const COHERENCE_WEIGHT: f64 = 0.4;
/// Weight of the interference check in the overall score.
const INTERFERENCE_WEIGHT: f64 = 0.3;
/// Weight of the entanglement-consistency check in the overall score.
const ENTANGLEMENT_WEIGHT: f64 = 0.3;
/// Minimum score for a record to count as valid.
const VALIDITY_THRESHOLD: f64 = 0.7;

/// Diagnostic report for a stored record.
///
/// Carries every intermediate field alongside the verdict so callers can see
/// which check dragged the score down.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    /// Overall verdict: `score >= 0.7`
    pub valid: bool,
    /// Weighted score: `0.4*coherent + 0.3*(1 - |interference|) + 0.3*entanglement_valid`
    pub score: f64,
    /// Whether coherence clears the configured threshold
    pub coherent: bool,
    /// Current coherence value
    pub coherence: f64,
    /// Mean interference against every other active record
    pub interference_score: f64,
    /// Whether every entangled peer exists and links back
    pub entanglement_valid: bool,
    /// Record phase
    pub phase: f64,
    /// Record amplitude
    pub amplitude: f64,
    /// Record frequency
    pub frequency: f64,
}

/// Every peer in `entangled_with` must be active and must link back.
pub fn entanglement_consistent(record: &StateRecord, store: &StateStore) -> bool {
    record.entangled_with.iter().all(|peer_id| {
        store
            .get(peer_id)
            .is_some_and(|peer| peer.entangled_with.contains(&record.id))
    })
}

/// Score a record against the rest of the store.
pub fn validate_record(
    record: &StateRecord,
    store: &StateStore,
    coherence_threshold: f64,
) -> ValidationReport {
    let coherent = record.is_coherent(coherence_threshold);
    let interference_score = mean_interference(record, store);
    let entanglement_valid = entanglement_consistent(record, store);

    let score = COHERENCE_WEIGHT * f64::from(coherent as u8)
        + INTERFERENCE_WEIGHT * (1.0 - interference_score.abs())
        + ENTANGLEMENT_WEIGHT * f64::from(entanglement_valid as u8);

    ValidationReport {
        valid: score >= VALIDITY_THRESHOLD,
        score,
        coherent,
        coherence: record.coherence,
        interference_score,
        entanglement_valid,
        phase: record.phase,
        amplitude: record.amplitude,
        frequency: record.frequency,
    }
}
