//! Conflict resolution: merging a candidate with its colliding records.
//!
//! The merge is a superposition of payloads. Shared numeric keys are
//! averaged with amplitude weighting, shared non-numeric keys fall back to a
//! priority tie-break, absent keys are adopted. Amplitudes accumulate
//! (clamped to 1), phases combine through an iterative pairwise average.
//! The pairwise average is order-dependent by contract: resolution walks the
//! colliding records in detection order.
//!
//! Resolution never touches the store; the gateway inserts the resolved
//! record only after the whole merge succeeds, so a failed merge leaves no
//! partial mutation behind.

use std::f64::consts::TAU;

use serde_json::Value;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::types::StateRecord;

/// Merge `candidate` with `colliding` into one resolved record.
///
/// With no colliding records the candidate is returned unchanged: no new
/// entanglements, same payload, same signature.
///
/// The resolved record keeps the candidate's id, priority, and timestamps,
/// carries the merged payload, the accumulated amplitude and phase, a fresh
/// coherence of 1.0, and is entangled with every colliding record.
pub fn resolve(
    candidate: StateRecord,
    colliding: &[&StateRecord],
) -> GatewayResult<StateRecord> {
    if colliding.is_empty() {
        return Ok(candidate);
    }

    let mut merged = match &candidate.payload {
        Value::Object(map) => map.clone(),
        _ => {
            return Err(GatewayError::ConflictResolution(
                "candidate payload must be a map to merge".into(),
            ))
        }
    };

    let mut total_amplitude = candidate.amplitude;
    let mut total_phase = candidate.phase;

    for existing in colliding {
        let existing_map = match &existing.payload {
            Value::Object(map) => map,
            _ => {
                return Err(GatewayError::ConflictResolution(format!(
                    "colliding state {} has a non-map payload",
                    existing.id
                )))
            }
        };

        for (key, theirs) in existing_map {
            match merged.get(key) {
                Some(ours) => {
                    if let (Some(ours_num), Some(theirs_num)) = (ours.as_f64(), theirs.as_f64()) {
                        // Amplitude-weighted average; an all-zero pair splits evenly
                        let denominator = candidate.amplitude + existing.amplitude;
                        let weight_new = if denominator == 0.0 {
                            0.5
                        } else {
                            candidate.amplitude / denominator
                        };
                        let averaged = weight_new * ours_num + (1.0 - weight_new) * theirs_num;
                        merged.insert(key.clone(), Value::from(averaged));
                    } else if candidate.priority < existing.priority {
                        // Non-numeric conflict: higher priority wins, candidate on ties
                        merged.insert(key.clone(), theirs.clone());
                    }
                }
                None => {
                    merged.insert(key.clone(), theirs.clone());
                }
            }
        }

        total_amplitude += existing.amplitude;
        total_phase = (total_phase + existing.phase) / 2.0;
    }

    let mut resolved = candidate;
    resolved.payload = Value::Object(merged);
    resolved.amplitude = total_amplitude.min(1.0);
    resolved.phase = total_phase.rem_euclid(TAU);
    resolved.coherence = 1.0;
    resolved.entangled_with = colliding.iter().map(|record| record.id).collect();

    debug!(
        state_id = %resolved.id,
        merged_with = colliding.len(),
        amplitude = resolved.amplitude,
        "resolved state collision"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with(payload: Value, priority: f64, amplitude: f64, phase: f64) -> StateRecord {
        let mut record = StateRecord::new(payload, priority);
        record.amplitude = amplitude;
        record.phase = phase;
        record
    }

    #[test]
    fn test_resolve_without_collisions_is_identity() {
        let candidate = StateRecord::new(json!({"x": 10}), 1.0);
        let expected_payload = candidate.payload.clone();
        let expected_phase = candidate.phase;

        let resolved = resolve(candidate, &[]).unwrap();
        assert_eq!(resolved.payload, expected_payload);
        assert_eq!(resolved.phase, expected_phase);
        assert!(resolved.entangled_with.is_empty());
    }

    #[test]
    fn test_numeric_keys_average_with_amplitude_weights() {
        let candidate = record_with(json!({"price": 100.0}), 1.0, 0.6, 1.0);
        let existing = record_with(json!({"price": 200.0}), 1.0, 0.4, 1.2);

        let resolved = resolve(candidate, &[&existing]).unwrap();
        // weight_new = 0.6 / (0.6 + 0.4) = 0.6
        let merged = resolved.payload.get("price").unwrap().as_f64().unwrap();
        assert!((merged - (0.6 * 100.0 + 0.4 * 200.0)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_amplitudes_split_evenly() {
        let candidate = record_with(json!({"v": 10.0}), 1.0, 0.0, 1.0);
        let existing = record_with(json!({"v": 20.0}), 1.0, 0.0, 1.0);

        let resolved = resolve(candidate, &[&existing]).unwrap();
        let merged = resolved.payload.get("v").unwrap().as_f64().unwrap();
        assert!((merged - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_numeric_conflict_uses_priority() {
        // Candidate outranks: its value stays
        let candidate = record_with(json!({"side": "buy"}), 0.9, 0.5, 1.0);
        let existing = record_with(json!({"side": "sell"}), 0.2, 0.5, 1.0);
        let resolved = resolve(candidate, &[&existing]).unwrap();
        assert_eq!(resolved.payload.get("side").unwrap(), "buy");

        // Existing outranks: its value wins
        let candidate = record_with(json!({"side": "buy"}), 0.2, 0.5, 1.0);
        let existing = record_with(json!({"side": "sell"}), 0.9, 0.5, 1.0);
        let resolved = resolve(candidate, &[&existing]).unwrap();
        assert_eq!(resolved.payload.get("side").unwrap(), "sell");

        // Tie goes to the candidate
        let candidate = record_with(json!({"side": "buy"}), 0.5, 0.5, 1.0);
        let existing = record_with(json!({"side": "sell"}), 0.5, 0.5, 1.0);
        let resolved = resolve(candidate, &[&existing]).unwrap();
        assert_eq!(resolved.payload.get("side").unwrap(), "buy");
    }

    #[test]
    fn test_mixed_numeric_and_text_uses_priority() {
        // "both numeric" is required for averaging; number-vs-string falls
        // back to the priority rule
        let candidate = record_with(json!({"v": 10.0}), 0.1, 0.5, 1.0);
        let existing = record_with(json!({"v": "ten"}), 0.9, 0.5, 1.0);
        let resolved = resolve(candidate, &[&existing]).unwrap();
        assert_eq!(resolved.payload.get("v").unwrap(), "ten");
    }

    #[test]
    fn test_absent_keys_are_adopted() {
        let candidate = record_with(json!({"a": 1.0}), 1.0, 0.5, 1.0);
        let existing = record_with(json!({"b": true, "c": [1, 2]}), 1.0, 0.5, 1.0);

        let resolved = resolve(candidate, &[&existing]).unwrap();
        assert_eq!(resolved.payload.get("b").unwrap(), &json!(true));
        assert_eq!(resolved.payload.get("c").unwrap(), &json!([1, 2]));
    }

    #[test]
    fn test_amplitude_accumulates_and_clamps() {
        let candidate = record_with(json!({"a": 1.0}), 1.0, 0.7, 1.0);
        let e1 = record_with(json!({"b": 1.0}), 1.0, 0.5, 1.0);
        let e2 = record_with(json!({"c": 1.0}), 1.0, 0.4, 1.0);

        let resolved = resolve(candidate, &[&e1, &e2]).unwrap();
        assert_eq!(resolved.amplitude, 1.0);
    }

    #[test]
    fn test_phase_average_is_order_dependent() {
        let e1 = record_with(json!({"b": 1.0}), 1.0, 0.1, 0.5);
        let e2 = record_with(json!({"c": 1.0}), 1.0, 0.1, 2.5);

        let forward = resolve(
            record_with(json!({"a": 1.0}), 1.0, 0.1, 1.0),
            &[&e1, &e2],
        )
        .unwrap();
        let backward = resolve(
            record_with(json!({"a": 1.0}), 1.0, 0.1, 1.0),
            &[&e2, &e1],
        )
        .unwrap();

        // ((1.0 + 0.5)/2 + 2.5)/2 = 1.625 vs ((1.0 + 2.5)/2 + 0.5)/2 = 1.125
        assert!((forward.phase - 1.625).abs() < 1e-12);
        assert!((backward.phase - 1.125).abs() < 1e-12);
    }

    #[test]
    fn test_resolved_record_resets_coherence_and_entangles() {
        let mut candidate = record_with(json!({"a": 1.0}), 0.8, 0.5, 1.0);
        candidate.coherence = 0.3;
        let existing = record_with(json!({"a": 2.0}), 0.5, 0.5, 1.0);
        let existing_id = existing.id;

        let resolved = resolve(candidate, &[&existing]).unwrap();
        assert!((resolved.coherence - 1.0).abs() < f64::EPSILON);
        assert!((resolved.priority - 0.8).abs() < f64::EPSILON);
        assert!(resolved.entangled_with.contains(&existing_id));
        assert_eq!(resolved.entangled_with.len(), 1);
    }

    #[test]
    fn test_incompatible_payloads_fail() {
        let candidate = record_with(json!([1, 2, 3]), 1.0, 0.5, 1.0);
        let existing = record_with(json!({"a": 1.0}), 1.0, 0.5, 1.0);
        assert!(matches!(
            resolve(candidate, &[&existing]),
            Err(GatewayError::ConflictResolution(_))
        ));

        let candidate = record_with(json!({"a": 1.0}), 1.0, 0.5, 1.0);
        let existing = record_with(json!("scalar"), 1.0, 0.5, 1.0);
        assert!(resolve(candidate, &[&existing]).is_err());
    }
}
