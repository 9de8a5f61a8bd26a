//! Pairwise interference scoring and collision detection.
//!
//! Interference compares the raw absolute phase difference against the
//! π/4 and 7π/4 thresholds. The raw delta is intentionally not unwrapped to
//! the shorter circular distance: substituting `min(d, 2π - d)` would change
//! which pairs are flagged as colliding.

use std::f64::consts::FRAC_PI_4;

use uuid::Uuid;

use crate::store::StateStore;
use crate::types::StateRecord;

/// Outcome of running collision detection.
///
/// `Clear` is an explicit no-collision sentinel, distinct from an empty
/// colliding list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// No record interferes beyond the sensitivity threshold.
    Clear,
    /// Ids of colliding records, in store iteration order.
    Colliding(Vec<Uuid>),
}

impl CollisionOutcome {
    /// True when at least one collision was flagged.
    pub fn detected(&self) -> bool {
        matches!(self, CollisionOutcome::Colliding(_))
    }

    /// The colliding ids, if any.
    pub fn ids(&self) -> Option<&[Uuid]> {
        match self {
            CollisionOutcome::Clear => None,
            CollisionOutcome::Colliding(ids) => Some(ids),
        }
    }
}

/// Interference between two records' phase-amplitude signatures, in [-1, 1].
///
/// Nearly aligned phases (raw delta under π/4 or over 7π/4) interfere
/// constructively via `cos`; everything else interferes destructively via
/// `-sin`.
pub fn interference(a: &StateRecord, b: &StateRecord) -> f64 {
    let phase_delta = (a.phase - b.phase).abs();
    let amplitude_product = a.amplitude * b.amplitude;

    let raw = if phase_delta < FRAC_PI_4 || phase_delta > 7.0 * FRAC_PI_4 {
        amplitude_product * phase_delta.cos()
    } else {
        -amplitude_product * phase_delta.sin()
    };
    raw.clamp(-1.0, 1.0)
}

/// Score `candidate` against every record in the store view.
///
/// `exclude` skips one id (the record being updated). A record collides when
/// its absolute interference with the candidate strictly exceeds
/// `sensitivity`. Pure over its inputs: the same candidate and store state
/// always yield the same outcome.
pub fn detect_collisions(
    candidate: &StateRecord,
    store: &StateStore,
    exclude: Option<Uuid>,
    sensitivity: f64,
) -> CollisionOutcome {
    let mut colliding = Vec::new();

    for existing in store.iter() {
        if Some(existing.id) == exclude || existing.id == candidate.id {
            continue;
        }
        if interference(candidate, existing).abs() > sensitivity {
            colliding.push(existing.id);
        }
    }

    if colliding.is_empty() {
        CollisionOutcome::Clear
    } else {
        CollisionOutcome::Colliding(colliding)
    }
}

/// Used by validation: mean interference of `record` against every other
/// active record, 0.0 when it is alone.
pub fn mean_interference(record: &StateRecord, store: &StateStore) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;

    for other in store.iter() {
        if other.id == record.id {
            continue;
        }
        total += interference(record, other);
        count += 1;
    }

    if count > 0 {
        total / count as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Record with pinned phase and amplitude, bypassing derivation.
    fn pinned(phase: f64, amplitude: f64) -> StateRecord {
        let mut record = StateRecord::new(json!({"probe": true}), 1.0);
        record.phase = phase;
        record.amplitude = amplitude;
        record
    }

    #[test]
    fn test_constructive_branch_near_zero_delta() {
        let a = pinned(1.0, 0.9);
        let b = pinned(1.1, 0.9);
        // delta 0.1 < π/4 -> cos branch, close to the amplitude product
        let i = interference(&a, &b);
        assert!((i - 0.81 * (0.1f64).cos()).abs() < 1e-9);
        assert!(i > 0.8);
    }

    #[test]
    fn test_destructive_branch_mid_range() {
        let a = pinned(0.0, 1.0);
        let b = pinned(1.0, 1.0);
        // delta 1.0 is between π/4 and 7π/4 -> -sin branch
        let i = interference(&a, &b);
        assert!((i + (1.0f64).sin()).abs() < 1e-9);
        assert!(i < 0.0);
    }

    #[test]
    fn test_raw_delta_not_unwrapped() {
        // Raw delta 5.9 exceeds 7π/4, so the cos branch applies to the raw
        // value; unwrapping to the circular distance (~0.38) would also pick
        // cos but of a different angle.
        let a = pinned(0.0, 1.0);
        let b = pinned(5.9, 1.0);
        let i = interference(&a, &b);
        assert!((i - (5.9f64).cos()).abs() < 1e-9);

        // Just above π/4 the destructive branch kicks in even though the
        // phases are still fairly close.
        let c = pinned(0.0, 1.0);
        let d = pinned(0.8, 1.0);
        assert!(interference(&c, &d) < 0.0);
    }

    #[test]
    fn test_interference_clamped() {
        // Amplitudes are capped at 1 so the product stays in range, but the
        // clamp is part of the contract.
        let a = pinned(0.0, 1.0);
        let b = pinned(0.0, 1.0);
        let i = interference(&a, &b);
        assert!((-1.0..=1.0).contains(&i));
        assert!((i - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_detect_collisions_flags_strong_interference() {
        let mut store = StateStore::new();
        let strong = store.insert(pinned(1.0, 1.0));
        let weak = store.insert(pinned(1.0, 0.1));

        let candidate = pinned(1.05, 1.0);
        let outcome = detect_collisions(&candidate, &store, None, 0.8);

        let ids = outcome.ids().expect("collision expected");
        assert!(ids.contains(&strong));
        assert!(!ids.contains(&weak));
    }

    #[test]
    fn test_detect_collisions_clear_sentinel() {
        let mut store = StateStore::new();
        store.insert(pinned(1.0, 0.1));

        let candidate = pinned(1.0, 0.1);
        assert_eq!(
            detect_collisions(&candidate, &store, None, 0.8),
            CollisionOutcome::Clear
        );
        assert!(!CollisionOutcome::Clear.detected());
    }

    #[test]
    fn test_detect_collisions_respects_exclude() {
        let mut store = StateStore::new();
        let id = store.insert(pinned(1.0, 1.0));

        let candidate = pinned(1.0, 1.0);
        assert!(detect_collisions(&candidate, &store, None, 0.8).detected());
        assert_eq!(
            detect_collisions(&candidate, &store, Some(id), 0.8),
            CollisionOutcome::Clear
        );
    }

    #[test]
    fn test_detection_is_pure() {
        let mut store = StateStore::new();
        store.insert(pinned(1.0, 1.0));
        store.insert(pinned(2.5, 0.9));
        store.insert(pinned(1.02, 0.95));

        let candidate = pinned(1.01, 1.0);
        let first = detect_collisions(&candidate, &store, None, 0.8);
        let second = detect_collisions(&candidate, &store, None, 0.8);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mean_interference_empty_store() {
        let store = StateStore::new();
        let candidate = pinned(1.0, 1.0);
        assert_eq!(mean_interference(&candidate, &store), 0.0);
    }

    #[test]
    fn test_mean_interference_averages_over_others() {
        let mut store = StateStore::new();
        let a = pinned(0.0, 1.0);
        let a_id = store.insert(a.clone());
        store.insert(pinned(0.1, 1.0));
        store.insert(pinned(1.0, 1.0));

        let stored = store.get(&a_id).unwrap();
        let expected = ((0.1f64).cos() + -(1.0f64).sin()) / 2.0;
        assert!((mean_interference(stored, &store) - expected).abs() < 1e-9);
        assert_eq!(stored.id, a.id);
    }
}
