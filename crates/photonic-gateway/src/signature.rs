//! Pure signature derivation: payload -> (phase, amplitude, frequency).
//!
//! The signature is what collision detection operates on. It is fully
//! determined by the payload's canonical serialization plus the record's
//! timestamp, and is recomputed on every payload assignment; callers can
//! never set the fields directly.
//!
//! # Formulas
//!
//! - `phase`: first 32 bits of the SHA-256 digest of the canonical
//!   serialization, mapped to [0, 2π) via `(bits mod 10000) / 10000 * 2π`
//! - `amplitude`: with `n` the serialization length and `u` its distinct
//!   character count, `min(1, (u/n) * n / 1000)`; `0` for an empty
//!   serialization
//! - `frequency`: `1.0 + ((epoch_seconds mod 1000) / 1000) * 0.5`, so always
//!   in [1.0, 1.5)

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::canonical_json;

/// Number of buckets the digest is folded into before mapping to [0, 2π).
const PHASE_BUCKETS: u32 = 10_000;

/// Serialization length at which a maximally diverse payload saturates
/// amplitude at 1.0.
const AMPLITUDE_SCALE: f64 = 1000.0;

/// Derived numeric fingerprint of a payload.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Phase angle in [0, 2π)
    pub phase: f64,
    /// Amplitude in [0, 1]
    pub amplitude: f64,
    /// Frequency in [1.0, 1.5)
    pub frequency: f64,
}

/// Compute the full signature for a payload stamped at `timestamp`.
pub fn compute_signature(payload: &Value, timestamp: DateTime<Utc>) -> Signature {
    let canonical = canonical_json(payload);
    Signature {
        phase: phase_of(&canonical),
        amplitude: amplitude_of(&canonical),
        frequency: frequency_of(timestamp),
    }
}

/// Map the canonical serialization onto a phase angle in [0, 2π).
pub fn phase_of(canonical: &str) -> f64 {
    let digest = Sha256::digest(canonical.as_bytes());
    let bits = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    f64::from(bits % PHASE_BUCKETS) / f64::from(PHASE_BUCKETS) * std::f64::consts::TAU
}

/// Amplitude from the serialization's character diversity.
pub fn amplitude_of(canonical: &str) -> f64 {
    let length = canonical.chars().count();
    if length == 0 {
        return 0.0;
    }
    let distinct = canonical.chars().collect::<HashSet<_>>().len();
    let diversity = distinct as f64 / length as f64;
    (diversity * length as f64 / AMPLITUDE_SCALE).min(1.0)
}

/// Frequency from the creation timestamp's epoch seconds.
pub fn frequency_of(timestamp: DateTime<Utc>) -> f64 {
    let time_factor = timestamp.timestamp().rem_euclid(1000) as f64 / 1000.0;
    1.0 + time_factor * 0.5
}
