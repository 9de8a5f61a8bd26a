//! Domain types for the photonic gateway.

pub mod payload;
pub mod record;

pub use payload::{canonical_json, shallow_merge};
pub use record::StateRecord;
