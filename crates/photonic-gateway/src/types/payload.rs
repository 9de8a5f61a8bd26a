//! Payload helpers.
//!
//! Payloads are `serde_json::Value` trees: the tagged variant
//! (Number | String | Bool | Object | Array | Null) lets the merge logic
//! match exhaustively instead of inspecting types at runtime.

use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// Order-independent canonical serialization of a payload.
///
/// `serde_json`'s default map is BTree-backed, so object keys serialize in
/// sorted order at every nesting level; two payloads that differ only in key
/// insertion order produce the same canonical form.
pub fn canonical_json(payload: &Value) -> String {
    serde_json::to_string(payload).expect("serializing a serde_json::Value cannot fail")
}

/// Layer `update` over `base`, key by key, returning the merged payload.
///
/// Both payloads must be maps at the top level; an updated key replaces the
/// stored value wholesale (no deep merge).
pub fn shallow_merge(base: &Value, update: &Value) -> GatewayResult<Value> {
    match (base, update) {
        (Value::Object(base_map), Value::Object(update_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in update_map {
                merged.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(merged))
        }
        _ => Err(GatewayError::ConflictResolution(
            "payloads must be maps at the top level to merge".into(),
        )),
    }
}
