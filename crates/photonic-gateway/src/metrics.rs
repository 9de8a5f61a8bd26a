//! Gateway metrics and the bounded operation log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GatewayConfig;

/// Maximum operation records retained in the rolling log.
pub(crate) const HISTORY_CAPACITY: usize = 1000;

/// Number of entries `status()` reports from the tail of the log.
pub(crate) const RECENT_OPERATIONS: usize = 10;

/// Rolling counters maintained across the gateway's lifetime.
#[derive(Clone, Debug, Default, Serialize)]
pub struct GatewayMetrics {
    /// Records admitted through `create_state`
    pub total_states_processed: u64,
    /// Operations whose collision detection flagged at least one record
    pub collisions_detected: u64,
    /// Collisions successfully merged
    pub collisions_resolved: u64,
    /// Merges that aborted with a resolution error
    pub resolution_failures: u64,
    /// Records evicted by the decoherence sweep
    pub evictions: u64,
    /// Mean coherence across active records at the last refresh
    pub average_coherence: f64,
}

/// What a logged operation did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Created,
    Updated,
    Removed,
    Evicted,
}

/// One entry in the rolling operation log.
#[derive(Clone, Debug, Serialize)]
pub struct OperationRecord {
    /// Record the operation acted on
    pub state_id: Uuid,
    /// What happened
    pub operation: OperationKind,
    /// Whether collision detection flagged anything during the operation
    pub collision_detected: bool,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

/// Bounded log of recent operations, oldest entries dropped first.
#[derive(Debug, Default)]
pub(crate) struct OperationLog {
    entries: VecDeque<OperationRecord>,
}

impl OperationLog {
    pub(crate) fn record(&mut self, state_id: Uuid, operation: OperationKind, collision: bool) {
        self.entries.push_back(OperationRecord {
            state_id,
            operation,
            collision_detected: collision,
            timestamp: Utc::now(),
        });
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Last `n` entries in chronological order.
    pub(crate) fn recent(&self, n: usize) -> Vec<OperationRecord> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Read-only snapshot returned by `PhotonicGateway::status`.
#[derive(Clone, Debug, Serialize)]
pub struct StatusSnapshot {
    /// Currently active records
    pub active_states: usize,
    /// Configured capacity
    pub max_concurrent_states: usize,
    /// `active_states / max_concurrent_states`
    pub utilization: f64,
    /// Rolling counters
    pub metrics: GatewayMetrics,
    /// Configuration the gateway is running with
    pub config: GatewayConfig,
    /// Tail of the operation log
    pub recent_operations: Vec<OperationRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_log_bounded() {
        let mut log = OperationLog::default();
        for _ in 0..(HISTORY_CAPACITY + 50) {
            log.record(Uuid::new_v4(), OperationKind::Created, false);
        }
        assert_eq!(log.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut log = OperationLog::default();
        let ids: Vec<Uuid> = (0..15).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            log.record(*id, OperationKind::Created, false);
        }

        let recent = log.recent(RECENT_OPERATIONS);
        assert_eq!(recent.len(), RECENT_OPERATIONS);
        let expected: Vec<Uuid> = ids[5..].to_vec();
        let actual: Vec<Uuid> = recent.iter().map(|r| r.state_id).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_recent_smaller_than_requested() {
        let mut log = OperationLog::default();
        log.record(Uuid::new_v4(), OperationKind::Removed, false);
        assert_eq!(log.recent(RECENT_OPERATIONS).len(), 1);
    }

    #[test]
    fn test_operation_kind_serialization() {
        let json = serde_json::to_string(&OperationKind::Evicted).unwrap();
        assert_eq!(json, r#""evicted""#);
    }
}
