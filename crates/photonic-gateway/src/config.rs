//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// Configuration for the photonic gateway.
///
/// # Example
///
/// ```
/// use photonic_gateway::GatewayConfig;
/// use std::time::Duration;
///
/// let config = GatewayConfig::default()
///     .with_collision_sensitivity(0.9)
///     .with_sweep_interval(Duration::from_millis(250));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Coherence below this value marks a record for eviction and counts a
    /// record as incoherent during validation.
    /// Default: 0.5
    pub coherence_threshold: f64,

    /// Per-tick coherence decay rate applied by the sweeper.
    /// Default: 0.01
    pub decoherence_rate: f64,

    /// Absolute interference above this value flags a collision.
    /// Default: 0.8
    pub collision_sensitivity: f64,

    /// Hard cap on concurrently active records; `create_state` refuses with
    /// `CapacityExceeded` beyond it.
    /// Default: 100
    pub max_concurrent_states: usize,

    /// Interval between decoherence sweep ticks.
    /// Default: 1s
    pub sweep_interval: Duration,

    /// Pause after a failed sweep before the loop resumes ticking.
    /// Default: 5s
    pub sweep_backoff: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            coherence_threshold: 0.5,
            decoherence_rate: 0.01,
            collision_sensitivity: 0.8,
            max_concurrent_states: 100,
            sweep_interval: Duration::from_secs(1),
            sweep_backoff: Duration::from_secs(5),
        }
    }
}

impl GatewayConfig {
    /// Set the collision sensitivity.
    #[inline]
    pub fn with_collision_sensitivity(mut self, sensitivity: f64) -> Self {
        self.collision_sensitivity = sensitivity;
        self
    }

    /// Set the per-tick decoherence rate.
    #[inline]
    pub fn with_decoherence_rate(mut self, rate: f64) -> Self {
        self.decoherence_rate = rate;
        self
    }

    /// Set the coherence eviction threshold.
    #[inline]
    pub fn with_coherence_threshold(mut self, threshold: f64) -> Self {
        self.coherence_threshold = threshold;
        self
    }

    /// Set the active-record capacity.
    #[inline]
    pub fn with_max_concurrent_states(mut self, max: usize) -> Self {
        self.max_concurrent_states = max;
        self
    }

    /// Set the sweep tick interval.
    #[inline]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the pause after a failed sweep.
    #[inline]
    pub fn with_sweep_backoff(mut self, backoff: Duration) -> Self {
        self.sweep_backoff = backoff;
        self
    }

    /// Check all values are in range.
    ///
    /// Thresholds and rates must lie in [0, 1], the capacity must be at
    /// least 1, and both durations must be nonzero.
    pub fn validate(&self) -> GatewayResult<()> {
        if !(0.0..=1.0).contains(&self.coherence_threshold) {
            return Err(GatewayError::InvalidConfig(format!(
                "coherence_threshold must be in [0, 1], got {}",
                self.coherence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.decoherence_rate) {
            return Err(GatewayError::InvalidConfig(format!(
                "decoherence_rate must be in [0, 1], got {}",
                self.decoherence_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.collision_sensitivity) {
            return Err(GatewayError::InvalidConfig(format!(
                "collision_sensitivity must be in [0, 1], got {}",
                self.collision_sensitivity
            )));
        }
        if self.max_concurrent_states == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_concurrent_states must be at least 1".into(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(GatewayError::InvalidConfig(
                "sweep_interval must be nonzero".into(),
            ));
        }
        if self.sweep_backoff.is_zero() {
            return Err(GatewayError::InvalidConfig(
                "sweep_backoff must be nonzero".into(),
            ));
        }
        Ok(())
    }
}
