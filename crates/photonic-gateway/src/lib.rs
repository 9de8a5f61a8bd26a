//! Photonic Gateway - quantum-inspired conflict resolution for state records
//!
//! An in-memory store of short-lived state records that detects collisions
//! between a newly submitted record and all currently active records using a
//! pairwise interference score, resolves collisions by merging the colliding
//! records into one, tracks a symmetric entanglement relation between merged
//! records, and runs a background decoherence sweep that decays each record's
//! coherence and evicts it once coherence drops below a threshold.
//!
//! # Architecture
//!
//! - [`PhotonicGateway`]: the only public entry point; owns the store and the
//!   sweeper lifecycle
//! - [`StateRecord`]: a payload tree plus its derived phase/amplitude/frequency
//!   signature
//! - [`signature`]: pure payload -> signature derivation
//! - [`collision`]: pairwise interference scoring and collision detection
//! - [`resolver`]: the amplitude-weighted merge algorithm
//! - [`validator`]: per-record diagnostic scoring
//!
//! All store mutation funnels through one `RwLock`: caller-facing operations
//! and the decoherence sweeper share it, so collision detection always sees a
//! consistent whole-store snapshot and detection-then-insert is atomic.
//!
//! # Example
//!
//! ```no_run
//! use photonic_gateway::{GatewayConfig, PhotonicGateway};
//! use serde_json::json;
//!
//! # async fn run() -> photonic_gateway::GatewayResult<()> {
//! let gateway = PhotonicGateway::new(GatewayConfig::default())?;
//! let id = gateway.create_state(json!({"x": 10}), 1.0).await?;
//! let report = gateway.validate_state(id).await?;
//! assert!(report.coherent);
//! gateway.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod collision;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod resolver;
pub mod signature;
pub mod store;
pub mod types;
pub mod validator;

mod sweeper;

// Re-exports for convenience
pub use collision::CollisionOutcome;
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{PhotonicGateway, StateDetails};
pub use metrics::{GatewayMetrics, OperationKind, OperationRecord, StatusSnapshot};
pub use signature::Signature;
pub use types::StateRecord;
pub use validator::ValidationReport;
