//! DecoherenceSweeper - background decay-and-evict loop.
//!
//! Runs for the gateway's lifetime on a fixed tick interval. Each tick takes
//! the store's write lock, decays every record's coherence, and evicts the
//! records that dropped below the coherence threshold (removing symmetric
//! back-links from still-active peers). A failed sweep is logged and the
//! loop pauses for the configured backoff; it never exits on error.
//! Shutdown is graceful: the in-flight tick completes, then the loop returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::GatewayInner;
use crate::metrics::OperationKind;

/// Handle to the spawned sweeper task.
#[derive(Debug)]
pub(crate) struct SweeperHandle {
    pub(crate) shutdown: Arc<Notify>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) task: JoinHandle<()>,
}

/// Counts from one completed sweep tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SweepStats {
    pub(crate) decayed: usize,
    pub(crate) evicted: usize,
}

/// Spawn the sweeper loop over the shared gateway state.
pub(crate) fn spawn(inner: Arc<RwLock<GatewayInner>>, config: GatewayConfig) -> SweeperHandle {
    let shutdown = Arc::new(Notify::new());
    let running = Arc::new(AtomicBool::new(true));
    let task = tokio::spawn(sweeper_loop(
        inner,
        config,
        Arc::clone(&shutdown),
        Arc::clone(&running),
    ));
    info!("decoherence sweeper started");
    SweeperHandle {
        shutdown,
        running,
        task,
    }
}

async fn sweeper_loop(
    inner: Arc<RwLock<GatewayInner>>,
    config: GatewayConfig,
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
) {
    let mut ticker = interval(config.sweep_interval);
    // The first interval tick fires immediately; consume it so fresh records
    // get a full interval before their first decay.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,

            _ = ticker.tick() => {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                match sweep_once(&inner, &config).await {
                    Ok(stats) if stats.evicted > 0 => {
                        debug!(
                            decayed = stats.decayed,
                            evicted = stats.evicted,
                            "sweep evicted decoherent states"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        error!(error = %err, "sweep failed, backing off");
                        tokio::time::sleep(config.sweep_backoff).await;
                    }
                }
            }
        }
    }
    debug!("decoherence sweeper stopped");
}

/// One decay-and-evict pass over the whole store.
pub(crate) async fn sweep_once(
    inner: &RwLock<GatewayInner>,
    config: &GatewayConfig,
) -> GatewayResult<SweepStats> {
    let mut guard = inner.write().await;
    let state = &mut *guard;

    // Refuse to decay corrupted records; the loop retries after backoff
    if let Some(bad) = state
        .store
        .iter()
        .find(|record| !record.coherence.is_finite())
    {
        return Err(GatewayError::Internal(format!(
            "state {} has non-finite coherence",
            bad.id
        )));
    }

    let mut decayed = 0usize;
    for record in state.store.iter_mut() {
        record.decohere(config.decoherence_rate);
        decayed += 1;
    }

    let stale: Vec<Uuid> = state
        .store
        .iter()
        .filter(|record| !record.is_coherent(config.coherence_threshold))
        .map(|record| record.id)
        .collect();

    for id in &stale {
        state.store.remove(id);
        state.metrics.evictions += 1;
        state.history.record(*id, OperationKind::Evicted, false);
        debug!(state_id = %id, "evicted decoherent state");
    }

    state.metrics.average_coherence = state.store.mean_coherence();

    Ok(SweepStats {
        decayed,
        evicted: stale.len(),
    })
}
