//! Background expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::workflow::ContractWorkflow;

/// Spawn a task that sweeps idle sessions every `period` until `shutdown`
/// is cancelled.
pub fn spawn_sweeper(
    workflow: Arc<ContractWorkflow>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately
        ticker.tick().await;
        info!(period_secs = period.as_secs(), "session sweeper started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = workflow.sweep_expired_at(Utc::now());
                    if removed.is_empty() {
                        debug!("sweep found no idle sessions");
                    } else {
                        info!(count = removed.len(), "swept idle sessions");
                    }
                }
            }
        }
        info!("session sweeper stopped");
    })
}
