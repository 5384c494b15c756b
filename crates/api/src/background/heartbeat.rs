//! Heartbeat supervisor: pings the store while a job runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use offload_core::{JobId, JobStore};

/// Supervisor state as observed through its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatState {
    Running,
    Stopped,
}

/// Ping `store` for `job_id` every `interval` until `stop` fires.
///
/// The first ping happens one interval after start. Ping errors are logged
/// and the loop carries on; the next tick is the retry. A ping that is
/// already in flight when `stop` fires is allowed to finish. A zero
/// interval disables pinging.
pub async fn supervise(
    store: Arc<dyn JobStore>,
    job_id: JobId,
    interval: Duration,
    stop: CancellationToken,
) {
    if interval.is_zero() {
        warn!(job_id = %job_id, "heartbeat interval is zero, not pinging");
        return;
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = store.ping(&job_id).await {
                    warn!(job_id = %job_id, error = %e, "heartbeat ping failed");
                }
            }
        }
    }

    debug!(job_id = %job_id, "heartbeat stopped");
}

/// Handle to a running supervisor.
///
/// Stopping is best-effort: it raises the stop signal and returns without
/// waiting for the supervisor task. Dropping the handle stops it too.
#[derive(Debug)]
pub struct Heartbeat {
    stop: CancellationToken,
}

impl Heartbeat {
    /// Spawn a supervisor for `job_id` on the current runtime.
    pub fn spawn(store: Arc<dyn JobStore>, job_id: JobId, interval: Duration) -> Self {
        let stop = CancellationToken::new();
        tokio::spawn(supervise(store, job_id, interval, stop.clone()));
        Self { stop }
    }

    pub fn state(&self) -> HeartbeatState {
        if self.stop.is_cancelled() {
            HeartbeatState::Stopped
        } else {
            HeartbeatState::Running
        }
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
