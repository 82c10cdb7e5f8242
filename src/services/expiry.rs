use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::services::lifecycle;
use crate::state::AppState;

const RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Starts the background sweep that expires abandoned pending bookings.
/// Returns `None` when the interval is configured as 0. The task stops once
/// `shutdown` flips to true or its sender is dropped.
pub fn spawn_sweeper(
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Option<JoinHandle<()>> {
    let interval_secs = state.config.expiry_sweep_interval_secs;
    if interval_secs == 0 {
        tracing::info!("expiry sweep disabled");
        return None;
    }

    tracing::info!(interval_secs, "starting expiry sweep");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep_once(&state, RUN_TIMEOUT).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("expiry sweep stopped");
    }))
}

/// One sweep on the blocking pool. Failures and timeouts are logged and
/// reported as `None`.
pub async fn sweep_once(state: &Arc<AppState>, run_timeout: Duration) -> Option<usize> {
    let state = Arc::clone(state);
    let task = tokio::task::spawn_blocking(move || {
        let conn = state.conn()?;
        lifecycle::expire_stale_pending(&conn, &state.policy, Utc::now().naive_utc())
    });

    match tokio::time::timeout(run_timeout, task).await {
        Ok(Ok(Ok(expired))) => {
            tracing::debug!(expired, "expiry sweep finished");
            Some(expired)
        }
        Ok(Ok(Err(e))) => {
            tracing::error!(error = %e, "expiry sweep failed");
            None
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "expiry sweep task panicked");
            None
        }
        Err(_) => {
            tracing::warn!(timeout_secs = run_timeout.as_secs(), "expiry sweep timed out");
            None
        }
    }
}
