//! Background sweep of query results left behind by closed sessions.

use crate::state::AppState;
use qrcache_core::{QueryCacheError, QueryResultsManager};
use qrcache_types::SweepOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Run `task` on the blocking pool. A panic or cancellation surfaces as `TaskFailed`.
async fn run_blocking<T, F>(task: F) -> qrcache_core::Result<T>
where
    F: FnOnce() -> qrcache_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| QueryCacheError::TaskFailed(e.to_string()))?
}

/// Run one guarded sweep on the blocking pool.
pub async fn run_sweep(results: Arc<QueryResultsManager>, force: bool) -> qrcache_core::Result<SweepOutcome> {
    run_blocking(move || {
        if force {
            results.purge_inactive_sessions().map(SweepOutcome::Completed)
        } else {
            results.delete_for_inactive_sessions()
        }
    })
    .await
}

/// Spawn the periodic sweeper, or nothing when the interval is zero.
///
/// A pass that hit the scan limit and still deleted rows is followed
/// immediately by another pass.
pub fn spawn_sweeper(state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let secs = state.config.sweep_interval_secs;
    if secs == 0 {
        info!(target: "qrcache::startup", "Inactive session sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; give sessions a full interval first
        interval.tick().await;

        loop {
            interval.tick().await;
            loop {
                match run_sweep(state.results.clone(), false).await {
                    Ok(SweepOutcome::Completed(report)) => {
                        debug!(
                            target: "qrcache::sweep",
                            "Sweep pass: {} scanned, {} deleted",
                            report.scanned,
                            report.deleted
                        );
                        if !(report.truncated && report.deleted > 0) {
                            break;
                        }
                    }
                    Ok(SweepOutcome::Skipped { reason }) => {
                        debug!(target: "qrcache::sweep", "Sweep skipped: {:?}", reason);
                        break;
                    }
                    Err(e) => {
                        error!(target: "qrcache::sweep", "Inactive session sweep failed: {}", e);
                        break;
                    }
                }
            }
        }
    }))
}
