//! Quiescence detection: promoting an idle crawl to complete.
//!
//! The fetch counter alone cannot signal completion, because fetches
//! enqueue further work from inside fetches; the counter can touch zero
//! while discoveries are still in the queue. Watching for a full idle
//! window over tree insertions is the reliable signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::worker::{Worker, WorkerStatus};

/// Starts the per-worker completion ticker.
///
/// Every `window` the detector samples the worker's last tree update. Once
/// the crawl has entered the in-progress state and a full window elapses
/// with no insertion, the worker is promoted to complete and the ticker
/// stops.
pub(crate) fn spawn(worker: Arc<Worker>, window: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(window);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match worker.status() {
                WorkerStatus::Complete | WorkerStatus::Error => break,
                WorkerStatus::Initialised => continue,
                WorkerStatus::InProgress => {
                    if worker.idle_for() > window {
                        info!(seed = %worker.seed(), "no activity within the idle window, crawl complete");
                        worker.set_status(WorkerStatus::Complete);
                        break;
                    }
                }
            }
        }
    })
}
