// Resource poller - one recurring timer per resource, tab-aware
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::executor::FetchExecutor;
use crate::domain::resource::{Resource, Tab};
use crate::infrastructure::config::SyncConfig;

struct PollWorker {
    active_tx: watch::Sender<bool>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns one timer task per resource.
///
/// The interval keeps ticking while a resource is inactive so cadence stays
/// consistent; inactive ticks are skipped rather than rescheduled. A tick
/// that lands while a fetch is still in flight is dropped, not queued.
pub struct ResourcePoller {
    executor: Arc<FetchExecutor>,
    intervals: [Duration; 4],
    workers: Mutex<HashMap<Resource, PollWorker>>,
}

impl ResourcePoller {
    pub fn new(executor: Arc<FetchExecutor>, config: &SyncConfig) -> Self {
        let intervals = Resource::ALL.map(|r| config.poll_interval(r));
        Self {
            executor,
            intervals,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Spawns the poll worker for a resource. The first tick is immediate,
    /// so a resource started active fetches right away; one started inactive
    /// fetches on its first activation instead.
    pub async fn start(&self, resource: Resource, initially_active: bool) {
        let mut workers = self.workers.lock().await;
        if workers.contains_key(&resource) {
            tracing::warn!(%resource, "poller already started");
            return;
        }

        let (active_tx, active_rx) = watch::channel(initially_active);
        let cancel = CancellationToken::new();
        let interval = self.intervals[resource.index()];
        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(poll_loop(
            executor,
            resource,
            interval,
            active_rx,
            cancel.clone(),
        ));

        tracing::info!(%resource, interval_ms = interval.as_millis() as u64, active = initially_active, "poller started");
        workers.insert(
            resource,
            PollWorker {
                active_tx,
                cancel,
                handle,
            },
        );
    }

    /// Starts all four pollers with activation derived from the initial tab.
    pub async fn start_all(&self, tab: Tab) {
        for resource in Resource::ALL {
            self.start(resource, tab.activates(resource)).await;
        }
    }

    /// Changes a resource's activation. A false→true transition fires an
    /// immediate fetch inside the worker, independent of the timer's
    /// remaining countdown; true→false just lets future ticks be skipped.
    pub async fn set_active(&self, resource: Resource, active: bool) {
        let workers = self.workers.lock().await;
        let Some(worker) = workers.get(&resource) else {
            tracing::warn!(%resource, "set_active on a poller that was never started");
            return;
        };
        let changed = worker.active_tx.send_if_modified(|current| {
            if *current != active {
                *current = active;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::debug!(%resource, active, "poller activation changed");
        }
    }

    pub async fn stop(&self, resource: Resource) {
        let mut workers = self.workers.lock().await;
        if let Some(worker) = workers.remove(&resource) {
            worker.cancel.cancel();
            worker.handle.abort();
            tracing::info!(%resource, "poller stopped");
        }
    }

    /// Clears every timer. In-flight fetches are the executor's to cancel.
    pub async fn stop_all(&self) {
        let mut workers = self.workers.lock().await;
        for (resource, worker) in workers.drain() {
            worker.cancel.cancel();
            worker.handle.abort();
            tracing::debug!(%resource, "poller stopped");
        }
    }
}

async fn poll_loop(
    executor: Arc<FetchExecutor>,
    resource: Resource,
    interval: Duration,
    mut active_rx: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if *active_rx.borrow() {
                    executor.try_fetch(resource).await;
                } else {
                    tracing::trace!(%resource, "tick skipped, resource inactive");
                }
            }
            changed = active_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if *active_rx.borrow() {
                    // Reactivation may land mid-retry of a stale cycle;
                    // supersede it so fresh data wins.
                    executor.force_fetch(resource).await;
                }
            }
        }
    }
}
