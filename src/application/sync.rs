// Dashboard sync context - owns the whole core for the dashboard's lifetime
use std::sync::Arc;

use crate::application::executor::{FetchExecutor, RetryPolicy};
use crate::application::gateway::DashboardGateway;
use crate::application::poller::ResourcePoller;
use crate::application::store::{StoreSnapshot, ViewModelStore};
use crate::application::tabs::TabController;
use crate::domain::resource::Tab;
use crate::infrastructure::config::SyncConfig;

/// Explicit context object for the dashboard's active lifetime: store,
/// executor, pollers, and tab state all hang off this instead of any
/// ambient module state. Dropping out of scope without `shutdown` leaves
/// tasks running, so unmount must call `shutdown`.
pub struct DashboardSync {
    store: Arc<ViewModelStore>,
    executor: Arc<FetchExecutor>,
    poller: Arc<ResourcePoller>,
    tabs: TabController,
    initial_tab: Tab,
}

impl DashboardSync {
    pub fn new(gateway: Arc<dyn DashboardGateway>, config: &SyncConfig) -> Self {
        let store = Arc::new(ViewModelStore::new(config.degraded_threshold));
        let executor = FetchExecutor::new(
            gateway,
            store.clone(),
            config.request_timeout(),
            RetryPolicy {
                max_retries: config.max_retries,
                backoff_base: config.backoff_base(),
                jitter: config.backoff_jitter,
            },
        );
        let poller = Arc::new(ResourcePoller::new(executor.clone(), config));
        let initial_tab = Tab::Overview;
        let tabs = TabController::new(poller.clone(), initial_tab);
        Self {
            store,
            executor,
            poller,
            tabs,
            initial_tab,
        }
    }

    /// Starts all four pollers; always-on resources fetch immediately.
    pub async fn start(&self) {
        self.poller.start_all(self.initial_tab).await;
    }

    pub async fn select_tab(&self, tab: Tab) {
        self.tabs.select_tab(tab).await;
    }

    pub async fn current_tab(&self) -> Tab {
        self.tabs.current_tab().await
    }

    /// What the renderer reads: an owned point-in-time copy.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Total teardown: clears every timer and cancels every in-flight fetch.
    pub async fn shutdown(&self) {
        self.poller.stop_all().await;
        self.executor.cancel_all().await;
        tracing::info!("dashboard sync shut down");
    }
}
