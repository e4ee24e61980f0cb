// Tab activation controller - maps the selected view to resource activation
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::poller::ResourcePoller;
use crate::domain::resource::{Resource, Tab};

/// Tracks the single selected view and keeps per-resource activation in
/// step with it. The only internal state is the current tab.
pub struct TabController {
    poller: Arc<ResourcePoller>,
    current: Mutex<Tab>,
}

impl TabController {
    pub fn new(poller: Arc<ResourcePoller>, initial: Tab) -> Self {
        Self {
            poller,
            current: Mutex::new(initial),
        }
    }

    /// Switches the selected view and pokes the poller for every resource
    /// whose activation changed. Re-selecting the current tab is a no-op.
    pub async fn select_tab(&self, tab: Tab) {
        let mut current = self.current.lock().await;
        if *current == tab {
            return;
        }
        let previous = *current;
        *current = tab;

        for resource in Resource::ALL {
            let was_active = previous.activates(resource);
            let now_active = tab.activates(resource);
            if was_active != now_active {
                self.poller.set_active(resource, now_active).await;
            }
        }
        tracing::info!(from = %previous, to = %tab, "tab selected");
    }

    pub async fn current_tab(&self) -> Tab {
        *self.current.lock().await
    }
}
