// Fetch executor - per-resource request cycle with timeout, retry, and supersession
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::application::gateway::DashboardGateway;
use crate::application::store::ViewModelStore;
use crate::domain::fetch::{FetchError, FetchResult};
use crate::domain::resource::Resource;

/// Retry policy for one fetch cycle: exponential backoff with proportional
/// jitter. The whole cycle produces a single terminal result.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    /// Proportional jitter, e.g. 0.2 spreads each delay over ±20%.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    fn delay(&self, retry: u32) -> Duration {
        let base = self.backoff_base.as_millis() as f64;
        let exp = base * 2f64.powi(retry.saturating_sub(1) as i32);
        let factor = if self.jitter > 0.0 {
            rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter)
        } else {
            1.0
        };
        Duration::from_millis((exp * factor) as u64)
    }
}

struct Flight {
    token: CancellationToken,
    generation: u64,
}

/// Runs fetch cycles and applies their terminal results to the store.
///
/// The `flights` map is the single-flight slot per resource: an entry exists
/// exactly while a cycle is outstanding. Supersession swaps the entry under
/// the lock, so a cancelled cycle can never free or clobber the slot of the
/// cycle that replaced it (generations disambiguate).
pub struct FetchExecutor {
    gateway: Arc<dyn DashboardGateway>,
    store: Arc<ViewModelStore>,
    request_timeout: Duration,
    policy: RetryPolicy,
    root: CancellationToken,
    flights: Mutex<HashMap<Resource, Flight>>,
    generation: AtomicU64,
}

impl FetchExecutor {
    pub fn new(
        gateway: Arc<dyn DashboardGateway>,
        store: Arc<ViewModelStore>,
        request_timeout: Duration,
        policy: RetryPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            store,
            request_timeout,
            policy,
            root: CancellationToken::new(),
            flights: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        })
    }

    /// Starts a fetch cycle unless one is already outstanding for the
    /// resource; an overlapping trigger is dropped, not queued.
    pub async fn try_fetch(self: &Arc<Self>, resource: Resource) {
        let mut flights = self.flights.lock().await;
        if flights.contains_key(&resource) {
            tracing::debug!(%resource, "fetch already in flight, dropping trigger");
            return;
        }
        self.launch(&mut flights, resource);
    }

    /// Starts a fetch cycle, cancelling any outstanding one for the same
    /// resource first. The superseded cycle's eventual result is discarded
    /// and its single-flight slot is freed here, immediately.
    pub async fn force_fetch(self: &Arc<Self>, resource: Resource) {
        let mut flights = self.flights.lock().await;
        if let Some(flight) = flights.remove(&resource) {
            tracing::debug!(%resource, "superseding in-flight fetch");
            flight.token.cancel();
            self.store.end_flight(resource);
        }
        self.launch(&mut flights, resource);
    }

    /// Cancels every outstanding cycle. Used at dashboard unmount; teardown
    /// is total.
    pub async fn cancel_all(&self) {
        self.root.cancel();
        let mut flights = self.flights.lock().await;
        for resource in flights.keys() {
            self.store.end_flight(*resource);
        }
        flights.clear();
    }

    fn launch(self: &Arc<Self>, flights: &mut HashMap<Resource, Flight>, resource: Resource) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        flights.insert(
            resource,
            Flight {
                token: token.clone(),
                generation,
            },
        );
        self.store.begin_flight(resource);

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let result = this.run_cycle(resource, &token).await;

            let mut flights = this.flights.lock().await;
            let current = flights
                .get(&resource)
                .is_some_and(|f| f.generation == generation);
            if !current {
                // Superseded or torn down; the canceller already freed the
                // slot and this result must not reach the store.
                return;
            }
            flights.remove(&resource);
            this.store.end_flight(resource);
            if let Some(result) = result {
                this.store.apply_result(resource, result);
            }
        });
    }

    /// One full attempt-and-retry cycle. Returns None when cancelled.
    async fn run_cycle(
        &self,
        resource: Resource,
        token: &CancellationToken,
    ) -> Option<FetchResult> {
        let mut retry = 0u32;
        loop {
            if token.is_cancelled() {
                return None;
            }
            let attempt = tokio::select! {
                _ = token.cancelled() => return None,
                outcome = tokio::time::timeout(self.request_timeout, self.gateway.fetch(resource)) => outcome,
            };

            let error = match attempt {
                Ok(Ok(payload)) => return Some(FetchResult::success(payload)),
                Ok(Err(error)) => error,
                Err(_) => FetchError::Network(format!(
                    "request timed out after {}ms",
                    self.request_timeout.as_millis()
                )),
            };

            if retry >= self.policy.max_retries {
                tracing::warn!(
                    %resource,
                    attempts = retry + 1,
                    error = %error,
                    "fetch failed, recording failure"
                );
                return Some(FetchResult::failure(error));
            }
            retry += 1;
            let delay = self.policy.delay(retry);
            tracing::debug!(%resource, retry, delay_ms = delay.as_millis() as u64, error = %error, "retrying fetch");
            tokio::select! {
                _ = token.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payload::{DashboardStats, ResourcePayload};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    /// Gateway driven by a closure over the 1-based call number.
    struct ScriptedGateway<F>
    where
        F: Fn(u32) -> Script + Send + Sync,
    {
        calls: AtomicU32,
        script: F,
    }

    enum Script {
        Ok(ResourcePayload),
        Err(FetchError),
        Hang,
    }

    impl<F> ScriptedGateway<F>
    where
        F: Fn(u32) -> Script + Send + Sync,
    {
        fn new(script: F) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                script,
            })
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<F> DashboardGateway for ScriptedGateway<F>
    where
        F: Fn(u32) -> Script + Send + Sync,
    {
        async fn fetch(&self, _resource: Resource) -> Result<ResourcePayload, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match (self.script)(call) {
                Script::Ok(payload) => Ok(payload),
                Script::Err(error) => Err(error),
                Script::Hang => futures::future::pending().await,
            }
        }
    }

    fn stats(total_logs: u64) -> ResourcePayload {
        ResourcePayload::Stats(DashboardStats {
            total_logs,
            ..Default::default()
        })
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            backoff_base: Duration::from_millis(5),
            jitter: 0.0,
        }
    }

    async fn wait_settled(store: &ViewModelStore, resource: Resource) {
        for _ in 0..200 {
            if !store.is_in_flight(resource) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("fetch for {resource} never settled");
    }

    #[tokio::test]
    async fn success_is_applied_to_the_store() {
        let gateway = ScriptedGateway::new(|_| Script::Ok(stats(9)));
        let store = Arc::new(ViewModelStore::new(5));
        let executor = FetchExecutor::new(
            gateway.clone(),
            store.clone(),
            Duration::from_secs(1),
            fast_policy(),
        );

        executor.try_fetch(Resource::Stats).await;
        wait_settled(&store, Resource::Stats).await;

        let view = store.snapshot();
        assert_eq!(
            view.get(Resource::Stats).last_success.as_ref().unwrap().payload,
            stats(9)
        );
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_record_a_single_failure() {
        let gateway =
            ScriptedGateway::new(|_| Script::Err(FetchError::Network("refused".into())));
        let store = Arc::new(ViewModelStore::new(5));
        let executor = FetchExecutor::new(
            gateway.clone(),
            store.clone(),
            Duration::from_secs(1),
            fast_policy(),
        );

        executor.try_fetch(Resource::Incidents).await;
        wait_settled(&store, Resource::Incidents).await;

        // 1 initial attempt + 2 retries, but one terminal failure.
        assert_eq!(gateway.call_count(), 3);
        let view = store.snapshot();
        assert_eq!(view.get(Resource::Incidents).consecutive_failures, 1);
    }

    #[tokio::test]
    async fn retry_recovers_mid_cycle_without_recording_failure() {
        let gateway = ScriptedGateway::new(|call| {
            if call < 3 {
                Script::Err(FetchError::HttpStatus(502))
            } else {
                Script::Ok(stats(4))
            }
        });
        let store = Arc::new(ViewModelStore::new(5));
        let executor = FetchExecutor::new(
            gateway.clone(),
            store.clone(),
            Duration::from_secs(1),
            fast_policy(),
        );

        executor.try_fetch(Resource::Stats).await;
        wait_settled(&store, Resource::Stats).await;

        let view = store.snapshot();
        assert_eq!(view.get(Resource::Stats).consecutive_failures, 0);
        assert!(view.get(Resource::Stats).last_success.is_some());
    }

    #[tokio::test]
    async fn timeout_counts_as_network_failure() {
        let gateway = ScriptedGateway::new(|_| Script::Hang);
        let store = Arc::new(ViewModelStore::new(5));
        let executor = FetchExecutor::new(
            gateway.clone(),
            store.clone(),
            Duration::from_millis(20),
            RetryPolicy {
                max_retries: 0,
                backoff_base: Duration::from_millis(1),
                jitter: 0.0,
            },
        );

        executor.try_fetch(Resource::Logs).await;
        wait_settled(&store, Resource::Logs).await;

        let view = store.snapshot();
        assert_eq!(view.get(Resource::Logs).consecutive_failures, 1);
        assert!(matches!(
            view.get(Resource::Logs).last_error,
            Some(FetchError::Network(_))
        ));
    }

    #[tokio::test]
    async fn overlapping_trigger_is_dropped_not_queued() {
        let gateway = ScriptedGateway::new(|call| {
            if call == 1 {
                Script::Hang
            } else {
                Script::Ok(stats(1))
            }
        });
        let store = Arc::new(ViewModelStore::new(5));
        let executor = FetchExecutor::new(
            gateway.clone(),
            store.clone(),
            Duration::from_secs(30),
            fast_policy(),
        );

        executor.try_fetch(Resource::Alerts).await;
        executor.try_fetch(Resource::Alerts).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(gateway.call_count(), 1);
        assert!(store.is_in_flight(Resource::Alerts));
        executor.cancel_all().await;
    }

    #[tokio::test]
    async fn force_fetch_supersedes_and_discards_the_old_cycle() {
        let gateway = ScriptedGateway::new(|call| {
            if call == 1 {
                Script::Hang
            } else {
                Script::Ok(stats(2))
            }
        });
        let store = Arc::new(ViewModelStore::new(5));
        let executor = FetchExecutor::new(
            gateway.clone(),
            store.clone(),
            Duration::from_secs(30),
            fast_policy(),
        );

        executor.try_fetch(Resource::Alerts).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        executor.force_fetch(Resource::Alerts).await;
        wait_settled(&store, Resource::Alerts).await;

        assert_eq!(gateway.call_count(), 2);
        let view = store.snapshot();
        assert_eq!(
            view.get(Resource::Alerts).last_success.as_ref().unwrap().payload,
            stats(2)
        );
        assert_eq!(view.get(Resource::Alerts).consecutive_failures, 0);
    }

    #[tokio::test]
    async fn cancel_all_frees_every_flight() {
        let gateway = ScriptedGateway::new(|_| Script::Hang);
        let store = Arc::new(ViewModelStore::new(5));
        let executor = FetchExecutor::new(
            gateway.clone(),
            store.clone(),
            Duration::from_secs(30),
            fast_policy(),
        );

        executor.try_fetch(Resource::Stats).await;
        executor.try_fetch(Resource::Logs).await;
        executor.cancel_all().await;

        assert!(!store.is_in_flight(Resource::Stats));
        assert!(!store.is_in_flight(Resource::Logs));
        // Nothing reached the store.
        let view = store.snapshot();
        assert!(view.get(Resource::Stats).last_success.is_none());
        assert_eq!(view.get(Resource::Stats).consecutive_failures, 0);
    }
}
