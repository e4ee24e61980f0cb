// View-model store - single source of truth the renderer reads
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::domain::fetch::{FetchError, FetchResult};
use crate::domain::payload::ResourcePayload;
use crate::domain::resource::Resource;

/// Last successfully fetched payload for a resource, with the resolution
/// timestamp that decides staleness.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessRecord {
    pub payload: ResourcePayload,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct ResourceEntry {
    last_success: Option<SuccessRecord>,
    last_result: Option<FetchResult>,
    consecutive_failures: u32,
    in_flight: bool,
}

/// Holds the latest known state for all four resources.
///
/// Created once at dashboard mount, seeded empty. The keys are fixed at the
/// four resource kinds, so entries live in an array indexed by
/// `Resource::index` and are never added or removed at runtime.
pub struct ViewModelStore {
    entries: RwLock<[ResourceEntry; 4]>,
    degraded_threshold: u32,
}

impl ViewModelStore {
    pub fn new(degraded_threshold: u32) -> Self {
        Self {
            entries: RwLock::new(Default::default()),
            degraded_threshold,
        }
    }

    /// Reconcile one terminal fetch result.
    ///
    /// A success that resolved before the currently stored one is stale and
    /// dropped entirely (logged at debug). A failure increments the failure
    /// counter but keeps `last_success` so the renderer can show
    /// last-known-good data.
    pub fn apply_result(&self, resource: Resource, result: FetchResult) {
        let mut entries = self.entries.write().expect("store lock poisoned");
        let entry = &mut entries[resource.index()];

        match &result {
            FetchResult::Success {
                payload,
                fetched_at,
            } => {
                if let Some(prev) = &entry.last_success {
                    if *fetched_at < prev.fetched_at {
                        tracing::debug!(
                            %resource,
                            stale = %fetched_at,
                            current = %prev.fetched_at,
                            "dropping stale success"
                        );
                        return;
                    }
                }
                if entry.consecutive_failures > self.degraded_threshold {
                    tracing::info!(%resource, "resource recovered");
                }
                entry.last_success = Some(SuccessRecord {
                    payload: payload.clone(),
                    fetched_at: *fetched_at,
                });
                entry.consecutive_failures = 0;
            }
            FetchResult::Failure { error, .. } => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures == self.degraded_threshold + 1 {
                    tracing::warn!(
                        %resource,
                        failures = entry.consecutive_failures,
                        error = %error,
                        "resource degraded, continuing to poll"
                    );
                }
            }
        }
        entry.last_result = Some(result);
    }

    /// Flags the single-flight slot for a resource. Returns false if a fetch
    /// is already outstanding, in which case the caller must not start one.
    pub fn begin_flight(&self, resource: Resource) -> bool {
        let mut entries = self.entries.write().expect("store lock poisoned");
        let entry = &mut entries[resource.index()];
        if entry.in_flight {
            return false;
        }
        entry.in_flight = true;
        true
    }

    /// Frees the single-flight slot at terminal resolution (success,
    /// failure, or cancellation).
    pub fn end_flight(&self, resource: Resource) {
        let mut entries = self.entries.write().expect("store lock poisoned");
        entries[resource.index()].in_flight = false;
    }

    pub fn is_in_flight(&self, resource: Resource) -> bool {
        let entries = self.entries.read().expect("store lock poisoned");
        entries[resource.index()].in_flight
    }

    /// Owned, immutable copy of the current state for rendering.
    pub fn snapshot(&self) -> StoreSnapshot {
        let entries = self.entries.read().expect("store lock poisoned");
        let views = Resource::ALL.map(|resource| {
            let entry = &entries[resource.index()];
            ResourceView {
                resource,
                last_success: entry.last_success.clone(),
                last_error: match &entry.last_result {
                    Some(FetchResult::Failure { error, .. }) => Some(error.clone()),
                    _ => None,
                },
                consecutive_failures: entry.consecutive_failures,
                degraded: entry.consecutive_failures > self.degraded_threshold,
                in_flight: entry.in_flight,
            }
        });
        StoreSnapshot { views }
    }
}

/// Point-in-time copy of the store; safe to hand to the renderer.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    views: [ResourceView; 4],
}

impl StoreSnapshot {
    pub fn get(&self, resource: Resource) -> &ResourceView {
        &self.views[resource.index()]
    }

    pub fn views(&self) -> impl Iterator<Item = &ResourceView> {
        self.views.iter()
    }
}

#[derive(Debug, Clone)]
pub struct ResourceView {
    pub resource: Resource,
    pub last_success: Option<SuccessRecord>,
    /// Error of the most recent result, if that result was a failure.
    pub last_error: Option<FetchError>,
    pub consecutive_failures: u32,
    /// The failure threshold has been crossed; the poller keeps running and
    /// a single success clears this.
    pub degraded: bool,
    pub in_flight: bool,
}
