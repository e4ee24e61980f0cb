// Fetch outcome types shared by the executor and the store
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::payload::ResourcePayload;

/// Why a fetch attempt failed. None of these are fatal to the process;
/// they only feed the per-resource failure counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, or request timeout.
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with a non-2xx status.
    #[error("http status {0}")]
    HttpStatus(u16),
    /// The body arrived but could not be deserialized.
    #[error("malformed response body: {0}")]
    Parse(String),
}

/// Terminal outcome of one fetch cycle. Tagged union: never both.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success {
        payload: ResourcePayload,
        /// Resolution timestamp; ordering between results for the same
        /// resource is decided by this, not by when the request started.
        fetched_at: DateTime<Utc>,
    },
    Failure {
        error: FetchError,
        failed_at: DateTime<Utc>,
    },
}

impl FetchResult {
    pub fn success(payload: ResourcePayload) -> Self {
        FetchResult::Success {
            payload,
            fetched_at: Utc::now(),
        }
    }

    pub fn failure(error: FetchError) -> Self {
        FetchResult::Failure {
            error,
            failed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }
}
