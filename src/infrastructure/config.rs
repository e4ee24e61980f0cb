// Sync configuration - file and environment sources
use std::time::Duration;

use serde::Deserialize;

use crate::domain::resource::Resource;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1/dashboard";

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Root of the dashboard API; endpoint suffixes are appended per resource.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub poll: PollIntervals,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Proportional jitter applied to each backoff delay (0.2 = ±20%).
    #[serde(default = "default_backoff_jitter")]
    pub backoff_jitter: f64,
    /// Consecutive failures beyond this flag the resource degraded.
    #[serde(default = "default_degraded_threshold")]
    pub degraded_threshold: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollIntervals {
    #[serde(default = "default_stats_ms")]
    pub stats_ms: u64,
    #[serde(default = "default_incidents_ms")]
    pub incidents_ms: u64,
    #[serde(default = "default_alerts_ms")]
    pub alerts_ms: u64,
    #[serde(default = "default_logs_ms")]
    pub logs_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    4000
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_jitter() -> f64 {
    0.2
}

fn default_degraded_threshold() -> u32 {
    5
}

fn default_stats_ms() -> u64 {
    Resource::Stats.default_poll_interval().as_millis() as u64
}

fn default_incidents_ms() -> u64 {
    Resource::Incidents.default_poll_interval().as_millis() as u64
}

fn default_alerts_ms() -> u64 {
    Resource::Alerts.default_poll_interval().as_millis() as u64
}

fn default_logs_ms() -> u64 {
    Resource::Logs.default_poll_interval().as_millis() as u64
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            stats_ms: default_stats_ms(),
            incidents_ms: default_incidents_ms(),
            alerts_ms: default_alerts_ms(),
            logs_ms: default_logs_ms(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll: PollIntervals::default(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_jitter: default_backoff_jitter(),
            degraded_threshold: default_degraded_threshold(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self, resource: Resource) -> Duration {
        let ms = match resource {
            Resource::Stats => self.poll.stats_ms,
            Resource::Incidents => self.poll.incidents_ms,
            Resource::Alerts => self.poll.alerts_ms,
            Resource::Logs => self.poll.logs_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

/// Loads configuration from an optional `config/dashboard.toml` plus
/// `DASHBOARD_*` environment variables (`DASHBOARD_POLL__STATS_MS` for
/// nested keys). `API_BASE_URL` overrides the endpoint root last.
pub fn load_config() -> anyhow::Result<SyncConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut sync_config: SyncConfig = settings.try_deserialize()?;
    if let Ok(base_url) = std::env::var("API_BASE_URL") {
        sync_config.base_url = base_url;
    }
    Ok(sync_config)
}
