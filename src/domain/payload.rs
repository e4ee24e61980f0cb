// Response payload domain models
//
// All shapes come from an external backend and are treated as untrusted:
// missing fields default, unknown severities are tolerated. Only a body
// that fails JSON deserialization outright becomes a fetch failure.
use serde::Deserialize;

use crate::domain::resource::Resource;

/// Aggregate counters shown on the overview cards.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_logs: u64,
    #[serde(default)]
    pub total_alerts: u64,
    #[serde(default)]
    pub total_incidents: u64,
    #[serde(default)]
    pub critical_last_24h: u64,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub avg_response_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Incident {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub incident: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub rule_name: String,
    #[serde(default)]
    pub source_ip: String,
    #[serde(default)]
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseAction {
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub ml_anomaly: bool,
    #[serde(default)]
    pub anomaly_explanation: Option<String>,
    #[serde(default)]
    pub response_action: Option<ResponseAction>,
}

/// Parsed body of one resource fetch, so a single store can hold all four.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePayload {
    Stats(DashboardStats),
    Incidents(Vec<Incident>),
    Alerts(Vec<Alert>),
    Logs(Vec<LogEntry>),
}

impl ResourcePayload {
    pub fn resource(&self) -> Resource {
        match self {
            ResourcePayload::Stats(_) => Resource::Stats,
            ResourcePayload::Incidents(_) => Resource::Incidents,
            ResourcePayload::Alerts(_) => Resource::Alerts,
            ResourcePayload::Logs(_) => Resource::Logs,
        }
    }
}
