// HTTP gateway implementation against the dashboard backend
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::application::gateway::DashboardGateway;
use crate::domain::fetch::FetchError;
use crate::domain::payload::{Alert, DashboardStats, Incident, LogEntry, ResourcePayload};
use crate::domain::resource::Resource;

/// Fetches one resource per GET from the configured base path.
///
/// Timeouts are enforced by the executor around the whole call, so the
/// client itself carries none.
#[derive(Debug, Clone)]
pub struct HttpDashboardGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDashboardGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, resource: Resource) -> String {
        format!("{}{}", self.base_url, resource.endpoint_suffix())
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: Resource) -> Result<T, FetchError> {
        let response = self
            .client
            .get(self.url(resource))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Parse(e.to_string())
            } else {
                FetchError::Network(e.to_string())
            }
        })
    }
}

#[async_trait]
impl DashboardGateway for HttpDashboardGateway {
    async fn fetch(&self, resource: Resource) -> Result<ResourcePayload, FetchError> {
        match resource {
            Resource::Stats => {
                let stats: DashboardStats = self.get_json(resource).await?;
                Ok(ResourcePayload::Stats(stats))
            }
            Resource::Incidents => {
                let incidents: Vec<Incident> = self.get_json(resource).await?;
                Ok(ResourcePayload::Incidents(incidents))
            }
            Resource::Alerts => {
                let alerts: Vec<Alert> = self.get_json(resource).await?;
                Ok(ResourcePayload::Alerts(alerts))
            }
            Resource::Logs => {
                let logs: Vec<LogEntry> = self.get_json(resource).await?;
                Ok(ResourcePayload::Logs(logs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payload::Severity;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway_for(server: &MockServer) -> HttpDashboardGateway {
        HttpDashboardGateway::new(&server.uri())
    }

    #[tokio::test]
    async fn fetches_and_parses_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_logs": 120_000,
                "total_alerts": 75,
                "total_incidents": 3,
                "critical_last_24h": 1,
                "eps": 45.2
            })))
            .mount(&server)
            .await;

        let payload = gateway_for(&server)
            .await
            .fetch(Resource::Stats)
            .await
            .unwrap();
        match payload {
            ResourcePayload::Stats(stats) => {
                assert_eq!(stats.total_logs, 120_000);
                assert_eq!(stats.critical_last_24h, 1);
                assert_eq!(stats.eps, Some(45.2));
                assert_eq!(stats.avg_response_ms, None);
            }
            other => panic!("expected stats payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetches_and_parses_alerts_with_severity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"timestamp": "2024-05-01T10:00:00Z", "rule_name": "port scan",
                 "source_ip": "203.0.113.7", "severity": "HIGH"},
                {"timestamp": "2024-05-01T10:01:00Z", "rule_name": "impossible travel",
                 "source_ip": "198.51.100.3", "severity": "CRITICAL"}
            ])))
            .mount(&server)
            .await;

        let payload = gateway_for(&server)
            .await
            .fetch(Resource::Alerts)
            .await
            .unwrap();
        match payload {
            ResourcePayload::Alerts(alerts) => {
                assert_eq!(alerts.len(), 2);
                assert_eq!(alerts[0].severity, Severity::High);
                assert_eq!(alerts[1].severity, Severity::Critical);
            }
            other => panic!("expected alerts payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_2xx_status_maps_to_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/incidents"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .await
            .fetch(Resource::Incidents)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(503));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("not json {", "application/json"),
            )
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .await
            .fetch(Resource::Logs)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        // Port 9 (discard) is practically never listening locally.
        let gateway = HttpDashboardGateway::new("http://127.0.0.1:9");
        let err = gateway.fetch(Resource::Stats).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
