// Main entry point - Headless console monitor over the sync core
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use dashboard_sync::application::sync::DashboardSync;
use dashboard_sync::domain::payload::ResourcePayload;
use dashboard_sync::domain::resource::Tab;
use dashboard_sync::infrastructure::config::load_config;
use dashboard_sync::infrastructure::http_gateway::HttpDashboardGateway;
use dashboard_sync::StoreSnapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config().context("failed to load sync configuration")?;
    let tab = match std::env::args().nth(1).as_deref() {
        Some("alerts") => Tab::Alerts,
        Some("logs") => Tab::Logs,
        _ => Tab::Overview,
    };
    tracing::info!(base_url = %config.base_url, view = %tab, "starting dashboard sync");

    let gateway = Arc::new(HttpDashboardGateway::new(&config.base_url));
    let sync = DashboardSync::new(gateway, &config);
    sync.start().await;
    sync.select_tab(tab).await;

    let mut render = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = render.tick() => log_snapshot(&sync.snapshot()),
        }
    }

    sync.shutdown().await;
    Ok(())
}

fn log_snapshot(snapshot: &StoreSnapshot) {
    for view in snapshot.views() {
        let summary = view.last_success.as_ref().map(|record| {
            let data = match &record.payload {
                ResourcePayload::Stats(stats) => format!(
                    "logs={} alerts={} incidents={} critical_24h={}",
                    stats.total_logs,
                    stats.total_alerts,
                    stats.total_incidents,
                    stats.critical_last_24h
                ),
                ResourcePayload::Incidents(incidents) => format!("{} incidents", incidents.len()),
                ResourcePayload::Alerts(alerts) => format!("{} alerts", alerts.len()),
                ResourcePayload::Logs(logs) => format!("{} log entries", logs.len()),
            };
            (data, record.fetched_at)
        });

        match summary {
            Some((data, fetched_at)) => tracing::info!(
                resource = %view.resource,
                %data,
                %fetched_at,
                degraded = view.degraded,
                failures = view.consecutive_failures,
                "snapshot"
            ),
            None => tracing::info!(
                resource = %view.resource,
                degraded = view.degraded,
                failures = view.consecutive_failures,
                "snapshot (no data yet)"
            ),
        }
    }
}
