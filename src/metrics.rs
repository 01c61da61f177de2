use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Samples carried by successful publishes
pub const PUBLISH_SUCCESS: &str = "tsgen_publish_success_total";
/// Samples carried by failed publishes
pub const PUBLISH_FAILURE: &str = "tsgen_publish_failure_total";
pub const DROPPED_STATS: &str = "tsgen_dropped_stats_total";
pub const WORKERS_ACTIVE: &str = "tsgen_workers_active";

/// Install the Prometheus exporter on `0.0.0.0:port`. Must run inside the
/// tokio runtime.
pub fn init_metrics(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    metrics::describe_counter!(PUBLISH_SUCCESS, "Samples successfully published");
    metrics::describe_counter!(PUBLISH_FAILURE, "Samples whose publish failed");
    metrics::describe_counter!(DROPPED_STATS, "Worker stats records dropped on a full channel");
    metrics::describe_gauge!(WORKERS_ACTIVE, "Running workers");

    info!(
        "Metrics endpoint listening on http://0.0.0.0:{}/metrics",
        port
    );
    Ok(())
}
