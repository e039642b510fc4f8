use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

use crate::error::{AppError, Result};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics collector for the reporting service.
#[derive(Debug, Clone, Default)]
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_report_generated(&self, report: &str, duration_ms: f64, complete: bool) {
        counter!("report_generated_total", "report" => report.to_string(), "complete" => complete.to_string()).increment(1);
        histogram!("report_generation_duration_ms", "report" => report.to_string()).record(duration_ms);
    }

    pub fn record_query(&self, metric: &str, duration_ms: f64) {
        histogram!("report_query_duration_ms", "metric" => metric.to_string()).record(duration_ms);
    }

    pub fn record_query_failure(&self, metric: &str, reason: &str) {
        counter!("report_query_failures_total", "metric" => metric.to_string(), "reason" => reason.to_string()).increment(1);
    }

    pub fn set_health_score(&self, score: f64) {
        gauge!("business_health_score").set(score);
    }

    pub fn record_scoring_update(&self, kind: &str) {
        counter!("scoring_config_updates_total", "kind" => kind.to_string()).increment(1);
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_ms: f64) {
        counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
        histogram!("http_request_duration_ms", "method" => method.to_string(), "path" => path.to_string()).record(duration_ms);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the Prometheus recorder once and returns its handle.
pub fn init_metrics() -> Result<PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to install Prometheus recorder: {}", e)))?;
    describe_metrics();

    let handle = METRICS_HANDLE.get_or_init(|| handle).clone();
    METRICS.get_or_init(Metrics::new);

    Ok(handle)
}

fn describe_metrics() {
    describe_counter!("report_generated_total", Unit::Count, "Reports generated, by report and completeness");
    describe_histogram!("report_generation_duration_ms", Unit::Milliseconds, "End-to-end report generation latency");
    describe_histogram!("report_query_duration_ms", Unit::Milliseconds, "Latency of individual aggregate queries");
    describe_counter!("report_query_failures_total", Unit::Count, "Aggregate queries that failed or timed out");
    describe_gauge!("business_health_score", Unit::Count, "Most recently computed composite health score");
    describe_counter!("scoring_config_updates_total", Unit::Count, "Runtime edits of thresholds or weights");

    describe_counter!("http_requests_total", Unit::Count, "Total HTTP requests");
    describe_histogram!("http_request_duration_ms", Unit::Milliseconds, "HTTP request latency in milliseconds");
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}
