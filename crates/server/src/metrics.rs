//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Mirage server:
//! - HTTP request metrics (latency, counts)
//! - Loop and library status (collected dynamically)
//!
//! Core metrics (generation, autopilot, acquisition) are registered here too.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mirage_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirage_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mirage_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Status Metrics (collected dynamically)
// =============================================================================

/// Autopilot running state (1 = running, 0 = idle).
pub static AUTOPILOT_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mirage_autopilot_running",
        "Whether an autopilot run is in progress (1) or not (0)",
    )
    .unwrap()
});

/// Acquisition running state (1 = running, 0 = idle).
pub static ACQUISITION_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mirage_acquisition_running",
        "Whether a bulk acquisition run is in progress (1) or not (0)",
    )
    .unwrap()
});

/// Next catalog page the acquisition queue will search.
pub static ACQUISITION_CURSOR: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mirage_acquisition_cursor",
        "Persisted acquisition page cursor",
    )
    .unwrap()
});

/// Library assets by source.
pub static LIBRARY_ASSETS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("mirage_library_assets", "Current asset count by source"),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Status
    registry
        .register(Box::new(AUTOPILOT_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(ACQUISITION_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(ACQUISITION_CURSOR.clone()))
        .unwrap();
    registry
        .register(Box::new(LIBRARY_ASSETS.clone()))
        .unwrap();

    // Core metrics (generation, autopilot, acquisition, library)
    for metric in mirage_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the loops and the library as
/// they are now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let autopilot_running = state.autopilot().map(|a| a.is_running()).unwrap_or(false);
    AUTOPILOT_RUNNING.set(autopilot_running as i64);

    if let Some(queue) = state.acquisition() {
        ACQUISITION_RUNNING.set(queue.is_running() as i64);
        if let Ok(status) = queue.status().await {
            ACQUISITION_CURSOR.set(status.state.current_page as i64);
        }
    }

    if let Ok(stats) = state.library().stats() {
        for source in ["generated", "stock"] {
            let count = stats.by_source.get(source).copied().unwrap_or(0);
            LIBRARY_ASSETS.with_label_values(&[source]).set(count as i64);
        }
    }
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
///
/// Topic names in `/topics/{name}` are user supplied and collapse to one
/// label as well.
pub fn normalize_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/api/v1/topics/") {
        if !rest.is_empty() {
            return "/api/v1/topics/{name}".to_string();
        }
    }
    let result = UUID_RE.replace_all(path, "{id}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/library/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/library/{id}");
    }

    #[test]
    fn test_normalize_path_topic_name() {
        assert_eq!(
            normalize_path("/api/v1/topics/Dubai%20Creek"),
            "/api/v1/topics/{name}"
        );
        assert_eq!(normalize_path("/api/v1/topics"), "/api/v1/topics");
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/library/12345"), "/api/v1/library/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("mirage_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        AUTOPILOT_RUNNING.set(0);
        LIBRARY_ASSETS.with_label_values(&["stock"]).set(0);
        mirage_core::metrics::STOCK_DOWNLOADS.inc();
        mirage_core::metrics::AUTOPILOT_ROUNDS
            .with_label_values(&["empty"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("mirage_autopilot_running"));
        assert!(output.contains("mirage_library_assets"));
        assert!(output.contains("mirage_stock_downloads_total"));
        assert!(output.contains("mirage_autopilot_rounds_total"));
    }
}
