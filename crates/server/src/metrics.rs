//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the deployment server:
//! - HTTP request metrics (latency, counts, errors)
//! - Orchestrator state (collected on scrape)
//! - Core deployment metrics re-registered from `gamekit_deploy_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

use gamekit_deploy_core::FeatureType;

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
            "gamekit_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0, 300.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("gamekit_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "gamekit_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamekit_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Features with a deployment currently running.
pub static FEATURES_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "gamekit_features_in_progress",
        "Number of features with a deployment in progress",
    )
    .unwrap()
});

/// Whether the current account credentials are usable (1) or not (0).
pub static CREDENTIALS_VALID: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "gamekit_credentials_valid",
        "Whether the current account credentials are valid (1) or not (0)",
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
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Orchestrator
    registry
        .register(Box::new(FEATURES_IN_PROGRESS.clone()))
        .unwrap();
    registry
        .register(Box::new(CREDENTIALS_VALID.clone()))
        .unwrap();

    // Core metrics (actions, refreshes, gates)
    for metric in gamekit_deploy_core::metrics::all_metrics() {
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
/// Called before encoding so the gauges reflect the orchestrator right now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status();
    FEATURES_IN_PROGRESS.set(status.in_progress.len() as i64);
    CREDENTIALS_VALID.set(if status.credentials_valid { 1 } else { 0 });
}

static FEATURE_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<&str> = FeatureType::ALL.iter().map(|f| f.as_str()).collect();
    Regex::new(&format!(r"/({})(/|$)", names.join("|"))).unwrap()
});

/// Normalize a path for metric labels (replace feature keys with a placeholder).
pub fn normalize_path(path: &str) -> String {
    FEATURE_SEGMENT
        .replace_all(path, "/{feature}$2")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_feature() {
        let path = "/api/v1/features/identity";
        assert_eq!(normalize_path(path), "/api/v1/features/{feature}");
    }

    #[test]
    fn test_normalize_path_feature_middle() {
        let path = "/api/v1/features/gamesaving/can-create";
        assert_eq!(normalize_path(path), "/api/v1/features/{feature}/can-create");
    }

    #[test]
    fn test_normalize_path_keeps_refresh() {
        let path = "/api/v1/features/refresh";
        assert_eq!(normalize_path(path), "/api/v1/features/refresh");
    }

    #[test]
    fn test_normalize_path_no_features() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("gamekit_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        FEATURES_IN_PROGRESS.set(0);
        CREDENTIALS_VALID.set(0);
        gamekit_deploy_core::metrics::DEPLOYMENT_ACTIONS
            .with_label_values(&["create", "success"])
            .inc_by(0);

        let output = encode_metrics();

        assert!(output.contains("gamekit_http_request_duration_seconds"));
        assert!(output.contains("gamekit_http_requests_in_flight"));
        assert!(output.contains("gamekit_features_in_progress"));
        assert!(output.contains("gamekit_credentials_valid"));
        assert!(output.contains("gamekit_deployment_actions_total"));
    }
}
