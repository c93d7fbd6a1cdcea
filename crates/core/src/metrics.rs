//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Deployment actions (outcomes, durations)
//! - Status refreshes
//! - Gate refusals

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Orchestrator - Action Metrics
// =============================================================================

/// Deployment actions total by action and result.
pub static DEPLOYMENT_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamekit_deployment_actions_total",
            "Total deployment actions",
        ),
        &["action", "result"], // "success", "blocked", "failed"
    )
    .unwrap()
});

/// Deployment action duration in seconds.
pub static DEPLOYMENT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "gamekit_deployment_duration_seconds",
            "Duration of deployment actions",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &["action"],
    )
    .unwrap()
});

// =============================================================================
// Orchestrator - Status Metrics
// =============================================================================

/// Feature status refreshes by result.
pub static FEATURE_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamekit_feature_refreshes_total",
            "Total feature status refreshes",
        ),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

/// Actions refused by a gate, by action and reason.
pub static GATE_BLOCKED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamekit_gate_blocked_total",
            "Deployment actions refused by a gate",
        ),
        &["action", "reason"],
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DEPLOYMENT_ACTIONS.clone()),
        Box::new(DEPLOYMENT_DURATION.clone()),
        Box::new(FEATURE_REFRESHES.clone()),
        Box::new(GATE_BLOCKED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        DEPLOYMENT_ACTIONS
            .with_label_values(&["create", "success"])
            .inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "gamekit_deployment_actions_total"));
    }
}
