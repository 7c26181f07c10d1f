//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (count by kind/format/result, duration)
//! - Encoder process invocations

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by media kind, target format and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediaconv_conversions_total", "Total conversion requests"),
        &["kind", "format", "result"], // result: "success" or an error code
    )
    .unwrap()
});

/// Duration of successful conversions in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediaconv_conversion_duration_seconds",
            "Duration of successful conversions",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Encoder Metrics
// =============================================================================

/// Encoder process runs by result.
pub static ENCODER_INVOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediaconv_encoder_invocations_total",
            "Total encoder process invocations",
        ),
        &["result"], // "success", "failed", "timeout", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(ENCODER_INVOCATIONS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        CONVERSIONS_TOTAL
            .with_label_values(&["image", "png", "success"])
            .inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"mediaconv_conversions_total".to_string()));
    }
}
