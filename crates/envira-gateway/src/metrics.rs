//! Prometheus metrics for Envira Gateway
//!
//! Exposes metrics for monitoring ingestion, chat and AI provider health.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, register_histogram,
    register_histogram_vec, Counter, CounterVec, GaugeVec, Histogram, HistogramVec,
};

lazy_static! {
    // ============================================================================
    // Ingestion Metrics
    // ============================================================================

    /// Sensor readings accepted from devices
    pub static ref READINGS_STORED: Counter =
        register_counter!("envira_readings_stored_total", "Total sensor readings stored").unwrap();

    /// Rejected requests by endpoint
    pub static ref VALIDATION_FAILURES: CounterVec =
        register_counter_vec!(
            "envira_validation_failures_total",
            "Validation failures by endpoint",
            &["endpoint"]
        ).unwrap();

    // ============================================================================
    // Chat Metrics
    // ============================================================================

    /// Chat exchanges persisted
    pub static ref CHAT_EXCHANGES_STORED: Counter =
        register_counter!(
            "envira_chat_exchanges_stored_total",
            "Total chat exchanges stored"
        ).unwrap();

    /// Older exchanges dropped from prompt context
    pub static ref CONTEXT_EXCHANGES_OMITTED: Histogram = register_histogram!(
        "envira_context_exchanges_omitted",
        "Exchanges omitted from the prompt context window",
        vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0]
    ).unwrap();

    // ============================================================================
    // AI Provider Metrics
    // ============================================================================

    /// AI provider requests
    pub static ref AI_REQUESTS_TOTAL: CounterVec =
        register_counter_vec!(
            "envira_ai_requests_total",
            "Total AI provider requests",
            &["provider"]
        ).unwrap();

    /// AI provider errors
    pub static ref AI_ERRORS: CounterVec =
        register_counter_vec!(
            "envira_ai_errors_total",
            "AI provider errors",
            &["provider", "error_type"]
        ).unwrap();

    /// AI request latency
    pub static ref AI_LATENCY: HistogramVec = register_histogram_vec!(
        "envira_ai_latency_seconds",
        "AI request latency in seconds",
        &["provider"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Build info
    pub static ref BUILD_INFO: GaugeVec =
        register_gauge_vec!(
            "envira_build_info",
            "Build information",
            &["version", "commit"]
        ).unwrap();
}

/// Initialize metrics with build info
pub fn init_metrics() {
    BUILD_INFO
        .with_label_values(&[
            env!("CARGO_PKG_VERSION"),
            option_env!("GIT_COMMIT_SHA").unwrap_or("unknown"),
        ])
        .set(1.0);
}

/// Export metrics in Prometheus format
pub fn export() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_can_be_exported() {
        READINGS_STORED.inc();
        CHAT_EXCHANGES_STORED.inc();

        let exported = export();
        assert!(exported.contains("envira_readings_stored_total"));
        assert!(exported.contains("envira_chat_exchanges_stored_total"));
    }
}
