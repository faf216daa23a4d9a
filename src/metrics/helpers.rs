//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{IMAGES_SERVED_TOTAL, REMOTE_FETCH_TOTAL, RENDERS_TOTAL, RENDER_LATENCY};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording render metrics
pub struct RenderMetrics;

impl RenderMetrics {
    /// Record a finished render with its outcome label
    pub fn record(outcome: &str, seconds: f64) {
        RENDERS_TOTAL.with_label_values(&[outcome]).inc();
        RENDER_LATENCY.observe(seconds);
    }
}

/// Helper struct for recording template image metrics
pub struct ImageMetrics;

impl ImageMetrics {
    pub fn record_stored() {
        IMAGES_SERVED_TOTAL.with_label_values(&["stored"]).inc();
    }

    pub fn record_placeholder() {
        IMAGES_SERVED_TOTAL.with_label_values(&["placeholder"]).inc();
    }

    pub fn record_rejected() {
        IMAGES_SERVED_TOTAL.with_label_values(&["rejected"]).inc();
    }
}

/// Helper struct for recording remote fetch metrics
pub struct FetchMetrics;

impl FetchMetrics {
    pub fn record_success() {
        REMOTE_FETCH_TOTAL.with_label_values(&["ok"]).inc();
    }

    pub fn record_failure() {
        REMOTE_FETCH_TOTAL.with_label_values(&["error"]).inc();
    }
}
