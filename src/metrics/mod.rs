//! Prometheus metrics for the renderer.
//!
//! - Render metrics (outcome, latency)
//! - Template image metrics (served from store, placeholder, rejected)
//! - Remote content fetch metrics

mod helpers;

pub use helpers::{encode_metrics, FetchMetrics, ImageMetrics, RenderMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Histogram, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "campaign_view";

lazy_static! {
    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Renders by outcome
    pub static ref RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_renders_total", METRIC_PREFIX),
        "Total content renders by outcome",
        &["outcome"]
    ).unwrap();

    /// Time to assemble and finalize a document
    pub static ref RENDER_LATENCY: Histogram = register_histogram!(
        format!("{}_render_latency_seconds", METRIC_PREFIX),
        "Content render latency in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]
    ).unwrap();

    // ============================================================================
    // Image Metrics
    // ============================================================================

    /// Template image requests by how they were answered
    pub static ref IMAGES_SERVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_images_served_total", METRIC_PREFIX),
        "Template image requests by source",
        &["source"]
    ).unwrap();

    // ============================================================================
    // Remote Fetch Metrics
    // ============================================================================

    /// Remote content fetches by outcome
    pub static ref REMOTE_FETCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_remote_fetch_total", METRIC_PREFIX),
        "Remote content fetches by outcome",
        &["outcome"]
    ).unwrap();
}
