//! Prometheus metrics for build-progress sessions.
//!
//! All metrics follow the naming convention: `bp_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{exponential_buckets, Encoder, Histogram, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SESSION METRICS
    // =========================================================================

    /// Status batches handed to any writer
    pub static ref BATCHES_WRITTEN: IntCounter = IntCounter::new(
        "bp_session_batches_written_total",
        "Total status batches handed to a progress writer"
    ).expect("metric creation failed");

    /// Vertices seen for the first time
    pub static ref VERTICES_CREATED: IntCounter = IntCounter::new(
        "bp_session_vertices_created_total",
        "Total vertices added to a progress view"
    ).expect("metric creation failed");

    /// Log bytes appended to vertex buffers
    pub static ref LOG_BYTES_APPENDED: IntCounter = IntCounter::new(
        "bp_session_log_bytes_appended_total",
        "Total log bytes appended to vertex buffers"
    ).expect("metric creation failed");

    // =========================================================================
    // RENDER METRICS
    // =========================================================================

    /// Draw passes performed
    pub static ref REDRAWS: IntCounter = IntCounter::new(
        "bp_render_redraws_total",
        "Total draw passes performed by the interactive display"
    ).expect("metric creation failed");

    /// Batches folded into a later draw instead of drawing on their own
    pub static ref REDRAWS_COALESCED: IntCounter = IntCounter::new(
        "bp_render_redraws_coalesced_total",
        "Batches whose redraw was merged into a later draw pass"
    ).expect("metric creation failed");

    /// Draw pass duration
    pub static ref REDRAW_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "bp_render_redraw_duration_seconds",
            "Time spent in one draw pass"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).expect("bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // INSTANCE METRICS
    // =========================================================================

    /// Builder instances removed
    pub static ref INSTANCES_REMOVED: IntCounter = IntCounter::new(
        "bp_instances_removed_total",
        "Total builder instances removed"
    ).expect("metric creation failed");

    /// Builder instance removals that failed
    pub static ref INSTANCE_REMOVAL_FAILURES: IntCounter = IntCounter::new(
        "bp_instances_removal_failures_total",
        "Total builder instance removals that failed"
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Session
        Box::new(BATCHES_WRITTEN.clone()),
        Box::new(VERTICES_CREATED.clone()),
        Box::new(LOG_BYTES_APPENDED.clone()),
        // Render
        Box::new(REDRAWS.clone()),
        Box::new(REDRAWS_COALESCED.clone()),
        Box::new(REDRAW_DURATION.clone()),
        // Instances
        Box::new(INSTANCES_REMOVED.clone()),
        Box::new(INSTANCE_REMOVAL_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
