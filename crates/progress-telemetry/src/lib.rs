//! # Progress Telemetry
//!
//! Logging and metrics for build-progress sessions.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an env filter and a plain or JSON
//!   `fmt` layer. When an interactive display owns the terminal, logs go to a
//!   file or nowhere.
//! - **Metrics**: Prometheus counters for batches, vertices, redraws and
//!   instance teardown.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use progress_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env().for_interactive();
//! let _guard = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BP_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `BP_JSON_LOGS` | `false` | Emit JSON lines |
//! | `BP_LOG_FILE` | unset | Append logs to this file |
//! | `BP_CONSOLE_OUTPUT` | `true` | Log to stderr when no file is set |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LogTarget};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, BATCHES_WRITTEN,
    INSTANCES_REMOVED, INSTANCE_REMOVAL_FAILURES, LOG_BYTES_APPENDED, REDRAWS,
    REDRAWS_COALESCED, REDRAW_DURATION, VERTICES_CREATED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to open log file {path}: {reason}")]
    LogFile { path: String, reason: String },

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let target = init_logging(config)?;

    tracing::debug!(
        service = %config.service_name,
        target = ?target,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _metrics: metrics,
        target,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
    target: LogTarget,
}

impl TelemetryGuard {
    /// Where log output is going.
    pub fn target(&self) -> &LogTarget {
        &self.target
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Shutting down telemetry");
    }
}
