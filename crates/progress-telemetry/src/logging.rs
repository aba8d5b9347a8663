//! Structured logging setup.
//!
//! One `fmt` layer behind an `EnvFilter`. Output goes to a log file when one
//! is configured, to stderr when console output is enabled, and is dropped
//! otherwise so that an alternate-screen display is never written over.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::{TelemetryConfig, TelemetryError};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Where log output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
    Discard,
}

impl LogTarget {
    /// Pick the target for a configuration.
    pub fn resolve(config: &TelemetryConfig) -> Self {
        match (&config.log_file, config.console_output) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, true) => LogTarget::Stderr,
            (None, false) => LogTarget::Discard,
        }
    }
}

/// Install the global subscriber.
///
/// Fails if the filter does not parse, the log file cannot be opened, or a
/// subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<LogTarget, TelemetryError> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Config(e.to_string()))?;

    let target = LogTarget::resolve(config);
    let layer: Option<BoxedLayer> = match &target {
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            Some(fmt_layer(Mutex::new(file), config.json_logs, false))
        }
        LogTarget::Stderr => Some(fmt_layer(io::stderr, config.json_logs, true)),
        LogTarget::Discard => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    Ok(target)
}

fn open_log_file(path: &Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TelemetryError::LogFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn fmt_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(ansi)
            .boxed()
    }
}
