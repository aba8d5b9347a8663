//! Subcommand implementations.

mod instances;
mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use progress_telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};

pub use instances::{create, ls, rm, CreateArgs, RmArgs};
pub use watch::{watch, WatchArgs};

const CONFIG_DIR_NAME: &str = ".buildctl";

/// `$HOME/.buildctl`, or `./.buildctl` without a home directory.
pub fn default_config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

fn init(config: TelemetryConfig) -> Result<TelemetryGuard> {
    init_telemetry(&config).context("Failed to initialize telemetry")
}
