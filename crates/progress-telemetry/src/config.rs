//! Telemetry configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name recorded on startup
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error), env-filter syntax
    pub log_level: String,

    /// Whether to log to stderr when no log file is set
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "buildctl".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            log_file: None,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BP_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `BP_CONSOLE_OUTPUT`: Log to stderr (default: true)
    /// - `BP_JSON_LOGS`: JSON logs (default: false)
    /// - `BP_LOG_FILE`: Log file path (default: unset)
    pub fn from_env() -> Self {
        Self {
            service_name: "buildctl".to_string(),

            log_level: env::var("BP_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("BP_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("BP_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),

            log_file: env::var_os("BP_LOG_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Adjust for a session where an interactive display owns the terminal:
    /// stderr output is disabled, a configured log file is kept.
    #[must_use]
    pub fn for_interactive(mut self) -> Self {
        self.console_output = false;
        self
    }

    /// Override the log file.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "buildctl");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_for_interactive_keeps_file() {
        let config = TelemetryConfig::default()
            .with_log_file("/tmp/progress.log")
            .for_interactive();
        assert!(!config.console_output);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/progress.log")));
    }
}
