//! Progress display configuration from environment variables.

use std::env;

/// Column width labels are truncated to.
pub const DEFAULT_DISPLAY_WIDTH: usize = 160;

/// Marker put in front of the label of a cached vertex.
pub const CACHED_PREFIX: &str = "CACHED ";

/// Detail-pane text for a vertex without logs.
pub const LOG_PLACEHOLDER: &str = "No logs yet";

/// Configuration shared by every progress backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Maximum label width in characters, excluding the cached prefix.
    pub display_width: usize,

    /// Prefix for cached vertices.
    pub cached_prefix: String,

    /// Placeholder for empty or unknown log panes.
    pub log_placeholder: String,

    /// Keep the interactive display open after the build finishes, until
    /// the operator quits.
    pub hold_on_finish: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            display_width: DEFAULT_DISPLAY_WIDTH,
            cached_prefix: CACHED_PREFIX.to_string(),
            log_placeholder: LOG_PLACEHOLDER.to_string(),
            hold_on_finish: false,
        }
    }
}

impl ProgressConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BP_DISPLAY_WIDTH`: label width (default: 160, `0` is ignored)
    /// - `BP_HOLD_ON_FINISH`: keep the TUI open after completion (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            display_width: env::var("BP_DISPLAY_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|w: &usize| *w > 0)
                .unwrap_or(defaults.display_width),

            hold_on_finish: env::var("BP_HOLD_ON_FINISH")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.hold_on_finish),

            ..defaults
        }
    }

    /// Override the display width.
    #[must_use]
    pub fn with_display_width(mut self, width: usize) -> Self {
        self.display_width = width;
        self
    }

    /// Override the hold-on-finish behaviour.
    #[must_use]
    pub fn with_hold_on_finish(mut self, hold: bool) -> Self {
        self.hold_on_finish = hold;
        self
    }
}
