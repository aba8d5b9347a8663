//! # Error Types
//!
//! Session-level failures. None of these ever reach `write`; they are
//! reported once, by `wait`.

use thiserror::Error;

/// Errors that end a progress session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    /// The terminal could not be set up or restored.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A draw pass failed.
    #[error("Render failed: {0}")]
    Render(String),

    /// Writing plain or JSON output failed.
    #[error("Output error: {0}")]
    Output(String),

    /// The display task panicked.
    #[error("Display loop panicked: {0}")]
    LoopPanicked(String),

    /// The display task was cancelled before it finished.
    #[error("Display loop was cancelled")]
    LoopCancelled,

    /// `wait` was already called for this session.
    #[error("Progress session was already waited on")]
    AlreadyWaited,

    /// Unrecognized progress mode name.
    #[error("Invalid progress mode: {0} (expected auto, tty, plain or json)")]
    InvalidMode(String),
}
