//! # Progress Mode
//!
//! Which backend displays a build.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ProgressError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Interactive when stdout is a terminal, plain otherwise.
    #[default]
    Auto,
    /// Full-screen tree and log view.
    Tty,
    /// `#N`-prefixed lines.
    Plain,
    /// Newline-delimited JSON batches.
    Json,
}

impl ProgressMode {
    /// Replace `Auto` with a concrete mode.
    pub fn resolve(self, stdout_is_terminal: bool) -> Self {
        match self {
            ProgressMode::Auto if stdout_is_terminal => ProgressMode::Tty,
            ProgressMode::Auto => ProgressMode::Plain,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressMode::Auto => "auto",
            ProgressMode::Tty => "tty",
            ProgressMode::Plain => "plain",
            ProgressMode::Json => "json",
        }
    }
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressMode {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(ProgressMode::Auto),
            "tty" => Ok(ProgressMode::Tty),
            "plain" => Ok(ProgressMode::Plain),
            "json" | "rawjson" => Ok(ProgressMode::Json),
            _ => Err(ProgressError::InvalidMode(s.to_string())),
        }
    }
}
