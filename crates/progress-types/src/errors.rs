//! # Error Types
//!
//! Errors raised while constructing event-model values from text.

use thiserror::Error;

/// Errors produced when parsing a vertex digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The algorithm prefix is not `sha256`.
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The encoded part is not valid hex.
    #[error("Invalid digest encoding: {0}")]
    InvalidEncoding(String),

    /// The decoded digest has the wrong size.
    #[error("Invalid digest length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}
