//! # Writer Contract
//!
//! Implemented by every progress backend.

use std::any::Any;

use async_trait::async_trait;

use progress_types::{SolveStatus, VertexId, VertexWarning};

use crate::errors::ProgressError;

/// A progress display that accepts status batches.
///
/// Shared between producer tasks (usually behind an `Arc`), so every method
/// takes `&self`.
#[async_trait]
pub trait ProgressWriter: Send + Sync {
    /// Hand a batch to the display.
    ///
    /// Returns immediately. Batches written after the session ended are
    /// dropped.
    fn write(&self, status: SolveStatus);

    /// Signal that the build finished. Calling it more than once is harmless.
    fn finish(&self);

    /// Signal completion, then block until the display session ends.
    ///
    /// # Errors
    ///
    /// - `AlreadyWaited`: a previous call already joined the session
    /// - any error that terminated the display loop
    async fn wait(&self) -> Result<(), ProgressError>;

    /// Warnings received so far, in arrival order.
    fn warnings(&self) -> Vec<VertexWarning>;

    /// True once the display stopped accepting batches, for example because
    /// the operator quit. Further writes are dropped.
    fn is_closed(&self) -> bool {
        false
    }

    /// Whether logs from `source` may be attributed to `vertex`.
    ///
    /// Every source is accepted.
    fn validate_log_source(&self, _vertex: &VertexId, _source: &dyn Any) -> bool {
        true
    }

    /// Forget any association kept for `source`. Nothing is kept.
    fn clear_log_source(&self, _source: &dyn Any) {}
}
