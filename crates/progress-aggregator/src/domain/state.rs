//! Vertex state machine.

use serde::{Deserialize, Serialize};

use progress_types::Vertex;

/// Display state of a vertex.
///
/// Ordered so that merging is a max: `Errored` dominates `Completed`,
/// which dominates `Pending`. A merged state never moves back down.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VertexState {
    /// Seen but not yet completed.
    #[default]
    Pending,
    /// Completed without error.
    Completed,
    /// Reported an error.
    Errored,
}

impl VertexState {
    /// State implied by a single event.
    pub fn from_event(vertex: &Vertex) -> Self {
        if !vertex.error.is_empty() {
            VertexState::Errored
        } else if vertex.completed.is_some() {
            VertexState::Completed
        } else {
            VertexState::Pending
        }
    }

    /// Merge two observations.
    #[must_use]
    pub fn merge(self, other: VertexState) -> VertexState {
        self.max(other)
    }

    /// Completed or errored: the vertex will not run again.
    pub fn is_terminal(&self) -> bool {
        *self >= VertexState::Completed
    }

    pub fn is_errored(&self) -> bool {
        *self == VertexState::Errored
    }

    /// Short label.
    pub fn label(&self) -> &'static str {
        match self {
            VertexState::Pending => "RUN",
            VertexState::Completed => "DONE",
            VertexState::Errored => "ERROR",
        }
    }
}
