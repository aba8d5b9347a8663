//! # Status Entities
//!
//! One [`SolveStatus`] is one batch of the status stream. It groups vertex
//! updates, per-vertex progress counters, log fragments and warnings.
//!
//! Every field defaults when absent so that a producer omitting fields never
//! makes a batch undeliverable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

use crate::digest::VertexId;

/// Log stream number for standard output.
pub const STREAM_STDOUT: u8 = 1;

/// Log stream number for standard error.
pub const STREAM_STDERR: u8 = 2;

/// Named group several vertices can be displayed under.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressGroup {
    pub id: String,
    pub name: String,
}

/// Lifecycle update for one build step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vertex {
    /// Merge key.
    pub digest: VertexId,
    /// Digests of the vertices this one depends on.
    pub inputs: Vec<VertexId>,
    /// Human-readable step name, unsanitized.
    pub name: String,
    pub started: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    /// The result was reused instead of executed.
    pub cached: bool,
    /// Non-empty when the step failed.
    pub error: String,
    pub progress_group: Option<ProgressGroup>,
}

impl Vertex {
    /// Create a pending vertex with a name.
    pub fn new(digest: VertexId, name: impl Into<String>) -> Self {
        Self {
            digest,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Mark the vertex as started.
    #[must_use]
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started = Some(at);
        self
    }

    /// Mark the vertex as completed.
    #[must_use]
    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed = Some(at);
        self
    }

    /// Mark the vertex as served from cache.
    #[must_use]
    pub fn with_cached(mut self) -> Self {
        self.cached = true;
        self
    }

    /// Attach an error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }
}

/// Progress counter reported inside a vertex (e.g. bytes transferred).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexStatus {
    /// Counter identifier, unique within the vertex.
    pub id: String,
    pub vertex: VertexId,
    pub name: String,
    pub current: i64,
    pub total: i64,
    pub timestamp: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
}

/// Output fragment produced by a vertex.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexLog {
    pub vertex: VertexId,
    /// [`STREAM_STDOUT`] or [`STREAM_STDERR`]; other values are kept as-is.
    pub stream: u8,
    #[serde_as(as = "Base64")]
    pub data: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl VertexLog {
    /// Create a stdout fragment.
    pub fn new(vertex: VertexId, data: impl Into<Vec<u8>>, timestamp: DateTime<Utc>) -> Self {
        Self {
            vertex,
            stream: STREAM_STDOUT,
            data: data.into(),
            timestamp,
        }
    }
}

/// Advisory message surfaced next to, not inside, the vertex tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexWarning {
    /// Vertex the warning originated from; may be unknown to the display.
    pub vertex: VertexId,
    pub level: i32,
    pub short: String,
    pub detail: Vec<String>,
    pub url: String,
}

impl VertexWarning {
    pub fn new(vertex: VertexId, short: impl Into<String>) -> Self {
        Self {
            vertex,
            short: short.into(),
            ..Self::default()
        }
    }
}

/// One batch of the status stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveStatus {
    pub vertexes: Vec<Vertex>,
    pub statuses: Vec<VertexStatus>,
    pub logs: Vec<VertexLog>,
    pub warnings: Vec<VertexWarning>,
}

impl SolveStatus {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_vertex(mut self, vertex: Vertex) -> Self {
        self.vertexes.push(vertex);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: VertexStatus) -> Self {
        self.statuses.push(status);
        self
    }

    #[must_use]
    pub fn with_log(mut self, log: VertexLog) -> Self {
        self.logs.push(log);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, warning: VertexWarning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// True when the batch carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.vertexes.is_empty()
            && self.statuses.is_empty()
            && self.logs.is_empty()
            && self.warnings.is_empty()
    }
}
