//! Per-vertex record and log buffer.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use progress_types::{Vertex, VertexId, VertexLog, VertexStatus};

use super::label::{compose_label, sanitize_name};
use super::state::VertexState;
use crate::config::ProgressConfig;

/// Progress counter inside a vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub name: String,
    pub current: i64,
    pub total: i64,
}

/// What changed when an event was merged into a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RecordChange {
    pub label_changed: bool,
    pub cached_latched: bool,
    pub previous_state: VertexState,
    pub state_changed: bool,
}

impl RecordChange {
    pub(crate) fn any(&self) -> bool {
        self.label_changed || self.cached_latched || self.state_changed
    }
}

/// Merged view of every event seen for one vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexRecord {
    id: VertexId,
    index: usize,
    name: String,
    label: String,
    cached: bool,
    state: VertexState,
    error: Option<String>,
    inputs: Vec<VertexId>,
    started: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
    progress: BTreeMap<String, Progress>,
}

impl VertexRecord {
    /// Create a record from the first event seen for a vertex.
    pub(crate) fn new(index: usize, vertex: &Vertex, config: &ProgressConfig) -> Self {
        let mut record = Self {
            id: vertex.digest,
            index,
            name: String::new(),
            label: String::new(),
            cached: false,
            state: VertexState::Pending,
            error: None,
            inputs: Vec::new(),
            started: None,
            completed: None,
            progress: BTreeMap::new(),
        };
        record.merge(vertex, config);
        record
    }

    /// Merge a later event. Latches only move forward.
    pub(crate) fn merge(&mut self, vertex: &Vertex, config: &ProgressConfig) -> RecordChange {
        let mut change = RecordChange {
            previous_state: self.state,
            ..RecordChange::default()
        };

        if !vertex.name.is_empty() {
            self.name = sanitize_name(&vertex.name, config.display_width);
        }

        if vertex.cached && !self.cached {
            self.cached = true;
            change.cached_latched = true;
        }

        let label = compose_label(&self.name, self.cached, &config.cached_prefix);
        if label != self.label {
            self.label = label;
            change.label_changed = true;
        }

        let state = self.state.merge(VertexState::from_event(vertex));
        if state != self.state {
            self.state = state;
            change.state_changed = true;
        }

        if !vertex.error.is_empty() && self.error.is_none() {
            self.error = Some(vertex.error.clone());
        }

        for input in &vertex.inputs {
            if !self.inputs.contains(input) {
                self.inputs.push(*input);
            }
        }

        self.started = match (self.started, vertex.started) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.completed = match (self.completed, vertex.completed) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        change
    }

    /// Record a progress counter. Returns true when it changed.
    pub(crate) fn update_progress(&mut self, status: &VertexStatus) -> bool {
        let progress = Progress {
            name: status.name.clone(),
            current: status.current,
            total: status.total,
        };
        match self.progress.get(&status.id) {
            Some(existing) if *existing == progress => false,
            _ => {
                self.progress.insert(status.id.clone(), progress);
                true
            }
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Position in first-seen order, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Sanitized name without the cached prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tree label, including the cached prefix when latched.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cached(&self) -> bool {
        self.cached
    }

    pub fn state(&self) -> VertexState {
        self.state
    }

    /// True once some event reported a completion time. An errored vertex
    /// without one is terminal but not completed.
    pub fn completed(&self) -> bool {
        self.completed.is_some()
    }

    pub fn terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn errored(&self) -> bool {
        self.state.is_errored()
    }

    /// First error message reported for this vertex.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn inputs(&self) -> &[VertexId] {
        &self.inputs
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed
    }

    /// Elapsed time between start and completion, when both are known.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started, self.completed) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }

    /// Progress counters ordered by counter id.
    pub fn progress(&self) -> impl Iterator<Item = &Progress> {
        self.progress.values()
    }
}

/// Accumulated output of one vertex.
///
/// Fragments are appended in arrival order and never truncated. A fragment
/// identical in vertex, stream, timestamp and data to one already appended
/// is dropped, which keeps replays from duplicating output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBuffer {
    data: Vec<u8>,
    seen: HashSet<[u8; 32]>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Returns the byte range it occupies, or `None` if
    /// the fragment was empty or already appended.
    pub fn append(&mut self, log: &VertexLog) -> Option<Range<usize>> {
        if log.data.is_empty() {
            return None;
        }
        if !self.seen.insert(fingerprint(log)) {
            return None;
        }
        let start = self.data.len();
        self.data.extend_from_slice(&log.data);
        Some(start..self.data.len())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Buffer content as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn fingerprint(log: &VertexLog) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(log.vertex.as_bytes());
    hasher.update([log.stream]);
    hasher.update(log.timestamp.timestamp().to_be_bytes());
    hasher.update(log.timestamp.timestamp_subsec_nanos().to_be_bytes());
    hasher.update(&log.data);
    hasher.finalize().into()
}
