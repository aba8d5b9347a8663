//! The aggregator: in-memory index of vertices and their logs.

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, trace};

use progress_types::{SolveStatus, VertexId, VertexLog, VertexWarning};

use super::record::{LogBuffer, VertexRecord};
use super::state::VertexState;
use crate::config::ProgressConfig;

/// Most distinct unseen vertices whose logs are held for later adoption.
pub const MAX_ORPHAN_VERTICES: usize = 256;

/// Most bytes held for one unseen vertex.
pub const MAX_ORPHAN_BYTES: usize = 1 << 20;

/// A state change observed while ingesting a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub vertex: VertexId,
    pub from: VertexState,
    pub to: VertexState,
}

/// Bytes appended to a vertex's log buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedLog {
    pub vertex: VertexId,
    pub range: Range<usize>,
}

/// Summary of what one `ingest` call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Vertices seen for the first time, in first-seen order.
    pub created: Vec<VertexId>,
    /// Known vertices whose label or state changed.
    pub updated: Vec<VertexId>,
    pub transitions: Vec<Transition>,
    /// Vertices whose cached latch flipped in this batch.
    pub cached: Vec<VertexId>,
    pub appended: Vec<AppendedLog>,
    /// Number of warnings not seen before.
    pub new_warnings: usize,
}

impl IngestReport {
    /// True when the batch changed nothing visible.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.appended.is_empty()
            && self.new_warnings == 0
    }

    fn mark_updated(&mut self, id: VertexId) {
        if !self.created.contains(&id) && !self.updated.contains(&id) {
            self.updated.push(id);
        }
    }
}

/// Result of looking up one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot<'a> {
    Known {
        record: &'a VertexRecord,
        logs: &'a LogBuffer,
    },
    Unknown,
}

impl<'a> Snapshot<'a> {
    pub fn record(&self) -> Option<&'a VertexRecord> {
        match self {
            Snapshot::Known { record, .. } => Some(record),
            Snapshot::Unknown => None,
        }
    }

    pub fn logs(&self) -> Option<&'a LogBuffer> {
        match self {
            Snapshot::Known { logs, .. } => Some(logs),
            Snapshot::Unknown => None,
        }
    }

    /// Log text, or `placeholder` when unknown or empty.
    pub fn log_text_or(&self, placeholder: &str) -> String {
        match self.logs() {
            Some(logs) if !logs.is_empty() => logs.text().into_owned(),
            _ => placeholder.to_string(),
        }
    }
}

/// Vertex counts per display state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub pending: usize,
    pub completed: usize,
    pub errored: usize,
    pub cached: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.pending + self.completed + self.errored
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VertexEntry {
    record: VertexRecord,
    logs: LogBuffer,
}

/// Owner of all merged build state for one progress session.
///
/// Not synchronized: exactly one task owns it and applies batches in the
/// order they were enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    config: ProgressConfig,
    entries: HashMap<VertexId, VertexEntry>,
    order: Vec<VertexId>,
    /// Logs of vertices not seen yet, deduplicated like any log buffer and
    /// bounded by [`MAX_ORPHAN_VERTICES`] and [`MAX_ORPHAN_BYTES`].
    orphan_logs: HashMap<VertexId, LogBuffer>,
    warnings: Vec<VertexWarning>,
    batches: u64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

impl Aggregator {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            order: Vec::new(),
            orphan_logs: HashMap::new(),
            warnings: Vec::new(),
            batches: 0,
        }
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Merge a batch. Never fails; unmergeable fields are dropped.
    pub fn ingest(&mut self, status: &SolveStatus) -> IngestReport {
        let mut report = IngestReport::default();
        self.batches += 1;

        for vertex in &status.vertexes {
            let id = vertex.digest;
            match self.entries.get_mut(&id) {
                Some(entry) => {
                    let change = entry.record.merge(vertex, &self.config);
                    if change.cached_latched {
                        report.cached.push(id);
                    }
                    if change.state_changed {
                        report.transitions.push(Transition {
                            vertex: id,
                            from: change.previous_state,
                            to: entry.record.state(),
                        });
                    }
                    if change.any() {
                        report.mark_updated(id);
                    }
                }
                None => {
                    let record = VertexRecord::new(self.order.len(), vertex, &self.config);
                    if record.cached() {
                        report.cached.push(id);
                    }
                    if record.state() != VertexState::Pending {
                        report.transitions.push(Transition {
                            vertex: id,
                            from: VertexState::Pending,
                            to: record.state(),
                        });
                    }
                    self.entries.insert(
                        id,
                        VertexEntry {
                            record,
                            logs: LogBuffer::new(),
                        },
                    );
                    self.order.push(id);
                    report.created.push(id);
                    self.adopt_orphans(id, &mut report);
                }
            }
        }

        for counter in &status.statuses {
            match self.entries.get_mut(&counter.vertex) {
                Some(entry) => {
                    if entry.record.update_progress(counter) {
                        report.mark_updated(counter.vertex);
                    }
                }
                None => trace!(vertex = %counter.vertex, "Progress for unknown vertex dropped"),
            }
        }

        for log in &status.logs {
            match self.entries.get_mut(&log.vertex) {
                Some(entry) => {
                    if let Some(range) = entry.logs.append(log) {
                        report.appended.push(AppendedLog {
                            vertex: log.vertex,
                            range,
                        });
                    }
                }
                None => self.hold_orphan(log),
            }
        }

        for warning in &status.warnings {
            if !self.warnings.contains(warning) {
                self.warnings.push(warning.clone());
                report.new_warnings += 1;
            }
        }

        debug!(
            batch = self.batches,
            created = report.created.len(),
            updated = report.updated.len(),
            log_fragments = report.appended.len(),
            "Batch ingested"
        );

        report
    }

    fn hold_orphan(&mut self, log: &VertexLog) {
        if log.data.is_empty() {
            return;
        }
        if !self.orphan_logs.contains_key(&log.vertex)
            && self.orphan_logs.len() >= MAX_ORPHAN_VERTICES
        {
            trace!(vertex = %log.vertex, "Too many unseen vertices, log dropped");
            return;
        }
        let held = self.orphan_logs.entry(log.vertex).or_default();
        if held.len() + log.data.len() > MAX_ORPHAN_BYTES {
            trace!(vertex = %log.vertex, "Held log limit reached, log dropped");
            return;
        }
        if held.append(log).is_some() {
            trace!(vertex = %log.vertex, "Holding log for unseen vertex");
        }
    }

    /// Move held logs into a just-created entry, keeping their fingerprints
    /// so replays of them are still recognized.
    fn adopt_orphans(&mut self, id: VertexId, report: &mut IngestReport) {
        let Some(held) = self.orphan_logs.remove(&id) else {
            return;
        };
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        if !held.is_empty() {
            report.appended.push(AppendedLog {
                vertex: id,
                range: 0..held.len(),
            });
        }
        entry.logs = held;
    }

    /// Current record and logs of a vertex.
    pub fn snapshot(&self, id: &VertexId) -> Snapshot<'_> {
        match self.entries.get(id) {
            Some(entry) => Snapshot::Known {
                record: &entry.record,
                logs: &entry.logs,
            },
            None => Snapshot::Unknown,
        }
    }

    pub fn get(&self, id: &VertexId) -> Option<&VertexRecord> {
        self.entries.get(id).map(|e| &e.record)
    }

    /// Vertex ids in first-seen order.
    pub fn order(&self) -> &[VertexId] {
        &self.order
    }

    /// Records in first-seen order.
    pub fn records(&self) -> impl Iterator<Item = &VertexRecord> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.entries.get(id).map(|e| &e.record))
    }

    /// Warnings in arrival order, duplicates removed.
    pub fn warnings(&self) -> &[VertexWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of batches ingested so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn counts(&self) -> StateCounts {
        self.records().fold(StateCounts::default(), |mut counts, record| {
            match record.state() {
                VertexState::Pending => counts.pending += 1,
                VertexState::Completed => counts.completed += 1,
                VertexState::Errored => counts.errored += 1,
            }
            if record.cached() {
                counts.cached += 1;
            }
            counts
        })
    }

    /// Compare merged build state, ignoring how many batches produced it.
    pub fn same_state(&self, other: &Aggregator) -> bool {
        self.entries == other.entries
            && self.order == other.order
            && self.orphan_logs == other.orphan_logs
            && self.warnings == other.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use progress_types::{Vertex, VertexStatus};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn id(name: &str) -> VertexId {
        VertexId::of(name)
    }

    fn sample_sequence() -> Vec<SolveStatus> {
        let (a, b, c) = (id("a"), id("b"), id("c"));
        vec![
            SolveStatus::new()
                .with_vertex(Vertex::new(a, "load build definition").started_at(at(1)))
                .with_vertex(Vertex::new(b, "RUN\tapt-get update")),
            SolveStatus::new()
                .with_vertex(Vertex::new(a, "load build definition").completed_at(at(2)))
                .with_log(VertexLog::new(b, "Get:1 http://deb\n", at(3))),
            SolveStatus::new()
                .with_vertex(Vertex::new(c, "COPY . /src").with_cached())
                .with_vertex(Vertex::new(c, "COPY . /src").with_cached().completed_at(at(4)))
                .with_log(VertexLog::new(b, "Reading lists\n", at(5)))
                .with_warning(VertexWarning::new(b, "apt is not stable")),
            SolveStatus::new()
                .with_vertex(Vertex::new(b, "RUN\tapt-get update").with_error("exit code 100"))
                .with_vertex(Vertex::new(a, "load build definition")),
        ]
    }

    #[test]
    fn test_new_vertex_creates_record() {
        let mut agg = Aggregator::default();
        let report =
            agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(id("a"), "compile")));

        assert_eq!(report.created, vec![id("a")]);
        assert!(report.updated.is_empty());
        let record = agg.get(&id("a")).unwrap();
        assert_eq!(record.label(), "compile");
        assert_eq!(record.state(), VertexState::Pending);
    }

    #[test]
    fn test_scenario_pending_completed_errored() {
        let a = id("a");
        let mut agg = Aggregator::default();

        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(a, "compile")));
        assert_eq!(agg.get(&a).unwrap().state(), VertexState::Pending);

        let report = agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(a, "").completed_at(at(1))));
        assert_eq!(
            report.transitions,
            vec![Transition {
                vertex: a,
                from: VertexState::Pending,
                to: VertexState::Completed
            }]
        );
        assert_eq!(agg.get(&a).unwrap().label(), "compile");

        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(a, "").with_error("boom")));
        let record = agg.get(&a).unwrap();
        assert_eq!(record.state(), VertexState::Errored);
        assert_eq!(record.label(), "compile");
        assert_eq!(record.error(), Some("boom"));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut first = Aggregator::default();
        let mut second = Aggregator::default();
        for batch in sample_sequence() {
            first.ingest(&batch);
        }
        for batch in sample_sequence() {
            second.ingest(&batch);
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_reingest_is_idempotent() {
        let mut agg = Aggregator::default();
        let batches = sample_sequence();
        for batch in &batches {
            agg.ingest(batch);
        }
        let before = agg.clone();

        let report = agg.ingest(&batches[2]);
        assert!(report.is_noop());
        let report = agg.ingest(&batches[3]);
        assert!(report.is_noop());
        assert!(agg.same_state(&before));
    }

    #[test]
    fn test_latches_are_monotonic() {
        let a = id("a");
        let mut agg = Aggregator::default();
        agg.ingest(
            &SolveStatus::new().with_vertex(Vertex::new(a, "x").completed_at(at(1)).with_cached()),
        );
        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(a, "x").with_error("e")));
        // Later events that carry none of the latches.
        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(a, "x")));

        let record = agg.get(&a).unwrap();
        assert!(record.completed());
        assert!(record.errored());
        assert!(record.cached());
    }

    #[test]
    fn test_first_seen_order_is_stable() {
        let mut agg = Aggregator::default();
        for batch in sample_sequence() {
            agg.ingest(&batch);
        }
        for _ in 0..3 {
            agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(id("c"), "COPY . /src")));
            agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(id("a"), "x").completed_at(at(9))));
        }
        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(id("d"), "export")));

        assert_eq!(agg.order(), &[id("a"), id("b"), id("c"), id("d")]);
        let indexes: Vec<usize> = agg.records().map(|r| r.index()).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_logs_accumulate_across_batches() {
        let a = id("a");
        let mut agg = Aggregator::default();
        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(a, "x")));
        for (i, fragment) in ["a", "b", "c"].iter().enumerate() {
            agg.ingest(&SolveStatus::new().with_log(VertexLog::new(a, *fragment, at(i as i64))));
        }
        assert_eq!(agg.snapshot(&a).logs().unwrap().text(), "abc");
    }

    #[test]
    fn test_logs_before_vertex_are_adopted() {
        let a = id("a");
        let mut agg = Aggregator::default();
        agg.ingest(&SolveStatus::new().with_log(VertexLog::new(a, "early ", at(1))));
        assert_eq!(agg.snapshot(&a), Snapshot::Unknown);

        let report = agg.ingest(
            &SolveStatus::new()
                .with_vertex(Vertex::new(a, "x"))
                .with_log(VertexLog::new(a, "late", at(2))),
        );
        assert_eq!(report.appended.len(), 2);
        assert_eq!(agg.snapshot(&a).logs().unwrap().text(), "early late");
    }

    #[test]
    fn test_reingesting_held_logs_is_idempotent() {
        let a = id("a");
        let batch = SolveStatus::new()
            .with_log(VertexLog::new(a, "early ", at(1)))
            .with_log(VertexLog::new(a, "output", at(2)));
        let mut agg = Aggregator::default();
        agg.ingest(&batch);
        let once = agg.clone();

        for _ in 0..1001 {
            assert!(agg.ingest(&batch).is_noop());
        }
        assert!(agg.same_state(&once));

        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(a, "x")));
        let report = agg.ingest(&batch);
        assert!(report.appended.is_empty());
        assert_eq!(agg.snapshot(&a).log_text_or(""), "early output");
    }

    #[test]
    fn test_held_logs_are_bounded() {
        let mut agg = Aggregator::default();
        for i in 0..MAX_ORPHAN_VERTICES + 10 {
            let v = id(&format!("v{}", i));
            agg.ingest(&SolveStatus::new().with_log(VertexLog::new(v, "x", at(1))));
        }
        assert_eq!(agg.orphan_logs.len(), MAX_ORPHAN_VERTICES);

        let a = id("v0");
        let big = vec![b'y'; MAX_ORPHAN_BYTES];
        agg.ingest(&SolveStatus::new().with_log(VertexLog::new(a, big, at(2))));
        assert_eq!(agg.orphan_logs[&a].len(), 1);

        let late = id(&format!("v{}", MAX_ORPHAN_VERTICES + 5));
        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(late, "late")));
        assert_eq!(agg.snapshot(&late).logs().map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_same_vertex_twice_in_one_batch() {
        let a = id("a");
        let mut agg = Aggregator::default();
        let report = agg.ingest(
            &SolveStatus::new()
                .with_vertex(Vertex::new(a, "x").completed_at(at(1)))
                .with_vertex(Vertex::new(a, "x")),
        );
        assert_eq!(report.created, vec![a]);
        assert!(report.updated.is_empty());
        assert_eq!(agg.len(), 1);
        assert!(agg.get(&a).unwrap().completed());
    }

    #[test]
    fn test_latch_order_within_batch_does_not_matter() {
        let a = id("a");
        let events = [
            Vertex::new(a, "x").with_cached(),
            Vertex::new(a, "x").completed_at(at(1)),
            Vertex::new(a, "x").with_error("boom"),
        ];

        let mut forward = Aggregator::default();
        let mut backward = Aggregator::default();
        let mut batch = SolveStatus::new();
        batch.vertexes = events.to_vec();
        forward.ingest(&batch);
        batch.vertexes.reverse();
        backward.ingest(&batch);

        let f = forward.get(&a).unwrap();
        let b = backward.get(&a).unwrap();
        assert_eq!(f.state(), b.state());
        assert_eq!(f.cached(), b.cached());
        assert_eq!(f.label(), b.label());
    }

    #[test]
    fn test_snapshot_unknown() {
        let agg = Aggregator::default();
        let snapshot = agg.snapshot(&id("missing"));
        assert_eq!(snapshot, Snapshot::Unknown);
        assert_eq!(snapshot.log_text_or("No logs yet"), "No logs yet");
    }

    #[test]
    fn test_snapshot_empty_logs_uses_placeholder() {
        let mut agg = Aggregator::default();
        agg.ingest(&SolveStatus::new().with_vertex(Vertex::new(id("a"), "x")));
        assert_eq!(agg.snapshot(&id("a")).log_text_or("-"), "-");
    }

    #[test]
    fn test_truncation_with_cached_prefix() {
        let config = ProgressConfig::default().with_display_width(8);
        let mut agg = Aggregator::new(config);
        let a = id("a");
        agg.ingest(
            &SolveStatus::new().with_vertex(Vertex::new(a, "RUN\tcargo build --release").with_cached()),
        );
        assert_eq!(agg.get(&a).unwrap().name(), "RUNcargo");
        assert_eq!(agg.get(&a).unwrap().label(), "CACHED RUNcargo");
    }

    #[test]
    fn test_progress_for_unknown_vertex_is_dropped() {
        let mut agg = Aggregator::default();
        let report = agg.ingest(&SolveStatus::new().with_status(VertexStatus {
            id: "x".into(),
            vertex: id("ghost"),
            ..VertexStatus::default()
        }));
        assert!(report.is_noop());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_warnings_in_arrival_order_without_duplicates() {
        let mut agg = Aggregator::default();
        let w1 = VertexWarning::new(id("a"), "first");
        let w2 = VertexWarning::new(id("b"), "second");
        agg.ingest(&SolveStatus::new().with_warning(w1.clone()));
        agg.ingest(&SolveStatus::new().with_warning(w2.clone()).with_warning(w1.clone()));
        assert_eq!(agg.warnings(), &[w1, w2]);
    }

    #[test]
    fn test_counts() {
        let mut agg = Aggregator::default();
        for batch in sample_sequence() {
            agg.ingest(&batch);
        }
        let counts = agg.counts();
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.errored, 1);
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.cached, 1);
        assert_eq!(counts.total(), 3);
    }
}
