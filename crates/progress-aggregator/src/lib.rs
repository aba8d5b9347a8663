//! # Progress Aggregator
//!
//! Merges an unbounded stream of [`SolveStatus`](progress_types::SolveStatus)
//! batches into one coherent view of the build: which vertices exist, which
//! state each is in, and what log output belongs to each.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Latches never clear | `domain/state.rs` - `VertexState::merge()` is a max |
//! | First-seen order is append-only | `domain/aggregator.rs` - `order` only grows |
//! | Logs append in arrival order, once | `domain/record.rs` - `LogBuffer::append()` |
//! | Labels sanitized at merge time | `domain/label.rs` - `compose_label()` |
//!
//! ## Merge Rules
//!
//! ```text
//! [Pending] ──completed──→ [Completed] ──error──→ [Errored]
//!     │                                               ↑
//!     └─────────────────────error─────────────────────┘
//! ```
//!
//! Ingest never fails. Fields that cannot be merged (a status counter for an
//! unknown vertex, an empty log fragment) are dropped. Log fragments that
//! arrive before their vertex are held and adopted when the vertex appears.

pub mod config;
pub mod domain;

pub use config::{ProgressConfig, CACHED_PREFIX, DEFAULT_DISPLAY_WIDTH, LOG_PLACEHOLDER};
pub use domain::{
    compose_label, sanitize_name, Aggregator, AppendedLog, IngestReport, LogBuffer, Progress,
    Snapshot, StateCounts, Transition, VertexRecord, VertexState, MAX_ORPHAN_BYTES,
    MAX_ORPHAN_VERTICES,
};
