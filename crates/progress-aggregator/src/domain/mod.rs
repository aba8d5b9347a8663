//! Domain layer: labels, the vertex state machine, records and the
//! aggregator that owns them.

mod aggregator;
mod label;
mod record;
mod state;

pub use aggregator::{
    Aggregator, AppendedLog, IngestReport, Snapshot, StateCounts, Transition, MAX_ORPHAN_BYTES,
    MAX_ORPHAN_VERTICES,
};
pub use label::{compose_label, sanitize_name};
pub use record::{LogBuffer, Progress, VertexRecord};
pub use state::VertexState;
