//! Batch sequences shared by the integration flows.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use progress_types::{SolveStatus, Vertex, VertexId, VertexLog, VertexWarning};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .unwrap_or_default()
}

/// A three-step build: `load` is cached, `compile` logs "abc" and completes,
/// `link` fails. One warning is attached to `compile`.
pub fn build_sequence() -> Vec<SolveStatus> {
    let load = VertexId::of("load");
    let compile = VertexId::of("compile");
    let link = VertexId::of("link");

    vec![
        SolveStatus::new()
            .with_vertex(
                Vertex::new(load, "[internal] load definition")
                    .completed_at(at(0))
                    .with_cached(),
            )
            .with_vertex(Vertex::new(compile, "compile").started_at(at(0))),
        SolveStatus::new().with_log(VertexLog::new(compile, "a", at(1))),
        SolveStatus::new().with_log(VertexLog::new(compile, "b", at(2))),
        SolveStatus::new()
            .with_log(VertexLog::new(compile, "c", at(3)))
            .with_warning(VertexWarning::new(compile, "unpinned base image")),
        SolveStatus::new().with_vertex(
            Vertex::new(compile, "compile")
                .started_at(at(0))
                .completed_at(at(4)),
        ),
        SolveStatus::new().with_vertex(Vertex::new(link, "link").started_at(at(4))),
        SolveStatus::new().with_vertex(
            Vertex::new(link, "link")
                .started_at(at(4))
                .completed_at(at(5))
                .with_error("exit code: 1"),
        ),
    ]
}

/// Clonable in-memory sink for writers that take ownership of their output.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
