//! # JSON Writer
//!
//! One JSON object per batch, one batch per line. Batches are written as
//! received, so a consumer can replay them into its own aggregator.

use std::io::{self, Write};

use async_trait::async_trait;

use progress_aggregator::Aggregator;
use progress_telemetry::VERTICES_CREATED;
use progress_types::{SolveStatus, VertexWarning};

use crate::errors::ProgressError;
use crate::session::{
    run_blocking, session_channel, SessionCommand, SessionHandle, SessionReceiver, WarningLog,
};
use crate::writer::ProgressWriter;

fn encode_line<W: Write>(out: &mut W, status: &SolveStatus) -> Result<(), ProgressError> {
    serde_json::to_writer(&mut *out, status)
        .map_err(|e| ProgressError::Output(format!("Failed to encode batch: {}", e)))?;
    writeln!(out).and_then(|_| out.flush()).map_err(output)
}

fn output(e: io::Error) -> ProgressError {
    ProgressError::Output(e.to_string())
}

/// Session task. Encoding and writing run on the blocking pool.
async fn run_json<W: Write + Send + 'static>(
    mut rx: SessionReceiver,
    mut out: W,
    warnings: WarningLog,
) -> Result<(), ProgressError> {
    // Kept only for warning dedupe and metrics.
    let mut aggregator = Aggregator::default();
    let mut finished = false;

    while !finished {
        let Some(burst) = rx.recv_burst().await else {
            break;
        };
        let mut statuses = Vec::with_capacity(burst.len());
        for command in burst {
            match command {
                SessionCommand::Status(status) => {
                    let report = aggregator.ingest(&status);
                    VERTICES_CREATED.inc_by(report.created.len() as u64);
                    statuses.push(status);
                }
                SessionCommand::Finish => {
                    finished = true;
                    break;
                }
            }
        }

        let (returned, result) = run_blocking(move || {
            let result = statuses
                .iter()
                .try_for_each(|status| encode_line(&mut out, status));
            (out, result)
        })
        .await?;
        out = returned;
        result?;
        warnings.sync(aggregator.warnings());
    }
    Ok(())
}

/// [`ProgressWriter`] emitting newline-delimited JSON.
pub struct JsonWriter {
    session: SessionHandle,
}

impl JsonWriter {
    /// Start a JSON session. Must be called inside a tokio runtime.
    pub fn new<W>(out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = session_channel();
        let warnings = WarningLog::new();
        let session =
            SessionHandle::spawn(tx, warnings.clone(), "json", run_json(rx, out, warnings));
        Self { session }
    }
}

#[async_trait]
impl ProgressWriter for JsonWriter {
    fn write(&self, status: SolveStatus) {
        self.session.write(status);
    }

    fn finish(&self) {
        self.session.finish();
    }

    async fn wait(&self) -> Result<(), ProgressError> {
        self.session.wait().await
    }

    fn warnings(&self) -> Vec<VertexWarning> {
        self.session.warnings()
    }

    fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}
