//! # Plain Writer
//!
//! Line-oriented output for non-interactive terminals and CI logs:
//!
//! ```text
//! #1 load build definition
//! #1 DONE 0.1s
//! #2 RUN apt-get update
//! #2 Get:1 http://deb.debian.org bookworm InRelease
//! #2 ERROR: exit code 100
//! #3 CACHED COPY . /src
//! #3 CACHED
//! ```

use std::io::{self, Write};

use async_trait::async_trait;

use progress_aggregator::{Aggregator, IngestReport, ProgressConfig, VertexState};
use progress_telemetry::{LOG_BYTES_APPENDED, VERTICES_CREATED};
use progress_types::{SolveStatus, VertexWarning};

use crate::errors::ProgressError;
use crate::session::{
    run_blocking, session_channel, SessionCommand, SessionHandle, SessionReceiver, WarningLog,
};
use crate::writer::ProgressWriter;

/// Renders batches as `#N`-prefixed lines.
pub struct PlainPrinter<W: Write> {
    out: W,
    aggregator: Aggregator,
}

impl<W: Write> PlainPrinter<W> {
    pub fn new(out: W, config: ProgressConfig) -> Self {
        Self {
            out,
            aggregator: Aggregator::new(config),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Merge a batch and print what it changed.
    pub fn print(&mut self, status: &SolveStatus) -> io::Result<()> {
        let report = self.aggregator.ingest(status);
        VERTICES_CREATED.inc_by(report.created.len() as u64);

        self.print_report(&report)?;
        self.out.flush()
    }

    fn print_report(&mut self, report: &IngestReport) -> io::Result<()> {
        for id in &report.created {
            if let Some(record) = self.aggregator.get(id) {
                writeln!(self.out, "#{} {}", record.index() + 1, record.label())?;
            }
        }

        for appended in &report.appended {
            let Some(record) = self.aggregator.get(&appended.vertex) else {
                continue;
            };
            let Some(logs) = self.aggregator.snapshot(&appended.vertex).logs() else {
                continue;
            };
            LOG_BYTES_APPENDED.inc_by(appended.range.len() as u64);
            let fragment = String::from_utf8_lossy(&logs.as_bytes()[appended.range.clone()]);
            for line in fragment.lines() {
                writeln!(self.out, "#{} {}", record.index() + 1, line)?;
            }
        }

        for transition in &report.transitions {
            let Some(record) = self.aggregator.get(&transition.vertex) else {
                continue;
            };
            let n = record.index() + 1;
            match transition.to {
                VertexState::Pending => {}
                VertexState::Completed if record.cached() => writeln!(self.out, "#{} CACHED", n)?,
                VertexState::Completed => match record.duration() {
                    Some(d) => writeln!(
                        self.out,
                        "#{} DONE {:.1}s",
                        n,
                        d.num_milliseconds() as f64 / 1000.0
                    )?,
                    None => writeln!(self.out, "#{} DONE", n)?,
                },
                VertexState::Errored => writeln!(
                    self.out,
                    "#{} ERROR: {}",
                    n,
                    record.error().unwrap_or_default()
                )?,
            }
        }

        Ok(())
    }

    /// Print the accumulated warnings, if any.
    pub fn print_warnings(&mut self) -> io::Result<()> {
        let warnings: Vec<VertexWarning> = self.aggregator.warnings().to_vec();
        if warnings.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "{} warning(s) found:", warnings.len())?;
        for warning in &warnings {
            writeln!(self.out, " - {}", warning.short)?;
            for line in &warning.detail {
                writeln!(self.out, "   {}", line)?;
            }
            if !warning.url.is_empty() {
                writeln!(self.out, "   More info: {}", warning.url)?;
            }
        }
        self.out.flush()
    }
}

/// Session task. Printing happens on the blocking pool so a slow terminal
/// or pipe never stalls the runtime's workers.
async fn run_plain<W: Write + Send + 'static>(
    mut rx: SessionReceiver,
    mut printer: PlainPrinter<W>,
    warnings: WarningLog,
) -> Result<(), ProgressError> {
    let output = |e: io::Error| ProgressError::Output(e.to_string());
    let mut finished = false;

    while !finished {
        let Some(burst) = rx.recv_burst().await else {
            break;
        };
        let mut statuses = Vec::with_capacity(burst.len());
        for command in burst {
            match command {
                SessionCommand::Status(status) => statuses.push(status),
                SessionCommand::Finish => {
                    finished = true;
                    break;
                }
            }
        }

        let (returned, result) = run_blocking(move || {
            let result = statuses.iter().try_for_each(|status| printer.print(status));
            (printer, result)
        })
        .await?;
        printer = returned;
        result.map_err(output)?;
        warnings.sync(printer.aggregator().warnings());
    }

    run_blocking(move || printer.print_warnings())
        .await?
        .map_err(output)
}

/// [`ProgressWriter`] printing plain lines to any `io::Write`.
pub struct PlainWriter {
    session: SessionHandle,
}

impl PlainWriter {
    /// Start a plain session. Must be called inside a tokio runtime.
    pub fn new<W>(out: W, config: ProgressConfig) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = session_channel();
        let warnings = WarningLog::new();
        let printer = PlainPrinter::new(out, config);
        let session = SessionHandle::spawn(
            tx,
            warnings.clone(),
            "plain",
            run_plain(rx, printer, warnings),
        );
        Self { session }
    }
}

#[async_trait]
impl ProgressWriter for PlainWriter {
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
