//! `watch`: render a stream of status batches.
//!
//! Input is newline-delimited JSON, one `SolveStatus` per line, as emitted
//! by `--progress json`. Malformed lines are logged and skipped.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};

use progress_aggregator::ProgressConfig;
use progress_telemetry::{encode_metrics, TelemetryConfig};
use progress_tui::TuiWriter;
use progress_types::{SolveStatus, VertexWarning};
use progress_writer::{JsonWriter, PlainWriter, ProgressMode, ProgressWriter};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Display mode: auto, tty, plain or json
    #[arg(long, default_value = "auto", env = "BUILDCTL_PROGRESS")]
    progress: ProgressMode,

    /// File of JSON status batches, or `-` for stdin
    #[arg(long, default_value = "-")]
    input: String,

    /// Keep the interactive display open after the build finishes
    #[arg(long)]
    hold: bool,

    /// Pause between batches, for replaying recorded streams
    #[arg(long, default_value = "0")]
    delay_ms: u64,

    /// Write logs to this file (stderr is unavailable while the display runs)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Dump session metrics in Prometheus text format to this file on exit
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

pub async fn watch(args: WatchArgs) -> Result<ExitCode> {
    let mode = args.progress.resolve(io::stdout().is_terminal());

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(path) = &args.log_file {
        telemetry = telemetry.with_log_file(path);
    }
    if mode == ProgressMode::Tty {
        telemetry = telemetry.for_interactive();
    }
    let _telemetry = super::init(telemetry)?;
    debug!(mode = %mode, input = %args.input, "Starting watch");

    let input = open_input(&args.input).await?;
    let mut config = ProgressConfig::from_env();
    if args.hold {
        config = config.with_hold_on_finish(true);
    }
    let writer: Box<dyn ProgressWriter> = match mode {
        ProgressMode::Tty => Box::new(TuiWriter::new(config)?),
        ProgressMode::Plain | ProgressMode::Auto => {
            Box::new(PlainWriter::new(io::stdout(), config))
        }
        ProgressMode::Json => Box::new(JsonWriter::new(io::stdout())),
    };

    let delay = Duration::from_millis(args.delay_ms);
    let forwarded = forward(input, writer.as_ref(), delay).await;
    let finished = writer.wait().await;

    if mode == ProgressMode::Tty {
        print_warnings(&mut io::stderr(), &writer.warnings())?;
    }

    if let Some(path) = &args.metrics_file {
        let text = encode_metrics()?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    let batches = forwarded?;
    debug!(batches, "Input drained");
    finished?;
    Ok(ExitCode::SUCCESS)
}

async fn open_input(input: &str) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    if input == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("Failed to open {}", input))?;
    Ok(Box::new(file))
}

/// How often an idle input is interrupted to check whether the display closed.
const CLOSED_POLL: Duration = Duration::from_millis(100);

/// Feed every batch read from `input` to `writer`. Returns the batch count.
///
/// Stops early once the writer closes, e.g. the operator quit the display.
async fn forward<R>(input: R, writer: &dyn ProgressWriter, delay: Duration) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut count = 0;
    let mut line_no = 0;

    loop {
        if writer.is_closed() {
            debug!(batches = count, "Display closed, no longer reading input");
            break;
        }
        // `next_line` is cancel safe, so a poll tick loses no input.
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = tokio::time::sleep(CLOSED_POLL) => continue,
        };
        let Some(line) = line else {
            break;
        };
        line_no += 1;
        let Some(status) = parse_line(&line, line_no) else {
            continue;
        };
        writer.write(status);
        count += 1;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(count)
}

fn parse_line(line: &str, line_no: usize) -> Option<SolveStatus> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(line = line_no, error = %e, "Skipping malformed status batch");
            None
        }
    }
}

fn print_warnings<W: Write>(out: &mut W, warnings: &[VertexWarning]) -> io::Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }
    writeln!(out, "{} warning(s) found:", warnings.len())?;
    for warning in warnings {
        writeln!(out, " - {}", warning.short)?;
        for line in &warning.detail {
            writeln!(out, "   {}", line)?;
        }
        if !warning.url.is_empty() {
            writeln!(out, "   More info: {}", warning.url)?;
        }
    }
    Ok(())
}
