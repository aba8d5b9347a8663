//! [`ProgressWriter`] backed by the interactive display.

use std::io;

use async_trait::async_trait;
use crossterm::event::{Event, EventStream};
use futures_util::Stream;
use ratatui::{backend::Backend, Terminal};

use progress_aggregator::ProgressConfig;
use progress_types::{SolveStatus, VertexWarning};
use progress_writer::{session_channel, ProgressError, ProgressWriter, SessionHandle, WarningLog};

use crate::domain::ProgressView;
use crate::runtime::UiLoop;
use crate::terminal;

/// Full-screen progress display.
///
/// Owns the terminal from construction until `wait` returns.
pub struct TuiWriter {
    session: SessionHandle,
}

impl TuiWriter {
    /// Take over stdout and start the display. Must be called inside a
    /// tokio runtime.
    pub fn new(config: ProgressConfig) -> Result<Self, ProgressError> {
        let terminal = terminal::setup()?;
        Ok(Self::spawn(terminal, EventStream::new(), config, true))
    }

    /// Start the display on an arbitrary backend and input stream.
    ///
    /// The terminal is left as it is when the session ends.
    pub fn with_backend<B, S>(terminal: Terminal<B>, input: S, config: ProgressConfig) -> Self
    where
        B: Backend + Send + 'static,
        S: Stream<Item = io::Result<Event>> + Send + 'static,
    {
        Self::spawn(terminal, input, config, false)
    }

    fn spawn<B, S>(terminal: Terminal<B>, input: S, config: ProgressConfig, restore: bool) -> Self
    where
        B: Backend + Send + 'static,
        S: Stream<Item = io::Result<Event>> + Send + 'static,
    {
        let (tx, rx) = session_channel();
        let warnings = WarningLog::new();
        let hold_on_finish = config.hold_on_finish;
        let ui = UiLoop::new(
            terminal,
            ProgressView::new(config),
            warnings.clone(),
            hold_on_finish,
        );

        let task = async move {
            let result = ui.run(rx, input).await.map(|_| ());
            if restore {
                result.and(terminal::restore())
            } else {
                result
            }
        };

        Self {
            session: SessionHandle::spawn(tx, warnings, "tty", task),
        }
    }
}

#[async_trait]
impl ProgressWriter for TuiWriter {
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

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{stream, StreamExt};
    use progress_types::{Vertex, VertexId};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn test_writer(config: ProgressConfig) -> TuiWriter {
        let terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        TuiWriter::with_backend(terminal, stream::pending(), config)
    }

    #[tokio::test]
    async fn test_wait_returns_after_finish() {
        let writer = test_writer(ProgressConfig::default());
        writer.write(SolveStatus::new().with_vertex(Vertex::new(VertexId::of("a"), "a")));
        assert_eq!(writer.wait().await, Ok(()));
        assert_eq!(writer.wait().await, Err(ProgressError::AlreadyWaited));
    }

    #[tokio::test]
    async fn test_concurrent_producers() {
        let writer = Arc::new(test_writer(ProgressConfig::default()));
        let mut producers = Vec::new();
        for p in 0..4 {
            let writer = Arc::clone(&writer);
            producers.push(tokio::spawn(async move {
                for i in 0..25 {
                    let id = VertexId::of(format!("{}-{}", p, i));
                    writer.write(SolveStatus::new().with_vertex(Vertex::new(id, "step")));
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        assert_eq!(writer.wait().await, Ok(()));
    }

    #[tokio::test]
    async fn test_write_after_wait_is_dropped() {
        let writer = test_writer(ProgressConfig::default());
        writer.wait().await.unwrap();
        writer.write(SolveStatus::new());
        assert!(writer.warnings().is_empty());
    }

    #[tokio::test]
    async fn test_held_display_without_input_ends_on_wait() {
        let terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let writer = TuiWriter::with_backend(
            terminal,
            stream::empty(),
            ProgressConfig::default().with_hold_on_finish(true),
        );
        writer.write(SolveStatus::new().with_vertex(Vertex::new(VertexId::of("a"), "a")));

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), writer.wait()).await;
        assert_eq!(result.ok(), Some(Ok(())));
        assert!(writer.is_closed());
    }

    #[tokio::test]
    async fn test_operator_quit_closes_session() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

        let terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let quit = stream::iter(vec![Ok(Event::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
        )))])
        .chain(stream::pending());
        let writer = TuiWriter::with_backend(terminal, quit, ProgressConfig::default());

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while !writer.is_closed() {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        writer.write(SolveStatus::new());
        assert_eq!(writer.wait().await, Ok(()));
    }

    #[tokio::test]
    async fn test_render_failure_reported_by_wait() {
        struct BrokenBackend(TestBackend);

        impl Backend for BrokenBackend {
            fn draw<'a, I>(&mut self, _content: I) -> io::Result<()>
            where
                I: Iterator<Item = (u16, u16, &'a ratatui::buffer::Cell)>,
            {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "display gone"))
            }
            fn hide_cursor(&mut self) -> io::Result<()> {
                self.0.hide_cursor()
            }
            fn show_cursor(&mut self) -> io::Result<()> {
                self.0.show_cursor()
            }
            fn get_cursor_position(&mut self) -> io::Result<ratatui::layout::Position> {
                self.0.get_cursor_position()
            }
            fn set_cursor_position<P: Into<ratatui::layout::Position>>(
                &mut self,
                position: P,
            ) -> io::Result<()> {
                self.0.set_cursor_position(position)
            }
            fn clear(&mut self) -> io::Result<()> {
                self.0.clear()
            }
            fn size(&self) -> io::Result<ratatui::layout::Size> {
                self.0.size()
            }
            fn window_size(&mut self) -> io::Result<ratatui::backend::WindowSize> {
                self.0.window_size()
            }
            fn flush(&mut self) -> io::Result<()> {
                self.0.flush()
            }
        }

        let terminal = Terminal::new(BrokenBackend(TestBackend::new(40, 10))).unwrap();
        let writer = TuiWriter::with_backend(terminal, stream::pending(), ProgressConfig::default());
        writer.write(SolveStatus::new());

        let result = writer.wait().await;
        assert!(matches!(result, Err(ProgressError::Render(_))));
    }
}
