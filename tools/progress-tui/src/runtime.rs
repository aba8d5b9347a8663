//! The UI loop: the one task that owns the view and draws it.

use std::io;

use crossterm::event::Event;
use futures_util::{Stream, StreamExt};
use ratatui::{backend::Backend, Terminal};
use tracing::{debug, trace};

use progress_telemetry::{HistogramTimer, REDRAWS, REDRAWS_COALESCED, REDRAW_DURATION};
use progress_writer::{ProgressError, SessionCommand, SessionReceiver, WarningLog};

use crate::domain::ProgressView;
use crate::ui;

/// Inputs and outputs of one UI loop run.
pub struct UiLoop<B: Backend> {
    terminal: Terminal<B>,
    view: ProgressView,
    warnings: WarningLog,
    hold_on_finish: bool,
}

impl<B: Backend> UiLoop<B> {
    pub fn new(
        terminal: Terminal<B>,
        view: ProgressView,
        warnings: WarningLog,
        hold_on_finish: bool,
    ) -> Self {
        Self {
            terminal,
            view,
            warnings,
            hold_on_finish,
        }
    }

    /// Run until the build finishes (or, with hold-on-finish, until the
    /// operator quits), the operator quits, or a draw fails.
    ///
    /// A held display also ends once input is closed, since nobody is left
    /// to dismiss it.
    ///
    /// Every wake-up drains all queued commands before drawing once, so a
    /// burst of batches costs a single draw of the latest state.
    pub async fn run<S>(
        mut self,
        mut rx: SessionReceiver,
        input: S,
    ) -> Result<ProgressView, ProgressError>
    where
        S: Stream<Item = io::Result<Event>>,
    {
        let mut input = Box::pin(input);
        let mut queue_open = true;
        let mut input_open = true;

        loop {
            self.draw_if_dirty()?;

            if self.view.should_quit() {
                debug!("Operator quit the progress display");
                break;
            }
            if self.view.is_finished() && (!self.hold_on_finish || !input_open) {
                break;
            }
            if !queue_open && !input_open {
                break;
            }

            tokio::select! {
                command = rx.recv(), if queue_open => match command {
                    Some(command) => {
                        let mut applied = 1u64;
                        self.apply(command);
                        while let Some(next) = rx.try_recv() {
                            self.apply(next);
                            applied += 1;
                        }
                        if applied > 1 {
                            trace!(batches = applied, "Coalesced redraw");
                            REDRAWS_COALESCED.inc_by(applied - 1);
                        }
                    }
                    None => {
                        queue_open = false;
                        self.view.finish();
                    }
                },
                event = input.next(), if input_open => match event {
                    Some(Ok(Event::Key(key))) => self.view.handle_key(key),
                    Some(Ok(Event::Resize(..))) => self.view.mark_dirty(),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(ProgressError::Terminal(e.to_string())),
                    None => input_open = false,
                },
            }
        }

        Ok(self.view)
    }

    fn apply(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Status(status) => {
                let report = self.view.on_batch(&status);
                if report.new_warnings > 0 {
                    self.warnings.sync(self.view.warnings());
                }
            }
            SessionCommand::Finish => self.view.finish(),
        }
    }

    fn draw_if_dirty(&mut self) -> Result<(), ProgressError> {
        if !self.view.take_dirty() {
            return Ok(());
        }
        let _timer = HistogramTimer::new(&REDRAW_DURATION);
        let view = &self.view;
        self.terminal
            .draw(|frame| ui::render(frame, view))
            .map_err(render_error)?;
        REDRAWS.inc();
        Ok(())
    }
}

fn render_error(e: io::Error) -> ProgressError {
    ProgressError::Render(e.to_string())
}
