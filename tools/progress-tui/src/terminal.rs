//! Terminal setup and restore.

use std::io::{self, Stdout};
use std::sync::Once;

use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use progress_writer::ProgressError;

pub type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

static PANIC_HOOK: Once = Once::new();

fn terminal_error(e: io::Error) -> ProgressError {
    ProgressError::Terminal(e.to_string())
}

/// Enter raw mode and the alternate screen.
pub fn setup() -> Result<CrosstermTerminal, ProgressError> {
    install_panic_hook();

    enable_raw_mode().map_err(terminal_error)?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(terminal_error(e));
    }
    Terminal::new(CrosstermBackend::new(stdout)).map_err(terminal_error)
}

/// Leave the alternate screen and raw mode.
pub fn restore() -> Result<(), ProgressError> {
    disable_raw_mode().map_err(terminal_error)?;
    execute!(io::stdout(), LeaveAlternateScreen, Show).map_err(terminal_error)
}

/// Restore the terminal before the default panic output is printed.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
            original_hook(info);
        }));
    });
}
