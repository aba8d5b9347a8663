//! UI module - TUI rendering components.
//!
//! - `layout.rs`: header, body, warnings strip, footer
//! - `tree_panel.rs`: vertex tree under the root
//! - `log_panel.rs`: detail pane of the selected node
//! - `widgets/`: overlays

mod layout;
mod log_panel;
mod tree_panel;

pub mod widgets;

use progress_aggregator::VertexState;
use ratatui::style::Color;

pub use layout::render;

/// Foreground color for a vertex state. Error wins over completion.
pub fn state_color(state: VertexState) -> Color {
    match state {
        VertexState::Pending => Color::Reset,
        VertexState::Completed => Color::Blue,
        VertexState::Errored => Color::Red,
    }
}
