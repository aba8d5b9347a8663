//! Help overlay widget.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::state_color;
use progress_aggregator::VertexState;

fn key_line(key: &'static str, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), Style::default().fg(Color::Yellow)),
        Span::raw(text),
    ])
}

fn state_line(state: VertexState, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {:<10}", state.label()),
            Style::default().fg(state_color(state)),
        ),
        Span::raw(text),
    ])
}

/// Render a centered help overlay.
pub fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(60, 70, frame.area());

    frame.render_widget(Clear, popup_area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled(
            "BUILD PROGRESS HELP",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled("Navigation", bold)),
        Line::raw(""),
        key_line("↑/↓", "Select previous / next step"),
        key_line("Home/End", "Jump to the root / last step"),
        key_line("PgUp/PgDn", "Scroll the log pane"),
        Line::raw(""),
        Line::from(Span::styled("Actions", bold)),
        Line::raw(""),
        key_line("Q, Esc", "Quit"),
        key_line("?", "Toggle this help"),
        Line::raw(""),
        Line::from(Span::styled("Step States", bold)),
        Line::raw(""),
        state_line(VertexState::Pending, "Not finished yet"),
        state_line(VertexState::Completed, "Finished, or reused from cache"),
        state_line(VertexState::Errored, "Failed"),
        Line::raw(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(help_text).block(
        Block::default()
            .title(" Help ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(paragraph, popup_area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);

    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
