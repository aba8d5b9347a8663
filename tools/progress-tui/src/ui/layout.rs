//! Main layout orchestration.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  BUILD  4 steps  2 done  1 cached  1 failed          FINISHED   │
//! ├────────────────────────┬────────────────────────────────────────┤
//! │  STEPS                 │  SELECTED STEP LOGS                    │
//! │  ...                   │  ...                                   │
//! ├────────────────────────┴────────────────────────────────────────┤
//! │  WARNINGS (only when there are any)                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  [↑↓] Select  [PgUp/PgDn] Scroll  [Q] Quit  [?] Help            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{ProgressView, ViewMode};

use super::{log_panel, tree_panel, widgets};

/// Most warnings shown at once in the strip.
const WARNING_LINES: usize = 3;

/// Render the entire UI.
pub fn render(frame: &mut Frame, view: &ProgressView) {
    let warnings = view.warnings().len().min(WARNING_LINES) as u16;
    let warnings_height = if warnings > 0 { warnings + 2 } else { 0 };

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),               // Header
            Constraint::Min(5),                  // Body
            Constraint::Length(warnings_height), // Warnings
            Constraint::Length(3),               // Footer (keybinds)
        ])
        .split(frame.area());

    render_header(frame, main_chunks[0], view);
    render_body(frame, main_chunks[1], view);
    if warnings_height > 0 {
        render_warnings(frame, main_chunks[2], view);
    }
    render_footer(frame, main_chunks[3]);

    if view.mode() == ViewMode::Help {
        widgets::render_help_overlay(frame);
    }
}

fn render_header(frame: &mut Frame, area: Rect, view: &ProgressView) {
    let counts = view.aggregator().counts();

    let mut spans = vec![
        Span::styled(
            " BUILD ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} steps ", counts.total())),
        Span::styled(
            format!(" {} done ", counts.completed),
            Style::default().fg(Color::Blue),
        ),
        Span::styled(
            format!(" {} cached ", counts.cached),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if counts.errored > 0 {
        spans.push(Span::styled(
            format!(" {} failed ", counts.errored),
            Style::default().fg(Color::Red),
        ));
    }

    let status = if view.is_finished() {
        Span::styled(
            " FINISHED ",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" RUNNING ", Style::default().fg(Color::Yellow))
    };

    let used: usize = spans.iter().map(|s| s.width()).sum::<usize>() + status.width();
    let padding = (area.width as usize).saturating_sub(used + 2);
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(status);

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, area);
}

fn render_body(frame: &mut Frame, area: Rect, view: &ProgressView) {
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    tree_panel::render(frame, body_chunks[0], view);
    log_panel::render(frame, body_chunks[1], view);
}

fn render_warnings(frame: &mut Frame, area: Rect, view: &ProgressView) {
    let warnings = view.warnings();
    let skip = warnings.len().saturating_sub(WARNING_LINES);
    let lines: Vec<Line> = warnings
        .iter()
        .skip(skip)
        .map(|w| {
            Line::from(vec![
                Span::styled("WARNING: ", Style::default().fg(Color::Yellow)),
                Span::raw(w.short.as_str()),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" WARNINGS ({}) ", warnings.len()))
            .title_style(Style::default().fg(Color::Yellow))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let keybinds = vec![
        Span::styled("[↑↓]", Style::default().fg(Color::Yellow)),
        Span::raw(" Select  "),
        Span::styled("[Home/End]", Style::default().fg(Color::Yellow)),
        Span::raw(" Jump  "),
        Span::styled("[PgUp/PgDn]", Style::default().fg(Color::Yellow)),
        Span::raw(" Scroll  "),
        Span::styled("[Q]", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit  "),
        Span::styled("[?]", Style::default().fg(Color::Yellow)),
        Span::raw(" Help"),
    ];

    let footer = Paragraph::new(Line::from(keybinds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .centered();
    frame.render_widget(footer, area);
}
