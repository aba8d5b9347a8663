//! Right panel: logs of the selected node.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::ProgressView;

use super::state_color;

/// Render the detail pane.
pub fn render(frame: &mut Frame, area: Rect, view: &ProgressView) {
    let detail = view.detail();

    let title_style = match detail.state {
        Some(state) => Style::default().fg(state_color(state)),
        None => Style::default().fg(Color::Cyan),
    };
    let mut title = vec![Span::styled(
        format!(" {} ", detail.title),
        title_style.add_modifier(Modifier::BOLD),
    )];
    if let Some(state) = detail.state {
        title.push(Span::styled(
            format!("[{}] ", state.label()),
            Style::default().fg(state_color(state)),
        ));
    }

    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let summary_height = detail.summary.len().min(4) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(summary_height), Constraint::Min(1)])
        .split(inner);

    if summary_height > 0 {
        let lines: Vec<Line> = detail
            .summary
            .iter()
            .map(|s| Line::from(Span::styled(s.as_str(), Style::default().fg(Color::DarkGray))))
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[0]);
    }

    let logs = chunks[1];
    let line_count = u16::try_from(detail.text.lines().count()).unwrap_or(u16::MAX);
    let offset = view
        .log_scroll()
        .unwrap_or_else(|| line_count.saturating_sub(logs.height));

    let paragraph = Paragraph::new(detail.text.as_str())
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, logs);
}
