//! Left panel: the vertex tree.
//!
//! ```text
//! ┌ STEPS ───────────────────────┐
//! │ .                            │
//! │ ├─ load build definition     │
//! │ ├─ CACHED COPY . /src        │
//! │ └─ RUN make                  │
//! └──────────────────────────────┘
//! ```

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::domain::{ProgressView, ROOT_LABEL};

use super::state_color;

/// Render the tree panel.
pub fn render(frame: &mut Frame, area: Rect, view: &ProgressView) {
    let nodes = view.tree().nodes();
    let last = nodes.len().saturating_sub(1);

    let mut items = Vec::with_capacity(nodes.len() + 1);
    items.push(ListItem::new(Line::from(Span::styled(
        ROOT_LABEL,
        Style::default().fg(Color::Cyan),
    ))));
    items.extend(nodes.iter().enumerate().map(|(i, node)| {
        let branch = if i == last { "└─ " } else { "├─ " };
        ListItem::new(Line::from(vec![
            Span::styled(branch, Style::default().fg(Color::DarkGray)),
            Span::styled(node.label.as_str(), Style::default().fg(state_color(node.state))),
        ]))
    }));

    let list = List::new(items)
        .block(
            Block::default()
                .title(" STEPS ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = ListState::default().with_selected(Some(view.cursor()));
    frame.render_stateful_widget(list, area, &mut state);
}
