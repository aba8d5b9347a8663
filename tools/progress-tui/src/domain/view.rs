//! View state owned by the UI loop.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use progress_aggregator::{Aggregator, IngestReport, ProgressConfig, Snapshot, VertexState};
use progress_telemetry::{LOG_BYTES_APPENDED, VERTICES_CREATED};
use progress_types::{SolveStatus, VertexId, VertexWarning};

use super::tree::{VertexTree, ROOT_LABEL};

/// Lines moved by one PageUp/PageDown.
const PAGE: u16 = 10;

/// Current screen mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Tree and log pane.
    #[default]
    Tree,
    /// Help overlay.
    Help,
    /// Operator asked to leave.
    Quit,
}

/// Contents of the log pane for the selected node.
///
/// Rebuilt from a snapshot whenever the selection or the selected vertex
/// changes; never edited piecemeal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPane {
    pub title: String,
    pub state: Option<VertexState>,
    /// Error, timing and progress counters.
    pub summary: Vec<String>,
    pub text: String,
}

impl DetailPane {
    fn root(placeholder: &str) -> Self {
        Self {
            title: ROOT_LABEL.to_string(),
            state: None,
            summary: Vec::new(),
            text: placeholder.to_string(),
        }
    }

    fn from_snapshot(snapshot: Snapshot<'_>, placeholder: &str) -> Self {
        let Some(record) = snapshot.record() else {
            return Self::root(placeholder);
        };

        let mut summary = Vec::new();
        if let Some(error) = record.error() {
            summary.push(format!("error: {}", error));
        }
        if let Some(d) = record.duration() {
            summary.push(format!("took {:.1}s", d.num_milliseconds() as f64 / 1000.0));
        }
        for progress in record.progress() {
            let name = if progress.name.is_empty() {
                "progress"
            } else {
                progress.name.as_str()
            };
            if progress.total > 0 {
                summary.push(format!("{} {}/{}", name, progress.current, progress.total));
            } else {
                summary.push(format!("{} {}", name, progress.current));
            }
        }

        Self {
            title: record.label().to_string(),
            state: Some(record.state()),
            summary,
            text: snapshot.log_text_or(placeholder),
        }
    }
}

/// Everything the renderer reads. Owned by exactly one task.
pub struct ProgressView {
    aggregator: Aggregator,
    tree: VertexTree,
    /// 0 is the root; `n` is `tree.nodes()[n - 1]`.
    cursor: usize,
    detail: DetailPane,
    /// `None` follows the end of the log.
    log_scroll: Option<u16>,
    mode: ViewMode,
    finished: bool,
    dirty: bool,
}

impl ProgressView {
    pub fn new(config: ProgressConfig) -> Self {
        let detail = DetailPane::root(&config.log_placeholder);
        Self {
            aggregator: Aggregator::new(config),
            tree: VertexTree::new(),
            cursor: 0,
            detail,
            log_scroll: None,
            mode: ViewMode::Tree,
            finished: false,
            dirty: true,
        }
    }

    /// Ingest a batch and update the tree and, if affected, the detail pane.
    pub fn on_batch(&mut self, status: &SolveStatus) -> IngestReport {
        let report = self.aggregator.ingest(status);
        if report.is_noop() {
            return report;
        }

        VERTICES_CREATED.inc_by(report.created.len() as u64);
        LOG_BYTES_APPENDED.inc_by(report.appended.iter().map(|a| a.range.len() as u64).sum());

        self.tree.apply(&report, &self.aggregator);

        if let Some(selected) = self.selected_vertex() {
            let touched = report.updated.contains(&selected)
                || report.created.contains(&selected)
                || report.appended.iter().any(|a| a.vertex == selected);
            if touched {
                self.refresh_detail();
            }
        }

        self.dirty = true;
        report
    }

    /// The build reported completion.
    pub fn finish(&mut self) {
        self.finished = true;
        self.dirty = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;

        match self.mode {
            ViewMode::Help => self.mode = ViewMode::Tree,
            ViewMode::Quit => {}
            ViewMode::Tree => match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    self.mode = ViewMode::Quit
                }
                KeyCode::Char('?') => self.mode = ViewMode::Help,
                KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
                KeyCode::Down | KeyCode::Char('j') => self.select_next(),
                KeyCode::Home => self.select(0),
                KeyCode::End => self.select(self.tree.len()),
                KeyCode::PageUp => self.scroll_up(PAGE),
                KeyCode::PageDown => self.scroll_down(PAGE),
                _ => {}
            },
        }
    }

    /// Move the cursor to `cursor` (0 = root) and rebuild the detail pane.
    pub fn select(&mut self, cursor: usize) {
        let cursor = cursor.min(self.tree.len());
        if cursor != self.cursor {
            self.cursor = cursor;
            self.log_scroll = None;
        }
        self.refresh_detail();
        self.dirty = true;
    }

    pub fn select_prev(&mut self) {
        self.select(self.cursor.saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        self.select(self.cursor + 1);
    }

    /// Select a vertex by id. Returns false if it is not in the tree.
    pub fn select_vertex(&mut self, id: &VertexId) -> bool {
        match self.tree.position(id) {
            Some(pos) => {
                self.select(pos + 1);
                true
            }
            None => false,
        }
    }

    fn scroll_up(&mut self, lines: u16) {
        let max = self.max_scroll();
        let current = self.log_scroll.unwrap_or(max);
        self.log_scroll = Some(current.saturating_sub(lines));
    }

    fn scroll_down(&mut self, lines: u16) {
        let Some(current) = self.log_scroll else {
            return;
        };
        let next = current.saturating_add(lines);
        self.log_scroll = if next >= self.max_scroll() {
            None
        } else {
            Some(next)
        };
    }

    fn max_scroll(&self) -> u16 {
        let lines = self.detail.text.lines().count();
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    fn refresh_detail(&mut self) {
        let placeholder = &self.aggregator.config().log_placeholder;
        self.detail = match self.selected_vertex() {
            Some(id) => DetailPane::from_snapshot(self.aggregator.snapshot(&id), placeholder),
            None => DetailPane::root(placeholder),
        };
    }

    pub fn selected_vertex(&self) -> Option<VertexId> {
        self.cursor
            .checked_sub(1)
            .and_then(|pos| self.tree.get(pos))
            .map(|node| node.id)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn tree(&self) -> &VertexTree {
        &self.tree
    }

    pub fn detail(&self) -> &DetailPane {
        &self.detail
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn warnings(&self) -> &[VertexWarning] {
        self.aggregator.warnings()
    }

    pub fn log_scroll(&self) -> Option<u16> {
        self.log_scroll
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn should_quit(&self) -> bool {
        self.mode == ViewMode::Quit
    }

    /// Force a redraw on the next pass.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// True if something changed since the last draw; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
