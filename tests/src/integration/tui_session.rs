//! # Interactive Display Flows
//!
//! Drives the UI loop and `TuiWriter` against a headless terminal.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::stream;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::style::Color;
    use ratatui::Terminal;

    use progress_aggregator::{ProgressConfig, VertexState};
    use progress_tui::{ui, ProgressView, TuiWriter, UiLoop};
    use progress_types::VertexId;
    use progress_writer::{session_channel, ProgressError, ProgressWriter, WarningLog};

    use crate::integration::fixtures::build_sequence;

    fn screen(view: &ProgressView) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| ui::render(frame, view)).unwrap();
        terminal.backend().buffer().clone()
    }

    /// Cell position of the first occurrence of `needle`.
    fn find(buffer: &Buffer, needle: &str) -> Option<(u16, u16)> {
        (0..buffer.area.height).find_map(|y| {
            let row: String = (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect();
            let byte = row.find(needle)?;
            Some((row[..byte].chars().count() as u16, y))
        })
    }

    async fn run_sequence() -> ProgressView {
        let (tx, rx) = session_channel();
        let terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let view = ProgressView::new(ProgressConfig::default());
        let ui_loop = UiLoop::new(terminal, view, WarningLog::new(), false);

        for batch in build_sequence() {
            tx.send_status(batch);
        }
        tx.finish();
        ui_loop.run(rx, stream::pending()).await.unwrap()
    }

    #[tokio::test]
    async fn test_tree_follows_first_seen_order() {
        let view = run_sequence().await;
        let labels: Vec<_> = view
            .tree()
            .nodes()
            .iter()
            .map(|n| (n.label.as_str(), n.state))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("CACHED [internal] load definition", VertexState::Completed),
                ("compile", VertexState::Completed),
                ("link", VertexState::Errored),
            ]
        );
    }

    #[tokio::test]
    async fn test_final_screen() {
        let mut view = run_sequence().await;
        let compile = VertexId::of("compile");
        assert!(view.select_vertex(&compile));
        assert_eq!(view.detail().text, "abc");

        let buffer = screen(&view);
        assert!(find(&buffer, "3 steps").is_some());
        assert!(find(&buffer, "1 failed").is_some());
        assert!(find(&buffer, "FINISHED").is_some());
        assert!(find(&buffer, "WARNING: unpinned base image").is_some());

        let (x, y) = find(&buffer, "└─ link").unwrap();
        assert_eq!(buffer[(x + 3, y)].fg, Color::Red);
    }

    #[tokio::test]
    async fn test_writer_contract_with_concurrent_producers() {
        let terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let writer = Arc::new(TuiWriter::with_backend(
            terminal,
            stream::pending(),
            ProgressConfig::default(),
        ));

        let mut producers = Vec::new();
        for batch in build_sequence() {
            let writer = Arc::clone(&writer);
            producers.push(tokio::spawn(async move { writer.write(batch) }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        writer.wait().await.unwrap();
        assert_eq!(writer.warnings().len(), 1);
        assert_eq!(writer.wait().await, Err(ProgressError::AlreadyWaited));

        // Late writes are dropped without error.
        writer.write(build_sequence().remove(0));
    }
}
