//! # Replay Flows
//!
//! The same batch sequence must produce the same state no matter how it
//! reaches an aggregator: directly, twice over, or through the JSON writer
//! and back.

#[cfg(test)]
mod tests {
    use progress_aggregator::{Aggregator, ProgressConfig, VertexState};
    use progress_types::{SolveStatus, VertexId};
    use progress_writer::{JsonWriter, PlainWriter, ProgressWriter};

    use crate::integration::fixtures::{build_sequence, SharedBuf};

    fn ingest_all(batches: &[SolveStatus]) -> Aggregator {
        let mut aggregator = Aggregator::default();
        for batch in batches {
            aggregator.ingest(batch);
        }
        aggregator
    }

    #[test]
    fn test_replay_is_deterministic() {
        let first = ingest_all(&build_sequence());
        let second = ingest_all(&build_sequence());
        assert_eq!(first, second);
    }

    #[test]
    fn test_reingesting_sequence_changes_nothing() {
        let batches = build_sequence();
        let once = ingest_all(&batches);

        let mut twice = once.clone();
        for batch in &batches {
            assert!(twice.ingest(batch).is_noop());
        }
        assert!(twice.same_state(&once));
        assert_eq!(
            twice.snapshot(&VertexId::of("compile")).log_text_or(""),
            "abc"
        );
    }

    #[test]
    fn test_final_states() {
        let aggregator = ingest_all(&build_sequence());
        let states: Vec<_> = aggregator.records().map(|r| r.state()).collect();
        assert_eq!(
            states,
            vec![
                VertexState::Completed,
                VertexState::Completed,
                VertexState::Errored
            ]
        );
        let counts = aggregator.counts();
        assert_eq!((counts.cached, counts.errored), (1, 1));
        assert_eq!(
            aggregator.get(&VertexId::of("link")).unwrap().error(),
            Some("exit code: 1")
        );
    }

    #[tokio::test]
    async fn test_json_writer_output_replays_to_same_state() {
        let out = SharedBuf::default();
        let writer = JsonWriter::new(out.clone());
        for batch in build_sequence() {
            writer.write(batch);
        }
        writer.wait().await.unwrap();

        let decoded: Vec<SolveStatus> = out
            .text()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(decoded, build_sequence());

        let replayed = ingest_all(&decoded);
        assert!(replayed.same_state(&ingest_all(&build_sequence())));
        assert_eq!(writer.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_plain_writer_transcript() {
        let out = SharedBuf::default();
        let writer = PlainWriter::new(out.clone(), ProgressConfig::default());
        for batch in build_sequence() {
            writer.write(batch);
        }
        // Duplicates of earlier batches print nothing.
        for batch in build_sequence() {
            writer.write(batch);
        }
        writer.wait().await.unwrap();

        assert_eq!(
            out.text(),
            "#1 CACHED [internal] load definition\n\
             #2 compile\n\
             #1 CACHED\n\
             #2 a\n\
             #2 b\n\
             #2 c\n\
             #2 DONE 4.0s\n\
             #3 link\n\
             #3 ERROR: exit code: 1\n\
             \n\
             1 warning(s) found:\n \
             - unpinned base image\n"
        );
    }
}
