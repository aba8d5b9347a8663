//! Vertex tree shown in the left panel.

use std::collections::HashMap;

use progress_aggregator::{Aggregator, IngestReport, VertexState};
use progress_types::VertexId;

/// Label of the synthetic root.
pub const ROOT_LABEL: &str = ".";

/// One displayed vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: VertexId,
    pub label: String,
    pub state: VertexState,
}

/// Flat list of children under a single root.
///
/// Nodes are only ever appended or updated in place.
#[derive(Debug, Clone, Default)]
pub struct VertexTree {
    nodes: Vec<TreeNode>,
    index: HashMap<VertexId, usize>,
}

impl VertexTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project what a batch changed onto the tree.
    pub fn apply(&mut self, report: &IngestReport, aggregator: &Aggregator) {
        for id in &report.created {
            if self.index.contains_key(id) {
                continue;
            }
            if let Some(record) = aggregator.get(id) {
                self.index.insert(*id, self.nodes.len());
                self.nodes.push(TreeNode {
                    id: *id,
                    label: record.label().to_string(),
                    state: record.state(),
                });
            }
        }

        let touched = report
            .updated
            .iter()
            .chain(report.cached.iter())
            .chain(report.transitions.iter().map(|t| &t.vertex));
        for id in touched {
            let (Some(&pos), Some(record)) = (self.index.get(id), aggregator.get(id)) else {
                continue;
            };
            let node = &mut self.nodes[pos];
            node.label.clear();
            node.label.push_str(record.label());
            node.state = record.state();
        }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn get(&self, pos: usize) -> Option<&TreeNode> {
        self.nodes.get(pos)
    }

    pub fn position(&self, id: &VertexId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
