//! Display-side models: the vertex tree and the view state around it.

mod tree;
mod view;

pub use tree::{TreeNode, VertexTree, ROOT_LABEL};
pub use view::{DetailPane, ProgressView, ViewMode};
