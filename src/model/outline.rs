//! Bookmark tree model.

use serde::{Deserialize, Serialize};

/// A node in a document's bookmark tree.
///
/// Bookmark metadata arrives as arbitrarily nested lists of entries of
/// varying shape; modeling it as a tagged variant makes the two cases
/// statically distinct and lets traversal thread an explicit depth
/// counter instead of inspecting shapes at each node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutlineNode {
    /// An ordered group of child nodes. Entering a branch increments
    /// the traversal depth.
    Branch(Vec<OutlineNode>),

    /// A titled bookmark pointing at a page.
    Leaf {
        /// Raw bookmark title as stored in the document.
        title: String,
        /// Target page, possibly still unresolved.
        page: PageRef,
    },
}

impl OutlineNode {
    /// Create a leaf node.
    pub fn leaf(title: impl Into<String>, page: PageRef) -> Self {
        OutlineNode::Leaf {
            title: title.into(),
            page,
        }
    }

    /// Total number of leaves under this node (including itself).
    pub fn leaf_count(&self) -> usize {
        match self {
            OutlineNode::Leaf { .. } => 1,
            OutlineNode::Branch(children) => children.iter().map(OutlineNode::leaf_count).sum(),
        }
    }
}

/// A bookmark's page target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageRef {
    /// Already a concrete 1-based physical page number.
    Physical(u32),

    /// An indirect destination that must be resolved through the
    /// document source (see `DocumentSource::resolve_page`).
    Indirect(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_count() {
        let tree = OutlineNode::Branch(vec![
            OutlineNode::leaf("Chapter 1", PageRef::Physical(1)),
            OutlineNode::Branch(vec![
                OutlineNode::leaf("Section 1.1", PageRef::Physical(2)),
                OutlineNode::leaf("Section 1.2", PageRef::Indirect("dest-7".into())),
            ]),
        ]);
        assert_eq!(tree.leaf_count(), 3);
    }
}
