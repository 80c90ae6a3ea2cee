//! Outline extraction: depth-filtered traversal of the bookmark tree.

use crate::error::{Error, Result};
use crate::model::{DocumentId, OutlineEntry, OutlineNode, PageRef};
use crate::normalize::normalize;

use super::source::DocumentSource;

/// Walks a document's bookmark tree and emits the entries at the
/// configured target nesting depth.
#[derive(Debug, Clone)]
pub struct OutlineExtractor {
    /// Nesting depth whose entries become section titles.
    target_depth: i32,

    /// Offset added to the resolved physical page. The default `+1`
    /// compensates for a cover page not represented in the bookmark's
    /// own page index.
    page_offset: i32,
}

impl OutlineExtractor {
    /// Create an extractor with the corpus defaults (depth 2, offset +1).
    pub fn new() -> Self {
        Self {
            target_depth: 2,
            page_offset: 1,
        }
    }

    /// Set the target nesting depth.
    pub fn with_target_depth(mut self, depth: i32) -> Self {
        self.target_depth = depth;
        self
    }

    /// Set the page offset applied to resolved pages.
    pub fn with_page_offset(mut self, offset: i32) -> Self {
        self.page_offset = offset;
        self
    }

    /// Extract the target-depth entries of a document's outline.
    ///
    /// A document with no bookmark tree yields an empty sequence.
    /// Per-leaf resolution failures are logged and skipped; the rest of
    /// the tree continues to be walked.
    pub fn extract(
        &self,
        document_id: &DocumentId,
        source: &dyn DocumentSource,
    ) -> Result<Vec<OutlineEntry>> {
        let Some(tree) = source.outline()? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        self.walk(&tree, 0, document_id, source, &mut entries);
        Ok(entries)
    }

    fn walk(
        &self,
        node: &OutlineNode,
        depth: i32,
        document_id: &DocumentId,
        source: &dyn DocumentSource,
        entries: &mut Vec<OutlineEntry>,
    ) {
        match node {
            OutlineNode::Branch(children) => {
                for child in children {
                    self.walk(child, depth + 1, document_id, source, entries);
                }
            }
            OutlineNode::Leaf { title, page } => {
                if depth != self.target_depth {
                    return;
                }
                match self.resolve(page, source) {
                    Ok(physical) => entries.push(OutlineEntry {
                        document_id: document_id.clone(),
                        title: normalize(title),
                        page: physical + self.page_offset,
                        depth,
                    }),
                    Err(e) => {
                        log::warn!("{document_id}: skipping outline entry {title:?}: {e}");
                    }
                }
            }
        }
    }

    fn resolve(&self, page: &PageRef, source: &dyn DocumentSource) -> Result<i32> {
        match page {
            PageRef::Physical(n) => Ok(*n as i32),
            PageRef::Indirect(reference) if reference.is_empty() => Err(Error::extraction(
                reference,
                "outline entry has no destination",
            )),
            PageRef::Indirect(reference) => Ok(source.resolve_page(reference)? as i32),
        }
    }
}

impl Default for OutlineExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StubSource {
        tree: Option<OutlineNode>,
        destinations: HashMap<String, u32>,
    }

    impl DocumentSource for StubSource {
        fn page_count(&self) -> u32 {
            0
        }

        fn page_text(&self, _page_number: u32) -> Result<Option<String>> {
            Ok(None)
        }

        fn outline(&self) -> Result<Option<OutlineNode>> {
            Ok(self.tree.clone())
        }

        fn resolve_page(&self, reference: &str) -> Result<u32> {
            self.destinations
                .get(reference)
                .copied()
                .ok_or_else(|| Error::extraction(reference, "unknown destination"))
        }
    }

    fn doc() -> DocumentId {
        DocumentId::parse("2021_5_401234").unwrap()
    }

    fn sample_tree() -> OutlineNode {
        // Top-level entries sit at depth 1; their children at depth 2.
        OutlineNode::Branch(vec![
            OutlineNode::leaf("Parte 1", PageRef::Physical(1)),
            OutlineNode::Branch(vec![
                OutlineNode::leaf("Datos del Contacto", PageRef::Physical(3)),
                OutlineNode::leaf("Suministros", PageRef::Indirect("d7".into())),
            ]),
            OutlineNode::leaf("Parte 2", PageRef::Physical(10)),
        ])
    }

    #[test]
    fn test_only_target_depth_retained() {
        let source = StubSource {
            tree: Some(sample_tree()),
            destinations: HashMap::from([("d7".to_string(), 7)]),
        };
        let entries = OutlineExtractor::new().extract(&doc(), &source).unwrap();

        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Datos del Contacto", "Suministros"]);
        assert!(entries.iter().all(|e| e.depth == 2));
    }

    #[test]
    fn test_page_offset_applied_once() {
        let source = StubSource {
            tree: Some(sample_tree()),
            destinations: HashMap::from([("d7".to_string(), 7)]),
        };
        let entries = OutlineExtractor::new().extract(&doc(), &source).unwrap();

        assert_eq!(entries[0].page, 4); // physical 3 + 1
        assert_eq!(entries[1].page, 8); // resolved 7 + 1
    }

    #[test]
    fn test_unresolvable_leaf_skipped() {
        let source = StubSource {
            tree: Some(sample_tree()),
            destinations: HashMap::new(),
        };
        let entries = OutlineExtractor::new().extract(&doc(), &source).unwrap();

        // "Suministros" cannot be resolved and is dropped; the walk continues.
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Datos del Contacto");
    }

    #[test]
    fn test_no_outline_is_empty_not_error() {
        let source = StubSource {
            tree: None,
            destinations: HashMap::new(),
        };
        let entries = OutlineExtractor::new().extract(&doc(), &source).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_custom_depth() {
        let source = StubSource {
            tree: Some(sample_tree()),
            destinations: HashMap::new(),
        };
        let entries = OutlineExtractor::new()
            .with_target_depth(1)
            .extract(&doc(), &source)
            .unwrap();
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Parte 1", "Parte 2"]);
    }
}
