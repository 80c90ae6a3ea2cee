//! Abstract interface for document access.
//!
//! Isolates the concrete PDF library from the alignment and
//! segmentation logic: the pipeline only ever sees page text blocks,
//! a bookmark tree, and a page-reference resolution capability.

use crate::error::Result;
use crate::model::OutlineNode;

/// Abstract source of a document's two structural views: the per-page
/// raw text stream and the bookmark tree.
pub trait DocumentSource {
    /// Number of physical pages.
    fn page_count(&self) -> u32;

    /// Raw extracted text for a 1-based page number.
    ///
    /// `Ok(None)` means the page yields no text; such pages are skipped
    /// and contribute no line records.
    fn page_text(&self, page_number: u32) -> Result<Option<String>>;

    /// The document's bookmark tree, or `None` when it has none.
    fn outline(&self) -> Result<Option<OutlineNode>>;

    /// Resolve an indirect page reference to a 1-based physical page number.
    fn resolve_page(&self, reference: &str) -> Result<u32>;
}
