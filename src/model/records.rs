//! Record types flowing through the pipeline.
//!
//! `LineRecord` and `OutlineEntry` are produced once per extraction
//! pass and never mutated; `MatchedOutlineEntry` and `ContentSection`
//! are recomputed in full whenever their inputs change.

use serde::{Deserialize, Serialize};

use super::DocumentId;

/// A position inside a document: the ordering key for all
/// segmentation logic. Lexicographic over `(page, line)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinePos {
    /// 1-based page number.
    pub page: i32,
    /// 1-based line position within the page.
    pub line: i32,
}

impl LinePos {
    /// Create a position.
    pub fn new(page: i32, line: i32) -> Self {
        Self { page, line }
    }
}

/// One normalized text line of a document.
///
/// `line_number` counts every raw line consumed on the page, including
/// lines later dropped as empty, so positions stay comparable with
/// independent re-derivations of line position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRecord {
    /// Owning document.
    pub document_id: DocumentId,
    /// 1-based page number.
    pub page_number: i32,
    /// 1-based raw-line position within the page.
    pub line_number: i32,
    /// Normalized line text (never empty).
    pub text: String,
}

impl LineRecord {
    /// Position key of this line.
    pub fn pos(&self) -> LinePos {
        LinePos::new(self.page_number, self.line_number)
    }
}

/// A bookmark entry retained at the configured target depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Owning document.
    pub document_id: DocumentId,
    /// Normalized section title.
    pub title: String,
    /// 1-based page the title is reported on, page offset already applied.
    pub page: i32,
    /// Bookmark nesting level.
    pub depth: i32,
}

/// An [`OutlineEntry`] located (or not) inside the line stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedOutlineEntry {
    /// The outline entry being located.
    pub entry: OutlineEntry,
    /// Position of the matching line on the target page; `None` when no
    /// page line contains the title. Not an error.
    pub line_number: Option<i32>,
    /// Raw text of the matched line, when one was found.
    pub matched_text: Option<String>,
}

impl MatchedOutlineEntry {
    /// Section start position, falling back to the top of the page when
    /// the title was never located.
    pub fn start_pos(&self) -> LinePos {
        LinePos::new(self.entry.page, self.line_number.unwrap_or(1))
    }
}

/// A titled, contiguous span of a document's body text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSection {
    /// Owning document.
    pub document_id: DocumentId,
    /// Section title.
    pub title: String,
    /// Page the section starts on.
    pub page_start: i32,
    /// Line the section starts at.
    pub line_start: i32,
    /// Page the section ends on (derived from the next entry, or
    /// `page_start + 1` for the final section of a document).
    pub page_end: i32,
    /// End line (exclusive); `None` means the whole end page is included.
    pub line_end: Option<i32>,
    /// Bookmark nesting level of the title.
    pub depth: i32,
    /// Ordered included line texts.
    pub content: Vec<String>,
}

impl ContentSection {
    /// Number of content lines. Zero is valid: two entries sharing a
    /// position produce an empty section that is still emitted.
    pub fn content_length(&self) -> i32 {
        self.content.len() as i32
    }

    /// Content joined with newlines, the form persisted in the section table.
    pub fn content_text(&self) -> String {
        self.content.join("\n")
    }

    /// Start position key.
    pub fn start_pos(&self) -> LinePos {
        LinePos::new(self.page_start, self.line_start)
    }
}
