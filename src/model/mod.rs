//! Data model for the section corpus.

mod document;
mod outline;
mod records;

pub use document::DocumentId;
pub use outline::{OutlineNode, PageRef};
pub use records::{ContentSection, LinePos, LineRecord, MatchedOutlineEntry, OutlineEntry};
