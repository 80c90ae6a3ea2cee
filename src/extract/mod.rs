//! Document extraction: the PDF collaborator seam, line extraction,
//! and outline extraction.

mod lines;
mod outline;
mod pdf;
mod source;

pub use lines::LineExtractor;
pub use outline::OutlineExtractor;
pub use pdf::LopdfSource;
pub use source::DocumentSource;
