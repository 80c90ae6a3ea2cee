//! # seccion
//!
//! Batch conversion of weakly-structured procurement PDFs into a
//! structured, queryable corpus of titled content sections.
//!
//! Each document exposes two independent, imperfect views of its own
//! structure: an embedded bookmark tree (titles and approximate pages)
//! and a linear stream of extracted text lines per page. This crate
//! reconciles the two — it locates each bookmark title inside the noisy
//! line stream, then carves the stream into ordered, non-overlapping
//! content sections with reproducible boundaries.
//!
//! ## Quick Start
//!
//! ```no_run
//! use seccion::{process_file, PipelineOptions};
//!
//! fn main() -> seccion::Result<()> {
//!     let tables = process_file("2021_5_401234.pdf", &PipelineOptions::new())?;
//!     for section in &tables.sections {
//!         println!("{} (p. {})", section.title, section.page_start);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Whole-directory batch runs go through [`PipelineContext`], which owns
//! the worker pools, flushes per-batch Parquet tables, and merges them
//! into the final corpus:
//!
//! ```no_run
//! use seccion::{PipelineContext, PipelineOptions};
//! use std::path::Path;
//!
//! fn main() -> seccion::Result<()> {
//!     let ctx = PipelineContext::new(PipelineOptions::new())?;
//!     let summary = ctx.run(Path::new("downloads/pdf/2021"), Path::new("out"))?;
//!     println!("{} sections", summary.merge.sections);
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod error;
pub mod extract;
pub mod matching;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod segment;
pub mod store;

// Re-export commonly used types
pub use assemble::{AssembledCorpus, CorpusAssembler};
pub use error::{Error, Result};
pub use extract::{DocumentSource, LineExtractor, LopdfSource, OutlineExtractor};
pub use model::{
    ContentSection, DocumentId, LinePos, LineRecord, MatchedOutlineEntry, OutlineEntry,
    OutlineNode, PageRef,
};
pub use pipeline::{
    process_source, DocumentTables, MergeSummary, PipelineContext, PipelineOptions, RunSummary,
};

use std::path::Path;

/// Process a single PDF file into its line, outline, and section tables.
///
/// The document identity is parsed from the filename stem, which must
/// follow the `{year}_{category_id}_{nro_licitacion}` pattern.
pub fn process_file<P: AsRef<Path>>(
    path: P,
    options: &PipelineOptions,
) -> Result<DocumentTables> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| Error::InvalidDocumentId(path.display().to_string()))?;
    let document_id = DocumentId::parse(&stem)?;

    let source = LopdfSource::open(path)?;
    process_source(&document_id, &source, options)
}

/// Process an already-opened document source under an explicit identity.
pub fn process_document(
    document_id: &DocumentId,
    source: &dyn DocumentSource,
    options: &PipelineOptions,
) -> Result<DocumentTables> {
    process_source(document_id, source, options)
}
