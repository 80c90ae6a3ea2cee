//! Batch orchestration: worker pools, per-document timeouts, batch
//! flushing, and the final schema-checked merge.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::unbounded;
use serde::Serialize;

use crate::assemble::CorpusAssembler;
use crate::error::{Error, Result};
use crate::extract::{DocumentSource, LineExtractor, LopdfSource, OutlineExtractor};
use crate::matching::locate_titles;
use crate::model::{ContentSection, DocumentId, LineRecord, MatchedOutlineEntry};
use crate::segment::segment_document;
use crate::store;

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Bookmark nesting depth treated as section titles.
    pub target_depth: i32,

    /// Offset added to resolved bookmark pages.
    pub page_offset: i32,

    /// Time bound for one document's extraction.
    pub timeout: Duration,

    /// Number of documents per batch; each batch is flushed to columnar
    /// storage before the next starts, capping peak memory.
    pub batch_size: usize,

    /// CPU-bound worker threads (0 = one per available core).
    pub cpu_threads: usize,

    /// IO-bound worker threads (0 = two per available core).
    pub io_threads: usize,
}

impl PipelineOptions {
    /// Create options with the corpus defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target outline depth.
    pub fn with_target_depth(mut self, depth: i32) -> Self {
        self.target_depth = depth;
        self
    }

    /// Set the page offset.
    pub fn with_page_offset(mut self, offset: i32) -> Self {
        self.page_offset = offset;
        self
    }

    /// Set the per-document timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set worker pool sizes.
    pub fn with_threads(mut self, cpu: usize, io: usize) -> Self {
        self.cpu_threads = cpu;
        self.io_threads = io;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target_depth: 2,
            page_offset: 1,
            timeout: Duration::from_secs(60),
            batch_size: 10,
            cpu_threads: 0,
            io_threads: 0,
        }
    }
}

/// All derived tables for one document.
#[derive(Debug, Clone)]
pub struct DocumentTables {
    /// The document's identity.
    pub document_id: DocumentId,
    /// Ordered line records.
    pub lines: Vec<LineRecord>,
    /// Matched outline entries.
    pub outline: Vec<MatchedOutlineEntry>,
    /// Titled content sections.
    pub sections: Vec<ContentSection>,
}

/// Extract, match, and segment one document.
///
/// The steps run as one sequential unit so the `(page, line)` ordering
/// invariant the segmenter relies on is never interleaved away.
pub fn process_source(
    document_id: &DocumentId,
    source: &dyn DocumentSource,
    options: &PipelineOptions,
) -> Result<DocumentTables> {
    let lines = LineExtractor::new().extract(document_id, source)?;
    let entries = OutlineExtractor::new()
        .with_target_depth(options.target_depth)
        .with_page_offset(options.page_offset)
        .extract(document_id, source)?;
    let outline = locate_titles(entries, &lines);
    let sections = segment_document(outline.clone(), &lines);

    Ok(DocumentTables {
        document_id: document_id.clone(),
        lines,
        outline,
        sections,
    })
}

/// Counters and timestamps for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Documents discovered under the input directory.
    pub documents_found: usize,
    /// Documents fully processed.
    pub documents_processed: usize,
    /// Documents skipped after an extraction failure.
    pub documents_failed: usize,
    /// Documents abandoned on timeout.
    pub documents_timed_out: usize,
    /// Files whose names do not parse as a document identity.
    pub invalid_ids_skipped: usize,
    /// Batches flushed to storage.
    pub batches_flushed: usize,
    /// Totals over the merged output.
    pub merge: MergeSummary,
    /// Run start time.
    pub started_at: DateTime<Utc>,
    /// Run finish time.
    pub finished_at: DateTime<Utc>,
}

/// Row counts of the merged output tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeSummary {
    /// Rows in the merged line table.
    pub line_records: usize,
    /// Rows in the merged matched-outline table.
    pub outline_entries: usize,
    /// Sections in the canonical corpus.
    pub sections: usize,
    /// Sections parked in the empty-section side table.
    pub empty_sections: usize,
}

/// Owns the worker pools for one run.
///
/// Lifecycle is explicit: construct at run start, pass by reference into
/// the stages, drop when the run ends. No process-wide singletons.
pub struct PipelineContext {
    options: PipelineOptions,
    cpu_pool: Arc<rayon::ThreadPool>,
    io_pool: Arc<rayon::ThreadPool>,
}

impl PipelineContext {
    /// Build the worker pools for a run.
    pub fn new(options: PipelineOptions) -> Result<Self> {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let cpu_threads = if options.cpu_threads > 0 {
            options.cpu_threads
        } else {
            cores
        };
        let io_threads = if options.io_threads > 0 {
            options.io_threads
        } else {
            cores * 2
        };

        let cpu_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cpu_threads)
            .thread_name(|i| format!("seccion-cpu-{i}"))
            .build()
            .map_err(|e| Error::Other(e.to_string()))?;
        let io_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(io_threads)
            .thread_name(|i| format!("seccion-io-{i}"))
            .build()
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            options,
            cpu_pool: Arc::new(cpu_pool),
            io_pool: Arc::new(io_pool),
        })
    }

    /// The options this context was built with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process every document under `input_dir` into per-batch Parquet
    /// tables in `output_dir`, then merge them into the final corpus.
    ///
    /// Per-document failures and timeouts are logged and skipped; only a
    /// merge-time schema mismatch halts the run. Already-flushed batches
    /// stay valid if the run is cut short.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<RunSummary> {
        let started_at = Utc::now();
        std::fs::create_dir_all(output_dir)?;

        let files = collect_pdf_files(input_dir)?;
        log::info!("Found {} PDF files under {}", files.len(), input_dir.display());

        let mut summary = RunSummary {
            documents_found: files.len(),
            documents_processed: 0,
            documents_failed: 0,
            documents_timed_out: 0,
            invalid_ids_skipped: 0,
            batches_flushed: 0,
            merge: MergeSummary::default(),
            started_at,
            finished_at: started_at,
        };

        for (batch_index, chunk) in files.chunks(self.options.batch_size).enumerate() {
            let outputs = self.process_batch(chunk, &mut summary);
            if outputs.is_empty() {
                continue;
            }
            flush_batch(output_dir, batch_index, &outputs)?;
            summary.batches_flushed += 1;
        }

        summary.merge = merge_output_dir(output_dir)?;
        summary.finished_at = Utc::now();
        log::info!(
            "Run complete: {} processed, {} failed, {} timed out, {} sections",
            summary.documents_processed,
            summary.documents_failed,
            summary.documents_timed_out,
            summary.merge.sections
        );
        Ok(summary)
    }

    /// Process one batch of files across the worker pools.
    ///
    /// File reads go to the IO pool, parsing and segmentation to the CPU
    /// pool; results come back over a channel. A document whose result
    /// does not arrive within the timeout window is abandoned: its task
    /// keeps running but the late result is discarded, and it contributes
    /// zero records.
    fn process_batch(&self, files: &[PathBuf], summary: &mut RunSummary) -> Vec<DocumentTables> {
        let (tx, rx) = unbounded();
        let mut expected = 0usize;

        for path in files {
            let stem = match path.file_stem() {
                Some(stem) => stem.to_string_lossy().to_string(),
                None => continue,
            };
            let id = match DocumentId::parse(&stem) {
                Ok(id) => id,
                Err(_) => {
                    log::warn!("Skipping {}: not a document id", path.display());
                    summary.invalid_ids_skipped += 1;
                    continue;
                }
            };

            expected += 1;
            let tx = tx.clone();
            let path = path.clone();
            let options = self.options.clone();
            let cpu_pool = Arc::clone(&self.cpu_pool);

            self.io_pool.spawn(move || {
                let data = std::fs::read(&path);
                cpu_pool.spawn(move || {
                    let result = data.map_err(Error::from).and_then(|bytes| {
                        let source = LopdfSource::from_bytes(&bytes)?;
                        process_source(&id, &source, &options)
                    });
                    // The receiver may already have given up on us.
                    let _ = tx.send((id, result));
                });
            });
        }
        drop(tx);

        let mut outputs = Vec::with_capacity(expected);
        let mut received = 0usize;
        while received < expected {
            match rx.recv_timeout(self.options.timeout) {
                Ok((id, Ok(tables))) => {
                    log::debug!(
                        "{id}: {} lines, {} sections",
                        tables.lines.len(),
                        tables.sections.len()
                    );
                    outputs.push(tables);
                    summary.documents_processed += 1;
                }
                Ok((id, Err(e))) => {
                    log::error!("{id}: {e}");
                    summary.documents_failed += 1;
                }
                Err(_) => {
                    let abandoned = expected - received;
                    log::error!("Timed out waiting for {abandoned} document(s); abandoning batch remainder");
                    summary.documents_timed_out += abandoned;
                    break;
                }
            }
            received += 1;
        }

        outputs
    }
}

/// Merge all per-batch tables in `output_dir` into the final corpus
/// files, validating every batch file's schema first.
///
/// Batch files are left in place so an interrupted or repeated run can
/// re-merge without re-extracting.
pub fn merge_output_dir(output_dir: &Path) -> Result<MergeSummary> {
    let lines = store::merge_lines(&batch_files(output_dir, "lines_batch_")?)?;
    store::write_lines(output_dir.join("merged_lines.parquet"), &lines)?;

    let outlines = store::merge_matched_outlines(&batch_files(output_dir, "outlines_batch_")?)?;
    store::write_matched_outlines(output_dir.join("merged_outlines.parquet"), &outlines)?;

    let sections = store::merge_sections(&batch_files(output_dir, "sections_batch_")?)?;
    let corpus = CorpusAssembler::new().assemble(sections);
    store::write_sections(output_dir.join("content_sections.parquet"), &corpus.sections)?;
    store::write_sections(
        output_dir.join("empty_sections.parquet"),
        &corpus.empty_sections,
    )?;

    Ok(MergeSummary {
        line_records: lines.len(),
        outline_entries: outlines.len(),
        sections: corpus.sections.len(),
        empty_sections: corpus.empty_sections.len(),
    })
}

fn flush_batch(output_dir: &Path, index: usize, outputs: &[DocumentTables]) -> Result<()> {
    let lines: Vec<_> = outputs.iter().flat_map(|t| t.lines.iter().cloned()).collect();
    let outline: Vec<_> = outputs
        .iter()
        .flat_map(|t| t.outline.iter().cloned())
        .collect();
    let sections: Vec<_> = outputs
        .iter()
        .flat_map(|t| t.sections.iter().cloned())
        .collect();

    store::write_lines(output_dir.join(format!("lines_batch_{index}.parquet")), &lines)?;
    store::write_matched_outlines(
        output_dir.join(format!("outlines_batch_{index}.parquet")),
        &outline,
    )?;
    store::write_sections(
        output_dir.join(format!("sections_batch_{index}.parquet")),
        &sections,
    )?;

    log::info!(
        "Flushed batch {index}: {} lines, {} outline entries, {} sections",
        lines.len(),
        outline.len(),
        sections.len()
    );
    Ok(())
}

fn batch_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(prefix) && name.ends_with(".parquet") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Recursively collect `*.pdf` files, in stable path order.
fn collect_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    fn visit(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                visit(&path, out)?;
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    visit(dir, &mut files)?;
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = PipelineOptions::new()
            .with_target_depth(3)
            .with_page_offset(2)
            .with_batch_size(0)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(options.target_depth, 3);
        assert_eq!(options.page_offset, 2);
        assert_eq!(options.batch_size, 1); // clamped to at least one
        assert_eq!(options.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_context_pools_are_scoped_to_run() {
        let ctx = PipelineContext::new(PipelineOptions::new().with_threads(1, 1)).unwrap();
        assert_eq!(ctx.options().batch_size, 10);
        drop(ctx); // pools shut down with the context
    }

    #[test]
    fn test_collect_pdf_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("sub/a.PDF"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = collect_pdf_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.pdf"));
        assert!(files[1].ends_with("sub/a.PDF"));
    }

    #[test]
    fn test_empty_input_dir_runs_clean() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::new(PipelineOptions::new().with_threads(1, 1)).unwrap();

        let summary = ctx.run(input.path(), output.path()).unwrap();
        assert_eq!(summary.documents_found, 0);
        assert_eq!(summary.merge.sections, 0);
    }
}
