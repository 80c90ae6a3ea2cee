//! Corpus assembly: final cleanup and deduplication over merged
//! per-batch section tables.

use std::collections::HashSet;

use crate::model::ContentSection;
use crate::normalize::clean_punctuation;

/// Result of assembling the corpus.
#[derive(Debug, Default)]
pub struct AssembledCorpus {
    /// The canonical corpus: cleaned, deduplicated, non-empty sections.
    pub sections: Vec<ContentSection>,

    /// Sections whose content became empty after cleanup. Excluded from
    /// the canonical corpus but kept as an auditable side table, never
    /// silently discarded.
    pub empty_sections: Vec<ContentSection>,
}

/// Final cleanup pass over a merged corpus of content sections.
///
/// Applies, per section: the doubled-punctuation table to each content
/// line (never the lossy repeated-character collapse), then removal of
/// consecutive duplicate lines — a correction for overlapping text
/// layers that produce the same line twice. Duplicate sections sharing
/// `(document_id, page_start, line_start, title)` collapse to one.
///
/// Re-running assembly over an assembled corpus is a no-op.
pub struct CorpusAssembler;

impl CorpusAssembler {
    /// Create an assembler.
    pub fn new() -> Self {
        Self
    }

    /// Clean, deduplicate, and partition a merged corpus.
    pub fn assemble(&self, sections: Vec<ContentSection>) -> AssembledCorpus {
        let mut seen: HashSet<(String, i32, i32, String)> = HashSet::new();
        let mut corpus = AssembledCorpus::default();

        for mut section in sections {
            let key = (
                section.document_id.raw.clone(),
                section.page_start,
                section.line_start,
                section.title.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            section.content = clean_content(&section.content);

            if section.content.is_empty() {
                corpus.empty_sections.push(section);
            } else {
                corpus.sections.push(section);
            }
        }

        corpus
    }
}

impl Default for CorpusAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Punctuation cleanup followed by consecutive-duplicate-line removal.
fn clean_content(lines: &[String]) -> Vec<String> {
    let cleaned: Vec<String> = lines.iter().map(|l| clean_punctuation(l)).collect();
    remove_consecutive_duplicates(cleaned)
}

fn remove_consecutive_duplicates(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if out.last() != Some(&line) {
            out.push(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentId;

    fn section(title: &str, page: i32, line: i32, content: &[&str]) -> ContentSection {
        ContentSection {
            document_id: DocumentId::parse("2021_5_401234").unwrap(),
            title: title.to_string(),
            page_start: page,
            line_start: line,
            page_end: page + 1,
            line_end: None,
            depth: 2,
            content: content.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_consecutive_duplicates_removed() {
        let corpus = CorpusAssembler::new().assemble(vec![section(
            "T",
            1,
            1,
            &["Item A", "Item A", "Item B"],
        )]);
        assert_eq!(corpus.sections[0].content, vec!["Item A", "Item B"]);
    }

    #[test]
    fn test_non_adjacent_duplicates_kept() {
        let corpus = CorpusAssembler::new().assemble(vec![section(
            "T",
            1,
            1,
            &["Item A", "Item B", "Item A"],
        )]);
        assert_eq!(corpus.sections[0].content, vec!["Item A", "Item B", "Item A"]);
    }

    #[test]
    fn test_punctuation_table_not_letter_collapse() {
        let corpus =
            CorpusAssembler::new().assemble(vec![section("T", 1, 1, &["LLAMADO -- MCA.."])]);
        // Doubled letters survive; doubled punctuation collapses.
        assert_eq!(corpus.sections[0].content, vec!["LLAMADO - MCA."]);
    }

    #[test]
    fn test_duplicate_tuple_collapses_to_one() {
        let corpus = CorpusAssembler::new().assemble(vec![
            section("T", 3, 10, &["x"]),
            section("T", 3, 10, &["x"]),
            section("T", 3, 11, &["x"]),
        ]);
        assert_eq!(corpus.sections.len(), 2);
    }

    #[test]
    fn test_empty_sections_moved_to_side_table() {
        let corpus = CorpusAssembler::new().assemble(vec![
            section("vacía", 2, 5, &[]),
            section("llena", 2, 6, &["contenido"]),
        ]);
        assert_eq!(corpus.sections.len(), 1);
        assert_eq!(corpus.empty_sections.len(), 1);
        assert_eq!(corpus.empty_sections[0].title, "vacía");
    }

    #[test]
    fn test_idempotent() {
        let assembler = CorpusAssembler::new();
        let first = assembler.assemble(vec![section(
            "T",
            1,
            1,
            &["a..b", "dup", "dup", "fin"],
        )]);
        let again = assembler.assemble(first.sections.clone());
        assert_eq!(again.sections[0].content, first.sections[0].content);
        assert!(again.empty_sections.is_empty());
    }
}
