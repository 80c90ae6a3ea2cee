//! Line extraction from per-page raw text blocks.

use crate::error::Result;
use crate::model::{DocumentId, LineRecord};
use crate::normalize::normalize;

use super::source::DocumentSource;

/// Title fragments that the source extractor splits across two physical
/// lines and that must be rejoined into one logical line.
const KNOWN_FRAGMENT_PAIRS: &[(&str, &str)] = &[
    (
        "REQUISITOS DE PARTICIPACIÓN Y CRITERIOS DE",
        "EVALUACIÓN",
    ),
    (
        "SUMINISTROS REQUERIDOS - ESPECIFICACIONES",
        "TÉCNICAS",
    ),
];

/// Turns a document's raw per-page text blocks into an ordered sequence
/// of [`LineRecord`]s.
pub struct LineExtractor {
    /// Two-part fragment pairs, stored in normalized form.
    fragment_pairs: Vec<(String, String)>,
}

impl LineExtractor {
    /// Create an extractor with the built-in fragment table.
    pub fn new() -> Self {
        Self::with_fragment_pairs(
            KNOWN_FRAGMENT_PAIRS
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string())),
        )
    }

    /// Create an extractor with a custom fragment table.
    pub fn with_fragment_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            fragment_pairs: pairs
                .into_iter()
                .map(|(a, b)| (normalize(&a), normalize(&b)))
                .collect(),
        }
    }

    /// Extract every page of a document, in page order.
    ///
    /// Pages yielding no text are skipped; a document with zero pages
    /// produces an empty sequence. Neither is an error.
    pub fn extract(
        &self,
        document_id: &DocumentId,
        source: &dyn DocumentSource,
    ) -> Result<Vec<LineRecord>> {
        let mut records = Vec::new();
        for page_number in 1..=source.page_count() {
            if let Some(text) = source.page_text(page_number)? {
                records.extend(self.extract_page(document_id, page_number as i32, &text));
            }
        }
        Ok(records)
    }

    /// Extract one page's raw text block into line records.
    ///
    /// The position counter advances for every raw line consumed, even
    /// lines that normalize to empty and are not emitted; a merged
    /// fragment pair consumes two raw lines and advances two positions.
    /// This keeps positions aligned with independent re-derivations of
    /// line position over the same raw stream.
    pub fn extract_page(
        &self,
        document_id: &DocumentId,
        page_number: i32,
        raw_text: &str,
    ) -> Vec<LineRecord> {
        let raw_lines: Vec<&str> = raw_text.split('\n').collect();
        let mut records = Vec::new();
        let mut position = 0i32;
        let mut i = 0;

        while i < raw_lines.len() {
            position += 1;
            let current = normalize(raw_lines[i]);

            if i + 1 < raw_lines.len() {
                let next = normalize(raw_lines[i + 1]);
                if let Some(merged) = self.merge_fragments(&current, &next) {
                    records.push(LineRecord {
                        document_id: document_id.clone(),
                        page_number,
                        line_number: position,
                        text: merged,
                    });
                    position += 1;
                    i += 2;
                    continue;
                }
            }

            if !current.is_empty() {
                records.push(LineRecord {
                    document_id: document_id.clone(),
                    page_number,
                    line_number: position,
                    text: current,
                });
            }
            i += 1;
        }

        records
    }

    fn merge_fragments(&self, current: &str, next: &str) -> Option<String> {
        for (part1, part2) in &self.fragment_pairs {
            if current == part1 && next == part2 {
                return Some(format!("{current} {next}"));
            }
        }
        None
    }
}

impl Default for LineExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentId {
        DocumentId::parse("2021_5_401234").unwrap()
    }

    #[test]
    fn test_known_fragment_pair_merges() {
        let extractor = LineExtractor::new();
        let text = "REQUISITOS DE PARTICIPACIÓN Y CRITERIOS DE\nEVALUACIÓN";
        let records = extractor.extract_page(&doc(), 1, text);

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].text,
            "REQUISITOS DE PARTICIPACIÓN Y CRITERIOS DE EVALUACIÓN"
        );
        assert_eq!(records[0].line_number, 1);
    }

    #[test]
    fn test_merge_consumes_two_positions() {
        let extractor = LineExtractor::new();
        let text = "SUMINISTROS REQUERIDOS - ESPECIFICACIONES\nTÉCNICAS\nItem 1";
        let records = extractor.extract_page(&doc(), 3, text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line_number, 1);
        assert_eq!(records[1].line_number, 3);
        assert_eq!(records[1].text, "Item 1");
    }

    #[test]
    fn test_empty_lines_counted_but_not_emitted() {
        let extractor = LineExtractor::new();
        let records = extractor.extract_page(&doc(), 1, "\nAlpha\n   \nBeta");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "Alpha");
        assert_eq!(records[0].line_number, 2);
        assert_eq!(records[1].text, "Beta");
        assert_eq!(records[1].line_number, 4);
    }

    #[test]
    fn test_positions_strictly_increasing_within_page() {
        let extractor = LineExtractor::new();
        let records = extractor.extract_page(&doc(), 1, "a\nb\n\nc\nd");
        let positions: Vec<i32> = records.iter().map(|r| r.line_number).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lines_are_normalized() {
        let extractor = LineExtractor::new();
        let records = extractor.extract_page(&doc(), 1, "  ITEM  --  uno  ");
        assert_eq!(records[0].text, "ITEM - uno");
    }
}
