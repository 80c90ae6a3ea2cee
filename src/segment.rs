//! Carving the line stream into titled content sections.

use crate::model::{ContentSection, LinePos, LineRecord, MatchedOutlineEntry};

/// Slice one document's line stream into sections bounded by its
/// matched outline entries.
///
/// Entries are ordered by `(page, line)` with unmatched entries
/// anchored at the top of their page. Entry *i*'s section runs from its
/// own start boundary up to (but excluding) entry *i+1*'s start
/// boundary; the final section runs through the entirety of the page
/// after its own start page, since no further structural marker exists.
///
/// Exactly one section is emitted per input entry, in boundary order;
/// empty sections are retained for outline fidelity.
pub fn segment_document(
    entries: Vec<MatchedOutlineEntry>,
    lines: &[LineRecord],
) -> Vec<ContentSection> {
    let mut ordered = entries;
    ordered.sort_by_key(|e| e.start_pos());

    let mut sections = Vec::with_capacity(ordered.len());
    for (i, current) in ordered.iter().enumerate() {
        let start = current.start_pos();

        // End boundary: the next entry's start, or the whole next page
        // for the final section.
        let (end_page, end_line) = match ordered.get(i + 1) {
            Some(next) => (next.entry.page, next.line_number.map(|_| next.start_pos().line)),
            None => (current.entry.page + 1, None),
        };

        let content = slice_lines(lines, start, end_page, end_line);

        sections.push(ContentSection {
            document_id: current.entry.document_id.clone(),
            title: current.entry.title.clone(),
            page_start: start.page,
            line_start: start.line,
            page_end: end_page,
            line_end: end_line,
            depth: current.entry.depth,
            content,
        });
    }

    sections
}

/// Collect line texts with position `>= start` and `< (end_page, end_line)`.
///
/// A `None` end line applies no upper truncation within the end page:
/// the whole end page is included.
fn slice_lines(
    lines: &[LineRecord],
    start: LinePos,
    end_page: i32,
    end_line: Option<i32>,
) -> Vec<String> {
    lines
        .iter()
        .filter(|line| {
            let after_start = line.pos() >= start;
            let before_end = match end_line {
                Some(el) => line.pos() < LinePos::new(end_page, el),
                None => line.page_number <= end_page,
            };
            after_start && before_end
        })
        .map(|line| line.text.clone())
        .collect()
}
