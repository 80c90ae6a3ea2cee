//! Locating outline titles inside the line stream.

use crate::model::{LineRecord, MatchedOutlineEntry, OutlineEntry};
use crate::normalize::normalize;

/// Locate an outline entry's title among the line records of its target
/// page.
///
/// A candidate line matches when the normalized, lowercased title is a
/// substring of the normalized, lowercased line text; containment
/// subsumes exact equality. The first match in ascending position order
/// wins. No match is not an error: `line_number` stays `None` and the
/// section start later falls back to the top of the page.
///
/// `lines` may be the document's full persisted line table or a freshly
/// produced stream for the one page; records on other pages are ignored.
pub fn locate_title(entry: OutlineEntry, lines: &[LineRecord]) -> MatchedOutlineEntry {
    let needle = normalize(&entry.title).to_lowercase();

    // An empty title would contain-match every line.
    if needle.is_empty() {
        return MatchedOutlineEntry {
            entry,
            line_number: None,
            matched_text: None,
        };
    }

    for line in lines.iter().filter(|l| l.page_number == entry.page) {
        let haystack = normalize(&line.text).to_lowercase();
        if haystack.contains(&needle) {
            return MatchedOutlineEntry {
                line_number: Some(line.line_number),
                matched_text: Some(line.text.clone()),
                entry,
            };
        }
    }

    MatchedOutlineEntry {
        entry,
        line_number: None,
        matched_text: None,
    }
}

/// Locate every outline entry of a document, preserving entry order.
pub fn locate_titles(
    entries: Vec<OutlineEntry>,
    lines: &[LineRecord],
) -> Vec<MatchedOutlineEntry> {
    entries
        .into_iter()
        .map(|entry| locate_title(entry, lines))
        .collect()
}
