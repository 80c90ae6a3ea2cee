//! Text canonicalization.
//!
//! Titles and body lines reach the pipeline through different
//! extraction paths; both sides must pass through the same
//! canonicalization so that containment checks stay meaningful.

use unicode_normalization::UnicodeNormalization;

/// Punctuation characters whose doubled forms are a known extraction
/// artifact in the source corpus.
const DOUBLED_PUNCTUATION: &[char] = &['-', ',', '.', ';', ':', '°', '/'];

/// Canonicalize a piece of extracted text.
///
/// Applies, in order: Unicode NFC, collapse of any immediately-repeated
/// character (`aa` → `a`, `--` → `-`), the doubled-punctuation table,
/// and whitespace folding with trim.
///
/// The repeated-character collapse is lossy for legitimate doubled
/// letters; it is a domain convention of the source corpus and both
/// titles and lines go through it, so matching stays consistent.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
///
/// # Example
///
/// ```
/// use seccion::normalize::normalize;
///
/// assert_eq!(normalize("  LLAMADO  --  MCA  "), "LAMADO - MCA");
/// assert_eq!(normalize(&normalize("aa..bb")), normalize("aa..bb"));
/// ```
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let collapsed = collapse_repeats(&composed);
    let cleaned = clean_punctuation(&collapsed);
    fold_whitespace(&cleaned)
}

/// Collapse doubled punctuation only, leaving letters untouched.
///
/// This is the cleanup applied to already-assembled section content,
/// where the generic repeated-character collapse would be destructive.
pub fn clean_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if prev == Some(c) && DOUBLED_PUNCTUATION.contains(&c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Collapse any run of an immediately-repeated character to one occurrence.
fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Collapse whitespace runs to single spaces and trim the ends.
fn fold_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_repeated_letters() {
        // Lossy by convention: doubled letters collapse too.
        assert_eq!(normalize("LLAMADO"), "LAMADO");
        assert_eq!(normalize("carro"), "caro");
    }

    #[test]
    fn test_collapses_doubled_punctuation() {
        assert_eq!(normalize("items -- list"), "items - list");
        assert_eq!(normalize("fin.."), "fin.");
        assert_eq!(normalize("a ,, b :: c ;; d °° e // f"), "a , b : c ; d ° e / f");
    }

    #[test]
    fn test_folds_whitespace() {
        assert_eq!(normalize("  hola \t  mundo \n "), "hola mundo");
    }

    #[test]
    fn test_idempotent() {
        for input in ["", "  REQUISITOS  ::  2021 ", "aaa...bbb", "x--y\t\tz"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn test_nfc_composition() {
        // Decomposed "Ó" (O + combining acute) composes to a single char.
        let decomposed = "EVALUACIO\u{0301}N";
        assert_eq!(normalize(decomposed), "EVALUACIÓN");
    }

    #[test]
    fn test_clean_punctuation_leaves_letters() {
        assert_eq!(clean_punctuation("LLAMADO -- x"), "LLAMADO - x");
        assert_eq!(clean_punctuation("a....b"), "a.b");
    }

    #[test]
    fn test_clean_punctuation_idempotent_on_runs() {
        let once = clean_punctuation("x....y");
        assert_eq!(clean_punctuation(&once), once);
    }
}
