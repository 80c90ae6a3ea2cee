//! Document identity.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Identity of a source document, parsed from the filename pattern
/// `{year}_{category_id}_{nro_licitacion}`.
///
/// The identity is attached to every derived record for traceability.
/// `category_id` may be `-1` when the category is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId {
    /// Full filename stem, e.g. `2021_5_401234`.
    pub raw: String,

    /// Four-digit procurement year.
    pub year: String,

    /// Category identifier; `-1` when absent.
    pub category_id: String,

    /// Tender number (nro. de licitación).
    pub nro_licitacion: String,
}

impl DocumentId {
    /// Parse a document identity from a filename stem.
    ///
    /// # Example
    ///
    /// ```
    /// use seccion::DocumentId;
    ///
    /// let id = DocumentId::parse("2021_-1_389557").unwrap();
    /// assert_eq!(id.year, "2021");
    /// assert_eq!(id.category_id, "-1");
    /// assert_eq!(id.nro_licitacion, "389557");
    /// ```
    pub fn parse(stem: &str) -> Result<Self> {
        let re = Regex::new(r"^(\d{4})_(-?\d+)_(\d+)$").unwrap();
        let caps = re
            .captures(stem)
            .ok_or_else(|| Error::InvalidDocumentId(stem.to_string()))?;

        Ok(Self {
            raw: stem.to_string(),
            year: caps[1].to_string(),
            category_id: caps[2].to_string(),
            nro_licitacion: caps[3].to_string(),
        })
    }

    /// Whether the category component is present (not `-1`).
    pub fn has_category(&self) -> bool {
        self.category_id != "-1"
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_id() {
        let id = DocumentId::parse("2023_12_405678").unwrap();
        assert_eq!(id.year, "2023");
        assert_eq!(id.category_id, "12");
        assert_eq!(id.nro_licitacion, "405678");
        assert!(id.has_category());
    }

    #[test]
    fn test_parse_absent_category() {
        let id = DocumentId::parse("2021_-1_389557").unwrap();
        assert_eq!(id.category_id, "-1");
        assert!(!id.has_category());
    }

    #[test]
    fn test_parse_rejects_other_names() {
        assert!(DocumentId::parse("notes").is_err());
        assert!(DocumentId::parse("21_5_1234").is_err());
        assert!(DocumentId::parse("2021_5_1234_extra").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let id = DocumentId::parse("2022_7_395001").unwrap();
        assert_eq!(id.to_string(), "2022_7_395001");
    }
}
