//! Error types for the seccion library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for seccion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building the section corpus.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document could not be read or parsed; the document is skipped.
    #[error("Extraction failed for {document}: {reason}")]
    Extraction {
        /// Identity of the failed document.
        document: String,
        /// What went wrong.
        reason: String,
    },

    /// A per-document operation exceeded its time bound.
    #[error("Operation timed out for {document} after {seconds}s")]
    Timeout {
        /// Identity of the abandoned document.
        document: String,
        /// Configured time bound.
        seconds: u64,
    },

    /// A filename does not follow the `{year}_{category_id}_{nro_licitacion}` pattern.
    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),

    /// A persisted batch file disagrees with the declared table schema.
    /// Fatal to the merge step; already-flushed batches stay untouched.
    #[error("Schema mismatch in {file}: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        /// The offending batch file.
        file: PathBuf,
        /// Declared column layout.
        expected: String,
        /// Column layout actually found in the file.
        found: String,
    },

    /// Error from the Parquet reader/writer.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Error building or concatenating Arrow record batches.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::Extraction`] from a document identity and any cause.
    pub fn extraction(document: impl Into<String>, reason: impl ToString) -> Self {
        Error::Extraction {
            document: document.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::extraction("<unknown>", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Timeout {
            document: "2021_5_401234".to_string(),
            seconds: 60,
        };
        assert_eq!(
            err.to_string(),
            "Operation timed out for 2021_5_401234 after 60s"
        );

        let err = Error::InvalidDocumentId("notes.pdf".to_string());
        assert_eq!(err.to_string(), "Invalid document id: notes.pdf");
    }

    #[test]
    fn test_schema_mismatch_names_file() {
        let err = Error::SchemaMismatch {
            file: PathBuf::from("lines_batch_3.parquet"),
            expected: "document_id: Utf8".to_string(),
            found: "doc: Utf8".to_string(),
        };
        assert!(err.to_string().contains("lines_batch_3.parquet"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
