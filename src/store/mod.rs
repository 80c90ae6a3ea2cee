//! Columnar persistence: Snappy-compressed Parquet tables with fixed
//! schemas, flushed per batch and merged with loud schema validation.

mod tables;

use std::fs::File;
use std::path::Path;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{Error, Result};
use crate::model::{ContentSection, LineRecord, MatchedOutlineEntry};

pub use tables::{line_schema, matched_outline_schema, section_schema};

/// Default number of rows per Parquet row group.
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10_000;

/// Write a line table.
pub fn write_lines<P: AsRef<Path>>(path: P, records: &[LineRecord]) -> Result<()> {
    write_table(path.as_ref(), line_schema(), tables::lines_to_batch(records)?)
}

/// Write a matched-outline table.
pub fn write_matched_outlines<P: AsRef<Path>>(
    path: P,
    entries: &[MatchedOutlineEntry],
) -> Result<()> {
    write_table(
        path.as_ref(),
        matched_outline_schema(),
        tables::matched_outlines_to_batch(entries)?,
    )
}

/// Write a section table.
pub fn write_sections<P: AsRef<Path>>(path: P, sections: &[ContentSection]) -> Result<()> {
    write_table(
        path.as_ref(),
        section_schema(),
        tables::sections_to_batch(sections)?,
    )
}

/// Read a line table back, validating its schema.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<LineRecord>> {
    read_table(path.as_ref(), &line_schema(), tables::lines_from_batch)
}

/// Read a matched-outline table back, validating its schema.
pub fn read_matched_outlines<P: AsRef<Path>>(path: P) -> Result<Vec<MatchedOutlineEntry>> {
    read_table(
        path.as_ref(),
        &matched_outline_schema(),
        tables::matched_outlines_from_batch,
    )
}

/// Read a section table back, validating its schema.
pub fn read_sections<P: AsRef<Path>>(path: P) -> Result<Vec<ContentSection>> {
    read_table(path.as_ref(), &section_schema(), tables::sections_from_batch)
}

/// Concatenate several persisted section tables.
///
/// Every file's schema is validated against the declared one before any
/// row is taken; a mismatch fails the merge with the offending file's
/// identity and leaves all input files untouched.
pub fn merge_sections<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ContentSection>> {
    let mut all = Vec::new();
    for path in paths {
        all.extend(read_sections(path)?);
    }
    Ok(all)
}

/// Concatenate several persisted line tables, with the same schema
/// validation as [`merge_sections`].
pub fn merge_lines<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<LineRecord>> {
    let mut all = Vec::new();
    for path in paths {
        all.extend(read_lines(path)?);
    }
    Ok(all)
}

/// Concatenate several persisted matched-outline tables.
pub fn merge_matched_outlines<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<MatchedOutlineEntry>> {
    let mut all = Vec::new();
    for path in paths {
        all.extend(read_matched_outlines(path)?);
    }
    Ok(all)
}

fn write_table(path: &Path, schema: SchemaRef, batch: RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_max_row_group_size(DEFAULT_ROW_GROUP_SIZE)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn read_table<T>(
    path: &Path,
    expected: &SchemaRef,
    from_batch: fn(&RecordBatch) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    ensure_schema(path, expected, builder.schema())?;

    let reader = builder.build()?;
    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(from_batch(&batch?)?);
    }
    Ok(rows)
}

/// Compare field names and types against the declared schema.
fn ensure_schema(path: &Path, expected: &SchemaRef, actual: &SchemaRef) -> Result<()> {
    let matches = expected.fields().len() == actual.fields().len()
        && expected
            .fields()
            .iter()
            .zip(actual.fields().iter())
            .all(|(e, a)| e.name() == a.name() && e.data_type() == a.data_type());

    if matches {
        Ok(())
    } else {
        Err(Error::SchemaMismatch {
            file: path.to_path_buf(),
            expected: describe_schema(expected),
            found: describe_schema(actual),
        })
    }
}

fn describe_schema(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| format!("{}: {}", f.name(), f.data_type()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentId, OutlineEntry};

    fn doc() -> DocumentId {
        DocumentId::parse("2021_5_401234").unwrap()
    }

    #[test]
    fn test_line_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.parquet");

        let records = vec![
            LineRecord {
                document_id: doc(),
                page_number: 1,
                line_number: 2,
                text: "hola".to_string(),
            },
            LineRecord {
                document_id: doc(),
                page_number: 2,
                line_number: 1,
                text: "mundo".to_string(),
            },
        ];

        write_lines(&path, &records).unwrap();
        let back = read_lines(&path).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].text, "hola");
        assert_eq!(back[1].page_number, 2);
        assert_eq!(back[0].document_id, doc());
    }

    #[test]
    fn test_matched_outline_roundtrip_preserves_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outlines.parquet");

        let entries = vec![
            MatchedOutlineEntry {
                entry: OutlineEntry {
                    document_id: doc(),
                    title: "Datos del Contacto".to_string(),
                    page: 5,
                    depth: 2,
                },
                line_number: Some(7),
                matched_text: Some("datos del contacto".to_string()),
            },
            MatchedOutlineEntry {
                entry: OutlineEntry {
                    document_id: doc(),
                    title: "Sin Ubicar".to_string(),
                    page: 9,
                    depth: 2,
                },
                line_number: None,
                matched_text: None,
            },
        ];

        write_matched_outlines(&path, &entries).unwrap();
        let back = read_matched_outlines(&path).unwrap();

        assert_eq!(back[0].line_number, Some(7));
        assert_eq!(back[1].line_number, None);
        assert_eq!(back[1].entry.title, "Sin Ubicar");
    }

    #[test]
    fn test_section_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.parquet");

        let sections = vec![ContentSection {
            document_id: doc(),
            title: "T".to_string(),
            page_start: 3,
            line_start: 10,
            page_end: 4,
            line_end: Some(2),
            depth: 2,
            content: vec!["a".to_string(), "b".to_string()],
        }];

        write_sections(&path, &sections).unwrap();
        let back = read_sections(&path).unwrap();

        assert_eq!(back[0].content, vec!["a", "b"]);
        assert_eq!(back[0].line_end, Some(2));
        assert_eq!(back[0].content_length(), 2);
        assert_eq!(back[0].document_id.year, "2021");
    }

    #[test]
    fn test_merge_concatenates() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.parquet");
        let b = dir.path().join("b.parquet");

        let record = |n| LineRecord {
            document_id: doc(),
            page_number: 1,
            line_number: n,
            text: format!("l{n}"),
        };
        write_lines(&a, &[record(1)]).unwrap();
        write_lines(&b, &[record(2)]).unwrap();

        let merged = merge_lines(&[a, b]).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_rejects_wrong_schema() {
        let dir = tempfile::tempdir().unwrap();
        let wrong = dir.path().join("wrong.parquet");

        // A line table is not a valid section table.
        write_lines(
            &wrong,
            &[LineRecord {
                document_id: doc(),
                page_number: 1,
                line_number: 1,
                text: "x".to_string(),
            }],
        )
        .unwrap();

        let err = merge_sections(&[wrong.clone()]).unwrap_err();
        match err {
            Error::SchemaMismatch { file, .. } => assert_eq!(file, wrong),
            other => panic!("expected schema mismatch, got {other}"),
        }
    }
}
