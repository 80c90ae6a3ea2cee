//! Fixed table schemas and record/batch conversions.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};
use crate::model::{ContentSection, DocumentId, LineRecord, MatchedOutlineEntry, OutlineEntry};

/// Declared schema of the line table.
pub fn line_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("document_id", DataType::Utf8, false),
        Field::new("page_number", DataType::Int32, false),
        Field::new("line_number", DataType::Int32, false),
        Field::new("text", DataType::Utf8, false),
    ]))
}

/// Declared schema of the matched-outline table.
pub fn matched_outline_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("document_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("page", DataType::Int32, false),
        Field::new("depth", DataType::Int32, false),
        Field::new("line_number", DataType::Int32, true),
    ]))
}

/// Declared schema of the section table, partitionable by `year`.
pub fn section_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("document_id", DataType::Utf8, false),
        Field::new("nro_licitacion", DataType::Utf8, false),
        Field::new("category_id", DataType::Utf8, false),
        Field::new("year", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("page", DataType::Int32, false),
        Field::new("line_start", DataType::Int32, false),
        Field::new("line_end", DataType::Int32, true),
        Field::new("depth", DataType::Int32, false),
        Field::new("content_length", DataType::Int32, false),
    ]))
}

pub fn lines_to_batch(records: &[LineRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.document_id.raw.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(
            records.iter().map(|r| r.page_number),
        )),
        Arc::new(Int32Array::from_iter_values(
            records.iter().map(|r| r.line_number),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.text.as_str()),
        )),
    ];
    Ok(RecordBatch::try_new(line_schema(), columns)?)
}

pub fn matched_outlines_to_batch(entries: &[MatchedOutlineEntry]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.entry.document_id.raw.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.entry.title.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(
            entries.iter().map(|e| e.entry.page),
        )),
        Arc::new(Int32Array::from_iter_values(
            entries.iter().map(|e| e.entry.depth),
        )),
        Arc::new(Int32Array::from(
            entries.iter().map(|e| e.line_number).collect::<Vec<_>>(),
        )),
    ];
    Ok(RecordBatch::try_new(matched_outline_schema(), columns)?)
}

pub fn sections_to_batch(sections: &[ContentSection]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            sections.iter().map(|s| s.document_id.raw.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            sections.iter().map(|s| s.document_id.nro_licitacion.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            sections.iter().map(|s| s.document_id.category_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            sections.iter().map(|s| s.document_id.year.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            sections.iter().map(|s| s.title.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            sections.iter().map(|s| s.content_text()),
        )),
        Arc::new(Int32Array::from_iter_values(
            sections.iter().map(|s| s.page_start),
        )),
        Arc::new(Int32Array::from_iter_values(
            sections.iter().map(|s| s.line_start),
        )),
        Arc::new(Int32Array::from(
            sections.iter().map(|s| s.line_end).collect::<Vec<_>>(),
        )),
        Arc::new(Int32Array::from_iter_values(
            sections.iter().map(|s| s.depth),
        )),
        Arc::new(Int32Array::from_iter_values(
            sections.iter().map(|s| s.content_length()),
        )),
    ];
    Ok(RecordBatch::try_new(section_schema(), columns)?)
}

pub fn lines_from_batch(batch: &RecordBatch) -> Result<Vec<LineRecord>> {
    let document_id = string_column(batch, 0)?;
    let page_number = int_column(batch, 1)?;
    let line_number = int_column(batch, 2)?;
    let text = string_column(batch, 3)?;

    (0..batch.num_rows())
        .map(|i| {
            Ok(LineRecord {
                document_id: DocumentId::parse(document_id.value(i))?,
                page_number: page_number.value(i),
                line_number: line_number.value(i),
                text: text.value(i).to_string(),
            })
        })
        .collect()
}

pub fn matched_outlines_from_batch(batch: &RecordBatch) -> Result<Vec<MatchedOutlineEntry>> {
    let document_id = string_column(batch, 0)?;
    let title = string_column(batch, 1)?;
    let page = int_column(batch, 2)?;
    let depth = int_column(batch, 3)?;
    let line_number = int_column(batch, 4)?;

    (0..batch.num_rows())
        .map(|i| {
            Ok(MatchedOutlineEntry {
                entry: OutlineEntry {
                    document_id: DocumentId::parse(document_id.value(i))?,
                    title: title.value(i).to_string(),
                    page: page.value(i),
                    depth: depth.value(i),
                },
                line_number: if line_number.is_null(i) {
                    None
                } else {
                    Some(line_number.value(i))
                },
                matched_text: None,
            })
        })
        .collect()
}

pub fn sections_from_batch(batch: &RecordBatch) -> Result<Vec<ContentSection>> {
    let document_id = string_column(batch, 0)?;
    let title = string_column(batch, 4)?;
    let content = string_column(batch, 5)?;
    let page = int_column(batch, 6)?;
    let line_start = int_column(batch, 7)?;
    let line_end = int_column(batch, 8)?;
    let depth = int_column(batch, 9)?;

    (0..batch.num_rows())
        .map(|i| {
            let text = content.value(i);
            let line_end = if line_end.is_null(i) {
                None
            } else {
                Some(line_end.value(i))
            };
            let page_start = page.value(i);
            Ok(ContentSection {
                document_id: DocumentId::parse(document_id.value(i))?,
                title: title.value(i).to_string(),
                page_start,
                line_start: line_start.value(i),
                // page_end is derived and not persisted. Reconstruct
                // conservatively: a truncated section is taken to end on
                // its start page, an untruncated one on the following page.
                page_end: if line_end.is_some() { page_start } else { page_start + 1 },
                line_end,
                depth: depth.value(i),
                content: if text.is_empty() {
                    Vec::new()
                } else {
                    text.split('\n').map(str::to_string).collect()
                },
            })
        })
        .collect()
}

fn string_column<'a>(batch: &'a RecordBatch, index: usize) -> Result<&'a StringArray> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::Other(format!("column {index} is not a string column")))
}

fn int_column<'a>(batch: &'a RecordBatch, index: usize) -> Result<&'a Int32Array> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| Error::Other(format!("column {index} is not an int32 column")))
}
