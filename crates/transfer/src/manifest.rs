//! Tab-separated file manifest.

use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

use rusty_transfer_portal::MetadataRecord;
use serde_json::Value;

use crate::error::TransferError;

/// Columns the manifest rows are ordered by.
pub const SORT_FIELDS: [&str; 3] = ["file_set.accession", "assembly", "file_format"];

/// Render one cell.
///
/// `null` is empty, strings are written raw, lists are the comma-joined
/// rendering of their elements and everything else is JSON text.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_cell)
            .collect::<Vec<String>>()
            .join(","),
        other => other.to_string(),
    }
}

fn sort_key(record: &MetadataRecord, field: &str) -> Option<String> {
    match record.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => Some(render_cell(value)),
    }
}

fn compare_records(a: &MetadataRecord, b: &MetadataRecord) -> Ordering {
    for field in SORT_FIELDS {
        let ordering: Ordering = match (sort_key(a, field), sort_key(b, field)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable sort by `SORT_FIELDS`; missing values sort last.
pub fn sort_records(records: &mut [MetadataRecord]) {
    records.sort_by(compare_records);
}

/// Write records as TSV with a header row of `fields`.
///
/// # Arguments
/// * `writer` - Destination
/// * `fields` - Column order; fields absent from a record are empty cells
/// * `records` - Rows, written in the given order
pub fn write_manifest<W: Write>(
    writer: W,
    fields: &[String],
    records: &[MetadataRecord],
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    wtr.write_record(fields)?;
    for record in records {
        let row: Vec<String> = fields
            .iter()
            .map(|field| record.get(field).map(render_cell).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Sort records and write them to a local file.
///
/// # Returns
/// The number of rows written.
pub fn write_manifest_file(
    path: &Path,
    fields: &[String],
    mut records: Vec<MetadataRecord>,
) -> Result<usize, TransferError> {
    let to_error = |message: String| TransferError::Manifest {
        path: path.display().to_string(),
        message,
    };
    sort_records(&mut records);
    let file = std::fs::File::create(path).map_err(|e| to_error(e.to_string()))?;
    write_manifest(file, fields, &records).map_err(|e| to_error(e.to_string()))?;
    Ok(records.len())
}
