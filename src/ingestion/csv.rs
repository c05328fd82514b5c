//! CSV ingestion implementation.

use std::path::Path;

use crate::error::{CleanlyError, CleanlyResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Cell texts read as missing values (after trimming), besides the empty string.
pub const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

/// Ingest a CSV file into an in-memory [`DataSet`] using a known schema.
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ).
/// - Each value is parsed according to the schema field type.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> CleanlyResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing CSV reader using a known schema.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> CleanlyResult<DataSet> {
    schema.validate()?;
    let headers = rdr.headers()?.clone();

    // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
    let mut col_idxs = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        match headers.iter().position(|h| h.trim() == field.name) {
            Some(idx) => col_idxs.push(idx),
            None => {
                return Err(CleanlyError::SchemaMismatch {
                    message: format!(
                        "missing required column '{field}'. headers={:?}",
                        headers.iter().collect::<Vec<_>>(),
                        field = field.name
                    ),
                });
            }
        }
    }

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for (field, &csv_idx) in schema.fields.iter().zip(col_idxs.iter()) {
            let raw = record.get(csv_idx).unwrap_or("");
            row.push(parse_typed_value(user_row, &field.name, field.data_type, raw)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

/// Ingest a CSV file, inferring the type of every column.
///
/// A column is [`DataType::Numeric`] when every non-missing cell parses as a number (an
/// all-missing column is numeric too), otherwise [`DataType::Categorical`]. Columns keep file
/// order.
pub fn infer_csv_from_path(path: impl AsRef<Path>) -> CleanlyResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    infer_csv_from_reader(&mut rdr)
}

/// Like [`infer_csv_from_path`], from an existing CSV reader.
pub fn infer_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
) -> CleanlyResult<DataSet> {
    let headers = rdr.headers()?.clone();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

    let fields = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let numeric = records.iter().all(|rec| {
                let raw = rec.get(idx).unwrap_or("");
                is_missing_token(raw) || raw.trim().parse::<f64>().is_ok()
            });
            let data_type = if numeric {
                DataType::Numeric
            } else {
                DataType::Categorical
            };
            Field::new(name.trim(), data_type)
        })
        .collect();
    let schema = Schema::new(fields);
    schema.validate()?;

    let rows = records
        .iter()
        .enumerate()
        .map(|(row_idx0, rec)| {
            schema
                .fields
                .iter()
                .enumerate()
                .map(|(idx, field)| {
                    parse_typed_value(
                        row_idx0 + 2,
                        &field.name,
                        field.data_type,
                        rec.get(idx).unwrap_or(""),
                    )
                })
                .collect::<CleanlyResult<Vec<_>>>()
        })
        .collect::<CleanlyResult<Vec<_>>>()?;

    Ok(DataSet::new(schema, rows))
}

fn is_missing_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || NA_TOKENS.contains(&trimmed)
}

fn parse_typed_value(
    row: usize,
    column: &str,
    data_type: DataType,
    raw: &str,
) -> CleanlyResult<Value> {
    if is_missing_token(raw) {
        return Ok(Value::Null);
    }

    let trimmed = raw.trim();
    match data_type {
        DataType::Categorical => Ok(Value::Text(trimmed.to_owned())),
        DataType::Numeric => trimmed.parse::<f64>().map(Value::Number).map_err(|e| {
            CleanlyError::ParseError {
                row,
                column: column.to_owned(),
                raw: raw.to_owned(),
                message: e.to_string(),
            }
        }),
    }
}
