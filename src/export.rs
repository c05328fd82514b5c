//! CSV export of a [`DataSet`].
//!
//! The header row carries the schema field names; missing cells are written as empty fields and
//! numbers use `f64`'s `Display` (so `2.0` is written as `2`).

use std::io::Write;
use std::path::Path;

use crate::error::CleanlyResult;
use crate::types::DataSet;

/// Write `dataset` as CSV to `writer`.
pub fn write_csv<W: Write>(dataset: &DataSet, writer: W) -> CleanlyResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `dataset` as CSV to a file, replacing it if it exists.
pub fn write_csv_to_path(dataset: &DataSet, path: impl AsRef<Path>) -> CleanlyResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(dataset, std::io::BufWriter::new(file))
}

/// Render `dataset` as an in-memory CSV string.
pub fn to_csv_string(dataset: &DataSet) -> CleanlyResult<String> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf)?;
    // csv only ever writes the UTF-8 text it is given.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
