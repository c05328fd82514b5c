//! Duplicate removal and missing-value imputation.

use std::collections::HashSet;

use crate::error::{CleanlyError, CleanlyResult, StatisticIssue, UndefinedStatistic};
use crate::types::{DataSet, DataType, Value};

use super::Transformed;
use super::stats::{mean, mode};

/// Hashable identity of a cell. Every missing value is the same key.
#[derive(Debug, PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Missing,
    Number(u64),
    Text(&'a str),
}

impl<'a> CellKey<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            v if v.is_missing() => CellKey::Missing,
            // -0.0 == 0.0
            Value::Number(x) if *x == 0.0 => CellKey::Number(0),
            Value::Number(x) => CellKey::Number(x.to_bits()),
            Value::Text(s) => CellKey::Text(s),
            Value::Null => CellKey::Missing,
        }
    }
}

/// Indexes of rows that repeat an earlier row exactly (missing == missing).
pub fn duplicate_row_indices(dataset: &DataSet) -> Vec<usize> {
    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(dataset.row_count());
    dataset
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !seen.insert(row.iter().map(CellKey::of).collect()))
        .map(|(i, _)| i)
        .collect()
}

/// Remove duplicate rows, keeping the first occurrence of each.
pub fn drop_duplicates(dataset: &DataSet) -> DataSet {
    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(dataset.row_count());
    let rows = dataset
        .rows
        .iter()
        .filter(|row| seen.insert(row.iter().map(CellKey::of).collect()))
        .cloned()
        .collect();
    DataSet::new(dataset.schema.clone(), rows)
}

/// Fill missing cells: numeric columns with the column mean, categorical columns with the mode.
///
/// See [`impute_missing_report`].
pub fn impute_missing(dataset: &DataSet) -> CleanlyResult<DataSet> {
    impute_missing_report(dataset).map(|t| t.into_dataset("impute"))
}

/// Fill missing cells and report columns whose mean was undefined.
///
/// - A numeric column with no values is filled with NaN (still missing) and reported as
///   [`StatisticIssue::NoValues`].
/// - A categorical column with missing cells and no values fails with
///   [`CleanlyError::EmptyColumn`].
/// - Mode ties go to the lexicographically smallest value.
pub fn impute_missing_report(dataset: &DataSet) -> CleanlyResult<Transformed> {
    let mut warnings = Vec::new();
    let mut fills: Vec<Option<Value>> = Vec::with_capacity(dataset.column_count());

    for (idx, field) in dataset.schema.fields.iter().enumerate() {
        if !dataset.column(idx).any(Value::is_missing) {
            fills.push(None);
            continue;
        }
        let fill = match field.data_type {
            DataType::Numeric => {
                let m = mean(&dataset.numbers(idx)).unwrap_or_else(|| {
                    warnings.push(UndefinedStatistic::new(&field.name, StatisticIssue::NoValues));
                    f64::NAN
                });
                Value::Number(m)
            }
            DataType::Categorical => {
                let m = mode(dataset.column(idx).filter_map(Value::as_text)).ok_or_else(|| {
                    CleanlyError::EmptyColumn {
                        column: field.name.clone(),
                    }
                })?;
                Value::Text(m.to_owned())
            }
        };
        fills.push(Some(fill));
    }

    let out = dataset.map_rows(|row| {
        row.iter()
            .zip(&fills)
            .map(|(value, fill)| match fill {
                Some(fill) if value.is_missing() => fill.clone(),
                _ => value.clone(),
            })
            .collect()
    });

    Ok(Transformed::new(out, warnings))
}

/// Remove duplicate rows, then impute missing values.
///
/// ```rust
/// use cleanly::processing::clean;
/// use cleanly::types::{Column, DataSet, Value};
///
/// let ds = DataSet::from_columns(vec![
///     Column::numeric("a", [Some(1.0), Some(1.0), None]),
///     Column::categorical("b", [Some("x"), Some("x"), None]),
/// ])
/// .unwrap();
/// let out = clean(&ds).unwrap();
/// assert_eq!(out.rows, vec![
///     vec![Value::Number(1.0), Value::from("x")],
///     vec![Value::Number(1.0), Value::from("x")],
/// ]);
/// ```
pub fn clean(dataset: &DataSet) -> CleanlyResult<DataSet> {
    clean_report(dataset).map(|t| t.into_dataset("clean"))
}

/// [`clean`], also returning the undefined-statistic warnings.
pub fn clean_report(dataset: &DataSet) -> CleanlyResult<Transformed> {
    impute_missing_report(&drop_duplicates(dataset))
}
