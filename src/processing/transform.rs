//! Column and row edits: scaling, encoding, dropping/renaming columns, equality filter, sort.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{CleanlyError, CleanlyResult, StatisticIssue, UndefinedStatistic};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::Transformed;

/// Min-max scale every numeric column into `[0, 1]`.
///
/// See [`normalize_report`].
pub fn normalize(dataset: &DataSet) -> DataSet {
    normalize_report(dataset).into_dataset("normalize")
}

/// Min-max scale every numeric column, reporting columns that could not be scaled.
///
/// A constant column becomes all `0.0` ([`StatisticIssue::ZeroSpread`]); a column without
/// values is left as is ([`StatisticIssue::NoValues`]). Missing cells stay missing.
pub fn normalize_report(dataset: &DataSet) -> Transformed {
    let mut warnings = Vec::new();
    let mut ranges: HashMap<usize, (f64, f64)> = HashMap::new();
    for idx in dataset.schema.indices_of_type(DataType::Numeric) {
        let name = &dataset.schema.fields[idx].name;
        let values = dataset.numbers(idx);
        if values.is_empty() {
            warnings.push(UndefinedStatistic::new(name, StatisticIssue::NoValues));
            continue;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            warnings.push(UndefinedStatistic::new(name, StatisticIssue::ZeroSpread));
        }
        ranges.insert(idx, (min, max - min));
    }

    let out = dataset.map_rows(|row| {
        row.iter()
            .enumerate()
            .map(|(idx, value)| match (ranges.get(&idx), value.as_number()) {
                (Some(&(_, span)), Some(_)) if span == 0.0 => Value::Number(0.0),
                (Some(&(min, span)), Some(v)) => Value::Number((v - min) / span),
                _ => value.clone(),
            })
            .collect()
    });
    Transformed::new(out, warnings)
}

/// Replace each categorical column by integer codes in first-appearance order.
///
/// Codes start at 0; missing cells get -1. Encoded columns become [`DataType::Numeric`].
pub fn encode_categorical(dataset: &DataSet) -> DataSet {
    let cat_idxs = dataset.schema.indices_of_type(DataType::Categorical);
    let mut codes: Vec<HashMap<&str, usize>> = vec![HashMap::new(); cat_idxs.len()];
    for row in &dataset.rows {
        for (slot, &idx) in cat_idxs.iter().enumerate() {
            if let Some(text) = row[idx].as_text() {
                let next = codes[slot].len();
                codes[slot].entry(text).or_insert(next);
            }
        }
    }

    let schema = Schema::new(
        dataset
            .schema
            .fields
            .iter()
            .map(|f| Field::new(f.name.clone(), DataType::Numeric))
            .collect(),
    );
    dataset.map_rows_into(schema, |row| {
        let mut out = row.to_vec();
        for (slot, &idx) in cat_idxs.iter().enumerate() {
            let code = row[idx]
                .as_text()
                .and_then(|t| codes[slot].get(t))
                .map(|&c| c as f64)
                .unwrap_or(-1.0);
            out[idx] = Value::Number(code);
        }
        out
    })
}

/// Remove the named columns. Fails with [`CleanlyError::UnknownColumn`] on unknown names.
pub fn drop_columns(dataset: &DataSet, columns: &[&str]) -> CleanlyResult<DataSet> {
    let mut drop = vec![false; dataset.column_count()];
    for name in columns {
        drop[dataset.schema.require(name)?] = true;
    }

    let keep: Vec<usize> = (0..dataset.column_count()).filter(|&i| !drop[i]).collect();
    let schema = Schema::new(
        keep.iter()
            .map(|&i| dataset.schema.fields[i].clone())
            .collect(),
    );
    Ok(dataset.map_rows_into(schema, |row| keep.iter().map(|&i| row[i].clone()).collect()))
}

/// Rename column `from` to `to`, keeping its position and values.
pub fn rename_column(dataset: &DataSet, from: &str, to: &str) -> CleanlyResult<DataSet> {
    let idx = dataset.schema.require(from)?;
    if to.is_empty() {
        return Err(CleanlyError::invalid_argument("to", "column name must not be empty"));
    }
    if from != to && dataset.schema.index_of(to).is_some() {
        return Err(CleanlyError::DuplicateColumn {
            column: to.to_owned(),
        });
    }

    let mut out = dataset.clone();
    out.schema.fields[idx].name = to.to_owned();
    Ok(out)
}

/// Keep rows whose `column` cell equals `raw`, parsed according to the column type.
///
/// Missing cells never match. For a numeric column, `raw` must parse as a number.
pub fn filter_equals(dataset: &DataSet, column: &str, raw: &str) -> CleanlyResult<DataSet> {
    let idx = dataset.schema.require(column)?;
    match dataset.schema.fields[idx].data_type {
        DataType::Numeric => {
            let wanted: f64 = raw.trim().parse().map_err(|_| {
                CleanlyError::invalid_argument(
                    "value",
                    format!("'{raw}' is not a number (column '{column}' is numeric)"),
                )
            })?;
            Ok(dataset.filter_rows(|row| row[idx].as_number() == Some(wanted)))
        }
        DataType::Categorical => Ok(dataset.filter_rows(|row| row[idx].as_text() == Some(raw))),
    }
}

/// Sort direction for [`sort_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort by one column. Missing values go last in either order.
pub fn sort_by(dataset: &DataSet, column: &str, order: SortOrder) -> CleanlyResult<DataSet> {
    let idx = dataset.schema.require(column)?;
    let mut rows = dataset.rows.clone();
    rows.sort_by(|a, b| match (a[idx].is_missing(), b[idx].is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = compare_present(&a[idx], &b[idx]);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
    });
    Ok(DataSet::new(dataset.schema.clone(), rows))
}

/// Order two non-missing cells of the same column.
pub(crate) fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or_else(|| x.total_cmp(y)),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
