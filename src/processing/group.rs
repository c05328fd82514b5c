//! Column reductions and group-by aggregation.

use std::str::FromStr;

use crate::error::{CleanlyError, CleanlyResult};
use crate::types::{DataSet, Field, Schema, Value};

use super::stats::{mean, numeric_column};
use super::transform::compare_present;

/// Aggregations over a numeric column. Missing values are ignored by all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Mean,
    Sum,
    /// Number of non-missing values.
    Count,
    Max,
    Min,
}

impl FromStr for AggFunc {
    type Err = CleanlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" | "avg" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "count" => Ok(Self::Count),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            _ => Err(CleanlyError::invalid_argument(
                "agg",
                format!("unknown aggregation '{s}' (expected mean/sum/count/max/min)"),
            )),
        }
    }
}

/// Apply `func` to `values`.
///
/// `Sum` of nothing is 0 and `Count` of nothing is 0; `Mean`/`Max`/`Min` of nothing is
/// [`Value::Null`].
pub fn aggregate(values: &[f64], func: AggFunc) -> Value {
    let folded = match func {
        AggFunc::Count => return Value::Number(values.len() as f64),
        AggFunc::Sum => return Value::Number(values.iter().sum()),
        AggFunc::Mean => mean(values),
        AggFunc::Max => values.iter().copied().reduce(f64::max),
        AggFunc::Min => values.iter().copied().reduce(f64::min),
    };
    folded.map(Value::Number).unwrap_or(Value::Null)
}

/// Reduce a whole numeric column with `func`.
pub fn reduce(dataset: &DataSet, column: &str, func: AggFunc) -> CleanlyResult<Value> {
    let idx = numeric_column(dataset, column)?;
    Ok(aggregate(&dataset.numbers(idx), func))
}

/// Aggregate `agg_column` per distinct value of `group_column`.
///
/// Rows whose group key is missing are dropped. The result has one row per group, sorted by
/// key ascending, with schema `[group_column, agg_column]`.
///
/// ```rust
/// use cleanly::processing::{group_by, AggFunc};
/// use cleanly::types::{Column, DataSet, Value};
///
/// let ds = DataSet::from_columns(vec![
///     Column::categorical("city", [Some("Oslo"), Some("Lima"), Some("Oslo")]),
///     Column::numeric("sales", [Some(1.0), Some(5.0), Some(2.0)]),
/// ])
/// .unwrap();
/// let out = group_by(&ds, "city", "sales", AggFunc::Sum).unwrap();
/// assert_eq!(out.rows, vec![
///     vec![Value::from("Lima"), Value::Number(5.0)],
///     vec![Value::from("Oslo"), Value::Number(3.0)],
/// ]);
/// ```
pub fn group_by(
    dataset: &DataSet,
    group_column: &str,
    agg_column: &str,
    func: AggFunc,
) -> CleanlyResult<DataSet> {
    let key_idx = dataset.schema.require(group_column)?;
    let agg_idx = numeric_column(dataset, agg_column)?;
    if key_idx == agg_idx {
        // Grouping a column by itself would repeat its name.
        return Err(CleanlyError::DuplicateColumn {
            column: group_column.to_owned(),
        });
    }

    let mut keyed: Vec<(&Value, Option<f64>)> = dataset
        .rows
        .iter()
        .filter(|row| !row[key_idx].is_missing())
        .map(|row| (&row[key_idx], row[agg_idx].as_number()))
        .collect();
    keyed.sort_by(|a, b| compare_present(a.0, b.0));

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut start = 0;
    while start < keyed.len() {
        let key = keyed[start].0;
        let end = keyed[start..]
            .iter()
            .position(|(k, _)| compare_present(k, key).is_ne())
            .map_or(keyed.len(), |n| start + n);
        let values: Vec<f64> = keyed[start..end].iter().filter_map(|(_, v)| *v).collect();
        rows.push(vec![key.clone(), aggregate(&values, func)]);
        start = end;
    }

    let schema = Schema::new(vec![
        dataset.schema.fields[key_idx].clone(),
        Field::numeric(dataset.schema.fields[agg_idx].name.clone()),
    ]);
    Ok(DataSet::new(schema, rows))
}
