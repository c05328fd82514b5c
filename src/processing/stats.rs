//! Column statistics: the numeric primitives used by the transforms, plus the summary views
//! (overview, describe, correlation, histogram, value counts).

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::check_bins;
use crate::error::{CleanlyError, CleanlyResult};
use crate::types::{DataSet, DataType};

use super::clean::duplicate_row_indices;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` with fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile `q` in `[0, 1]` of ascending `sorted`, linearly interpolating between closest ranks.
///
/// Returns `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sorted copy of `values` (which must not contain NaN).
pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Most frequent value. Ties go to the lexicographically smallest value.
pub fn mode<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        // Keys arrive in ascending order; a later key must strictly beat the count.
        if best.is_none_or(|(_, n)| count > n) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v)
}

/// Shape, duplicates and missing values of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub duplicate_rows: usize,
    /// `(column, missing count)` for columns with at least one missing value, in schema order.
    pub missing: Vec<(String, usize)>,
}

/// Summarize shape, duplicate rows and per-column missing counts.
pub fn overview(dataset: &DataSet) -> Overview {
    let missing = dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let n = dataset.column(idx).filter(|v| v.is_missing()).count();
            (f.name.clone(), n)
        })
        .filter(|(_, n)| *n > 0)
        .collect();

    Overview {
        rows: dataset.row_count(),
        columns: dataset.column_count(),
        duplicate_rows: duplicate_row_indices(dataset).len(),
        missing,
    }
}

/// Descriptive statistics of one numeric column. Undefined statistics are NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

/// Count, mean, std, min, quartiles and max of every numeric column.
pub fn describe(dataset: &DataSet) -> Vec<ColumnSummary> {
    dataset
        .schema
        .indices_of_type(DataType::Numeric)
        .into_iter()
        .map(|idx| {
            let values = sorted(&dataset.numbers(idx));
            let q = |p| quantile(&values, p).unwrap_or(f64::NAN);
            ColumnSummary {
                column: dataset.schema.fields[idx].name.clone(),
                count: values.len(),
                mean: mean(&values).unwrap_or(f64::NAN),
                std: sample_std(&values).unwrap_or(f64::NAN),
                min: values.first().copied().unwrap_or(f64::NAN),
                q25: q(0.25),
                median: q(0.5),
                q75: q(0.75),
                max: values.last().copied().unwrap_or(f64::NAN),
            }
        })
        .collect()
}

/// Pairwise Pearson correlations between numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    /// Numeric column names, in schema order.
    pub columns: Vec<String>,
    /// `values[i][j]` is the correlation of `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Pearson correlation of every pair of numeric columns.
///
/// Each pair uses the rows where both cells are present. A pair with fewer than two such rows,
/// or with zero spread in either column, correlates as NaN.
pub fn correlation_matrix(dataset: &DataSet) -> CorrelationMatrix {
    let idxs = dataset.schema.indices_of_type(DataType::Numeric);
    let values = idxs
        .iter()
        .map(|&a| {
            idxs.iter()
                .map(|&b| {
                    let pairs: Vec<(f64, f64)> = dataset
                        .rows
                        .iter()
                        .filter_map(|row| Some((row[a].as_number()?, row[b].as_number()?)))
                        .collect();
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: idxs
            .iter()
            .map(|&i| dataset.schema.fields[i].name.clone())
            .collect(),
        values,
    }
}

fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
        sxy += (x - mx) * (y - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Equal-width histogram of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    /// `counts.len() + 1` ascending bin edges. The last bin includes its right edge.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Bin the non-missing values of `column` into `bins` equal-width bins over `[min, max]`.
///
/// A constant column is binned over `[v - 0.5, v + 0.5]`, an empty one over `[0, 1]`.
pub fn histogram(dataset: &DataSet, column: &str, bins: usize) -> CleanlyResult<Histogram> {
    check_bins("bins", bins)?;
    let idx = numeric_column(dataset, column)?;
    let values = dataset.numbers(idx);

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if values.is_empty() {
        (lo, hi) = (0.0, 1.0);
    } else if lo == hi {
        (lo, hi) = (lo - 0.5, hi + 0.5);
    }

    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in values {
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    Ok(Histogram {
        column: column.to_owned(),
        edges,
        counts,
    })
}

/// Occurrences of each non-missing value of a categorical column, in first-appearance order.
pub fn value_counts(dataset: &DataSet, column: &str) -> CleanlyResult<Vec<(String, usize)>> {
    let idx = dataset.schema.require(column)?;
    if dataset.schema.fields[idx].data_type != DataType::Categorical {
        return Err(CleanlyError::invalid_argument(
            "column",
            format!("'{column}' is not categorical"),
        ));
    }

    let mut order: Vec<(String, usize)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for text in dataset.column(idx).filter_map(|v| v.as_text()) {
        match position.get(text) {
            Some(&i) => order[i].1 += 1,
            None => {
                position.insert(text, order.len());
                order.push((text.to_owned(), 1));
            }
        }
    }
    Ok(order)
}

pub(crate) fn numeric_column(dataset: &DataSet, column: &str) -> CleanlyResult<usize> {
    let idx = dataset.schema.require(column)?;
    if dataset.schema.fields[idx].data_type != DataType::Numeric {
        return Err(CleanlyError::invalid_argument(
            "column",
            format!("'{column}' is not numeric"),
        ));
    }
    Ok(idx)
}
