//! Row-wise outlier removal over numeric columns.
//!
//! Both filters compute per-column bounds once from the input, then keep a row only if every
//! numeric cell is within its column's bounds. Categorical columns are carried through
//! untouched. A missing cell has no z-score, so it fails the Z-score test for a checked
//! column; it never falls outside an IQR fence.

use serde::Serialize;

use crate::config::{check_positive, DEFAULT_IQR_MULTIPLIER};
use crate::error::{CleanlyResult, StatisticIssue, UndefinedStatistic};
use crate::types::{DataSet, DataType};

use super::Transformed;
use super::stats::{mean, quantile, sample_std, sorted};

/// Drop rows with any numeric |z| >= `threshold`.
///
/// z is computed against the column mean and sample standard deviation of the non-missing
/// values. A row missing a value in a checked column is dropped. A column whose mean or
/// deviation is zero, undefined or not finite is skipped and lets every row through.
///
/// Fails with [`crate::CleanlyError::InvalidArgument`] unless `threshold > 0`.
pub fn filter_zscore(dataset: &DataSet, threshold: f64) -> CleanlyResult<DataSet> {
    filter_zscore_report(dataset, threshold).map(|t| t.into_dataset("zscore"))
}

/// [`filter_zscore`], also returning columns that were skipped for lack of spread.
pub fn filter_zscore_report(dataset: &DataSet, threshold: f64) -> CleanlyResult<Transformed> {
    check_positive("threshold", threshold)?;

    let mut warnings = Vec::new();
    let mut checks: Vec<(usize, f64, f64)> = Vec::new();
    for idx in dataset.schema.indices_of_type(DataType::Numeric) {
        let name = &dataset.schema.fields[idx].name;
        let values = dataset.numbers(idx);
        match (mean(&values), sample_std(&values)) {
            (None, _) => warnings.push(UndefinedStatistic::new(name, StatisticIssue::NoValues)),
            (Some(_), None) => {
                warnings.push(UndefinedStatistic::new(name, StatisticIssue::TooFewValues))
            }
            (Some(mu), Some(sd)) if !mu.is_finite() || !sd.is_finite() => {
                warnings.push(UndefinedStatistic::new(name, StatisticIssue::NonFinite))
            }
            (Some(_), Some(sd)) if sd == 0.0 => {
                warnings.push(UndefinedStatistic::new(name, StatisticIssue::ZeroSpread))
            }
            (Some(mu), Some(sd)) => checks.push((idx, mu, sd)),
        }
    }

    let out = dataset.filter_rows(|row| {
        checks.iter().all(|&(idx, mu, sd)| {
            row[idx]
                .as_number()
                .is_some_and(|v| ((v - mu) / sd).abs() < threshold)
        })
    });
    tracing::debug!(
        threshold,
        rows_in = dataset.row_count(),
        rows_out = out.row_count(),
        "z-score filter"
    );

    Ok(Transformed::new(out, warnings))
}

/// Inclusive bounds `[q1 - k * iqr, q3 + k * iqr]` of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fence {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fence {
    /// Whether `v` is inside the fence (edges included).
    pub fn contains(&self, v: f64) -> bool {
        self.lower <= v && v <= self.upper
    }
}

/// IQR fences of every numeric column that has at least one value, in schema order.
pub fn iqr_fences(dataset: &DataSet, multiplier: f64) -> CleanlyResult<Vec<Fence>> {
    check_positive("iqr_multiplier", multiplier)?;
    Ok(fences_with_warnings(dataset, multiplier)
        .0
        .into_iter()
        .map(|(_, f)| f)
        .collect())
}

fn fences_with_warnings(
    dataset: &DataSet,
    multiplier: f64,
) -> (Vec<(usize, Fence)>, Vec<UndefinedStatistic>) {
    let mut warnings = Vec::new();
    let mut fences = Vec::new();
    for idx in dataset.schema.indices_of_type(DataType::Numeric) {
        let name = &dataset.schema.fields[idx].name;
        let values = sorted(&dataset.numbers(idx));
        match (quantile(&values, 0.25), quantile(&values, 0.75)) {
            (Some(q1), Some(q3)) => {
                let iqr = q3 - q1;
                fences.push((
                    idx,
                    Fence {
                        column: name.clone(),
                        q1,
                        q3,
                        lower: q1 - multiplier * iqr,
                        upper: q3 + multiplier * iqr,
                    },
                ));
            }
            _ => warnings.push(UndefinedStatistic::new(name, StatisticIssue::NoValues)),
        }
    }
    (fences, warnings)
}

/// Drop rows with any numeric value outside the 1.5 * IQR fences.
///
/// ```rust
/// use cleanly::processing::filter_iqr;
/// use cleanly::types::{Column, DataSet, Value};
///
/// let ds = DataSet::from_columns(vec![
///     Column::numeric("a", [Some(1.0), Some(2.0), Some(3.0), Some(1000.0)]),
///     Column::categorical("tag", [Some("x"), Some("y"), Some("z"), Some("w")]),
/// ])
/// .unwrap();
/// let out = filter_iqr(&ds);
/// assert_eq!(out.row_count(), 3);
/// assert_eq!(out.rows[2][1], Value::from("z"));
/// ```
pub fn filter_iqr(dataset: &DataSet) -> DataSet {
    apply_fences(dataset, DEFAULT_IQR_MULTIPLIER).into_dataset("iqr")
}

/// [`filter_iqr`] with a configurable fence multiplier (must be > 0).
pub fn filter_iqr_with_multiplier(dataset: &DataSet, multiplier: f64) -> CleanlyResult<DataSet> {
    filter_iqr_report(dataset, multiplier).map(|t| t.into_dataset("iqr"))
}

/// [`filter_iqr_with_multiplier`], also returning columns that had no values to fence.
pub fn filter_iqr_report(dataset: &DataSet, multiplier: f64) -> CleanlyResult<Transformed> {
    check_positive("iqr_multiplier", multiplier)?;
    Ok(apply_fences(dataset, multiplier))
}

fn apply_fences(dataset: &DataSet, multiplier: f64) -> Transformed {
    let (fences, warnings) = fences_with_warnings(dataset, multiplier);
    let out = dataset.filter_rows(|row| {
        fences
            .iter()
            .all(|(idx, fence)| row[*idx].as_number().is_none_or(|v| fence.contains(v)))
    });
    tracing::debug!(
        multiplier,
        rows_in = dataset.row_count(),
        rows_out = out.row_count(),
        "iqr filter"
    );
    Transformed::new(out, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanlyError;
    use crate::types::{Column, Value};

    fn scenario_two() -> DataSet {
        DataSet::from_columns(vec![
            Column::numeric("A", [Some(1.0), Some(2.0), Some(3.0), Some(1000.0)]),
            Column::numeric("B", [Some(10.0), Some(20.0), Some(30.0), Some(1000.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn zscore_drops_outlier_with_low_threshold() {
        // With four rows the largest attainable |z| is 1.5, so a 3.0 cutoff keeps everything.
        let out = filter_zscore(&scenario_two(), 1.4).unwrap();
        assert_eq!(out.row_count(), 3);
        assert!(out.rows.iter().all(|r| r[0] != Value::Number(1000.0)));
    }

    #[test]
    fn zscore_rejects_non_positive_threshold() {
        for t in [0.0, -1.0, f64::NAN] {
            let err = filter_zscore(&scenario_two(), t).unwrap_err();
            assert!(matches!(err, CleanlyError::InvalidArgument { .. }), "{t}");
        }
    }

    #[test]
    fn zscore_constant_column_keeps_all_rows() {
        let ds = DataSet::from_columns(vec![Column::numeric("k", [Some(5.0); 6])]).unwrap();
        for t in [0.01, 1.0, 3.0] {
            let report = filter_zscore_report(&ds, t).unwrap();
            assert_eq!(report.dataset.row_count(), 6);
            assert_eq!(
                report.warnings,
                vec![UndefinedStatistic::new("k", StatisticIssue::ZeroSpread)]
            );
        }
    }

    #[test]
    fn zscore_single_value_column_is_skipped() {
        let ds = DataSet::from_columns(vec![Column::numeric("k", [Some(5.0), None])]).unwrap();
        let report = filter_zscore_report(&ds, 1.0).unwrap();
        assert_eq!(report.dataset.row_count(), 2);
        assert_eq!(report.warnings[0].issue, StatisticIssue::TooFewValues);
    }

    #[test]
    fn zscore_drops_rows_with_missing_cells() {
        let ds = DataSet::from_columns(vec![Column::numeric(
            "a",
            [Some(1.0), Some(2.0), Some(3.0), None],
        )])
        .unwrap();
        assert_eq!(filter_zscore(&ds, 3.0).unwrap().row_count(), 3);
        assert_eq!(
            filter_zscore(&ds, 0.5).unwrap().rows,
            vec![vec![Value::Number(2.0)]]
        );

        let nan = DataSet::from_columns(vec![Column::numeric(
            "a",
            [Some(1.0), Some(f64::NAN), Some(3.0)],
        )])
        .unwrap();
        assert_eq!(filter_zscore(&nan, 3.0).unwrap().row_count(), 2);
    }

    #[test]
    fn zscore_skipped_column_does_not_drop_missing_cells() {
        // "k" has zero spread, so its gap is not tested; "a" decides alone.
        let ds = DataSet::from_columns(vec![
            Column::numeric("a", [Some(1.0), Some(2.0), Some(3.0)]),
            Column::numeric("k", [Some(4.0), None, Some(4.0)]),
        ])
        .unwrap();
        let report = filter_zscore_report(&ds, 3.0).unwrap();
        assert_eq!(report.dataset, ds);
        assert_eq!(report.warnings[0].issue, StatisticIssue::ZeroSpread);
    }

    #[test]
    fn zscore_non_finite_statistics_skip_column() {
        // The sum of "big" overflows, so its mean is infinite.
        let ds = DataSet::from_columns(vec![
            Column::numeric("big", [Some(1e308), Some(1e308), Some(1.0), Some(2.0), Some(3.0)]),
            Column::numeric("small", [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]),
        ])
        .unwrap();
        let report = filter_zscore_report(&ds, 3.0).unwrap();
        assert_eq!(report.dataset.row_count(), 5);
        assert_eq!(
            report.warnings,
            vec![UndefinedStatistic::new("big", StatisticIssue::NonFinite)]
        );

        let inf = DataSet::from_columns(vec![Column::numeric(
            "x",
            [Some(1.0), Some(f64::INFINITY), Some(2.0)],
        )])
        .unwrap();
        let report = filter_zscore_report(&inf, 3.0).unwrap();
        assert_eq!(report.dataset, inf);
        assert_eq!(report.warnings[0].issue, StatisticIssue::NonFinite);
    }

    #[test]
    fn iqr_keeps_rows_with_missing_cells() {
        let ds = DataSet::from_columns(vec![Column::numeric(
            "a",
            [Some(1.0), Some(2.0), Some(3.0), None],
        )])
        .unwrap();
        assert_eq!(filter_iqr(&ds), ds);
    }

    #[test]
    fn iqr_removes_scenario_outlier() {
        let out = filter_iqr(&scenario_two());
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.rows[2], vec![Value::Number(3.0), Value::Number(30.0)]);
    }

    #[test]
    fn iqr_fence_is_inclusive() {
        // q1 = 2, q3 = 4, iqr = 2 -> fence [-1, 7]; both edge values stay.
        let tight = DataSet::from_columns(vec![Column::numeric(
            "a",
            [Some(2.0), Some(2.0), Some(4.0), Some(4.0), Some(7.0), Some(-1.0)],
        )])
        .unwrap();
        let f = &iqr_fences(&tight, 1.5).unwrap()[0];
        assert_eq!((f.q1, f.q3, f.lower, f.upper), (2.0, 4.0, -1.0, 7.0));
        assert_eq!(filter_iqr(&tight).row_count(), 6);
    }

    #[test]
    fn iqr_multiplier_must_be_positive() {
        assert!(filter_iqr_with_multiplier(&scenario_two(), 0.0).is_err());
        assert_eq!(
            filter_iqr_with_multiplier(&scenario_two(), 1000.0)
                .unwrap()
                .row_count(),
            4
        );
    }

    #[test]
    fn iqr_all_missing_column_has_no_fence() {
        let ds = DataSet::from_columns(vec![
            Column::numeric("a", [None, None]),
            Column::categorical("c", [Some("x"), None]),
        ])
        .unwrap();
        let report = filter_iqr_report(&ds, 1.5).unwrap();
        assert_eq!(report.dataset, ds);
        assert_eq!(report.warnings[0].issue, StatisticIssue::NoValues);
    }
}
