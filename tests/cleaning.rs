use cleanly::ingestion::csv::infer_csv_from_path;
use cleanly::processing::outliers::filter_zscore_report;
use cleanly::processing::{clean, clean_report, filter_iqr, filter_zscore};
use cleanly::types::{Column, DataSet, Value};
use cleanly::{CleanlyError, StatisticIssue};
use pretty_assertions::assert_eq;

fn scenario_one() -> DataSet {
    DataSet::from_columns(vec![
        Column::numeric("A", [Some(1.0), Some(2.0), Some(2.0), Some(f64::NAN)]),
        Column::numeric("B", [Some(f64::NAN), Some(2.0), Some(2.0), Some(3.0)]),
        Column::categorical("C", [Some("a"), Some("b"), Some("b"), None]),
    ])
    .unwrap()
}

fn outlier_pair() -> DataSet {
    DataSet::from_columns(vec![
        Column::numeric("A", [Some(1.0), Some(2.0), Some(3.0), Some(1000.0)]),
        Column::numeric("B", [Some(10.0), Some(20.0), Some(30.0), Some(1000.0)]),
    ])
    .unwrap()
}

fn sales() -> DataSet {
    infer_csv_from_path("tests/fixtures/sales.csv").unwrap()
}

fn column_has_no_missing(ds: &DataSet, idx: usize) -> bool {
    ds.column(idx).all(|v| !v.is_missing())
}

#[test]
fn clean_removes_duplicate_and_fills_gaps() {
    let ds = scenario_one();
    let out = clean(&ds).unwrap();

    assert_eq!(out.row_count(), 3);
    for idx in 0..3 {
        assert!(column_has_no_missing(&out, idx), "column {idx} still has gaps");
    }
    // A mean of {1, 2}; B mean of {2, 3}; C tie between "a" and "b" resolves to "a".
    assert_eq!(
        out.rows,
        vec![
            vec![Value::Number(1.0), Value::Number(2.5), Value::from("a")],
            vec![Value::Number(2.0), Value::Number(2.0), Value::from("b")],
            vec![Value::Number(1.5), Value::Number(3.0), Value::from("a")],
        ]
    );
    // Input is left as it was.
    assert_eq!(ds.row_count(), 4);
}

#[test]
fn clean_twice_is_stable_on_scenario() {
    let once = clean(&scenario_one()).unwrap();
    assert_eq!(clean(&once).unwrap(), once);
}

#[test]
fn fully_missing_categorical_column_fails_clean() {
    let ds = DataSet::from_columns(vec![
        Column::numeric("n", [Some(1.0), Some(2.0)]),
        Column::categorical("c", [None::<&str>, None]),
    ])
    .unwrap();

    match clean(&ds) {
        Err(CleanlyError::EmptyColumn { column }) => assert_eq!(column, "c"),
        other => panic!("expected EmptyColumn, got {other:?}"),
    }
}

#[test]
fn fully_missing_numeric_column_is_reported_not_fatal() {
    let ds = DataSet::from_columns(vec![
        Column::numeric("n", [None, None]),
        Column::categorical("c", [Some("x"), Some("y")]),
    ])
    .unwrap();

    let report = clean_report(&ds).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].column, "n");
    assert_eq!(report.warnings[0].issue, StatisticIssue::NoValues);
    assert!(report.dataset.column(0).all(|v| v.is_missing()));
}

#[test]
fn iqr_removes_extreme_row() {
    let out = filter_iqr(&outlier_pair());
    assert_eq!(out.row_count(), 3);
    assert!(!out.rows.contains(&vec![Value::Number(1000.0), Value::Number(1000.0)]));
}

#[test]
fn zscore_three_sigma_needs_enough_rows() {
    // Four rows cap |z| at (n - 1) / sqrt(n) = 1.5, below a 3.0 cutoff.
    assert_eq!(filter_zscore(&outlier_pair(), 3.0).unwrap().row_count(), 4);
    assert_eq!(filter_zscore(&outlier_pair(), 1.4).unwrap().row_count(), 3);

    // With 21 rows the same kind of outlier sits well past 3 sigma.
    let ds = sales();
    let out = filter_zscore(&ds, 3.0).unwrap();
    assert_eq!(out.row_count(), 20);
    let price = out.schema.index_of("price").unwrap();
    assert!(out.column(price).all(|v| v.as_number() != Some(1000.0)));
}

#[test]
fn constant_column_survives_any_threshold() {
    let ds = DataSet::from_columns(vec![
        Column::numeric("k", [Some(5.0); 8]),
        Column::categorical("tag", ["a", "b", "c", "d", "e", "f", "g", "h"].map(Some)),
    ])
    .unwrap();
    for t in [1e-9, 0.5, 3.0, f64::INFINITY] {
        assert_eq!(filter_zscore(&ds, t).unwrap(), ds, "threshold {t}");
    }
}

#[test]
fn negative_threshold_is_rejected() {
    let err = filter_zscore(&outlier_pair(), -1.0).unwrap_err();
    assert!(matches!(err, CleanlyError::InvalidArgument { .. }));
    assert!(err.to_string().contains("threshold"));
}

#[test]
fn outlier_filters_are_idempotent_on_sales() {
    let ds = sales();

    let once = filter_iqr(&ds);
    assert_eq!(once.row_count(), 20);
    assert_eq!(filter_iqr(&once), once);

    let once = filter_zscore(&ds, 3.0).unwrap();
    assert_eq!(filter_zscore(&once, 3.0).unwrap(), once);
}

#[test]
fn categorical_columns_pass_through_filters() {
    let ds = sales();
    let city = ds.schema.index_of("city").unwrap();
    let out = filter_iqr(&ds);
    assert_eq!(out.schema, ds.schema);
    assert_eq!(
        out.column(city).cloned().collect::<Vec<_>>(),
        ds.column(city).take(20).cloned().collect::<Vec<_>>()
    );
}

#[test]
fn gaps_fail_zscore_but_pass_iqr() {
    let ds = DataSet::from_columns(vec![
        Column::numeric("a", [Some(1.0), Some(2.0), Some(3.0), None]),
        Column::categorical("tag", [Some("w"), Some("x"), Some("y"), Some("z")]),
    ])
    .unwrap();

    let z = filter_zscore(&ds, 3.0).unwrap();
    assert_eq!(z.row_count(), 3);
    assert!(z.column(1).all(|v| v.as_text() != Some("z")));
    assert_eq!(filter_iqr(&ds), ds);
}

#[test]
fn overflowing_column_is_skipped_by_zscore() {
    let ds = DataSet::from_columns(vec![
        Column::numeric("big", [Some(1e308), Some(1e308), Some(1.0), Some(2.0), Some(3.0)]),
        Column::numeric("small", [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]),
    ])
    .unwrap();

    let report = filter_zscore_report(&ds, 3.0).unwrap();
    assert_eq!(report.dataset, ds);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].column, "big");
    assert_eq!(report.warnings[0].issue, StatisticIssue::NonFinite);
}
