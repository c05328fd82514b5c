use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use cleanly::config::CleaningConfig;
use cleanly::ingestion::{ingest_from_path, IngestionOptions};
use cleanly::observability::{FileObserver, Observer, OperationContext, OperationStats, Severity};
use cleanly::processing::AggFunc;
use cleanly::session::{Action, ActionOutput, Session, SessionOptions};
use cleanly::types::{Column, DataSet, DataType, Field, Schema, Value};
use cleanly::{CleanlyError, StatisticIssue, UndefinedStatistic};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(String, OperationStats)>>,
    warnings: Mutex<Vec<(String, StatisticIssue)>>,
    failures: Mutex<Vec<(String, Severity)>>,
    alerts: Mutex<Vec<Severity>>,
}

impl Observer for RecordingObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        self.successes
            .lock()
            .unwrap()
            .push((ctx.operation.clone(), stats));
    }

    fn on_warning(&self, ctx: &OperationContext, warning: &UndefinedStatistic) {
        self.warnings
            .lock()
            .unwrap()
            .push((ctx.operation.clone(), warning.issue));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, _error: &CleanlyError) {
        self.failures
            .lock()
            .unwrap()
            .push((ctx.operation.clone(), severity));
    }

    fn on_alert(&self, _ctx: &OperationContext, severity: Severity, _error: &CleanlyError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn observed(obs: &Arc<RecordingObserver>) -> SessionOptions {
    SessionOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    }
}

fn actions(tokens: &[&str]) -> Vec<Action> {
    tokens.iter().map(|t| t.parse().unwrap()).collect()
}

#[test]
fn sales_pipeline_cleans_filters_and_groups() {
    let mut session = Session::open("tests/fixtures/sales.csv", SessionOptions::default()).unwrap();
    assert_eq!(session.dataset().row_count(), 21);

    let outputs = session
        .apply_all(&actions(&["clean", "iqr", "sort=price:desc", "group=city:price:count"]))
        .unwrap();

    assert_eq!(
        outputs[..3],
        [
            ActionOutput::Replaced { rows_before: 21, rows_after: 21 },
            ActionOutput::Replaced { rows_before: 21, rows_after: 20 },
            ActionOutput::Replaced { rows_before: 20, rows_after: 20 },
        ]
    );
    match &outputs[3] {
        ActionOutput::Grouped(g) => assert_eq!(
            g.rows,
            vec![
                vec![Value::from("Lima"), Value::Number(6.0)],
                vec![Value::from("Oslo"), Value::Number(7.0)],
                vec![Value::from("Paris"), Value::Number(7.0)],
            ]
        ),
        other => panic!("expected grouped output, got {other:?}"),
    }

    let price = session.dataset().schema.index_of("price").unwrap();
    assert_eq!(session.dataset().rows[0][price], Value::Number(29.0));
}

#[test]
fn describe_reports_without_touching_dataset() {
    let mut session = Session::open("tests/fixtures/sales.csv", SessionOptions::default()).unwrap();
    let before = session.dataset().clone();

    let ActionOutput::Describe(summaries) = session.apply(&Action::Describe).unwrap() else {
        panic!("expected describe output");
    };
    let qty = summaries.iter().find(|s| s.column == "qty").unwrap();
    assert_eq!(qty.count, 21);
    assert_abs_diff_eq!(qty.mean, 61.0 / 21.0, epsilon = 1e-12);
    assert_eq!((qty.min, qty.median, qty.max), (1.0, 3.0, 5.0));

    assert_eq!(session.dataset(), &before);
}

#[test]
fn config_file_sets_default_threshold() {
    let config = CleaningConfig::from_path("tests/fixtures/config.json").unwrap();
    assert_eq!(config.z_threshold, 2.5);
    assert_eq!(config.iqr_multiplier, 1.5);

    let mut session = Session::open(
        "tests/fixtures/sales.csv",
        SessionOptions {
            config,
            ..Default::default()
        },
    )
    .unwrap();
    session.apply(&"zscore".parse().unwrap()).unwrap();
    assert_eq!(session.dataset().row_count(), 20);

    let ActionOutput::Histogram(h) = session.apply(&"histogram=qty".parse().unwrap()).unwrap()
    else {
        panic!("expected histogram");
    };
    assert_eq!(h.counts.len(), 4);
    assert_eq!(h.counts.iter().sum::<usize>(), 20);
}

#[test]
fn observer_sees_ingest_actions_and_warnings() {
    let obs = Arc::new(RecordingObserver::default());
    let mut session = Session::open("tests/fixtures/people.csv", observed(&obs)).unwrap();

    session.apply(&Action::Clean).unwrap();
    session
        .apply(&Action::Group {
            by: "city".to_string(),
            column: "score".to_string(),
            func: AggFunc::Mean,
        })
        .unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![
            ("ingest".to_string(), OperationStats { rows_in: 0, rows_out: 5 }),
            ("clean".to_string(), OperationStats { rows_in: 5, rows_out: 4 }),
            ("group".to_string(), OperationStats { rows_in: 4, rows_out: 4 }),
        ]
    );
    assert!(obs.warnings.lock().unwrap().is_empty());

    // Zero spread: every z-score is undefined.
    let mut constant = Session::new(
        DataSet::from_columns(vec![Column::numeric("k", [Some(1.0), Some(1.0), Some(1.0)])])
            .unwrap(),
        observed(&obs),
    );
    constant.apply(&Action::ZScore(None)).unwrap();
    assert_eq!(
        obs.warnings.lock().unwrap().clone(),
        vec![("zscore".to_string(), StatisticIssue::ZeroSpread)]
    );
}

#[test]
fn failed_action_is_reported_and_leaves_dataset() {
    let obs = Arc::new(RecordingObserver::default());
    let mut session = Session::open("tests/fixtures/people.csv", observed(&obs)).unwrap();
    let before = session.dataset().clone();

    let err = session.apply(&"sort=nope".parse().unwrap()).unwrap_err();
    assert!(matches!(err, CleanlyError::UnknownColumn { .. }));
    assert_eq!(session.dataset(), &before);

    assert_eq!(
        obs.failures.lock().unwrap().clone(),
        vec![("sort".to_string(), Severity::Error)]
    );
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn missing_file_alerts_as_critical() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    };

    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    assert_eq!(
        obs.failures.lock().unwrap().clone(),
        vec![("ingest".to_string(), Severity::Critical)]
    );
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![Severity::Critical]);
}

#[test]
fn schema_mismatch_fails_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        schema: Some(Schema::new(vec![Field::new("definitely_missing", DataType::Categorical)])),
        observer: Some(obs.clone()),
        alert_at_or_above: Severity::Critical,
    };

    let _ = ingest_from_path("tests/fixtures/people.csv", &opts).unwrap_err();

    assert_eq!(
        obs.failures.lock().unwrap().clone(),
        vec![("ingest".to_string(), Severity::Error)]
    );
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn file_observer_appends_lines_and_export_round_trips() {
    let dir = std::env::temp_dir();
    let log = dir.join(format!("cleanly_session_{}.log", std::process::id()));
    let out = dir.join(format!("cleanly_session_{}.csv", std::process::id()));
    let _ = std::fs::remove_file(&log);

    let observer: Arc<dyn Observer> = Arc::new(FileObserver::new(&log));
    let mut session = Session::open(
        "tests/fixtures/people.csv",
        SessionOptions {
            observer: Some(observer),
            ..Default::default()
        },
    )
    .unwrap();
    session.apply(&Action::Clean).unwrap();
    session.export(&out).unwrap();

    let text = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("ok op=ingest"));
    assert!(lines[1].contains("ok op=clean") && lines[1].contains("rows_out=4"));
    assert!(lines[2].contains("ok op=export"));

    let back = Session::open(&out, SessionOptions::default()).unwrap();
    assert_eq!(back.dataset(), session.dataset());

    let _ = std::fs::remove_file(&log);
    let _ = std::fs::remove_file(&out);
}
