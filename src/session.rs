//! A single-dataset working session.
//!
//! A [`Session`] owns the current [`DataSet`] and applies user-chosen [`Action`]s one at a time.
//! Actions that transform the data replace the current dataset; reporting actions
//! (overview, describe, correlation, group, histogram, counts) leave it as is. A failed action
//! leaves the current dataset unchanged.
//!
//! ```rust
//! use cleanly::session::{Action, ActionOutput, Session, SessionOptions};
//! use cleanly::types::{Column, DataSet};
//!
//! # fn main() -> Result<(), cleanly::CleanlyError> {
//! let ds = DataSet::from_columns(vec![
//!     Column::numeric("a", [Some(1.0), Some(1.0), None]),
//! ])?;
//! let mut session = Session::new(ds, SessionOptions::default());
//! let out = session.apply(&"clean".parse::<Action>()?)?;
//! assert_eq!(out, ActionOutput::Replaced { rows_before: 3, rows_after: 2 });
//! assert_eq!(session.dataset().row_count(), 2);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::config::CleaningConfig;
use crate::error::{CleanlyError, CleanlyResult};
use crate::export;
use crate::ingestion::{self, IngestionOptions};
use crate::observability::{self, Observer, OperationContext, OperationStats, Severity};
use crate::processing::stats::{self, ColumnSummary, CorrelationMatrix, Histogram, Overview};
use crate::processing::{self, outliers, transform, AggFunc, SortOrder, Transformed};
use crate::types::DataSet;

/// One user-selectable step.
///
/// Parsed from tokens like `clean`, `zscore=2.5`, `sort=price:desc`, `group=city:price:mean`
/// (see [`Action::from_str`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Overview,
    Describe,
    Clean,
    DropDuplicates,
    ImputeMissing,
    /// Z-score filter; `None` uses [`CleaningConfig::z_threshold`].
    ZScore(Option<f64>),
    /// IQR filter; `None` uses [`CleaningConfig::iqr_multiplier`].
    Iqr(Option<f64>),
    Normalize,
    Encode,
    DropColumns(Vec<String>),
    Rename { from: String, to: String },
    Filter { column: String, value: String },
    Sort { column: String, order: SortOrder },
    Group { by: String, column: String, func: AggFunc },
    Correlation,
    /// Histogram; `None` bins uses [`CleaningConfig::histogram_bins`].
    Histogram { column: String, bins: Option<usize> },
    ValueCounts(String),
}

impl Action {
    /// Short operation name used in logs and observer contexts.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Overview => "overview",
            Action::Describe => "describe",
            Action::Clean => "clean",
            Action::DropDuplicates => "dedupe",
            Action::ImputeMissing => "impute",
            Action::ZScore(_) => "zscore",
            Action::Iqr(_) => "iqr",
            Action::Normalize => "normalize",
            Action::Encode => "encode",
            Action::DropColumns(_) => "drop",
            Action::Rename { .. } => "rename",
            Action::Filter { .. } => "filter",
            Action::Sort { .. } => "sort",
            Action::Group { .. } => "group",
            Action::Correlation => "correlation",
            Action::Histogram { .. } => "histogram",
            Action::ValueCounts(_) => "counts",
        }
    }
}

impl FromStr for Action {
    type Err = CleanlyError;

    /// Parse `name` or `name=argument`.
    ///
    /// | token | action |
    /// |---|---|
    /// | `overview`, `describe`, `correlation` | reports |
    /// | `clean`, `dedupe`, `impute`, `normalize`, `encode` | transforms |
    /// | `zscore[=t]`, `iqr[=k]` | outlier filters |
    /// | `drop=a,b` | drop columns |
    /// | `rename=old:new` | rename a column |
    /// | `filter=col=value` | keep rows where `col == value` |
    /// | `sort=col[:asc\|desc]` | sort |
    /// | `group=by:col:func` | group-by (`mean/sum/count/max/min`) |
    /// | `histogram=col[:bins]`, `counts=col` | distributions |
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg)),
            None => (s.trim(), None),
        };
        let bad = |message: String| CleanlyError::invalid_argument("action", message);
        let required = || {
            arg.filter(|a| !a.is_empty())
                .ok_or_else(|| bad(format!("'{name}' needs an argument ({name}=...)")))
        };
        let number = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| bad(format!("'{raw}' is not a number")))
        };

        let action = match name.to_ascii_lowercase().as_str() {
            "overview" => Action::Overview,
            "describe" | "stats" => Action::Describe,
            "clean" => Action::Clean,
            "dedupe" | "drop-duplicates" => Action::DropDuplicates,
            "impute" => Action::ImputeMissing,
            "zscore" => Action::ZScore(arg.map(number).transpose()?),
            "iqr" => Action::Iqr(arg.map(number).transpose()?),
            "normalize" => Action::Normalize,
            "encode" => Action::Encode,
            "correlation" | "corr" => Action::Correlation,
            "drop" => Action::DropColumns(
                required()?
                    .split(',')
                    .map(|c| c.trim().to_owned())
                    .filter(|c| !c.is_empty())
                    .collect(),
            ),
            "rename" => {
                let (from, to) = required()?
                    .split_once(':')
                    .ok_or_else(|| bad("rename expects old:new".to_string()))?;
                Action::Rename {
                    from: from.to_owned(),
                    to: to.to_owned(),
                }
            }
            "filter" => {
                let (column, value) = required()?
                    .split_once('=')
                    .ok_or_else(|| bad("filter expects column=value".to_string()))?;
                Action::Filter {
                    column: column.to_owned(),
                    value: value.to_owned(),
                }
            }
            "sort" => {
                let arg = required()?;
                let (column, order) = match arg.rsplit_once(':') {
                    Some((column, order)) => (column, parse_order(order)?),
                    None => (arg, SortOrder::Ascending),
                };
                Action::Sort {
                    column: column.to_owned(),
                    order,
                }
            }
            "group" => {
                let parts: Vec<&str> = required()?.split(':').collect();
                let [by, column, func] = parts.as_slice() else {
                    return Err(bad("group expects by:column:func".to_string()));
                };
                Action::Group {
                    by: (*by).to_owned(),
                    column: (*column).to_owned(),
                    func: func.parse()?,
                }
            }
            "histogram" | "hist" => {
                let arg = required()?;
                match arg.rsplit_once(':') {
                    Some((column, bins)) => Action::Histogram {
                        column: column.to_owned(),
                        bins: Some(
                            bins.trim()
                                .parse()
                                .map_err(|_| bad(format!("'{bins}' is not a bin count")))?,
                        ),
                    },
                    None => Action::Histogram {
                        column: arg.to_owned(),
                        bins: None,
                    },
                }
            }
            "counts" => Action::ValueCounts(required()?.to_owned()),
            other => return Err(bad(format!("unknown action '{other}'"))),
        };
        Ok(action)
    }
}

fn parse_order(s: &str) -> CleanlyResult<SortOrder> {
    match s.trim().to_ascii_lowercase().as_str() {
        "asc" | "ascending" => Ok(SortOrder::Ascending),
        "desc" | "descending" => Ok(SortOrder::Descending),
        other => Err(CleanlyError::invalid_argument(
            "order",
            format!("unknown sort order '{other}' (expected asc/desc)"),
        )),
    }
}

/// What an [`Action`] produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ActionOutput {
    /// The current dataset was replaced; see [`Session::dataset`].
    Replaced { rows_before: usize, rows_after: usize },
    Overview(Overview),
    Describe(Vec<ColumnSummary>),
    Correlation(CorrelationMatrix),
    Grouped(DataSet),
    Histogram(Histogram),
    ValueCounts {
        column: String,
        counts: Vec<(String, usize)>,
    },
}

/// Options for a [`Session`].
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct SessionOptions {
    /// Transform parameters.
    pub config: CleaningConfig,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn Observer>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            config: CleaningConfig::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("config", &self.config)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

enum Step {
    Replace(Transformed),
    Report(ActionOutput),
}

/// Owns the current dataset of one user session.
#[derive(Debug)]
pub struct Session {
    dataset: DataSet,
    options: SessionOptions,
}

impl Session {
    /// Start a session on an existing dataset.
    pub fn new(dataset: DataSet, options: SessionOptions) -> Self {
        Self { dataset, options }
    }

    /// Start a session on a CSV file with inferred column types.
    pub fn open(path: impl AsRef<Path>, options: SessionOptions) -> CleanlyResult<Self> {
        let ingest = IngestionOptions {
            schema: None,
            observer: options.observer.clone(),
            alert_at_or_above: options.alert_at_or_above,
        };
        let dataset = ingestion::ingest_from_path(path, &ingest)?;
        Ok(Self::new(dataset, options))
    }

    /// The current dataset.
    pub fn dataset(&self) -> &DataSet {
        &self.dataset
    }

    /// Session options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// End the session, handing back the current dataset.
    pub fn into_dataset(self) -> DataSet {
        self.dataset
    }

    /// Apply one action, replacing the current dataset if the action transforms it.
    pub fn apply(&mut self, action: &Action) -> CleanlyResult<ActionOutput> {
        let ctx = OperationContext::new(action.name());
        let rows_in = self.dataset.row_count();
        let result = self.run(action);

        observability::report(
            self.options.observer.as_ref(),
            self.options.alert_at_or_above,
            &ctx,
            &result,
            |step| OperationStats {
                rows_in,
                rows_out: match step {
                    Step::Replace(t) => t.dataset.row_count(),
                    Step::Report(_) => rows_in,
                },
            },
        );

        match result? {
            Step::Replace(t) => {
                let rows_after = t.dataset.row_count();
                self.dataset = match &self.options.observer {
                    Some(obs) => {
                        for w in &t.warnings {
                            obs.on_warning(&ctx, w);
                        }
                        t.dataset
                    }
                    None => t.into_dataset(action.name()),
                };
                tracing::debug!(action = action.name(), rows_in, rows_after, "dataset replaced");
                Ok(ActionOutput::Replaced {
                    rows_before: rows_in,
                    rows_after,
                })
            }
            Step::Report(out) => Ok(out),
        }
    }

    /// Apply actions in order, stopping at the first failure.
    pub fn apply_all(&mut self, actions: &[Action]) -> CleanlyResult<Vec<ActionOutput>> {
        actions.iter().map(|a| self.apply(a)).collect()
    }

    /// Write the current dataset as CSV.
    pub fn export(&self, path: impl AsRef<Path>) -> CleanlyResult<()> {
        let path = path.as_ref();
        let ctx = OperationContext::with_path("export", path);
        let result = export::write_csv_to_path(&self.dataset, path);
        let rows = self.dataset.row_count();
        observability::report(
            self.options.observer.as_ref(),
            self.options.alert_at_or_above,
            &ctx,
            &result,
            |_| OperationStats {
                rows_in: rows,
                rows_out: rows,
            },
        );
        result
    }

    fn run(&self, action: &Action) -> CleanlyResult<Step> {
        let ds = &self.dataset;
        let cfg = &self.options.config;
        let replace = |dataset: DataSet| Step::Replace(Transformed::new(dataset, Vec::new()));

        let step = match action {
            Action::Clean => Step::Replace(processing::clean_report(ds)?),
            Action::DropDuplicates => replace(processing::drop_duplicates(ds)),
            Action::ImputeMissing => Step::Replace(processing::clean::impute_missing_report(ds)?),
            Action::ZScore(t) => Step::Replace(outliers::filter_zscore_report(
                ds,
                t.unwrap_or(cfg.z_threshold),
            )?),
            Action::Iqr(k) => Step::Replace(outliers::filter_iqr_report(
                ds,
                k.unwrap_or(cfg.iqr_multiplier),
            )?),
            Action::Normalize => Step::Replace(transform::normalize_report(ds)),
            Action::Encode => replace(transform::encode_categorical(ds)),
            Action::DropColumns(columns) => {
                let names: Vec<&str> = columns.iter().map(String::as_str).collect();
                replace(transform::drop_columns(ds, &names)?)
            }
            Action::Rename { from, to } => replace(transform::rename_column(ds, from, to)?),
            Action::Filter { column, value } => {
                replace(transform::filter_equals(ds, column, value)?)
            }
            Action::Sort { column, order } => replace(transform::sort_by(ds, column, *order)?),
            Action::Group { by, column, func } => Step::Report(ActionOutput::Grouped(
                processing::group_by(ds, by, column, *func)?,
            )),
            Action::Overview => Step::Report(ActionOutput::Overview(stats::overview(ds))),
            Action::Describe => Step::Report(ActionOutput::Describe(stats::describe(ds))),
            Action::Correlation => {
                Step::Report(ActionOutput::Correlation(stats::correlation_matrix(ds)))
            }
            Action::Histogram { column, bins } => Step::Report(ActionOutput::Histogram(
                stats::histogram(ds, column, bins.unwrap_or(cfg.histogram_bins))?,
            )),
            Action::ValueCounts(column) => Step::Report(ActionOutput::ValueCounts {
                column: column.clone(),
                counts: stats::value_counts(ds, column)?,
            }),
        };
        Ok(step)
    }
}
