//! Ingestion entrypoints.
//!
//! Most callers should use [`ingest_from_path`], which:
//!
//! - reads a CSV file into an in-memory [`crate::types::DataSet`]
//! - uses [`IngestionOptions::schema`] when set, otherwise infers column types
//! - optionally reports success/failure/alerts to an [`Observer`]
//!
//! Format-specific functions live in [`csv`].

pub mod csv;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::CleanlyResult;
use crate::observability::{self, Observer, OperationContext, OperationStats, Severity};
use crate::types::{DataSet, Schema};

/// Options controlling [`ingest_from_path`].
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, infer column types from the data.
    pub schema: Option<Schema>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn Observer>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("schema", &self.schema)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            schema: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Read a CSV file into a [`DataSet`].
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```no_run
/// use cleanly::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), cleanly::CleanlyError> {
/// let ds = ingest_from_path("sales.csv", &IngestionOptions::default())?;
/// println!("rows={} cols={}", ds.row_count(), ds.column_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    options: &IngestionOptions,
) -> CleanlyResult<DataSet> {
    let path = path.as_ref();
    let ctx = OperationContext::with_path("ingest", path);

    let result = match &options.schema {
        Some(schema) => csv::ingest_csv_from_path(path, schema),
        None => csv::infer_csv_from_path(path),
    };

    match &result {
        Ok(ds) => tracing::debug!(
            path = %path.display(),
            rows = ds.row_count(),
            columns = ds.column_count(),
            "ingested csv"
        ),
        Err(e) => tracing::debug!(path = %path.display(), "csv ingestion failed: {e}"),
    }

    observability::report(
        options.observer.as_ref(),
        options.alert_at_or_above,
        &ctx,
        &result,
        |ds| OperationStats {
            rows_in: 0,
            rows_out: ds.row_count(),
        },
    );

    result
}
