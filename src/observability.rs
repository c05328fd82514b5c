//! Observer hooks for ingestion, transforms and export.
//!
//! [`crate::session::Session`] and [`crate::ingestion::ingest_from_path`] report every operation
//! to an optional [`Observer`]: success with row counts, non-fatal [`UndefinedStatistic`]
//! warnings, and failures classified by [`Severity`].

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{CleanlyError, UndefinedStatistic};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O failures).
    Critical,
}

impl Severity {
    /// Classify a failure.
    ///
    /// I/O problems are `Critical`; everything caused by the data or the arguments is `Error`.
    pub fn for_error(e: &CleanlyError) -> Self {
        match e {
            CleanlyError::Io(_) => Severity::Critical,
            CleanlyError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Severity::Critical,
                _ => Severity::Error,
            },
            CleanlyError::Json(err) if err.is_io() => Severity::Critical,
            _ => Severity::Error,
        }
    }
}

/// What an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    /// Operation name, e.g. `"ingest"`, `"clean"`, `"zscore"`.
    pub operation: String,
    /// File involved, for ingestion/export.
    pub path: Option<PathBuf>,
}

impl OperationContext {
    /// Context for an in-memory operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            path: None,
        }
    }

    /// Context for an operation on a file.
    pub fn with_path(operation: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            operation: operation.into(),
            path: Some(path.as_ref().to_path_buf()),
        }
    }
}

impl fmt::Display for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op={}", self.operation)?;
        if let Some(path) = &self.path {
            write!(f, " path={}", path.display())?;
        }
        Ok(())
    }
}

/// Row counts reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationStats {
    /// Rows before the operation (0 for ingestion).
    pub rows_in: usize,
    /// Rows after the operation.
    pub rows_out: usize,
}

/// Observer interface for operation outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait Observer: Send + Sync {
    /// Called when an operation succeeds.
    fn on_success(&self, _ctx: &OperationContext, _stats: OperationStats) {}

    /// Called once per undefined statistic encountered by a successful operation.
    fn on_warning(&self, _ctx: &OperationContext, _warning: &UndefinedStatistic) {}

    /// Called when an operation fails.
    fn on_failure(&self, _ctx: &OperationContext, _severity: Severity, _error: &CleanlyError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Report `result` to `observer`, alerting when the failure severity is `>= alert_at_or_above`.
pub(crate) fn report<T>(
    observer: Option<&Arc<dyn Observer>>,
    alert_at_or_above: Severity,
    ctx: &OperationContext,
    result: &Result<T, CleanlyError>,
    stats: impl FnOnce(&T) -> OperationStats,
) {
    let Some(obs) = observer else {
        return;
    };
    match result {
        Ok(v) => obs.on_success(ctx, stats(v)),
        Err(e) => {
            let sev = Severity::for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn Observer>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn Observer>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl Observer for CompositeObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_warning(&self, ctx: &OperationContext, warning: &UndefinedStatistic) {
        for o in &self.observers {
            o.on_warning(ctx, warning);
        }
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl Observer for StdErrObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        eprintln!(
            "[cleanly][ok] {ctx} rows_in={} rows_out={}",
            stats.rows_in, stats.rows_out
        );
    }

    fn on_warning(&self, ctx: &OperationContext, warning: &UndefinedStatistic) {
        eprintln!("[cleanly][Warning] {ctx} {warning}");
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        eprintln!("[cleanly][{severity:?}] {ctx} err={error}");
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        eprintln!("[ALERT][cleanly][{severity:?}] {ctx} err={error}");
    }
}

/// Forwards events to `tracing` under the `cleanly` target.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        tracing::info!(
            operation = %ctx.operation,
            rows_in = stats.rows_in,
            rows_out = stats.rows_out,
            "operation finished"
        );
    }

    fn on_warning(&self, ctx: &OperationContext, warning: &UndefinedStatistic) {
        tracing::warn!(operation = %ctx.operation, column = %warning.column, "{warning}");
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        tracing::error!(operation = %ctx.operation, ?severity, "{error}");
    }
}

/// Appends events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl Observer for FileObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        self.append_line(&format!(
            "{} ok {ctx} rows_in={} rows_out={}",
            unix_ts(),
            stats.rows_in,
            stats.rows_out
        ));
    }

    fn on_warning(&self, ctx: &OperationContext, warning: &UndefinedStatistic) {
        self.append_line(&format!("{} warn {ctx} {warning}", unix_ts()));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        self.append_line(&format!(
            "{} fail severity={severity:?} {ctx} err={error}",
            unix_ts()
        ));
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &CleanlyError) {
        self.append_line(&format!(
            "{} ALERT severity={severity:?} {ctx} err={error}",
            unix_ts()
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
