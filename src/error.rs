use std::fmt;

use thiserror::Error;

/// Convenience result type used across the crate.
pub type CleanlyResult<T> = Result<T, CleanlyError>;

/// Error type returned by ingestion, transforms and export.
///
/// This is a single error enum shared by every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum CleanlyError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON configuration.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data does not conform to the schema (wrong arity, wrong cell type, missing header, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A categorical column has no non-missing value, so no mode exists to impute with.
    #[error("column '{column}' has no non-missing values; cannot compute a mode")]
    EmptyColumn { column: String },

    /// An out-of-range parameter was supplied.
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// A referenced column does not exist in the schema.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    /// A column name would appear twice in a schema.
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },
}

impl CleanlyError {
    pub(crate) fn invalid_argument(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_column(column: &str) -> Self {
        Self::UnknownColumn {
            column: column.to_owned(),
        }
    }
}

/// Why a per-column statistic could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticIssue {
    /// The column has no non-missing values.
    NoValues,
    /// Fewer than two values; the sample standard deviation is undefined.
    TooFewValues,
    /// All values are equal, so the spread is zero.
    ZeroSpread,
    /// The mean or spread overflowed or is infinite.
    NonFinite,
}

/// Non-fatal warning: a column's mean/spread was undefined and a documented fallback was used.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UndefinedStatistic {
    /// Affected column.
    pub column: String,
    /// What was undefined.
    pub issue: StatisticIssue,
}

impl UndefinedStatistic {
    pub(crate) fn new(column: &str, issue: StatisticIssue) -> Self {
        Self {
            column: column.to_owned(),
            issue,
        }
    }
}

impl fmt::Display for UndefinedStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.issue {
            StatisticIssue::NoValues => "no non-missing values",
            StatisticIssue::TooFewValues => "fewer than two values",
            StatisticIssue::ZeroSpread => "zero spread",
            StatisticIssue::NonFinite => "mean or spread is not finite",
        };
        write!(f, "undefined statistic for column '{}': {what}", self.column)
    }
}
