//! `cleanly` is a small library for cleaning tabular data held in an in-memory
//! [`types::DataSet`].
//!
//! The core transforms live in [`processing`]:
//!
//! - [`processing::clean`]: drop exact duplicate rows, then fill missing numeric cells with the
//!   column mean and missing categorical cells with the column mode
//! - [`processing::filter_zscore`]: drop rows with any numeric |z| at or above a threshold
//! - [`processing::filter_iqr`]: drop rows with any numeric value outside the 1.5 * IQR fences
//!
//! Every transform borrows its input and returns a new dataset. Columns whose statistics are
//! undefined (no values, a single value, zero spread) are reported as
//! [`UndefinedStatistic`] warnings instead of failing the call.
//!
//! ## Data model
//!
//! A [`types::DataSet`] is a [`types::Schema`] plus rows of [`types::Value`]s. Columns are
//! either [`types::DataType::Numeric`] (`f64`) or [`types::DataType::Categorical`] (text).
//! [`types::Value::Null`] and a numeric NaN both count as missing.
//!
//! ## Quick example
//!
//! ```rust
//! use cleanly::processing::{clean, filter_iqr};
//! use cleanly::types::{Column, DataSet, Value};
//!
//! # fn main() -> Result<(), cleanly::CleanlyError> {
//! let ds = DataSet::from_columns(vec![
//!     Column::numeric("A", [Some(1.0), Some(1.0), None]),
//!     Column::categorical("B", [Some("x"), Some("x"), Some("y")]),
//! ])?;
//!
//! let cleaned = clean(&ds)?;
//! assert_eq!(cleaned.rows, vec![
//!     vec![Value::Number(1.0), Value::from("x")],
//!     vec![Value::Number(1.0), Value::from("y")],
//! ]);
//! assert_eq!(filter_iqr(&cleaned).row_count(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Files and sessions
//!
//! [`ingestion::ingest_from_path`] reads a CSV file (inferring column types unless a schema is
//! given) and [`export::write_csv_to_path`] writes one back. [`session::Session`] ties these
//! together with the statistics in [`processing::stats`] and reports every step to an optional
//! [`observability::Observer`].
//!
//! ```no_run
//! use cleanly::session::{Action, Session, SessionOptions};
//!
//! # fn main() -> Result<(), cleanly::CleanlyError> {
//! let mut session = Session::open("sales.csv", SessionOptions::default())?;
//! for token in ["clean", "iqr", "sort=price:desc"] {
//!     session.apply(&token.parse::<Action>()?)?;
//! }
//! session.export("sales_clean.csv")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: schema + in-memory dataset types
//! - [`processing`]: cleaning, outlier filters, column/row transforms, statistics
//! - [`ingestion`] / [`export`]: CSV in and out
//! - [`session`]: one dataset, many actions
//! - [`config`]: tunable parameters, loadable from JSON
//! - [`observability`]: observer hooks
//! - [`error`]: error and warning types

pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod observability;
pub mod processing;
pub mod session;
pub mod types;

pub use error::{CleanlyError, CleanlyResult, StatisticIssue, UndefinedStatistic};
