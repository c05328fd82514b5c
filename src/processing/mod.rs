//! In-memory dataset transformations.
//!
//! Every transform borrows a [`DataSet`] and returns a new one; the input is never modified and,
//! on error, nothing is produced.
//!
//! - [`clean`]: duplicate removal + imputation ([`clean::drop_duplicates`],
//!   [`clean::impute_missing`])
//! - [`filter_zscore`] / [`filter_iqr`]: outlier removal
//! - [`transform`]: normalization, encoding, column edits, row filter, sort
//! - [`group`]: group-by aggregation
//! - [`stats`]: summary statistics
//!
//! Transforms that can hit an undefined statistic come in two flavors: the plain function logs
//! the warnings through `tracing`, the `*_report` variant returns them in a [`Transformed`].
//!
//! ## Example: clean, then drop outliers
//!
//! ```rust
//! use cleanly::processing::{clean, filter_iqr, filter_zscore};
//! use cleanly::types::{Column, DataSet};
//!
//! let ds = DataSet::from_columns(vec![
//!     Column::numeric("a", [Some(1.0), Some(2.0), Some(3.0), Some(1000.0), None]),
//!     Column::numeric("b", [Some(10.0), Some(20.0), Some(30.0), Some(1000.0), Some(20.0)]),
//! ])
//! .unwrap();
//!
//! let cleaned = clean(&ds).unwrap();
//! assert_eq!(cleaned.row_count(), 5);
//!
//! let no_outliers = filter_iqr(&cleaned);
//! assert_eq!(no_outliers.row_count(), 4);
//! assert_eq!(filter_zscore(&no_outliers, 3.0).unwrap().row_count(), 4);
//! ```

pub mod clean;
pub mod group;
pub mod outliers;
pub mod stats;
pub mod transform;

pub use clean::{clean, clean_report, drop_duplicates, impute_missing};
pub use group::{group_by, AggFunc};
pub use outliers::{filter_iqr, filter_iqr_with_multiplier, filter_zscore};
pub use transform::{
    drop_columns, encode_categorical, filter_equals, normalize, rename_column, sort_by, SortOrder,
};

use crate::error::UndefinedStatistic;
use crate::types::DataSet;

/// A transform's output plus the non-fatal warnings it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub dataset: DataSet,
    pub warnings: Vec<UndefinedStatistic>,
}

impl Transformed {
    pub(crate) fn new(dataset: DataSet, warnings: Vec<UndefinedStatistic>) -> Self {
        Self { dataset, warnings }
    }

    /// Log every warning at `warn` level under `operation`, then return the dataset.
    pub fn into_dataset(self, operation: &str) -> DataSet {
        for w in &self.warnings {
            tracing::warn!(operation, column = %w.column, "{w}");
        }
        self.dataset
    }
}
