//! Tunable parameters for the transforms, loadable from JSON.
//!
//! ```rust
//! use cleanly::config::CleaningConfig;
//!
//! let cfg = CleaningConfig::from_json_str(r#"{ "z_threshold": 2.5 }"#).unwrap();
//! assert_eq!(cfg.z_threshold, 2.5);
//! assert_eq!(cfg.iqr_multiplier, 1.5);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CleanlyError, CleanlyResult};

/// Default Z-score cutoff, in standard deviations.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;
/// Default IQR fence multiplier.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Upper bound on histogram bins, so a bad count cannot exhaust memory.
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Parameters shared by a [`crate::session::Session`].
///
/// Missing keys take their defaults; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    /// Rows with any |z| at or above this are outliers. Must be > 0.
    pub z_threshold: f64,
    /// Fence width in IQRs beyond Q1/Q3. Must be > 0.
    pub iqr_multiplier: f64,
    /// Bin count for histograms, in `1..=MAX_HISTOGRAM_BINS`.
    pub histogram_bins: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl CleaningConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(input: &str) -> CleanlyResult<Self> {
        let cfg: Self = serde_json::from_str(input)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CleanlyResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check every parameter is in range.
    pub fn validate(&self) -> CleanlyResult<()> {
        check_positive("z_threshold", self.z_threshold)?;
        check_positive("iqr_multiplier", self.iqr_multiplier)?;
        check_bins("histogram_bins", self.histogram_bins)
    }
}

/// Fails unless `bins` is in `1..=MAX_HISTOGRAM_BINS`.
pub(crate) fn check_bins(name: &str, bins: usize) -> CleanlyResult<()> {
    if (1..=MAX_HISTOGRAM_BINS).contains(&bins) {
        Ok(())
    } else {
        Err(CleanlyError::invalid_argument(
            name,
            format!("must be between 1 and {MAX_HISTOGRAM_BINS} (got {bins})"),
        ))
    }
}

/// Fails unless `value` is a number greater than zero (NaN fails too).
pub(crate) fn check_positive(name: &str, value: f64) -> CleanlyResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(CleanlyError::invalid_argument(
            name,
            format!("must be > 0 (got {value})"),
        ))
    }
}
