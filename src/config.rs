//! Configuration for experiment-log analysis runs
//!
//! Loaded from TOML; every field has a default so a config file only needs
//! the values it changes.
//!
//! ```toml
//! data_root = "../data"
//! abort_on_malformed = false
//! color_mask = 0x0FFFFFFF
//! utilizations = ["12", "25", "37", "50", "63", "75", "87"]
//!
//! [file_range]
//! first = 1
//! last = 999
//! ```

use crate::error::{AnalysisError, Result};
use crate::selection::{ALL_COLORS_24, ALL_COLORS_28};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// What a run does with a file that fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop the run and report the file
    Abort,
    /// Log the file, record it as skipped and carry on
    Skip,
}

/// Inclusive range of numeric file indices in one run directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRange {
    pub first: u32,
    pub last: u32,
}

impl FileRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    pub fn indices(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.last - self.first) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }
}

impl Default for FileRange {
    fn default() -> Self {
        Self::new(1, 250)
    }
}

/// Settings shared by every run of an analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding the `<platform>/<benchmark>/...` tree
    pub data_root: PathBuf,

    /// Abort a run on the first malformed file (default) instead of skipping it
    pub abort_on_malformed: bool,

    /// Colors whose page counts form the selected partition
    pub color_mask: u64,

    /// File indices read from each run directory
    pub file_range: FileRange,

    /// Utilization levels of a box-plot sweep, in plotting order
    pub utilizations: Vec<String>,

    /// Multiplier applied to elapsed seconds in box-plot sweeps
    pub time_scale: f64,
}

fn default_utilizations() -> Vec<String> {
    ["25", "37", "50", "63", "75", "87", "100"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("../data"),
            abort_on_malformed: true,
            color_mask: ALL_COLORS_24,
            file_range: FileRange::default(),
            utilizations: default_utilizations(),
            time_scale: 1000.0,
        }
    }
}

impl AnalysisConfig {
    /// Layout of the 24-color embedded platform runs
    pub fn raw_counter_platform() -> Self {
        Self::default()
    }

    /// Layout of the 28-color server platform runs
    pub fn generic_platform() -> Self {
        Self {
            color_mask: ALL_COLORS_28,
            file_range: FileRange::new(1, 999),
            ..Self::default()
        }
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded analysis config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.abort_on_malformed {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Skip
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.file_range.is_empty() {
            return Err(AnalysisError::InvalidConfig(format!(
                "file_range is empty ({}..={})",
                self.file_range.first, self.file_range.last
            )));
        }

        if self.utilizations.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "utilizations must list at least one level".to_string(),
            ));
        }

        if self.color_mask == 0 {
            return Err(AnalysisError::InvalidConfig(
                "color_mask selects no colors".to_string(),
            ));
        }

        if !(self.time_scale > 0.0 && self.time_scale.is_finite()) {
            return Err(AnalysisError::InvalidConfig(format!(
                "time_scale must be positive, got {}",
                self.time_scale
            )));
        }

        Ok(())
    }
}
