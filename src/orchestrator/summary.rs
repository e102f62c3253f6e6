// Result objects handed to the visualization layer

use crate::color_histogram::ColorHistogramRecord;
use crate::error::AnalysisError;
use crate::perf_log::PerfRecord;
use crate::selection::SelectedPartition;
use crate::statistics::SeriesStatistics;
use crate::store::FileId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A file dropped from a run under the skip policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Stored record of a color run: the histogram and its partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRecord {
    pub histogram: ColorHistogramRecord,
    pub partition: SelectedPartition,
}

/// Statistics of one perf-log run directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfRunSummary {
    pub run: String,
    pub miss_rate: SeriesStatistics,
    pub elapsed: SeriesStatistics,
    pub records: BTreeMap<FileId, PerfRecord>,
    pub skipped: Vec<SkippedFile>,
}

/// Statistics of one color-profile run directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorRunSummary {
    pub run: String,
    pub color_mask: u64,
    /// Statistics over the per-file deviation of selected-color page counts
    pub stddev: SeriesStatistics,
    pub total_pages: u64,
    pub selected_pages: u64,
    pub rest_pages: u64,
    pub records: BTreeMap<FileId, ColorRecord>,
    pub skipped: Vec<SkippedFile>,
}

/// Quantity collected per file in a box-plot sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxPlotQuantity {
    /// Perf-log miss rate, percent
    MissRate,
    /// Perf-log elapsed time scaled by the configured time scale
    ElapsedTime,
    /// Standard deviation of selected-color page counts
    ColorStdDev,
}

impl fmt::Display for BoxPlotQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoxPlotQuantity::MissRate => "miss_rate",
            BoxPlotQuantity::ElapsedTime => "elapsed_time",
            BoxPlotQuantity::ColorStdDev => "color_stddev",
        })
    }
}

impl PerfRunSummary {
    pub fn files_parsed(&self) -> usize {
        self.records.len()
    }
}

impl ColorRunSummary {
    pub fn files_parsed(&self) -> usize {
        self.records.len()
    }
}

/// Values of one utilization level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotLevel {
    pub utilization: String,
    /// One value per file, in file-id order
    pub values: Vec<f64>,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    /// File holding the minimum; the lowest id wins a tie
    pub min_file_id: FileId,
    pub max: f64,
    pub max_file_id: FileId,
    pub skipped: Vec<SkippedFile>,
}

/// One array of values per utilization level, in sweep order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotSweep {
    pub quantity: BoxPlotQuantity,
    pub levels: Vec<BoxPlotLevel>,
}

impl BoxPlotSweep {
    pub fn new(quantity: BoxPlotQuantity) -> Self {
        Self {
            quantity,
            levels: Vec::new(),
        }
    }

    /// The per-level arrays alone
    pub fn arrays(&self) -> Vec<&[f64]> {
        self.levels.iter().map(|l| l.values.as_slice()).collect()
    }

    /// Per-level means, the line drawn across the boxes
    pub fn means(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.mean).collect()
    }
}

/// A sweep that stopped at a failing level
///
/// Levels finished before the failure are kept in `completed`.
#[derive(Error, Debug)]
#[error("Sweep aborted at utilization {utilization}: {source}")]
pub struct SweepError {
    pub completed: BoxPlotSweep,
    pub utilization: String,
    #[source]
    pub source: AnalysisError,
}

/// Color distribution and performance of a single experiment file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinsSnapshot {
    pub file_id: FileId,
    pub color_path: PathBuf,
    pub perf_path: PathBuf,
    pub selected_counts: Vec<u64>,
    pub stddev: f64,
    pub miss_rate_percent: f64,
    pub elapsed_seconds: f64,
}
