//! colorstat - statistics over cache-coloring experiment logs
//!
//! Parses perf-counter logs and page-color profiles produced by cache-coloring
//! experiments, splits color histograms by a selection bitmask, and computes
//! descriptive statistics per run, per utilization sweep and per file. Page
//! usage profiles can additionally be classified by memory area.

pub mod bits;
pub mod cli;
pub mod color_histogram;
pub mod config;
pub mod error;
pub mod memory_map;
pub mod orchestrator;
pub mod perf_log;
pub mod report;
pub mod scanner;
pub mod selection;
pub mod statistics;
pub mod store;

pub use error::{AnalysisError, Result};
