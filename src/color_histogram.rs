//! Page-color histogram parsing
//!
//! The color profiler writes one summary line carrying the total page count
//! (marked with `###`) and one line per color bin (containing `Color` and a
//! `:` before the bin's page count). Bins appear in ascending color order
//! starting at 0, so the position of a bin line is its color index.

use crate::error::{AnalysisError, Result};
use crate::scanner::{FileScanner, LineScanner};
use serde::{Deserialize, Serialize};
use std::path::Path;

const TOTAL_MARKER: &str = "###";
const COLOR_MARKER: &str = "Color";

/// One parsed color profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorHistogramRecord {
    pub total_pages: u64,
    /// Page count per color bin; index is the color id
    pub per_color_counts: Vec<u64>,
}

impl ColorHistogramRecord {
    pub fn colors(&self) -> usize {
        self.per_color_counts.len()
    }
}

/// First run of ASCII digits in `s`
fn first_number(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// Page count on a total line: the number following the last `###` that is
/// followed by one
pub fn total_pages_token(line: &str) -> Option<&str> {
    line.rmatch_indices(TOTAL_MARKER)
        .find_map(|(at, _)| first_number(&line[at + TOTAL_MARKER.len()..]))
}

/// Page count on a color line: the number following the last `:` after a
/// `Color` token that is followed by one
pub fn color_count_token(line: &str) -> Option<&str> {
    let at = line.find(COLOR_MARKER)?;
    let tail = &line[at + COLOR_MARKER.len()..];
    tail.rmatch_indices(':')
        .find_map(|(colon, _)| first_number(&tail[colon + 1..]))
}

/// Line-at-a-time accumulator for one color profile
#[derive(Debug, Default)]
pub struct HistogramAccumulator {
    total_pages: u64,
    per_color_counts: Vec<u64>,
    error: Option<String>,
}

impl HistogramAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }

        if let Some(token) = total_pages_token(line) {
            match token.parse::<u64>() {
                Ok(total) => self.total_pages = total,
                Err(e) => {
                    self.error = Some(format!("bad total page count '{}': {}", token, e));
                    return;
                }
            }
        }

        if let Some(token) = color_count_token(line) {
            match token.parse::<u64>() {
                Ok(count) => self.per_color_counts.push(count),
                Err(e) => {
                    self.error = Some(format!(
                        "bad page count '{}' for color {}: {}",
                        token,
                        self.per_color_counts.len(),
                        e
                    ));
                }
            }
        }
    }

    pub fn finish(self, path: &Path) -> Result<ColorHistogramRecord> {
        if let Some(reason) = self.error {
            return Err(AnalysisError::malformed(path, reason));
        }
        if self.total_pages == 0 {
            return Err(AnalysisError::malformed(path, "zero or missing total page count"));
        }
        if self.per_color_counts.is_empty() {
            return Err(AnalysisError::malformed(path, "no color bins"));
        }
        // Every partition of the bins sums to at most this
        if self
            .per_color_counts
            .iter()
            .try_fold(0u64, |acc, &c| acc.checked_add(c))
            .is_none()
        {
            return Err(AnalysisError::malformed(
                path,
                "color bin counts overflow a 64-bit page total",
            ));
        }

        Ok(ColorHistogramRecord {
            total_pages: self.total_pages,
            per_color_counts: self.per_color_counts,
        })
    }
}

/// Parser for page-color profiles
#[derive(Debug, Clone, Default)]
pub struct ColorHistogramParser<S = FileScanner> {
    scanner: S,
}

impl ColorHistogramParser<FileScanner> {
    pub fn new() -> Self {
        Self::with_scanner(FileScanner)
    }
}

impl<S: LineScanner> ColorHistogramParser<S> {
    pub fn with_scanner(scanner: S) -> Self {
        Self { scanner }
    }

    pub fn parse(&self, path: &Path) -> Result<ColorHistogramRecord> {
        let mut acc = HistogramAccumulator::new();
        self.scanner.scan(path, &mut |line| acc.feed(line))?;
        let record = acc.finish(path)?;

        tracing::debug!(
            path = %path.display(),
            total_pages = record.total_pages,
            colors = record.colors(),
            "parsed color histogram"
        );

        Ok(record)
    }
}
