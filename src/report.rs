//! Text and JSON rendering of run results
//!
//! Every result type serializes with serde; the text form is a compact
//! summary in the style of a statistics table.

use crate::orchestrator::{BinsSnapshot, BoxPlotSweep, ColorRunSummary, PerfRunSummary};
use crate::statistics::SeriesStatistics;
use serde::Serialize;
use std::io::{self, Write};

/// Human-readable rendering of a result
pub trait TextReport {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Pretty-printed JSON for `value`
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn write_series(out: &mut dyn Write, label: &str, stats: &SeriesStatistics, unit: &str) -> io::Result<()> {
    writeln!(out, "{} ({} files):", label, stats.count)?;
    writeln!(out, "  Mean:    {:.4}{}", stats.mean, unit)?;
    writeln!(out, "  Std Dev: {:.4}{}", stats.stddev, unit)?;
    writeln!(out, "  Min:     {:.4}{} (file {})", stats.min, unit, stats.min_file_id)?;
    writeln!(out, "  Max:     {:.4}{} (file {})", stats.max, unit, stats.max_file_id)?;
    Ok(())
}

fn write_skipped(out: &mut dyn Write, skipped: &[crate::orchestrator::SkippedFile]) -> io::Result<()> {
    if skipped.is_empty() {
        return Ok(());
    }
    writeln!(out, "Skipped {} file(s):", skipped.len())?;
    for file in skipped {
        writeln!(out, "  {}: {}", file.path.display(), file.reason)?;
    }
    Ok(())
}

impl TextReport for PerfRunSummary {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "=== Perf run {} ===", self.run)?;
        write_series(out, "Miss rate", &self.miss_rate, " %")?;
        write_series(out, "Elapsed", &self.elapsed, " s")?;
        write_skipped(out, &self.skipped)
    }
}

impl TextReport for ColorRunSummary {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "=== Color run {} (mask 0x{:x}) ===", self.run, self.color_mask)?;
        write_series(out, "Selected-color deviation", &self.stddev, " pages")?;
        writeln!(
            out,
            "Pages: {} total, {} selected, {} rest",
            self.total_pages, self.selected_pages, self.rest_pages
        )?;
        write_skipped(out, &self.skipped)
    }
}

impl TextReport for BoxPlotSweep {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "=== Box-plot sweep: {} ===", self.quantity)?;
        writeln!(
            out,
            "utilization      files         mean      std dev          min   min file          max   max file"
        )?;
        writeln!(
            out,
            "----------- ---------- ------------ ------------ ------------ ---------- ------------ ----------"
        )?;
        for level in &self.levels {
            writeln!(
                out,
                "{:>11} {:>10} {:>12.4} {:>12.4} {:>12.4} {:>10} {:>12.4} {:>10}",
                level.utilization,
                level.values.len(),
                level.mean,
                level.stddev,
                level.min,
                level.min_file_id.as_str(),
                level.max,
                level.max_file_id.as_str()
            )?;
        }
        for level in &self.levels {
            write_skipped(out, &level.skipped)?;
        }
        Ok(())
    }
}

impl TextReport for BinsSnapshot {
    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "=== File {} ===", self.file_id)?;
        writeln!(out, "Colors: {}", self.color_path.display())?;
        writeln!(out, "Perf:   {}", self.perf_path.display())?;
        for (bin, count) in self.selected_counts.iter().enumerate() {
            writeln!(out, "  bin {:>2}: {}", bin, count)?;
        }
        writeln!(out, "Std Dev:   {:.4} pages", self.stddev)?;
        writeln!(out, "Miss rate: {:.4} %", self.miss_rate_percent)?;
        writeln!(out, "Elapsed:   {:.4} s", self.elapsed_seconds)?;
        Ok(())
    }
}
