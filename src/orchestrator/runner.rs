// Run driver: path construction, per-file parsing, failure policy, statistics

use super::layout::{sibling_perf_path, DataKind, DatasetLayout, RunParameters};
use super::summary::{
    BinsSnapshot, BoxPlotLevel, BoxPlotQuantity, BoxPlotSweep, ColorRecord, ColorRunSummary,
    PerfRunSummary, SkippedFile, SweepError,
};
use crate::color_histogram::ColorHistogramParser;
use crate::config::{AnalysisConfig, FailurePolicy};
use crate::error::{AnalysisError, Result};
use crate::memory_map::{report_path, Boundary, MemoryAreaMap, PageUsage};
use crate::perf_log::{PerfLogParser, PerfRecord, Platform};
use crate::scanner::{FileScanner, LineScanner};
use crate::selection::SelectionPolicy;
use crate::statistics::SeriesStatistics;
use crate::store::{AggregationStore, FileId};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of parsing a run's files into a store
struct Collected {
    skipped: Vec<SkippedFile>,
    /// Path each stored record was parsed from
    sources: BTreeMap<FileId, PathBuf>,
}

impl Collected {
    fn source(&self, id: &FileId) -> PathBuf {
        self.sources.get(id).cloned().unwrap_or_default()
    }
}

/// Drives parsers over the files of a run and hands the results to the
/// statistics engine
#[derive(Debug, Clone)]
pub struct DatasetOrchestrator<S = FileScanner> {
    config: AnalysisConfig,
    layout: DatasetLayout,
    scanner: S,
}

impl DatasetOrchestrator<FileScanner> {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_scanner(config, FileScanner)
    }
}

impl<S: LineScanner> DatasetOrchestrator<S> {
    pub fn with_scanner(config: AnalysisConfig, scanner: S) -> Result<Self> {
        config.validate()?;
        let layout = DatasetLayout::new(config.data_root.clone());
        Ok(Self {
            config,
            layout,
            scanner,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Reset `store`, then parse every path into it under the configured
    /// failure policy
    ///
    /// Two paths with the same file id keep the later record. The earlier
    /// path is reported as skipped.
    fn collect<R, F>(
        &self,
        paths: &[PathBuf],
        store: &mut AggregationStore<R>,
        mut parse: F,
    ) -> Result<Collected>
    where
        F: FnMut(&Path) -> Result<R>,
    {
        store.reset();
        let policy = self.config.failure_policy();
        let mut skipped = Vec::new();
        let mut sources = BTreeMap::new();

        for path in paths {
            let outcome = FileId::from_path(path).and_then(|id| Ok((id, parse(path)?)));
            match outcome {
                Ok((id, record)) => {
                    store.put(id.clone(), record);
                    if let Some(earlier) = sources.insert(id.clone(), path.clone()) {
                        tracing::warn!(
                            file_id = %id,
                            earlier = %earlier.display(),
                            later = %path.display(),
                            "file id seen twice, keeping the later record"
                        );
                        skipped.push(SkippedFile {
                            reason: format!("superseded by {} (same file id {})", path.display(), id),
                            path: earlier,
                        });
                    }
                }
                Err(err) if policy == FailurePolicy::Skip && err.is_per_file() => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping file");
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Collected { skipped, sources })
    }

    /// Parse the perf logs at `paths` and compute miss-rate and elapsed-time
    /// statistics
    pub fn summarize_perf(
        &self,
        run: impl Into<String>,
        platform: Platform,
        paths: &[PathBuf],
        store: &mut AggregationStore<PerfRecord>,
    ) -> Result<PerfRunSummary> {
        let run = run.into();
        let parser = PerfLogParser::with_scanner(&self.scanner, platform);
        let skipped = self.collect(paths, store, |path| parser.parse(path))?.skipped;

        let miss_rate = SeriesStatistics::compute(
            &format!("{} miss_rate", run),
            &store.series(PerfRecord::miss_rate_percent),
        )?;
        let elapsed = SeriesStatistics::compute(
            &format!("{} elapsed", run),
            &store.series(|r| r.elapsed_seconds),
        )?;

        tracing::info!(
            run = %run,
            files = store.len(),
            skipped = skipped.len(),
            mean_miss_rate = miss_rate.mean,
            mean_elapsed = elapsed.mean,
            "perf run summarized"
        );

        Ok(PerfRunSummary {
            run,
            miss_rate,
            elapsed,
            records: store.all().clone(),
            skipped,
        })
    }

    /// Parse the color profiles at `paths`, partition each by the configured
    /// mask, and compute statistics over the per-file deviations
    pub fn summarize_colors(
        &self,
        run: impl Into<String>,
        paths: &[PathBuf],
        store: &mut AggregationStore<ColorRecord>,
    ) -> Result<ColorRunSummary> {
        let run = run.into();
        let parser = ColorHistogramParser::with_scanner(&self.scanner);
        let selection = SelectionPolicy::new(self.config.color_mask);
        let collected = self.collect(paths, store, |path| {
            let histogram = parser.parse(path)?;
            let partition = selection.partition(&histogram);
            Ok(ColorRecord {
                histogram,
                partition,
            })
        })?;

        let stddev = SeriesStatistics::compute(
            &format!("{} stddev", run),
            &store.series(|r| r.partition.standard_deviation),
        )?;

        let mut total_pages = 0u64;
        let mut selected_pages = 0u64;
        let mut rest_pages = 0u64;
        for (id, record) in store.iter() {
            let overflow = || {
                AnalysisError::malformed(
                    collected.source(id),
                    format!("page totals of run {} overflow a 64-bit counter", run),
                )
            };
            total_pages = total_pages
                .checked_add(record.histogram.total_pages)
                .ok_or_else(overflow)?;
            selected_pages = selected_pages
                .checked_add(record.partition.selected_total)
                .ok_or_else(overflow)?;
            rest_pages = rest_pages
                .checked_add(record.partition.rest_total)
                .ok_or_else(overflow)?;
        }
        let skipped = collected.skipped;

        tracing::info!(
            run = %run,
            files = store.len(),
            skipped = skipped.len(),
            mean_stddev = stddev.mean,
            selected_pages,
            rest_pages,
            "color run summarized"
        );

        Ok(ColorRunSummary {
            run,
            color_mask: selection.mask(),
            stddev,
            total_pages,
            selected_pages,
            rest_pages,
            records: store.all().clone(),
            skipped,
        })
    }

    /// Perf run over the configured file range of the run `params` names
    pub fn perf_run(
        &self,
        params: &RunParameters,
        store: &mut AggregationStore<PerfRecord>,
    ) -> Result<PerfRunSummary> {
        let params = params.with_data_kind(DataKind::Perf);
        let paths = self
            .layout
            .paths(&params, self.config.file_range.indices());
        self.summarize_perf(params.label(), params.platform, &paths, store)
    }

    /// Color run over the configured file range of the run `params` names
    pub fn color_run(
        &self,
        params: &RunParameters,
        store: &mut AggregationStore<ColorRecord>,
    ) -> Result<ColorRunSummary> {
        let params = params.with_data_kind(DataKind::Colors);
        let paths = self
            .layout
            .paths(&params, self.config.file_range.indices());
        self.summarize_colors(params.label(), &paths, store)
    }

    /// Collect one array of `quantity` per configured utilization level
    ///
    /// The utilization of `params` is ignored. A level that fails stops the
    /// sweep; the levels before it are returned inside the error.
    pub fn box_plot_sweep(
        &self,
        params: &RunParameters,
        quantity: BoxPlotQuantity,
    ) -> std::result::Result<BoxPlotSweep, SweepError> {
        let mut sweep = BoxPlotSweep::new(quantity);

        for utilization in &self.config.utilizations {
            let level_params = params.with_utilization(utilization.as_str());
            match self.sweep_level(&level_params, quantity) {
                Ok(level) => sweep.levels.push(level),
                Err(source) => {
                    tracing::warn!(utilization = %utilization, error = %source, "sweep aborted");
                    return Err(SweepError {
                        completed: sweep,
                        utilization: utilization.clone(),
                        source,
                    });
                }
            }
        }

        tracing::info!(
            quantity = %quantity,
            levels = sweep.levels.len(),
            "box-plot sweep complete"
        );
        Ok(sweep)
    }

    fn sweep_level(&self, params: &RunParameters, quantity: BoxPlotQuantity) -> Result<BoxPlotLevel> {
        let indices = self.config.file_range.indices();
        let (series, skipped) = match quantity {
            BoxPlotQuantity::MissRate | BoxPlotQuantity::ElapsedTime => {
                let params = params.with_data_kind(DataKind::Perf);
                let paths = self.layout.paths(&params, indices);
                let parser = PerfLogParser::with_scanner(&self.scanner, params.platform);
                let mut store = AggregationStore::new();
                let skipped = self.collect(&paths, &mut store, |path| parser.parse(path))?.skipped;

                let scale = self.config.time_scale;
                let series = if quantity == BoxPlotQuantity::MissRate {
                    store.series(PerfRecord::miss_rate_percent)
                } else {
                    store.series(|r| r.elapsed_seconds * scale)
                };
                (series, skipped)
            }
            BoxPlotQuantity::ColorStdDev => {
                let params = params.with_data_kind(DataKind::Colors);
                let paths = self.layout.paths(&params, indices);
                let parser = ColorHistogramParser::with_scanner(&self.scanner);
                let selection = SelectionPolicy::new(self.config.color_mask);
                let mut store = AggregationStore::new();
                let skipped = self.collect(&paths, &mut store, |path| {
                    parser
                        .parse(path)
                        .map(|histogram| selection.partition(&histogram).standard_deviation)
                })?
                .skipped;
                (store.series(|stddev| *stddev), skipped)
            }
        };

        let stats = SeriesStatistics::compute(
            &format!("{} {}", params.label(), quantity),
            &series,
        )?;
        tracing::debug!(
            utilization = %params.utilization,
            files = stats.count,
            mean = stats.mean,
            "sweep level collected"
        );

        Ok(BoxPlotLevel {
            utilization: params.utilization.clone(),
            values: series.into_iter().map(|(_, v)| v).collect(),
            mean: stats.mean,
            stddev: stats.stddev,
            min: stats.min,
            min_file_id: stats.min_file_id,
            max: stats.max,
            max_file_id: stats.max_file_id,
            skipped,
        })
    }

    /// Color distribution and performance of experiment file `index` of the
    /// run `params` names
    pub fn bins_snapshot(&self, params: &RunParameters, index: u32) -> Result<BinsSnapshot> {
        let params = params.with_data_kind(DataKind::Colors);
        let color_path = self.layout.file_path(&params, index);
        self.snapshot_file(params.platform, &color_path)
    }

    /// Snapshot of the color profile at `color_path` and the perf log
    /// recorded next to it
    pub fn snapshot_file(&self, platform: Platform, color_path: &Path) -> Result<BinsSnapshot> {
        let file_id = FileId::from_path(color_path)?;
        let perf_path = sibling_perf_path(color_path).ok_or_else(|| {
            AnalysisError::malformed(color_path, "path has no CL directory to pair with a perf log")
        })?;

        let histogram = ColorHistogramParser::with_scanner(&self.scanner).parse(color_path)?;
        let partition = SelectionPolicy::new(self.config.color_mask).partition(&histogram);
        let perf = PerfLogParser::with_scanner(&self.scanner, platform).parse(&perf_path)?;

        tracing::info!(
            file_id = %file_id,
            stddev = partition.standard_deviation,
            miss_rate = perf.miss_rate_percent(),
            "bins snapshot"
        );

        Ok(BinsSnapshot {
            file_id,
            color_path: color_path.to_path_buf(),
            perf_path,
            selected_counts: partition.selected_counts,
            stddev: partition.standard_deviation,
            miss_rate_percent: perf.miss_rate_percent(),
            elapsed_seconds: perf.elapsed_seconds,
        })
    }

    /// Classify the pages of the profile at `pages_path` by the areas of the
    /// map at `map_path` and write the report to `<pages_path>.ord`
    pub fn write_area_report(
        &self,
        map_path: &Path,
        pages_path: &Path,
        boundary: Boundary,
    ) -> Result<PathBuf> {
        let map = MemoryAreaMap::parse_with(&self.scanner, map_path)?.with_boundary(boundary);
        let pages = PageUsage::parse_with(&self.scanner, pages_path)?;

        let out_path = report_path(pages_path);
        write_replacing(&out_path, |out| map.write_report(&pages, out))?;

        tracing::info!(
            report = %out_path.display(),
            areas = map.len(),
            pages = pages.len(),
            "area report written"
        );
        Ok(out_path)
    }
}

/// Write `path` through a sibling `.tmp` file renamed into place
///
/// On failure the temporary file is removed and `path` is left untouched.
pub(crate) fn write_replacing<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = File::create(&tmp)
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            write(&mut out)?;
            out.flush()
        })
        .and_then(|()| fs::rename(&tmp, path));

    written.map_err(|e| {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            tracing::debug!(path = %tmp.display(), error = %cleanup, "temporary report not removed");
        }
        AnalysisError::io(path, e)
    })
}
