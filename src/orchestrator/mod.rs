// Dataset orchestration
//
// Turns run coordinates (platform, benchmark, kernel and allocator variants,
// co-runners, utilization, file range) into file paths, feeds each file to
// the matching parser, aggregates the records in a store keyed by file id,
// and hands the resulting series to the statistics engine.
//
// Modes:
// - single run: statistics over one run directory (perf or color data)
// - box-plot sweep: one array per utilization level, in configured order
// - bins snapshot: one color profile paired with its perf log
// - area report: page-usage profile classified by a memory-area map
//
// A file that fails to parse either aborts the run or is recorded as
// skipped, depending on `AnalysisConfig::abort_on_malformed`.

mod layout;
mod runner;
mod summary;

pub use layout::{sibling_perf_path, DataKind, DatasetLayout, RunParameters};
pub use runner::DatasetOrchestrator;
pub use summary::{
    BinsSnapshot, BoxPlotLevel, BoxPlotQuantity, BoxPlotSweep, ColorRecord, ColorRunSummary,
    PerfRunSummary, SkippedFile, SweepError,
};
