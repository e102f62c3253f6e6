//! CLI argument parsing for colorstat

use crate::config::{AnalysisConfig, FileRange};
use crate::memory_map::Boundary;
use crate::orchestrator::{BoxPlotQuantity, DataKind, RunParameters};
use crate::perf_log::Platform;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Quantity collected by `boxplot`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuantityArg {
    MissRate,
    ElapsedTime,
    ColorStddev,
}

impl From<QuantityArg> for BoxPlotQuantity {
    fn from(arg: QuantityArg) -> Self {
        match arg {
            QuantityArg::MissRate => BoxPlotQuantity::MissRate,
            QuantityArg::ElapsedTime => BoxPlotQuantity::ElapsedTime,
            QuantityArg::ColorStddev => BoxPlotQuantity::ColorStdDev,
        }
    }
}

/// Area boundary policy for `areas`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BoundaryArg {
    /// start <= addr < end
    HalfOpen,
    /// start < addr < end
    Open,
}

impl From<BoundaryArg> for Boundary {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::HalfOpen => Boundary::HalfOpen,
            BoundaryArg::Open => Boundary::Open,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "colorstat")]
#[command(version)]
#[command(about = "Statistics over cache-coloring experiment logs", long_about = None)]
pub struct Cli {
    /// TOML analysis config; command-line flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format (text or json)
    #[arg(long = "format", global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Root of the experiment data tree
    #[arg(long = "data-root", global = true, value_name = "DIR")]
    pub data_root: Option<PathBuf>,

    /// Skip files that fail to parse instead of aborting the run
    #[arg(long = "skip-malformed", global = true)]
    pub skip_malformed: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Miss-rate and elapsed-time statistics of one perf run
    Perf {
        #[command(flatten)]
        run: RunArgs,

        /// Parse these files instead of the run directory
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Selected-color deviation statistics of one color run
    Colors {
        #[command(flatten)]
        run: RunArgs,

        /// Parse these files instead of the run directory
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// One array per utilization level, for box plots
    Boxplot {
        #[command(flatten)]
        run: RunArgs,

        /// Quantity collected per file
        #[arg(long, value_enum, default_value = "miss-rate")]
        quantity: QuantityArg,

        /// Utilization levels, in order (default: from config)
        #[arg(long = "levels", value_delimiter = ',', value_name = "LIST")]
        levels: Vec<String>,
    },

    /// Selected color bins and performance of a single experiment file
    Bins {
        #[command(flatten)]
        run: RunArgs,

        /// File index inside the run directory
        #[arg(long, value_name = "N", conflicts_with = "file")]
        index: Option<u32>,

        /// Color profile path; the perf log is found in the sibling PF directory
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Classify a page-usage profile by memory area and write `<pages>.ord`
    Areas {
        /// Memory-area map (`/proc/<pid>/maps` layout)
        #[arg(long, value_name = "PATH")]
        map: PathBuf,

        /// Page-usage profile (`<address> : <count>` rows)
        #[arg(long, value_name = "PATH")]
        pages: PathBuf,

        /// Which area boundaries count as inside the area
        #[arg(long, value_enum, default_value = "half-open")]
        boundary: BoundaryArg,
    },
}

/// Coordinates of a run directory
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Platform tag: XE (generic counters) or TG (raw counters)
    #[arg(long, default_value = "TG")]
    pub platform: Platform,

    #[arg(long, default_value = "BW")]
    pub benchmark: String,

    /// Linux variant directory
    #[arg(long, default_value = "UN")]
    pub linux: String,

    /// Allocator variant directory
    #[arg(long, default_value = "PL")]
    pub allocator: String,

    /// Co-runner directory
    #[arg(long, default_value = "00")]
    pub corunners: String,

    /// Working-set directory level (e.g. QF)
    #[arg(long = "working-set")]
    pub working_set: Option<String>,

    #[arg(long, default_value = "100")]
    pub utilization: String,

    /// First file index (default: from config)
    #[arg(long)]
    pub first: Option<u32>,

    /// Last file index (default: from config)
    #[arg(long)]
    pub last: Option<u32>,

    /// Selected-color bitmask, decimal or 0x-prefixed hex (default: from config)
    #[arg(long, value_parser = parse_mask)]
    pub mask: Option<u64>,
}

impl RunArgs {
    pub fn parameters(&self, data_kind: DataKind) -> RunParameters {
        RunParameters {
            platform: self.platform,
            benchmark: self.benchmark.clone(),
            linux_variant: self.linux.clone(),
            allocator_variant: self.allocator.clone(),
            data_kind,
            corunners: self.corunners.clone(),
            working_set: self.working_set.clone(),
            utilization: self.utilization.clone(),
        }
    }

    /// Write the range and mask overrides into `config`
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if self.first.is_some() || self.last.is_some() {
            config.file_range = FileRange::new(
                self.first.unwrap_or(config.file_range.first),
                self.last.unwrap_or(config.file_range.last),
            );
        }
        if let Some(mask) = self.mask {
            config.color_mask = mask;
        }
    }
}

fn parse_mask(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid color mask '{}': {}", s, e))
}

impl Cli {
    /// Apply the global flags to `config`
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(root) = &self.data_root {
            config.data_root = root.clone();
        }
        if self.skip_malformed {
            config.abort_on_malformed = false;
        }
        match &self.command {
            Command::Perf { run, .. } | Command::Colors { run, .. } | Command::Bins { run, .. } => {
                run.apply(config)
            }
            Command::Boxplot { run, levels, .. } => {
                run.apply(config);
                if !levels.is_empty() {
                    config.utilizations = levels.clone();
                }
            }
            Command::Areas { .. } => {}
        }
    }
}
