//! Error types shared by the parsers, the store and the statistics engine
//!
//! Every parse-level variant carries the path of the offending file so a
//! failed run can always name the input that stopped it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing, aggregating or summarizing experiment logs
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Malformed record in {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("Malformed memory range '{range}' in {} (line {line})", path.display())]
    MalformedRange {
        path: PathBuf,
        line: usize,
        range: String,
    },

    #[error("No numeric file id in path: {}", path.display())]
    UnresolvableFileId { path: PathBuf },

    #[error("Cannot compute statistics over empty series '{series}'")]
    EmptySeries { series: String },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path of the input file this error refers to, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::MalformedRecord { path, .. }
            | Self::MalformedRange { path, .. }
            | Self::UnresolvableFileId { path }
            | Self::FileNotFound { path }
            | Self::Io { path, .. } => Some(path),
            Self::EmptySeries { .. } | Self::InvalidConfig(_) => None,
        }
    }

    /// Whether the error describes a single bad input file
    ///
    /// These are the errors a skip policy may step over; everything else
    /// (empty series, bad configuration) always aborts the run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. }
                | Self::MalformedRange { .. }
                | Self::UnresolvableFileId { .. }
                | Self::FileNotFound { .. }
                | Self::Io { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
