//! Line scanning for experiment log files
//!
//! Parsers never open files themselves; they are handed a [`LineScanner`]
//! and receive one line at a time. The file handle lives only for the
//! duration of a single `scan` call and is dropped on every exit path.

use crate::error::{AnalysisError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Capability for visiting the lines of a named input
pub trait LineScanner {
    /// Call `visit` once per line of `path`, in file order, without the
    /// trailing newline
    fn scan(&self, path: &Path, visit: &mut dyn FnMut(&str)) -> Result<()>;
}

impl<T: LineScanner + ?Sized> LineScanner for &T {
    fn scan(&self, path: &Path, visit: &mut dyn FnMut(&str)) -> Result<()> {
        (**self).scan(path, visit)
    }
}

/// Scanner over files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FileScanner;

impl LineScanner for FileScanner {
    fn scan(&self, path: &Path, visit: &mut dyn FnMut(&str)) -> Result<()> {
        if !path.is_file() {
            return Err(AnalysisError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| AnalysisError::io(path, e))?;
            if read == 0 {
                break;
            }
            visit(line.trim_end_matches(['\n', '\r']));
        }

        Ok(())
    }
}

/// Scanner over in-memory documents keyed by path
///
/// Used for fuzzing and for tests that do not want to touch the disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryScanner {
    documents: HashMap<PathBuf, String>,
}

impl MemoryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `contents` under `path`, replacing any earlier document
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.documents.insert(path.into(), contents.into());
    }

    /// Builder-style variant of [`MemoryScanner::insert`]
    pub fn with(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl LineScanner for MemoryScanner {
    fn scan(&self, path: &Path, visit: &mut dyn FnMut(&str)) -> Result<()> {
        let contents = self
            .documents
            .get(path)
            .ok_or_else(|| AnalysisError::FileNotFound {
                path: path.to_path_buf(),
            })?;

        for line in contents.lines() {
            visit(line);
        }

        Ok(())
    }
}
