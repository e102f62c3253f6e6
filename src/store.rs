//! Per-run aggregation of parsed records keyed by file id

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::path::Path;

/// Key derived from the trailing numeric component of an input path
///
/// Ids order numerically (`"9" < "10"`), which fixes the order in which a
/// store is iterated and therefore which file wins an extremum tie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the id from the digits that end `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_with_suffix(path, "")
    }

    /// Derive the id from the digits that immediately precede `suffix` at
    /// the end of `path` (e.g. `"log17.txt"` with suffix `".txt"`)
    pub fn from_path_with_suffix(path: &Path, suffix: &str) -> Result<Self> {
        let unresolvable = || AnalysisError::UnresolvableFileId {
            path: path.to_path_buf(),
        };

        let text = path.to_str().ok_or_else(unresolvable)?;
        let stem = text.strip_suffix(suffix).ok_or_else(unresolvable)?;
        let digits = stem.len()
            - stem
                .chars()
                .rev()
                .take_while(char::is_ascii_digit)
                .count();

        let id = &stem[digits..];
        if id.is_empty() {
            return Err(unresolvable());
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() && !self.0.is_empty() {
            "0"
        } else {
            trimmed
        }
    }
}

impl Ord for FileId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for FileId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u32> for FileId {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

/// Records of one analysis run, keyed by file id
///
/// A store is created per run and handed to the statistics stage; nothing
/// survives between runs unless the caller keeps the store.
#[derive(Debug, Clone)]
pub struct AggregationStore<R> {
    records: BTreeMap<FileId, R>,
}

impl<R> Default for AggregationStore<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<R> AggregationStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record so the store can serve a new run
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Insert or overwrite the record for `id`
    pub fn put(&mut self, id: FileId, record: R) -> Option<R> {
        self.records.insert(id, record)
    }

    pub fn get(&self, id: &FileId) -> Option<&R> {
        self.records.get(id)
    }

    pub fn all(&self) -> &BTreeMap<FileId, R> {
        &self.records
    }

    pub fn iter(&self) -> btree_map::Iter<'_, FileId, R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Project every record to one number, in file-id order
    pub fn series<F>(&self, mut project: F) -> Vec<(FileId, f64)>
    where
        F: FnMut(&R) -> f64,
    {
        self.records
            .iter()
            .map(|(id, record)| (id.clone(), project(record)))
            .collect()
    }
}

impl<'a, R> IntoIterator for &'a AggregationStore<R> {
    type Item = (&'a FileId, &'a R);
    type IntoIter = btree_map::Iter<'a, FileId, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
