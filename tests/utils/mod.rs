// Experiment data fixtures
//
// Builds a throwaway `<root>/TG/BW/UN/PL/<kind>/00/<utilization>/<index>`
// tree in a temporary directory.

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Perf log in the raw-counter vocabulary
pub fn raw_log(references: u64, misses: u64, seconds: &str) -> String {
    format!(
        " Performance counter stats for './bandwidth -m 1536':\n\n\
         {} r50\n\
         {} r52\n\n\
         {} seconds time elapsed\n",
        group_thousands(references),
        group_thousands(misses),
        seconds
    )
}

/// Perf log in the generic-counter vocabulary
pub fn generic_log(references: u64, misses: u64, seconds: &str) -> String {
    format!(
        " Performance counter stats for './bandwidth':\n\n\
         {} cache-references\n\
         {} cache-misses              #    0.000 % of all cache refs\n\n\
         {} seconds time elapsed\n",
        group_thousands(references),
        group_thousands(misses),
        seconds
    )
}

/// Color profile with one bin per entry of `counts`
pub fn profile(counts: &[u64]) -> String {
    let mut text = format!("### Total Pages : {}\n", counts.iter().sum::<u64>());
    for (color, count) in counts.iter().enumerate() {
        text.push_str(&format!("Color {:2} : {}\n", color, count));
    }
    text
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub struct DataTree {
    dir: TempDir,
}

impl DataTree {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn run_dir(&self, kind: &str, utilization: &str) -> PathBuf {
        self.root()
            .join("TG/BW/UN/PL")
            .join(kind)
            .join("00")
            .join(utilization)
    }

    pub fn write(&self, path: &Path, contents: &str) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(path.to_path_buf())
    }

    pub fn write_perf(
        &self,
        utilization: &str,
        index: u32,
        references: u64,
        misses: u64,
        seconds: &str,
    ) -> Result<PathBuf> {
        let path = self.run_dir("PF", utilization).join(index.to_string());
        self.write(&path, &raw_log(references, misses, seconds))
    }

    pub fn write_colors(&self, utilization: &str, index: u32, counts: &[u64]) -> Result<PathBuf> {
        let path = self.run_dir("CL", utilization).join(index.to_string());
        self.write(&path, &profile(counts))
    }
}
