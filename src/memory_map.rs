//! Memory-area maps and page-address classification
//!
//! An area map lists one region per row: a hyphen-joined hexadecimal range
//! first, a label last, and any number of fields in between (the layout of
//! `/proc/<pid>/maps`). A page-usage profile lists `<address> : <count>`
//! rows. Together they produce the per-area page report written next to
//! the profile as `<profile>.ord`.

use crate::error::{AnalysisError, Result};
use crate::scanner::{FileScanner, LineScanner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Which area boundaries count as inside the area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Boundary {
    /// `start <= addr < end`; the end address is one past the last byte
    #[default]
    HalfOpen,
    /// `start < addr < end`; neither boundary address belongs to the area
    Open,
}

impl Boundary {
    pub fn contains(self, area: &MemoryArea, address: u64) -> bool {
        match self {
            Boundary::HalfOpen => area.start_address <= address && address < area.end_address,
            Boundary::Open => area.start_address < address && address < area.end_address,
        }
    }
}

/// One mapped region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryArea {
    pub start_address: u64,
    pub end_address: u64,
    pub size: u64,
    pub label: String,
}

fn parse_hex(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}

/// Areas ordered by start address
///
/// Areas are expected not to overlap; this is not checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryAreaMap {
    areas: Vec<MemoryArea>,
    boundary: Boundary,
}

impl MemoryAreaMap {
    /// Parse an area map file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::parse_with(&FileScanner, path)
    }

    pub fn parse_with(scanner: &dyn LineScanner, path: &Path) -> Result<Self> {
        let mut areas = Vec::new();
        let mut error = None;
        let mut line_no = 0usize;

        scanner.scan(path, &mut |line| {
            line_no += 1;
            if error.is_some() {
                return;
            }
            match parse_area(line) {
                Ok(Some(area)) => areas.push(area),
                Ok(None) => {}
                Err(range) => {
                    error = Some(AnalysisError::MalformedRange {
                        path: path.to_path_buf(),
                        line: line_no,
                        range,
                    })
                }
            }
        })?;

        if let Some(err) = error {
            return Err(err);
        }

        tracing::debug!(path = %path.display(), areas = areas.len(), "parsed memory area map");
        Ok(Self::from_areas(areas))
    }

    pub fn from_areas(mut areas: Vec<MemoryArea>) -> Self {
        areas.sort_by_key(|a| a.start_address);
        Self {
            areas,
            boundary: Boundary::default(),
        }
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn areas(&self) -> &[MemoryArea] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Area containing `address` under this map's boundary policy, or `None`
    /// when the address is unmapped
    pub fn classify(&self, address: u64) -> Option<&MemoryArea> {
        // Last area starting at or before the address is the only candidate
        let idx = self.areas.partition_point(|a| a.start_address <= address);
        let candidate = self.areas.get(idx.checked_sub(1)?)?;
        self.boundary
            .contains(candidate, address)
            .then_some(candidate)
    }

    /// Write the per-area page report
    ///
    /// One header per area followed by every page of `pages` it contains,
    /// in address order.
    pub fn write_report<W: Write + ?Sized>(&self, pages: &PageUsage, out: &mut W) -> io::Result<()> {
        for area in &self.areas {
            write!(
                out,
                "\nArea Range : 0x{:09x} - 0x{:09x}\n\n",
                area.start_address, area.end_address
            )?;
            let lower = match self.boundary {
                Boundary::HalfOpen => area.start_address,
                Boundary::Open => area.start_address.saturating_add(1),
            };
            if lower >= area.end_address {
                continue;
            }
            for (address, count) in pages.counts.range(lower..area.end_address) {
                writeln!(out, "0x{:08x} : {}", address, count)?;
            }
        }
        Ok(())
    }
}

/// Parse one map row; `Ok(None)` for blank rows, `Err(range)` for a bad range
fn parse_area(line: &str) -> std::result::Result<Option<MemoryArea>, String> {
    let mut words = line.split_whitespace();
    let Some(range) = words.next() else {
        return Ok(None);
    };
    let label = words.last().unwrap_or(range).to_string();

    let (start, end) = range.split_once('-').ok_or_else(|| range.to_string())?;
    let start_address = parse_hex(start).ok_or_else(|| range.to_string())?;
    let end_address = parse_hex(end).ok_or_else(|| range.to_string())?;
    if end_address < start_address {
        return Err(range.to_string());
    }

    Ok(Some(MemoryArea {
        start_address,
        end_address,
        size: end_address - start_address,
        label,
    }))
}

/// Report path for a page-usage profile: `<input>.ord`
pub fn report_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".ord");
    PathBuf::from(name)
}

/// Page access counts keyed by page address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageUsage {
    counts: BTreeMap<u64, u64>,
}

impl PageUsage {
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::parse_with(&FileScanner, path)
    }

    pub fn parse_with(scanner: &dyn LineScanner, path: &Path) -> Result<Self> {
        let mut counts = BTreeMap::new();
        let mut error = None;
        let mut line_no = 0usize;

        scanner.scan(path, &mut |line| {
            line_no += 1;
            if error.is_some() {
                return;
            }
            let mut words = line.split_whitespace().filter(|w| *w != ":");
            let Some(address) = words.next() else {
                return;
            };
            let address = address.trim_end_matches(':');

            let parsed = parse_hex(address).zip(words.next().and_then(|c| c.parse::<u64>().ok()));
            match parsed {
                Some((address, count)) => {
                    counts.insert(address, count);
                }
                None => {
                    error = Some(AnalysisError::malformed(
                        path,
                        format!("line {}: expected '<hex address> : <count>', got '{}'", line_no, line),
                    ))
                }
            }
        })?;

        if let Some(err) = error {
            return Err(err);
        }

        let usage = Self { counts };
        tracing::info!(
            path = %path.display(),
            pages = usage.len(),
            total_mib = usage.total_mib(),
            "parsed page usage"
        );
        Ok(usage)
    }

    pub fn insert(&mut self, address: u64, count: u64) {
        self.counts.insert(address, count);
    }

    pub fn counts(&self) -> &BTreeMap<u64, u64> {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, read as bytes, in MiB
    pub fn total_mib(&self) -> f64 {
        self.counts.values().sum::<u64>() as f64 / 1024.0 / 1024.0
    }
}
