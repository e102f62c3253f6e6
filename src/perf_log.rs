//! Performance-counter log parsing
//!
//! A perf log is free-form `perf stat` output. Three line shapes matter: the
//! cache-reference count, the cache-miss count and the elapsed wall time.
//! Which counter names identify the first two depends on the platform the
//! log was captured on, so every platform contributes its own ordered list
//! of line rules.
//!
//! A rule matches a line when, after skipping any leading non-digit
//! characters, the line holds a numeric token followed by whitespace and the
//! rule's anchor word. Count tokens may carry `,` thousands separators;
//! time tokens are plain decimals.

use crate::error::{AnalysisError, Result};
use crate::scanner::{FileScanner, LineScanner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Counter vocabulary of the machine a perf log was captured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Generic perf events (`cache-references` / `cache-misses`), tag `XE`
    Generic,
    /// Vendor raw counters (`r50` / `r52`), tag `TG`
    RawCounter,
}

impl Platform {
    /// Short tag used in directory names
    pub fn tag(self) -> &'static str {
        match self {
            Platform::Generic => "XE",
            Platform::RawCounter => "TG",
        }
    }

    fn reference_anchor(self) -> &'static str {
        match self {
            Platform::Generic => "cache-references",
            Platform::RawCounter => "r50",
        }
    }

    fn miss_anchor(self) -> &'static str {
        match self {
            Platform::Generic => "cache-misses",
            Platform::RawCounter => "r52",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xe" | "xeon" | "a" | "generic" => Ok(Platform::Generic),
            "tg" | "tegra" | "b" | "raw" | "raw-counter" => Ok(Platform::RawCounter),
            _ => Err(format!(
                "Unknown platform '{}'. Expected XE (generic counters) or TG (raw counters)",
                s
            )),
        }
    }
}

/// One parsed perf log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerfRecord {
    pub accesses: u64,
    pub misses: u64,
    pub elapsed_seconds: f64,
}

impl PerfRecord {
    /// `misses / accesses * 100`
    pub fn miss_rate_percent(&self) -> f64 {
        self.misses as f64 / self.accesses as f64 * 100.0
    }

    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed_seconds * 1000.0
    }
}

/// Field a line rule writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfField {
    Accesses,
    Misses,
    Elapsed,
}

/// Character class of the numeric token a rule captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// Digits with optional `,` separators
    Count,
    /// Digits with an optional decimal point
    Decimal,
}

impl Token {
    fn accepts(self, c: char) -> bool {
        match self {
            Token::Count => c.is_ascii_digit() || c == ',',
            Token::Decimal => c.is_ascii_digit() || c == '.',
        }
    }
}

/// A (line shape, field setter) pair
#[derive(Debug, Clone, Copy)]
pub struct LineRule {
    anchor: &'static str,
    token: Token,
    field: PerfField,
}

impl LineRule {
    /// Return the numeric token this rule captures from `line`, if it matches
    pub fn capture<'a>(&self, line: &'a str) -> Option<&'a str> {
        let start = line.find(|c: char| c.is_ascii_digit())?;
        let rest = &line[start..];

        let len = rest
            .find(|c: char| !self.token.accepts(c))
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(len);

        let trimmed = tail.trim_start();
        if trimmed.len() == tail.len() || !trimmed.starts_with(self.anchor) {
            return None;
        }

        Some(token)
    }

    pub fn field(&self) -> PerfField {
        self.field
    }
}

/// Ordered rule set for one platform
pub fn rules_for(platform: Platform) -> [LineRule; 3] {
    [
        LineRule {
            anchor: platform.reference_anchor(),
            token: Token::Count,
            field: PerfField::Accesses,
        },
        LineRule {
            anchor: platform.miss_anchor(),
            token: Token::Count,
            field: PerfField::Misses,
        },
        LineRule {
            anchor: "seconds time",
            token: Token::Decimal,
            field: PerfField::Elapsed,
        },
    ]
}

/// Line-at-a-time accumulator for one perf log
///
/// Fields start at a zero sentinel; a later matching line overwrites an
/// earlier one. The first conversion failure is kept and reported by
/// [`PerfAccumulator::finish`].
#[derive(Debug)]
pub struct PerfAccumulator {
    rules: [LineRule; 3],
    accesses: u64,
    misses: u64,
    elapsed_seconds: f64,
    error: Option<String>,
}

impl PerfAccumulator {
    pub fn new(platform: Platform) -> Self {
        Self {
            rules: rules_for(platform),
            accesses: 0,
            misses: 0,
            elapsed_seconds: 0.0,
            error: None,
        }
    }

    pub fn feed(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }

        for rule in self.rules {
            let Some(token) = rule.capture(line) else {
                continue;
            };

            let outcome = match rule.field() {
                PerfField::Accesses => parse_count(token).map(|v| self.accesses = v),
                PerfField::Misses => parse_count(token).map(|v| self.misses = v),
                PerfField::Elapsed => parse_seconds(token).map(|v| self.elapsed_seconds = v),
            };

            if let Err(reason) = outcome {
                self.error = Some(reason);
                return;
            }
        }
    }

    /// Validate the accumulated fields and build the record
    pub fn finish(self, path: &Path) -> Result<PerfRecord> {
        if let Some(reason) = self.error {
            return Err(AnalysisError::malformed(path, reason));
        }

        let mut missing = Vec::new();
        if self.accesses == 0 {
            missing.push("accesses");
        }
        if self.misses == 0 {
            missing.push("misses");
        }
        if self.elapsed_seconds == 0.0 {
            missing.push("elapsed time");
        }
        if !missing.is_empty() {
            return Err(AnalysisError::malformed(
                path,
                format!("zero or missing {}", missing.join(", ")),
            ));
        }

        Ok(PerfRecord {
            accesses: self.accesses,
            misses: self.misses,
            elapsed_seconds: self.elapsed_seconds,
        })
    }
}

fn parse_seconds(token: &str) -> std::result::Result<f64, String> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("elapsed time '{}' is out of range", token)),
        Err(_) => Err(format!("could not convert '{}' to a float", token)),
    }
}

fn parse_count(token: &str) -> std::result::Result<u64, String> {
    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u64>()
        .map_err(|e| format!("could not convert '{}' to an integer: {}", token, e))
}

/// Parser for perf logs of one platform
#[derive(Debug, Clone)]
pub struct PerfLogParser<S = FileScanner> {
    scanner: S,
    platform: Platform,
}

impl PerfLogParser<FileScanner> {
    pub fn new(platform: Platform) -> Self {
        Self::with_scanner(FileScanner, platform)
    }
}

impl<S: LineScanner> PerfLogParser<S> {
    pub fn with_scanner(scanner: S, platform: Platform) -> Self {
        Self { scanner, platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn parse(&self, path: &Path) -> Result<PerfRecord> {
        let mut acc = PerfAccumulator::new(self.platform);
        self.scanner.scan(path, &mut |line| acc.feed(line))?;
        let record = acc.finish(path)?;

        tracing::debug!(
            path = %path.display(),
            accesses = record.accesses,
            misses = record.misses,
            elapsed = record.elapsed_seconds,
            "parsed perf log"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::MemoryScanner;

    const GENERIC_LOG: &str = "\
 Performance counter stats for './bandwidth -m 1536 -t 1':

         1,234,567 cache-references
            12,345 cache-misses              #    1.000 % of all cache refs

       1.234 seconds time elapsed
";

    const RAW_LOG: &str = "\
 Performance counter stats for './bandwidth':

     2,000,000 r50
       150,000 r52

       0.875 seconds time elapsed
";

    fn parse(platform: Platform, text: &str) -> Result<PerfRecord> {
        let scanner = MemoryScanner::new().with("log1", text);
        PerfLogParser::with_scanner(scanner, platform).parse(Path::new("log1"))
    }

    #[test]
    fn test_generic_vocabulary() {
        let record = parse(Platform::Generic, GENERIC_LOG).unwrap();
        assert_eq!(record.accesses, 1_234_567);
        assert_eq!(record.misses, 12_345);
        assert_eq!(record.elapsed_seconds, 1.234);
        assert!((record.miss_rate_percent() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_raw_counter_vocabulary() {
        let record = parse(Platform::RawCounter, RAW_LOG).unwrap();
        assert_eq!(record.accesses, 2_000_000);
        assert_eq!(record.misses, 150_000);
        assert_eq!(record.elapsed_seconds, 0.875);
        assert!((record.miss_rate_percent() - 7.5).abs() < 1e-9);
        assert_eq!(record.elapsed_millis(), 875.0);
    }

    #[test]
    fn test_wrong_vocabulary_is_malformed() {
        let err = parse(Platform::RawCounter, GENERIC_LOG).unwrap_err();
        match err {
            AnalysisError::MalformedRecord { path, reason } => {
                assert_eq!(path, Path::new("log1"));
                assert!(reason.contains("accesses"));
                assert!(reason.contains("misses"));
                assert!(!reason.contains("elapsed"));
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_time_line() {
        let text = "1,000 cache-references\n10 cache-misses\n";
        let err = parse(Platform::Generic, text).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedRecord { .. }));
        assert!(err.to_string().contains("elapsed time"));
    }

    #[test]
    fn test_zero_count_is_malformed() {
        let text = "1,000 cache-references\n0 cache-misses\n1.0 seconds time elapsed\n";
        assert!(parse(Platform::Generic, text).is_err());
    }

    #[test]
    fn test_unconvertible_time() {
        let text = "1,000 cache-references\n10 cache-misses\n1.2.3 seconds time elapsed\n";
        let err = parse(Platform::Generic, text).unwrap_err();
        assert!(err.to_string().contains("1.2.3"));
    }

    #[test]
    fn test_infinite_time_is_malformed() {
        let text = format!(
            "1,000 cache-references\n10 cache-misses\n{}.5 seconds time elapsed\n",
            "9".repeat(400)
        );
        let err = parse(Platform::Generic, &text).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedRecord { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_count_overflow_is_malformed() {
        let text = "99999999999999999999999 cache-references\n10 cache-misses\n1.0 seconds time\n";
        assert!(parse(Platform::Generic, text).is_err());
    }

    #[test]
    fn test_later_lines_overwrite() {
        let text = "\
100 cache-references
200 cache-references
50 cache-misses
1.5 seconds time elapsed
";
        let record = parse(Platform::Generic, text).unwrap();
        assert_eq!(record.accesses, 200);
    }

    #[test]
    fn test_anchor_requires_separator() {
        let rules = rules_for(Platform::Generic);
        assert_eq!(rules[0].capture("  42 cache-references"), Some("42"));
        assert_eq!(rules[0].capture("42cache-references"), None);
        assert_eq!(rules[0].capture("42 cache-misses"), None);
        assert_eq!(rules[0].capture("no digits cache-references"), None);
    }

    #[test]
    fn test_raw_anchor_is_prefix() {
        let rules = rules_for(Platform::RawCounter);
        assert_eq!(rules[0].capture("  7,500 r50:u"), Some("7,500"));
        assert_eq!(rules[1].capture("  7,500 r50"), None);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("XE".parse::<Platform>().unwrap(), Platform::Generic);
        assert_eq!("tegra".parse::<Platform>().unwrap(), Platform::RawCounter);
        assert_eq!("A".parse::<Platform>().unwrap(), Platform::Generic);
        assert_eq!("b".parse::<Platform>().unwrap(), Platform::RawCounter);
        assert!("arm".parse::<Platform>().is_err());
        assert_eq!(Platform::RawCounter.to_string(), "TG");
    }
}
