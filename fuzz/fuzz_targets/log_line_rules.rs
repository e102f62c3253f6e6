#![no_main]

use colorstat::color_histogram::HistogramAccumulator;
use colorstat::perf_log::{PerfAccumulator, Platform};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Only text logs reach the parsers
    if let Ok(input) = std::str::from_utf8(data) {
        let mut generic = PerfAccumulator::new(Platform::Generic);
        let mut raw = PerfAccumulator::new(Platform::RawCounter);
        let mut colors = HistogramAccumulator::new();

        for line in input.lines() {
            generic.feed(line);
            raw.feed(line);
            colors.feed(line);
        }

        // Must not panic whatever the input
        let _ = generic.finish(Path::new("log1"));
        let _ = raw.finish(Path::new("log1"));
        let _ = colors.finish(Path::new("colors1"));
    }
});
