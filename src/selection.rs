//! Selected/rest partition of a color histogram by bitmask

use crate::bits::{BitDecomposer, LowestSetBit};
use crate::color_histogram::ColorHistogramRecord;
use crate::statistics::{population_std_dev, sorted};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Colors 0..24, the allocator's full set on the 24-color platform
pub const ALL_COLORS_24: u64 = 0x00FF_FFFF;

/// Colors 0..28, the allocator's full set on the 28-color platform
pub const ALL_COLORS_28: u64 = 0x0FFF_FFFF;

/// Page counts of one histogram split by a color mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPartition {
    pub selected_total: u64,
    pub rest_total: u64,
    /// Counts of the selected bins in ascending color order
    pub selected_counts: Vec<u64>,
    /// Population standard deviation of `selected_counts`
    pub standard_deviation: f64,
}

/// Routes each color bin into the selected or rest partition
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    mask: u64,
    selected: HashSet<usize>,
}

impl SelectionPolicy {
    pub fn new(mask: u64) -> Self {
        Self::with_decomposer(mask, &LowestSetBit)
    }

    pub fn with_decomposer(mask: u64, decomposer: &dyn BitDecomposer) -> Self {
        let selected = decomposer.positions(mask).map(|p| p as usize).collect();
        Self { mask, selected }
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn is_selected(&self, color: usize) -> bool {
        self.selected.contains(&color)
    }

    /// Split `record` into selected and rest bins
    ///
    /// Parsed records never hold bins whose sum overflows `u64`, so neither
    /// total can overflow.
    pub fn partition(&self, record: &ColorHistogramRecord) -> SelectedPartition {
        let mut selected_total = 0u64;
        let mut rest_total = 0u64;
        let mut selected_counts = Vec::with_capacity(self.selected.len());

        for (color, &count) in record.per_color_counts.iter().enumerate() {
            if self.is_selected(color) {
                selected_total += count;
                selected_counts.push(count);
            } else {
                rest_total += count;
            }
        }

        let values: Vec<f64> = selected_counts.iter().map(|&c| c as f64).collect();
        let standard_deviation = population_std_dev(&sorted(&values));

        SelectedPartition {
            selected_total,
            rest_total,
            selected_counts,
            standard_deviation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(counts: &[u64]) -> ColorHistogramRecord {
        ColorHistogramRecord {
            total_pages: counts.iter().sum(),
            per_color_counts: counts.to_vec(),
        }
    }

    #[test]
    fn test_partition_every_other_color() {
        let policy = SelectionPolicy::new(0b0101);
        let part = policy.partition(&record(&[10, 20, 30, 40]));
        assert_eq!(part.selected_counts, vec![10, 30]);
        assert_eq!(part.selected_total, 40);
        assert_eq!(part.rest_total, 60);
        assert_eq!(part.standard_deviation, 10.0);
    }

    #[test]
    fn test_selected_counts_keep_color_order() {
        let policy = SelectionPolicy::new(0b111);
        let part = policy.partition(&record(&[9, 1, 5]));
        assert_eq!(part.selected_counts, vec![9, 1, 5]);
    }

    #[test]
    fn test_mask_beyond_histogram() {
        let policy = SelectionPolicy::new(ALL_COLORS_28);
        let part = policy.partition(&record(&[4, 4, 4, 4]));
        assert_eq!(part.selected_counts.len(), 4);
        assert_eq!(part.rest_total, 0);
        assert_eq!(part.standard_deviation, 0.0);
    }

    #[test]
    fn test_bins_beyond_mask_go_to_rest() {
        let mut counts = vec![1u64; 24];
        counts.extend([100, 100, 100, 100]);
        let part = SelectionPolicy::new(ALL_COLORS_24).partition(&record(&counts));
        assert_eq!(part.selected_total, 24);
        assert_eq!(part.rest_total, 400);
    }

    #[test]
    fn test_empty_mask_selects_nothing() {
        let part = SelectionPolicy::new(0).partition(&record(&[3, 4]));
        assert!(part.selected_counts.is_empty());
        assert_eq!(part.selected_total, 0);
        assert_eq!(part.rest_total, 7);
        assert_eq!(part.standard_deviation, 0.0);
    }

    #[test]
    fn test_is_selected() {
        let policy = SelectionPolicy::new(0b1001);
        assert!(policy.is_selected(0));
        assert!(!policy.is_selected(1));
        assert!(policy.is_selected(3));
        assert_eq!(policy.mask(), 0b1001);
    }
}
