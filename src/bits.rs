//! Bit-position decomposition of color masks
//!
//! A color mask selects cache-color bins by setting the bit at each bin's
//! index. Decomposition walks the set bits from least to most significant
//! by isolating the lowest set bit (`v & v.wrapping_neg()`), counting its
//! position, and clearing it (`v ^= lowest`) until nothing is left.

/// Capability for turning a mask into the ordered positions of its set bits
pub trait BitDecomposer {
    /// Positions of the set bits in `mask`, ascending
    fn positions(&self, mask: u64) -> BitPositions;
}

/// Default decomposer using lowest-set-bit isolation
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestSetBit;

impl BitDecomposer for LowestSetBit {
    fn positions(&self, mask: u64) -> BitPositions {
        BitPositions::new(mask)
    }
}

/// Lazy iterator over the set-bit positions of a mask
///
/// Each iterator owns its working value, so two decompositions of the same
/// mask never interfere and a new one can be started at any time.
#[derive(Debug, Clone)]
pub struct BitPositions {
    remaining: u64,
}

impl BitPositions {
    pub fn new(mask: u64) -> Self {
        Self { remaining: mask }
    }
}

impl Iterator for BitPositions {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }

        let lowest = self.remaining & self.remaining.wrapping_neg();

        let mut shifted = lowest;
        let mut position = 0u32;
        while shifted > 1 {
            shifted >>= 1;
            position += 1;
        }

        self.remaining ^= lowest;
        Some(position)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitPositions {}

impl std::iter::FusedIterator for BitPositions {}

/// Convenience: collect the set-bit positions of `mask`
pub fn bit_positions(mask: u64) -> Vec<u32> {
    BitPositions::new(mask).collect()
}
