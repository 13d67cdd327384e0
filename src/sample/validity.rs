// MIT License
//
// Copyright (c) 2026 Raja Lehtihet & Wael El Oraiby
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//
//! A bitset marking which positions of a sample are still "live" after a
//! predicate has been applied, plus a running count of how many were
//! knocked out.

/// Bitset over sample positions, one bit per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    bits: Vec<u8>,
    invalid_count: usize,
}

impl ValidityMask {
    /// Builds a mask of `size` positions, all initially valid.
    pub fn new(size: usize) -> Self {
        ValidityMask {
            bits: vec![0xFF; size.div_ceil(8)],
            invalid_count: 0,
        }
    }

    /// Marks `index` as valid.
    pub fn set_valid(&mut self, index: usize) {
        let was_valid = self.is_valid(index);
        self.bits[index / 8] |= 1 << (index % 8);
        if !was_valid {
            self.invalid_count = self.invalid_count.saturating_sub(1);
        }
    }

    /// Marks `index` as invalid.
    pub fn set_invalid(&mut self, index: usize) {
        let was_valid = self.is_valid(index);
        self.bits[index / 8] &= !(1 << (index % 8));
        if was_valid {
            self.invalid_count += 1;
        }
    }

    /// Whether `index` is still live.
    pub fn is_valid(&self, index: usize) -> bool {
        (self.bits[index / 8] >> (index % 8)) & 1 == 1
    }

    /// How many positions have been knocked out.
    pub fn invalid_count(&self) -> usize {
        self.invalid_count
    }

    /// Total number of tracked positions.
    pub fn len(&self) -> usize {
        self.bits.len() * 8
    }

    /// Whether the mask tracks zero positions.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mask_is_all_valid() {
        let mask = ValidityMask::new(10);
        assert_eq!(mask.invalid_count(), 0);
        for i in 0..10 {
            assert!(mask.is_valid(i));
        }
    }

    #[test]
    fn set_invalid_is_tracked_once() {
        let mut mask = ValidityMask::new(4);
        mask.set_invalid(2);
        mask.set_invalid(2);
        assert!(!mask.is_valid(2));
        assert_eq!(mask.invalid_count(), 1);
    }

    #[test]
    fn set_valid_restores_count() {
        let mut mask = ValidityMask::new(4);
        mask.set_invalid(1);
        mask.set_valid(1);
        assert!(mask.is_valid(1));
        assert_eq!(mask.invalid_count(), 0);
    }
}
