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
//! Sorted-vector sample: a bounded ascending `Vec<u64>`, the variant produced
//! by predicate application and intersection (it needs a validity mask to
//! carry which positions survived without physically removing them).

use super::validity::ValidityMask;

const SHRINK_TO_FIT_THRESHOLD: f64 = 1.0 / 8.0;

/// A bounded, ascending-sorted vector of hashes with an optional validity
/// mask for lazily erased positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedVecSample {
    data: Vec<u64>,
    max_count: usize,
    validity: Option<ValidityMask>,
}

impl SortedVecSample {
    /// Builds an empty sample bounded at `max_count`.
    pub fn new(max_count: usize) -> Self {
        SortedVecSample {
            data: Vec::with_capacity(max_count),
            max_count,
            validity: None,
        }
    }

    /// Builds a sample from already-sorted data, without a validity mask.
    pub fn from_sorted(data: Vec<u64>, max_count: usize) -> Self {
        debug_assert!(data.windows(2).all(|w| w[0] <= w[1]));
        SortedVecSample {
            data,
            max_count,
            validity: None,
        }
    }

    /// Attaches a fresh all-valid mask, used when this sample is about to be
    /// probed by a predicate.
    pub fn with_mask(mut self) -> Self {
        self.validity = Some(ValidityMask::new(self.data.len()));
        self
    }

    /// Inserts `hash` keeping ascending order, evicting the largest hash if
    /// the bound is exceeded.
    pub fn add(&mut self, hash: u64) {
        let pos = self.data.partition_point(|&h| h <= hash);
        self.data.insert(pos, hash);
        if self.data.len() > self.max_count {
            self.data.pop();
        }
    }

    /// Marks the position holding `hash` as invalid.
    pub fn erase(&mut self, hash: u64) {
        let mask = self
            .validity
            .get_or_insert_with(|| ValidityMask::new(self.data.len()));
        if let Ok(pos) = self.data.binary_search(&hash) {
            mask.set_invalid(pos);
        }
    }

    /// Number of live (non-erased) positions.
    pub fn size(&self) -> usize {
        match &self.validity {
            Some(mask) => self.data.len() - mask.invalid_count(),
            None => self.data.len(),
        }
    }

    /// The capacity bound.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Live hashes in ascending order, truncated to at most `limit`
    /// positions of the underlying data (mirrors `Iterator(max_sample_count)`
    /// in the original: the limit bounds how much of the vector is walked,
    /// not how many survive).
    pub fn valid_hashes(&self, limit: usize) -> Vec<u64> {
        let end = limit.min(self.data.len());
        match &self.validity {
            Some(mask) => (0..end)
                .filter(|&i| mask.is_valid(i))
                .map(|i| self.data[i])
                .collect(),
            None => self.data[..end].to_vec(),
        }
    }

    /// Merges `other`'s live hashes into this sample, keeping only the
    /// smallest `max_count` values overall.
    pub fn combine(&mut self, other: &SortedVecSample) {
        let other_valid = other.valid_hashes(other.data.len());
        if other_valid.is_empty() {
            return;
        }
        if self.data.is_empty() {
            self.data = other_valid;
            self.data.truncate(self.max_count);
            return;
        }
        let result_size = (self.data.len() + other_valid.len()).min(self.max_count);
        let mut merged = Vec::with_capacity(result_size);
        let mut i = 0;
        let mut j = 0;
        while merged.len() < result_size {
            let take_self = i < self.data.len()
                && (j >= other_valid.len() || self.data[i] <= other_valid[j]);
            if take_self {
                merged.push(self.data[i]);
                i += 1;
            } else {
                merged.push(other_valid[j]);
                j += 1;
            }
        }
        self.data = merged;
        self.validity = None;
    }

    /// A copy with the validity mask collapsed into a physically shorter
    /// vector, once it is sparse enough to be worth compacting.
    pub fn shrink_to_fit(&mut self) {
        let Some(mask) = &self.validity else { return };
        let valid = self.size();
        if self.data.is_empty() {
            return;
        }
        if (valid as f64 / self.data.len() as f64) > SHRINK_TO_FIT_THRESHOLD && valid > 0 {
            return;
        }
        self.data = self.valid_hashes(self.data.len());
        let _ = mask;
        self.validity = None;
    }

    /// Rough in-memory footprint in bytes.
    pub fn estimate_byte_size(&self) -> usize {
        std::mem::size_of::<usize>() + std::mem::size_of::<Vec<u64>>() + self.data.len() * 8
    }

    pub(crate) fn raw_data(&self) -> &[u64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_ascending_order_and_respects_bound() {
        let mut s = SortedVecSample::new(3);
        for h in [5, 1, 9, 2] {
            s.add(h);
        }
        assert_eq!(s.raw_data(), &[1, 2, 5]);
    }

    #[test]
    fn erase_reduces_live_size_without_shrinking_storage() {
        let mut s = SortedVecSample::new(4);
        for h in [1, 2, 3] {
            s.add(h);
        }
        s.erase(2);
        assert_eq!(s.size(), 2);
        assert_eq!(s.raw_data().len(), 3);
    }

    #[test]
    fn combine_keeps_smallest_values_within_bound() {
        let mut a = SortedVecSample::new(3);
        for h in [1, 4, 7] {
            a.add(h);
        }
        let mut b = SortedVecSample::new(3);
        for h in [2, 3, 9] {
            b.add(h);
        }
        a.combine(&b);
        assert_eq!(a.raw_data(), &[1, 2, 3]);
    }
}
