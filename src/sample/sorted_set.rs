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
//! Sorted-set sample: a bounded `BTreeSet<u64>` that keeps the `max_count`
//! smallest hashes seen so far. No validity mask: positions erased from a
//! set sample are removed outright, matching ingestion-time sketches that
//! are never themselves the output of a predicate.

use std::collections::BTreeSet;

/// A bounded min-hash sample backed by an ordered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedSetSample {
    data: BTreeSet<u64>,
    max_count: usize,
}

impl SortedSetSample {
    /// Builds an empty sample bounded at `max_count`.
    pub fn new(max_count: usize) -> Self {
        SortedSetSample {
            data: BTreeSet::new(),
            max_count,
        }
    }

    /// Inserts `hash`, keeping only the `max_count` smallest values.
    pub fn add(&mut self, hash: u64) {
        if self.data.len() < self.max_count {
            self.data.insert(hash);
            return;
        }
        let current_max = *self.data.iter().next_back().expect("non-empty at capacity");
        if hash < current_max {
            self.data.insert(hash);
            if self.data.len() > self.max_count {
                self.data.remove(&current_max);
            }
        }
    }

    /// Removes `hash` outright.
    pub fn erase(&mut self, hash: u64) {
        self.data.remove(&hash);
    }

    /// Number of stored hashes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The capacity bound.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Ascending hashes, truncated to at most `limit` entries.
    pub fn valid_hashes(&self, limit: usize) -> Vec<u64> {
        self.data.iter().take(limit).copied().collect()
    }

    /// Merges `other`'s hashes in, keeping only the smallest `max_count`.
    pub fn combine(&mut self, other: &SortedSetSample) {
        for hash in &other.data {
            self.add(*hash);
        }
    }

    /// Rough in-memory footprint in bytes.
    pub fn estimate_byte_size(&self) -> usize {
        const SET_OVERHEAD: usize = 16;
        const PER_ITEM: usize = 32 + 8;
        std::mem::size_of::<usize>() + SET_OVERHEAD + self.data.len() * PER_ITEM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_retains_only_smallest_values() {
        let mut s = SortedSetSample::new(2);
        for h in [5, 1, 9, 2] {
            s.add(h);
        }
        assert_eq!(s.valid_hashes(10), vec![1, 2]);
    }

    #[test]
    fn erase_removes_the_value() {
        let mut s = SortedSetSample::new(3);
        for h in [1, 2, 3] {
            s.add(h);
        }
        s.erase(2);
        assert_eq!(s.size(), 2);
        assert_eq!(s.valid_hashes(10), vec![1, 3]);
    }

    #[test]
    fn combine_respects_capacity() {
        let mut a = SortedSetSample::new(2);
        a.add(10);
        a.add(20);
        let mut b = SortedSetSample::new(2);
        b.add(1);
        b.add(30);
        a.combine(&b);
        assert_eq!(a.valid_hashes(10), vec![1, 10]);
    }
}
