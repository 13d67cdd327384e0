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
//! Key-value sample: a bounded ascending map from primary-rid hash to
//! secondary-rid hash, used by pre-joined omni-sketches to carry the paired
//! identity of both sides of a PK→FK join through a single cell.

use super::validity::ValidityMask;
use std::collections::BTreeMap;

/// A bounded sample of `(primary_hash, secondary_hash)` pairs, ordered by
/// primary hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueSample {
    data: BTreeMap<u64, u64>,
    max_count: usize,
    validity: Option<ValidityMask>,
}

impl KeyValueSample {
    /// Builds an empty sample bounded at `max_count`.
    pub fn new(max_count: usize) -> Self {
        KeyValueSample {
            data: BTreeMap::new(),
            max_count,
            validity: None,
        }
    }

    /// Inserts a `(primary, secondary)` pair, keyed and bounded by
    /// `primary`, the smallest `max_count` primaries winning ties.
    pub fn add_pair(&mut self, primary: u64, secondary: u64) {
        if self.data.contains_key(&primary) {
            return;
        }
        if self.data.len() < self.max_count {
            self.data.insert(primary, secondary);
            return;
        }
        let max_key = *self.data.keys().next_back().expect("non-empty at capacity");
        if primary < max_key {
            self.data.insert(primary, secondary);
            self.data.remove(&max_key);
        }
    }

    /// Marks the pair keyed by `primary` as invalid.
    pub fn erase(&mut self, primary: u64) {
        let mask = self
            .validity
            .get_or_insert_with(|| ValidityMask::new(self.data.len()));
        if let Some(pos) = self.data.keys().position(|&k| k == primary) {
            mask.set_invalid(pos);
        }
    }

    /// Number of live pairs.
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

    /// Live primary hashes, ascending, truncated to `limit` positions of the
    /// underlying map.
    pub fn valid_hashes(&self, limit: usize) -> Vec<u64> {
        let end = limit.min(self.data.len());
        self.data
            .keys()
            .take(end)
            .enumerate()
            .filter(|(i, _)| self.validity.as_ref().is_none_or(|m| m.is_valid(*i)))
            .map(|(_, k)| *k)
            .collect()
    }

    /// Live `(primary, secondary)` pairs, ascending by primary.
    pub fn valid_pairs(&self, limit: usize) -> Vec<(u64, u64)> {
        let end = limit.min(self.data.len());
        self.data
            .iter()
            .take(end)
            .enumerate()
            .filter(|(i, _)| self.validity.as_ref().is_none_or(|m| m.is_valid(*i)))
            .map(|(_, (k, v))| (*k, *v))
            .collect()
    }

    /// The secondary hash paired with `primary`, if still live.
    pub fn secondary_for(&self, primary: u64) -> Option<u64> {
        let pos = self.data.keys().position(|&k| k == primary)?;
        if self.validity.as_ref().is_some_and(|m| !m.is_valid(pos)) {
            return None;
        }
        self.data.get(&primary).copied()
    }

    /// Merges `other`'s live pairs in, keeping only the smallest `max_count`
    /// primaries.
    pub fn combine(&mut self, other: &KeyValueSample) {
        for (primary, secondary) in other.valid_pairs(other.data.len()) {
            self.add_pair(primary, secondary);
        }
    }

    /// Pairs every hash in `primary_hashes` (assumed ascending) with the
    /// same `secondary_hash`, used when a pre-joined sketch fans one
    /// secondary record out to every primary rid a probe matched.
    ///
    /// Stops as soon as the sample is full and the next candidate exceeds
    /// the current largest key, since ascending input guarantees every
    /// later candidate would too.
    pub fn combine_with_secondary_hash(&mut self, primary_hashes: &[u64], secondary_hash: u64) {
        for &primary in primary_hashes {
            if self.data.len() == self.max_count {
                let max_key = *self.data.keys().next_back().expect("full implies non-empty");
                if primary > max_key {
                    return;
                }
            }
            self.data.insert(primary, secondary_hash);
            if self.data.len() > self.max_count {
                let max_key = *self.data.keys().next_back().expect("over capacity implies non-empty");
                self.data.remove(&max_key);
            }
        }
    }

    /// Rough in-memory footprint in bytes.
    pub fn estimate_byte_size(&self) -> usize {
        const MAP_OVERHEAD: usize = 32;
        const PER_ITEM: usize = 2 * (32 + 8);
        std::mem::size_of::<usize>() + MAP_OVERHEAD + self.data.len() * PER_ITEM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_pair_retains_smallest_primaries() {
        let mut s = KeyValueSample::new(2);
        s.add_pair(5, 50);
        s.add_pair(1, 10);
        s.add_pair(9, 90);
        assert_eq!(s.valid_pairs(10), vec![(1, 10), (5, 50)]);
    }

    #[test]
    fn secondary_for_resolves_paired_value() {
        let mut s = KeyValueSample::new(4);
        s.add_pair(3, 33);
        assert_eq!(s.secondary_for(3), Some(33));
        assert_eq!(s.secondary_for(4), None);
    }

    #[test]
    fn erase_hides_pair_without_removing_storage() {
        let mut s = KeyValueSample::new(4);
        s.add_pair(1, 11);
        s.add_pair(2, 22);
        s.erase(1);
        assert_eq!(s.size(), 1);
        assert_eq!(s.secondary_for(1), None);
    }
}
