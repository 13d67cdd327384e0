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
//! Bounded min-hash samples.
//!
//! A [`Sample`] is one of three physical layouts sharing the same algebra:
//! add, erase, intersect, union, flatten, iterate. The layout is fixed for
//! the lifetime of a sketch instance, known at construction time, so `Sample`
//! is a tagged enum rather than a trait object: there is never a need to mix
//! layouts behind one dynamic handle, only to dispatch on a fixed tag.

pub mod key_value;
pub mod sorted_set;
pub mod sorted_vec;
pub mod validity;

pub use key_value::KeyValueSample;
pub use sorted_set::SortedSetSample;
pub use sorted_vec::SortedVecSample;
pub use validity::ValidityMask;

/// One of the three physical min-hash sample layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Sample {
    /// Ordered-set layout: ingestion-time samples that are never themselves
    /// the output of a predicate.
    SortedSet(SortedSetSample),
    /// Ordered-vector layout with a validity mask: the result of a
    /// predicate, an intersection, or an erase.
    SortedVec(SortedVecSample),
    /// Ordered `(primary, secondary)` pair layout, used by pre-joined
    /// sketches.
    KeyValue(KeyValueSample),
}

impl Sample {
    /// Builds an empty ordered-set sample bounded at `max_count`.
    pub fn new_sorted_set(max_count: usize) -> Self {
        Sample::SortedSet(SortedSetSample::new(max_count))
    }

    /// Builds an empty ordered-vector sample bounded at `max_count`.
    pub fn new_sorted_vec(max_count: usize) -> Self {
        Sample::SortedVec(SortedVecSample::new(max_count))
    }

    /// Builds an empty key-value sample bounded at `max_count`.
    pub fn new_key_value(max_count: usize) -> Self {
        Sample::KeyValue(KeyValueSample::new(max_count))
    }

    /// Inserts a single hash. Panics if called on a [`Sample::KeyValue`],
    /// use [`Sample::add_pair`] there instead.
    pub fn add(&mut self, hash: u64) {
        match self {
            Sample::SortedSet(s) => s.add(hash),
            Sample::SortedVec(s) => s.add(hash),
            Sample::KeyValue(_) => panic!("KeyValue samples require add_pair, not add"),
        }
    }

    /// Inserts a `(primary, secondary)` pair into a [`Sample::KeyValue`].
    /// Panics on the other variants.
    pub fn add_pair(&mut self, primary: u64, secondary: u64) {
        match self {
            Sample::KeyValue(s) => s.add_pair(primary, secondary),
            _ => panic!("add_pair is only valid on KeyValue samples"),
        }
    }

    /// Invalidates the position holding `hash` (or, for [`Sample::KeyValue`],
    /// keyed by `hash` as the primary).
    pub fn erase(&mut self, hash: u64) {
        match self {
            Sample::SortedSet(s) => s.erase(hash),
            Sample::SortedVec(s) => s.erase(hash),
            Sample::KeyValue(s) => s.erase(hash),
        }
    }

    /// Number of live positions.
    pub fn size(&self) -> usize {
        match self {
            Sample::SortedSet(s) => s.size(),
            Sample::SortedVec(s) => s.size(),
            Sample::KeyValue(s) => s.size(),
        }
    }

    /// The capacity bound.
    pub fn max_count(&self) -> usize {
        match self {
            Sample::SortedSet(s) => s.max_count(),
            Sample::SortedVec(s) => s.max_count(),
            Sample::KeyValue(s) => s.max_count(),
        }
    }

    /// Live hashes in ascending order, truncated to at most `limit`
    /// positions of the underlying storage.
    pub fn valid_hashes(&self, limit: usize) -> Vec<u64> {
        match self {
            Sample::SortedSet(s) => s.valid_hashes(limit),
            Sample::SortedVec(s) => s.valid_hashes(limit),
            Sample::KeyValue(s) => s.valid_hashes(limit),
        }
    }

    /// Merges `other` into `self` in place. Panics if the variants differ.
    pub fn combine(&mut self, other: &Sample) {
        match (self, other) {
            (Sample::SortedSet(a), Sample::SortedSet(b)) => a.combine(b),
            (Sample::SortedVec(a), Sample::SortedVec(b)) => a.combine(b),
            (Sample::KeyValue(a), Sample::KeyValue(b)) => a.combine(b),
            _ => panic!("cannot combine samples of different physical layouts"),
        }
    }

    /// Pairs every hash `other` carries with `secondary_hash` and merges the
    /// result into a [`Sample::KeyValue`]. Panics if `self` is not one.
    pub fn combine_with_secondary_hash(&mut self, other: &Sample, secondary_hash: u64) {
        match self {
            Sample::KeyValue(a) => {
                let hashes = other.valid_hashes(other.max_count());
                a.combine_with_secondary_hash(&hashes, secondary_hash)
            }
            _ => panic!("combine_with_secondary_hash is only valid on KeyValue samples"),
        }
    }

    /// Converts any variant into a physically compacted [`Sample::SortedVec`]
    /// holding exactly its live hashes, dropping the validity mask.
    pub fn flatten(&self) -> Sample {
        let hashes = self.valid_hashes(self.max_count());
        Sample::SortedVec(SortedVecSample::from_sorted(hashes, self.max_count()))
    }

    /// Rough in-memory footprint in bytes.
    pub fn estimate_byte_size(&self) -> usize {
        match self {
            Sample::SortedSet(s) => s.estimate_byte_size(),
            Sample::SortedVec(s) => s.estimate_byte_size(),
            Sample::KeyValue(s) => s.estimate_byte_size(),
        }
    }
}

/// Computes the intersection of `samples` via the merge-skip algorithm:
/// advance the first sample's cursor through candidate hashes, realigning
/// every other cursor to the current candidate (or skipping ahead past it on
/// mismatch) until all cursors agree or one runs out.
///
/// Always returns a [`Sample::SortedVec`], mirroring the physical layout
/// `MinHashSketchVector::ComputeIntersection` returns regardless of its
/// inputs' layouts.
pub fn intersect(samples: &[&Sample], max_sample_count: Option<usize>) -> Sample {
    assert!(!samples.is_empty(), "samples to intersect must not be empty");

    let window = max_sample_count
        .unwrap_or_else(|| samples.iter().map(|s| s.max_count()).min().unwrap_or(0));

    let windows: Vec<Vec<u64>> = samples.iter().map(|s| s.valid_hashes(window)).collect();
    let mut idxs = vec![0usize; windows.len()];
    let mut result = Vec::new();

    'outer: while idxs[0] < windows[0].len() {
        let current = windows[0][idxs[0]];
        let mut matched = true;

        for k in 1..windows.len() {
            while idxs[k] < windows[k].len() && windows[k][idxs[k]] < current {
                idxs[k] += 1;
            }
            if idxs[k] >= windows[k].len() {
                break 'outer;
            }
            if windows[k][idxs[k]] == current {
                continue;
            }

            matched = false;
            let target = windows[k][idxs[k]];
            while idxs[0] < windows[0].len() && windows[0][idxs[0]] < target {
                idxs[0] += 1;
            }
            break;
        }

        if matched {
            result.push(current);
            idxs[0] += 1;
        }
    }

    Sample::SortedVec(SortedVecSample::from_sorted(result, window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_finds_common_hashes_across_two_sorted_vecs() {
        let mut a = Sample::new_sorted_vec(10);
        for h in [1, 2, 3, 5, 8] {
            a.add(h);
        }
        let mut b = Sample::new_sorted_vec(10);
        for h in [2, 3, 4, 8, 9] {
            b.add(h);
        }
        let result = intersect(&[&a, &b], None);
        assert_eq!(result.valid_hashes(10), vec![2, 3, 8]);
    }

    #[test]
    fn intersect_of_three_samples_requires_unanimous_membership() {
        let mut a = Sample::new_sorted_vec(10);
        let mut b = Sample::new_sorted_vec(10);
        let mut c = Sample::new_sorted_vec(10);
        for h in [1, 2, 3, 4] {
            a.add(h);
            b.add(h);
        }
        for h in [2, 4, 6] {
            c.add(h);
        }
        let result = intersect(&[&a, &b, &c], None);
        assert_eq!(result.valid_hashes(10), vec![2, 4]);
    }

    #[test]
    fn flatten_drops_erased_positions() {
        let mut a = Sample::new_sorted_vec(10);
        for h in [1, 2, 3] {
            a.add(h);
        }
        a.erase(2);
        let flattened = a.flatten();
        assert_eq!(flattened.valid_hashes(10), vec![1, 3]);
        assert_eq!(flattened.size(), 2);
    }

    #[test]
    fn combine_requires_matching_layouts() {
        let mut a = Sample::new_sorted_vec(4);
        a.add(1);
        let b = Sample::new_sorted_set(4);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut a = a.clone();
            a.combine(&b);
        }));
        assert!(result.is_err());
    }
}
