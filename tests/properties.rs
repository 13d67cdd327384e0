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
//! Quantified invariants over the min-hash sample algebra, run against
//! randomly generated inputs rather than fixed examples.

use std::collections::BTreeSet;

use proptest::prelude::*;

use omnisketch::cell::OmniSketchCell;
use omnisketch::sample::{self, Sample};

fn distinct_hashes(values: &[u64]) -> Vec<u64> {
    let set: BTreeSet<u64> = values.iter().copied().collect();
    set.into_iter().collect()
}

proptest! {
    /// Invariant 2: inserting more records never shrinks a cell's exact
    /// record count.
    #[test]
    fn sample_monotonicity(hashes in proptest::collection::vec(0u64..10_000, 0..200)) {
        let mut cell = OmniSketchCell::new(Sample::new_sorted_set(16));
        let mut last_count = 0u64;
        for h in hashes {
            cell.add_record(h);
            prop_assert!(cell.record_count() >= last_count);
            last_count = cell.record_count();
        }
    }

    /// Invariant 3: intersecting a sample with itself reproduces it exactly.
    #[test]
    fn intersect_idempotence(hashes in proptest::collection::vec(0u64..10_000, 0..64)) {
        let mut sample = Sample::new_sorted_vec(32);
        for h in distinct_hashes(&hashes) {
            sample.add(h);
        }
        let result = sample::intersect(&[&sample, &sample], None);
        prop_assert_eq!(result.valid_hashes(32), sample.valid_hashes(32));
    }

    /// Invariant 4: for disjoint inputs, a union's size is bounded by the
    /// capacity and by the sum of both inputs' sizes.
    #[test]
    fn union_bound_on_disjoint_inputs(
        a_hashes in proptest::collection::vec(0u64..5_000, 0..40),
        b_hashes in proptest::collection::vec(5_000u64..10_000, 0..40),
    ) {
        let capacity = 32;
        let mut a = Sample::new_sorted_vec(capacity);
        for h in distinct_hashes(&a_hashes) {
            a.add(h);
        }
        let mut b = Sample::new_sorted_vec(capacity);
        for h in distinct_hashes(&b_hashes) {
            b.add(h);
        }
        let a_size = a.size();
        let b_size = b.size();
        a.combine(&b);
        prop_assert!(a.size() <= capacity);
        prop_assert_eq!(a.size(), (a_size + b_size).min(capacity));
    }

    /// Invariant 5: erasing a hash drops exactly that hash from the live
    /// iteration order, leaving every other entry's relative order intact.
    #[test]
    fn erase_respects_iteration_order(
        hashes in proptest::collection::vec(0u64..10_000, 1..40),
        erase_idx in 0usize..40,
    ) {
        let distinct = distinct_hashes(&hashes);
        prop_assume!(!distinct.is_empty());
        let mut sample = Sample::new_sorted_vec(distinct.len());
        for &h in &distinct {
            sample.add(h);
        }
        let target = distinct[erase_idx % distinct.len()];
        sample.erase(target);

        let remaining = sample.valid_hashes(distinct.len());
        let expected: Vec<u64> = distinct.into_iter().filter(|&h| h != target).collect();
        prop_assert_eq!(remaining, expected);
    }

    /// Invariant 6: flattening a cell never changes its record count or the
    /// sequence of hashes a caller can iterate.
    #[test]
    fn flatten_preserves_record_count_and_iteration(hashes in proptest::collection::vec(0u64..10_000, 0..80)) {
        let mut cell = OmniSketchCell::new(Sample::new_sorted_vec(32));
        for h in distinct_hashes(&hashes) {
            cell.add_record(h);
        }
        let flattened = cell.flatten();
        prop_assert_eq!(cell.record_count(), flattened.record_count());
        prop_assert_eq!(cell.sample().valid_hashes(32), flattened.sample().valid_hashes(32));
    }
}
