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
//! A single grid cell: an exact record counter paired with a bounded
//! min-hash sample of the records routed into it.

use crate::sample::{self, Sample};

/// One cell of an omni-sketch's depth×width grid.
///
/// # Example
///
/// ```
/// use omnisketch::cell::OmniSketchCell;
/// use omnisketch::sample::Sample;
///
/// let mut cell = OmniSketchCell::new(Sample::new_sorted_set(16));
/// cell.add_record(42);
/// assert_eq!(cell.record_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct OmniSketchCell {
    sample: Sample,
    record_count: u64,
}

impl OmniSketchCell {
    /// Builds a cell around an already-constructed sample, with a zero
    /// record counter.
    pub fn new(sample: Sample) -> Self {
        OmniSketchCell {
            sample,
            record_count: 0,
        }
    }

    /// Builds a cell from a sample and an explicit starting record count.
    pub fn with_record_count(sample: Sample, record_count: u64) -> Self {
        OmniSketchCell {
            sample,
            record_count,
        }
    }

    /// Ingests one record's hash, incrementing the exact counter
    /// independently of whether the sample accepted it.
    pub fn add_record(&mut self, hash: u64) {
        self.sample.add(hash);
        self.record_count += 1;
    }

    /// Ingests one `(primary, secondary)` pair into a key-value cell.
    pub fn add_pair(&mut self, primary: u64, secondary: u64) {
        self.sample.add_pair(primary, secondary);
        self.record_count += 1;
    }

    /// The exact number of records routed into this cell.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Overwrites the exact record counter directly, used when a cell's
    /// count is derived from a probe result rather than accumulated via
    /// [`Self::add_record`].
    pub fn set_record_count(&mut self, count: u64) {
        self.record_count = count;
    }

    /// Number of live positions in the sample.
    pub fn sample_count(&self) -> usize {
        self.sample.size()
    }

    /// The sample's capacity bound.
    pub fn max_sample_count(&self) -> usize {
        self.sample.max_count()
    }

    /// Fraction of records that survive in the sample: 1.0 while the cell is
    /// below capacity, shrinking toward `max_sample_count / record_count`
    /// once it saturates. Used to scale a sample-level count back up to a
    /// cell-level cardinality estimate.
    pub fn sampling_probability(&self) -> f64 {
        if self.record_count == 0 {
            return 1.0;
        }
        (self.sample_count() as f64 / self.record_count as f64).min(1.0)
    }

    /// Read-only access to the underlying sample.
    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// Mutable access to the underlying sample.
    pub fn sample_mut(&mut self) -> &mut Sample {
        &mut self.sample
    }

    /// Merges `other`'s exact counter and sample into `self`.
    pub fn combine(&mut self, other: &OmniSketchCell) {
        self.record_count += other.record_count;
        self.sample.combine(&other.sample);
    }

    /// A copy of this cell with its sample physically compacted.
    pub fn flatten(&self) -> OmniSketchCell {
        OmniSketchCell {
            sample: self.sample.flatten(),
            record_count: self.record_count,
        }
    }

    /// Rough in-memory footprint in bytes.
    pub fn estimate_byte_size(&self) -> usize {
        std::mem::size_of::<u64>() + self.sample.estimate_byte_size()
    }

    /// Intersects several cells' samples, then rescales the result's record
    /// count by the ratio of the largest contributing cell's own sampling
    /// density: the cell whose exact count is largest drives the scale,
    /// since it carries the most reliable density estimate.
    pub fn intersect(cells: &[&OmniSketchCell], max_samples: Option<usize>) -> OmniSketchCell {
        assert!(!cells.is_empty(), "cells to intersect must not be empty");

        let (driver, _) = cells
            .iter()
            .enumerate()
            .max_by_key(|(_, c)| c.record_count)
            .expect("non-empty cells");
        let n_max = cells[driver].record_count;
        let sample_count = cells[driver].sample_count().max(1);

        let samples: Vec<&Sample> = cells.iter().map(|c| c.sample()).collect();
        let result_sample = sample::intersect(&samples, max_samples);

        let card_est = (n_max as f64 / sample_count as f64) * result_sample.size() as f64;
        OmniSketchCell {
            sample: result_sample,
            record_count: card_est.round() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_record_increments_counter_even_when_sample_is_full() {
        let mut cell = OmniSketchCell::new(Sample::new_sorted_set(1));
        cell.add_record(1);
        cell.add_record(2);
        cell.add_record(3);
        assert_eq!(cell.record_count(), 3);
        assert!(cell.sample_count() <= 1);
    }

    #[test]
    fn sampling_probability_is_one_below_capacity() {
        let mut cell = OmniSketchCell::new(Sample::new_sorted_set(10));
        cell.add_record(1);
        cell.add_record(2);
        assert_eq!(cell.sampling_probability(), 1.0);
    }

    #[test]
    fn combine_sums_record_counts() {
        let mut a = OmniSketchCell::new(Sample::new_sorted_vec(10));
        a.add_record(1);
        let mut b = OmniSketchCell::new(Sample::new_sorted_vec(10));
        b.add_record(2);
        a.combine(&b);
        assert_eq!(a.record_count(), 2);
    }

    #[test]
    fn intersect_estimates_cardinality_from_driving_cell() {
        let mut a = OmniSketchCell::new(Sample::new_sorted_vec(10));
        let mut b = OmniSketchCell::new(Sample::new_sorted_vec(10));
        for h in [1, 2, 3, 4, 5] {
            a.add_record(h);
        }
        for h in [3, 4, 5, 6, 7] {
            b.add_record(h);
        }
        let result = OmniSketchCell::intersect(&[&a, &b], None);
        assert_eq!(result.sample().valid_hashes(10), vec![3, 4, 5]);
    }
}
