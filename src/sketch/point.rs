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
//! The core omni-sketch: a depth×width grid of cells that a column's values
//! are hashed into, each cell holding an exact counter and a bounded sample
//! of the record ids routed there.

use crate::cell::OmniSketchCell;
use crate::error::{OmniSketchError, Result};
use crate::hash::{hash_rid, CellIndexMapper};
use crate::sketch::SampleVariant;
use crate::value::{Value, ValueSet};

/// A depth×width grid of [`OmniSketchCell`]s indexed by value hash.
///
/// # Example
///
/// ```
/// use omnisketch::sketch::PointOmniSketch;
/// use omnisketch::value::Value;
///
/// let mut sketch = PointOmniSketch::new(64, 4, 128).unwrap();
/// sketch.add_value_record(&Value::from_u64(7), 1001);
/// assert_eq!(sketch.record_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PointOmniSketch {
    width: usize,
    depth: usize,
    max_sample_count: usize,
    mapper: CellIndexMapper,
    variant: SampleVariant,
    cells: Vec<Vec<OmniSketchCell>>,
    record_count: u64,
    null_count: u64,
}

impl PointOmniSketch {
    /// Builds a sketch with the default Barrett-quadratic mapper and an
    /// ordered-set sample in each cell.
    pub fn new(width: usize, depth: usize, max_sample_count: usize) -> Result<Self> {
        Self::with_mapper(
            width,
            depth,
            max_sample_count,
            CellIndexMapper::default(),
            SampleVariant::SortedSet,
        )
    }

    /// Builds a sketch choosing the cell-index mapper and cell sample
    /// variant explicitly.
    pub fn with_mapper(
        width: usize,
        depth: usize,
        max_sample_count: usize,
        mapper: CellIndexMapper,
        variant: SampleVariant,
    ) -> Result<Self> {
        if width == 0 || depth == 0 {
            return Err(OmniSketchError::InvalidParameter(
                "width and depth must be non-zero",
            ));
        }
        let cells = (0..depth)
            .map(|_| {
                (0..width)
                    .map(|_| OmniSketchCell::new(variant.new_sample(max_sample_count)))
                    .collect()
            })
            .collect();
        Ok(PointOmniSketch {
            width,
            depth,
            max_sample_count,
            mapper,
            variant,
            cells,
            record_count: 0,
            null_count: 0,
        })
    }

    /// Ingests a typed value and its record id.
    pub fn add_value_record(&mut self, value: &Value, record_id: u64) {
        self.add_record_hashed(value.hash(), hash_rid(record_id));
    }

    /// Ingests an already-hashed value/record-id pair, routing it into one
    /// cell per row.
    pub fn add_record_hashed(&mut self, value_hash: u64, record_id_hash: u64) {
        for row_idx in 0..self.depth {
            let col_idx = self.mapper.column_index(value_hash, row_idx, self.width);
            self.cells[row_idx][col_idx].add_record(record_id_hash);
        }
        self.record_count += 1;
    }

    /// Accounts for `count` null-valued records, which are tracked in the
    /// exact record count but never routed into a cell.
    pub fn add_null_values(&mut self, count: u64) {
        self.record_count += count;
        self.null_count += count;
    }

    /// How many null-valued records have been ingested.
    pub fn count_nulls(&self) -> u64 {
        self.null_count
    }

    /// Total exact records ingested, nulls included.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Probes one value hash, intersecting its one matched cell per row.
    pub fn probe_hash(&self, hash: u64) -> OmniSketchCell {
        let matches: Vec<&OmniSketchCell> = (0..self.depth)
            .map(|row_idx| {
                let col_idx = self.mapper.column_index(hash, row_idx, self.width);
                &self.cells[row_idx][col_idx]
            })
            .collect();
        OmniSketchCell::intersect(&matches, None)
    }

    /// Like [`Self::probe_hash`], but also returns the largest exact record
    /// count among the per-row matched cells *before* intersection. The
    /// Exhaustive predicate combinator uses this as a density estimate when
    /// chaining several join hops together.
    pub fn probe_hash_with_n_max(&self, hash: u64) -> (OmniSketchCell, u64) {
        let matches: Vec<&OmniSketchCell> = (0..self.depth)
            .map(|row_idx| {
                let col_idx = self.mapper.column_index(hash, row_idx, self.width);
                &self.cells[row_idx][col_idx]
            })
            .collect();
        let n_max = matches.iter().map(|c| c.record_count()).max().unwrap_or(0);
        (OmniSketchCell::intersect(&matches, None), n_max)
    }

    /// Probes a single typed value.
    pub fn probe_value(&self, value: &Value) -> OmniSketchCell {
        self.probe_hash(value.hash())
    }

    /// Probes a set of hashes with OR semantics: each hash is probed and
    /// intersected independently across rows, then all per-hash results are
    /// summed into one cell (`ProbeAllSum`).
    pub fn probe_hashed_set(&self, hashes: &[u64]) -> OmniSketchCell {
        let mut result = OmniSketchCell::new(self.variant.new_sample(self.max_sample_count));
        for &hash in hashes {
            result.combine(&self.probe_hash(hash));
        }
        result
    }

    /// Probes a typed value set with the same OR/sum semantics as
    /// [`Self::probe_hashed_set`].
    pub fn probe_value_set(&self, values: &ValueSet) -> OmniSketchCell {
        self.probe_hashed_set(values.hashes())
    }

    /// Physically compacts every cell's sample in place.
    pub fn flatten(&mut self) {
        for row in &mut self.cells {
            for cell in row.iter_mut() {
                *cell = cell.flatten();
            }
        }
    }

    /// Rough in-memory footprint in bytes: the sum of every cell's sampled
    /// hash count times 8 bytes, matching the original's hash-dominated
    /// estimate.
    pub fn estimate_byte_size(&self) -> usize {
        let hash_count: usize = self
            .cells
            .iter()
            .flat_map(|row| row.iter())
            .map(|cell| cell.sample_count())
            .sum();
        hash_count * std::mem::size_of::<u64>()
    }

    /// Number of rows.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The per-cell sample capacity bound.
    pub fn min_hash_sketch_size(&self) -> usize {
        self.max_sample_count
    }

    /// Which sample variant backs this sketch's cells.
    pub fn sample_variant(&self) -> SampleVariant {
        self.variant
    }

    /// The cell-index mapper in use.
    pub fn mapper(&self) -> CellIndexMapper {
        self.mapper
    }

    /// Combines the first row's cells into one, giving a summary sample of
    /// every record id this sketch has seen. Used by pre-joined sketches
    /// to probe "which primary rid does this secondary rid map through".
    pub fn get_rids(&self) -> OmniSketchCell {
        let mut iter = self.cells[0].iter();
        let mut result = iter.next().cloned().expect("depth is non-zero");
        for cell in iter {
            result.combine(cell);
        }
        result
    }

    /// Merges `other`'s cells and record count into `self`. Errors if the
    /// grid shapes don't match.
    pub fn combine(&mut self, other: &PointOmniSketch) -> Result<()> {
        if other.depth != self.depth || other.width != self.width {
            return Err(OmniSketchError::ContractViolation(format!(
                "cannot combine {}x{} sketch into {}x{}",
                other.depth, other.width, self.depth, self.width
            )));
        }
        if other.max_sample_count != self.max_sample_count {
            return Err(OmniSketchError::ContractViolation(
                "cannot combine sketches with different sample capacities".into(),
            ));
        }
        tracing::debug!(
            depth = self.depth,
            width = self.width,
            "combining omni-sketches"
        );
        for row_idx in 0..self.depth {
            for col_idx in 0..self.width {
                self.cells[row_idx][col_idx].combine(&other.cells[row_idx][col_idx]);
            }
        }
        self.record_count += other.record_count;
        Ok(())
    }

    /// Read access to one cell.
    pub fn cell(&self, row_idx: usize, col_idx: usize) -> &OmniSketchCell {
        &self.cells[row_idx][col_idx]
    }

    /// Mutable access to one cell, used by [`crate::sketch::pre_joined`]
    /// ingestion which updates a cell's sample and counter independently.
    pub fn cell_mut(&mut self, row_idx: usize, col_idx: usize) -> &mut OmniSketchCell {
        &mut self.cells[row_idx][col_idx]
    }

    /// Adds `count` to the exact record counter without routing any new
    /// record through the grid. Used when the count is derived from a
    /// probe against another sketch, as in pre-joined ingestion.
    pub fn bump_record_count(&mut self, count: u64) {
        self.record_count += count;
    }

    /// Replaces one cell outright. Used when reconstructing a sketch from
    /// its serialized shape.
    pub fn set_cell(&mut self, row_idx: usize, col_idx: usize, cell: OmniSketchCell) {
        self.cells[row_idx][col_idx] = cell;
    }

    /// Estimates the record count of an FK/FK join between `self` and
    /// `other`, scaling each row's co-occurring cell pair by `multiplier`
    /// and keeping the row with the smallest resulting total. The same
    /// row independently gives the tightest bound in each slice of the
    /// grid, so the minimum across rows is the most conservative estimate.
    ///
    /// Requires `self` and `other` to share the same grid shape.
    pub fn multiply_record_counts(&self, other: &PointOmniSketch, multiplier: f64) -> Result<u64> {
        if other.depth != self.depth || other.width != self.width {
            return Err(OmniSketchError::ContractViolation(format!(
                "cannot multiply record counts of {}x{} sketch with {}x{}",
                other.depth, other.width, self.depth, self.width
            )));
        }

        let mut min_row_total = u64::MAX;
        for row_idx in 0..self.depth {
            let mut row_total = 0u64;
            for col_idx in 0..self.width {
                let this_cell = &self.cells[row_idx][col_idx];
                let other_cell = &other.cells[row_idx][col_idx];
                if this_cell.record_count() > 0 && other_cell.record_count() > 0 {
                    let scaled = (this_cell.record_count() as f64)
                        .max(this_cell.record_count() as f64 * other_cell.record_count() as f64 * multiplier);
                    row_total += scaled.round() as u64;
                }
            }
            min_row_total = min_row_total.min(row_total);
        }
        Ok(if min_row_total == u64::MAX { 0 } else { min_row_total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_shaped_grids() {
        assert!(PointOmniSketch::new(0, 4, 16).is_err());
        assert!(PointOmniSketch::new(4, 0, 16).is_err());
    }

    #[test]
    fn ingestion_increments_record_count_and_populates_cells() {
        let mut sketch = PointOmniSketch::new(32, 3, 64).unwrap();
        for rid in 0..20u64 {
            sketch.add_value_record(&Value::from_u64(1), rid);
        }
        assert_eq!(sketch.record_count(), 20);
        let probed = sketch.probe_value(&Value::from_u64(1));
        assert_eq!(probed.record_count(), 20);
    }

    #[test]
    fn probe_of_unseen_value_has_zero_record_count() {
        let mut sketch = PointOmniSketch::new(32, 3, 64).unwrap();
        sketch.add_value_record(&Value::from_u64(1), 10);
        let probed = sketch.probe_value(&Value::from_u64(2));
        assert_eq!(probed.record_count(), 0);
    }

    #[test]
    fn combine_rejects_mismatched_shapes() {
        let mut a = PointOmniSketch::new(16, 2, 32).unwrap();
        let b = PointOmniSketch::new(8, 2, 32).unwrap();
        assert!(a.combine(&b).is_err());
    }

    #[test]
    fn combine_sums_record_counts_on_matching_shapes() {
        let mut a = PointOmniSketch::new(16, 2, 32).unwrap();
        let mut b = PointOmniSketch::new(16, 2, 32).unwrap();
        a.add_value_record(&Value::from_u64(1), 1);
        b.add_value_record(&Value::from_u64(2), 2);
        a.combine(&b).unwrap();
        assert_eq!(a.record_count(), 2);
    }

    #[test]
    fn null_values_count_toward_record_count_but_not_cells() {
        let mut sketch = PointOmniSketch::new(16, 2, 32).unwrap();
        sketch.add_null_values(5);
        assert_eq!(sketch.record_count(), 5);
        assert_eq!(sketch.count_nulls(), 5);
    }

    #[test]
    fn multiply_record_counts_rejects_mismatched_shapes() {
        let a = PointOmniSketch::new(16, 2, 32).unwrap();
        let b = PointOmniSketch::new(8, 2, 32).unwrap();
        assert!(a.multiply_record_counts(&b, 1.0).is_err());
    }

    #[test]
    fn multiply_record_counts_is_zero_when_no_cells_co_occur() {
        let mut a = PointOmniSketch::new(16, 2, 32).unwrap();
        let b = PointOmniSketch::new(16, 2, 32).unwrap();
        a.add_value_record(&Value::from_u64(1), 1);
        assert_eq!(a.multiply_record_counts(&b, 1.0).unwrap(), 0);
    }
}
