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
//! Pre-joined omni-sketch: wraps a reference (primary-key) sketch so that
//! predicate pushdown through a PK→FK join never needs a runtime join.
//!
//! On ingest, the secondary (FK) side's record id is hashed and probed
//! against the reference sketch, which is keyed by rid rather than by a
//! column value; whatever primary rids that probe turns up are paired with
//! the secondary rid and stored in the destination cell. A later probe of
//! the destination grid therefore already carries both sides' rids, with no
//! join performed at query time.

use crate::error::Result;
use crate::hash::hash_rid;
use crate::sketch::point::PointOmniSketch;
use crate::sketch::SampleVariant;
use crate::value::{TypedHash, Value};

/// A [`PointOmniSketch`] whose cells carry `(primary_rid_hash,
/// secondary_rid_hash)` pairs instead of bare record-id hashes.
///
/// # Example
///
/// ```
/// use omnisketch::sketch::{PointOmniSketch, PreJoinedOmniSketch};
/// use omnisketch::value::Value;
///
/// let mut primary = PointOmniSketch::new(32, 3, 64).unwrap();
/// primary.add_value_record(&Value::from_u64(7), 1); // rid=1 keyed by its own rid-hash
///
/// let mut joined = PreJoinedOmniSketch::<u64>::new(primary, 32, 3, 64).unwrap();
/// joined.add_value_record(&Value::from_u64(7), 2); // secondary rid=2 references primary rid=1
/// assert_eq!(joined.record_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PreJoinedOmniSketch<T: TypedHash> {
    reference: PointOmniSketch,
    inner: PointOmniSketch,
    min: Option<T>,
    max: Option<T>,
}

impl<T: TypedHash> PreJoinedOmniSketch<T> {
    /// Builds a pre-joined sketch over `reference`, the rid-keyed sketch of
    /// the table on the PK side of the join.
    pub fn new(reference: PointOmniSketch, width: usize, depth: usize, max_sample_count: usize) -> Result<Self> {
        let inner = PointOmniSketch::with_mapper(
            width,
            depth,
            max_sample_count,
            reference.mapper(),
            SampleVariant::KeyValue,
        )?;
        Ok(PreJoinedOmniSketch {
            reference,
            inner,
            min: None,
            max: None,
        })
    }

    /// Ingests a typed value (updating the min/max trackers) alongside the
    /// secondary record id it was found on.
    pub fn add_record(&mut self, value: T, record_id: u64) {
        self.min = Some(self.min.map_or(value, |m| if value < m { value } else { m }));
        self.max = Some(self.max.map_or(value, |m| if value > m { value } else { m }));
        self.add_value_record(&value.to_value(), record_id);
    }

    /// Ingests a typed value without updating min/max tracking. The path
    /// used by [`Self::add_value_record`] and hash-level ingestion.
    pub fn add_value_record(&mut self, value: &Value, record_id: u64) {
        self.add_record_hashed(value.hash(), hash_rid(record_id));
    }

    /// Probes the reference sketch with the secondary record id's hash to
    /// find which primary rids it joins to, then routes the value hash
    /// through this sketch's own grid pairing each matched primary rid with
    /// the secondary rid.
    pub fn add_record_hashed(&mut self, value_hash: u64, record_id_hash: u64) {
        let probe_result = self.reference.probe_hash(record_id_hash);
        for row_idx in 0..self.inner.depth() {
            let col_idx = self
                .inner
                .mapper()
                .column_index(value_hash, row_idx, self.inner.width());
            let cell = self.inner.cell_mut(row_idx, col_idx);
            cell.sample_mut()
                .combine_with_secondary_hash(probe_result.sample(), record_id_hash);
            let new_count = cell.record_count() + probe_result.record_count();
            cell.set_record_count(new_count);
        }
        self.inner.bump_record_count(probe_result.record_count());
    }

    /// Probes this sketch's grid by typed value, same semantics as
    /// [`PointOmniSketch::probe_value`].
    pub fn probe(&self, value: T) -> crate::cell::OmniSketchCell {
        self.inner.probe_hash(value.to_value().hash())
    }

    /// Total records ingested.
    pub fn record_count(&self) -> u64 {
        self.inner.record_count()
    }

    /// Smallest value ingested so far, if any.
    pub fn min(&self) -> Option<T> {
        self.min
    }

    /// Largest value ingested so far, if any.
    pub fn max(&self) -> Option<T> {
        self.max
    }

    /// The underlying grid, for probing/combining via the common
    /// [`PointOmniSketch`] surface.
    pub fn inner(&self) -> &PointOmniSketch {
        &self.inner
    }

    /// The reference (primary-key) sketch this one was built against.
    pub fn reference(&self) -> &PointOmniSketch {
        &self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probing_joined_value_surfaces_combined_record_count() {
        let mut primary = PointOmniSketch::new(32, 3, 64).unwrap();
        primary.add_value_record(&Value::from_u64(7), 1);
        primary.add_value_record(&Value::from_u64(7), 2);

        let mut joined = PreJoinedOmniSketch::<u64>::new(primary, 32, 3, 64).unwrap();
        joined.add_value_record(&Value::from_u64(7), 100);

        assert_eq!(joined.record_count(), 2);
    }

    #[test]
    fn typed_ingestion_tracks_min_and_max() {
        let primary = PointOmniSketch::new(32, 3, 64).unwrap();
        let mut joined = PreJoinedOmniSketch::<u64>::new(primary, 32, 3, 64).unwrap();
        joined.add_record(5, 1);
        joined.add_record(1, 2);
        joined.add_record(9, 3);
        assert_eq!(joined.min(), Some(1));
        assert_eq!(joined.max(), Some(9));
    }
}
