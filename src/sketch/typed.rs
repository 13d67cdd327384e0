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
//! A [`PointOmniSketch`] with a running min/max over the typed values it has
//! ingested, letting range predicates (`BETWEEN`, `<`, `>`) expand to a
//! bounded probe set instead of scanning the whole domain.

use crate::error::Result;
use crate::hash::CellIndexMapper;
use crate::sketch::point::PointOmniSketch;
use crate::sketch::SampleVariant;
use crate::value::TypedHash;

/// A standard omni-sketch over a typed column, tracking `min`/`max`
/// alongside the grid.
#[derive(Debug, Clone)]
pub struct TypedPointOmniSketch<T: TypedHash> {
    inner: PointOmniSketch,
    min: Option<T>,
    max: Option<T>,
}

impl<T: TypedHash> TypedPointOmniSketch<T> {
    /// Builds a typed sketch with the default Barrett-quadratic mapper and
    /// an ordered-set sample in each cell.
    pub fn new(width: usize, depth: usize, max_sample_count: usize) -> Result<Self> {
        Ok(TypedPointOmniSketch {
            inner: PointOmniSketch::with_mapper(
                width,
                depth,
                max_sample_count,
                CellIndexMapper::default(),
                SampleVariant::SortedSet,
            )?,
            min: None,
            max: None,
        })
    }

    /// Ingests a typed value and its record id, updating the min/max
    /// trackers.
    pub fn add_record(&mut self, value: T, record_id: u64) {
        self.min = Some(self.min.map_or(value, |m| if value < m { value } else { m }));
        self.max = Some(self.max.map_or(value, |m| if value > m { value } else { m }));
        self.inner.add_value_record(&value.to_value(), record_id);
    }

    /// Probes one typed value.
    pub fn probe(&self, value: T) -> crate::cell::OmniSketchCell {
        self.inner.probe_hash(value.to_value().hash())
    }

    /// Probes a typed range `[lower, upper]` by expanding it to a value set
    /// and delegating to `ProbeAllSum` semantics. Callers should bound the
    /// range to something the domain can reasonably enumerate. This does
    /// not attempt an unbounded scan.
    pub fn probe_range(&self, hashes: &[u64]) -> crate::cell::OmniSketchCell {
        self.inner.probe_hashed_set(hashes)
    }

    /// Smallest value ingested so far, if any.
    pub fn min(&self) -> Option<T> {
        self.min
    }

    /// Largest value ingested so far, if any.
    pub fn max(&self) -> Option<T> {
        self.max
    }

    /// Total records ingested.
    pub fn record_count(&self) -> u64 {
        self.inner.record_count()
    }

    /// The underlying grid.
    pub fn inner(&self) -> &PointOmniSketch {
        &self.inner
    }
}
