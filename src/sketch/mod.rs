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
//! Omni-sketches: the depth×width grid of cells a table column is ingested
//! into, plus the pre-joined variant that carries a PK→FK relationship
//! through its cells without a runtime join.

pub mod point;
pub mod pre_joined;
pub mod typed;

pub use point::PointOmniSketch;
pub use pre_joined::PreJoinedOmniSketch;
pub use typed::TypedPointOmniSketch;

/// Which physical [`crate::sample::Sample`] layout a sketch's cells use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleVariant {
    /// Ingestion-time samples (`Sample::SortedSet`).
    SortedSet,
    /// Samples that have already been the output of a predicate
    /// (`Sample::SortedVec`).
    SortedVec,
    /// Paired primary/secondary samples (`Sample::KeyValue`), used by
    /// [`PreJoinedOmniSketch`].
    KeyValue,
}

impl SampleVariant {
    pub(crate) fn new_sample(self, max_count: usize) -> crate::sample::Sample {
        match self {
            SampleVariant::SortedSet => crate::sample::Sample::new_sorted_set(max_count),
            SampleVariant::SortedVec => crate::sample::Sample::new_sorted_vec(max_count),
            SampleVariant::KeyValue => crate::sample::Sample::new_key_value(max_count),
        }
    }
}
