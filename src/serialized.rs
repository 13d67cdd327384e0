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
//! The shapes external collaborators (CSV importers, query-text parsers,
//! benchmark harnesses) build against: predicate constructors that turn a
//! caller's literal into a probe [`OmniSketchCell`], and the `serde` wire
//! structs a persistence layer would round-trip sketches through.
//!
//! This crate does not read or write these shapes to disk; the structs only
//! pin down the data contract an external importer/exporter must satisfy.

use serde::{Deserialize, Serialize};

use crate::cell::OmniSketchCell;
use crate::error::{OmniSketchError, Result};
use crate::sample::Sample;
use crate::value::Value;

/// Ranges wider than this are rejected rather than silently enumerated.
/// A caller asking for a million-value `IN` set almost always meant a
/// different predicate.
pub const MAX_RANGE_WIDTH: u64 = 1_000_000;

/// A single-value predicate: `column = value`. Capacity-1 cell, exact
/// record count 1.
pub fn convert_point(value: &Value) -> OmniSketchCell {
    let mut cell = OmniSketchCell::new(Sample::new_sorted_vec(1));
    cell.add_record(value.hash());
    cell
}

/// An explicit `column IN (v1, .., vn)` predicate.
pub fn convert_set(values: &[Value]) -> OmniSketchCell {
    let mut cell = OmniSketchCell::new(Sample::new_sorted_vec(values.len().max(1)));
    for value in values {
        cell.add_record(value.hash());
    }
    cell
}

/// A `column BETWEEN lower AND upper` predicate over unsigned integers,
/// expanded to the explicit set of values in range.
///
/// Rejects ranges wider than [`MAX_RANGE_WIDTH`] instead of enumerating
/// an unbounded domain.
pub fn convert_range_u64(lower: u64, upper: u64) -> Result<OmniSketchCell> {
    if upper < lower {
        return Ok(OmniSketchCell::new(Sample::new_sorted_vec(1)));
    }
    let width = upper - lower + 1;
    if width > MAX_RANGE_WIDTH {
        return Err(OmniSketchError::InvalidParameter("range predicate exceeds the configured width cap"));
    }
    let values: Vec<Value> = (lower..=upper).map(Value::from_u64).collect();
    Ok(convert_set(&values))
}

/// A `column BETWEEN lower AND upper` predicate over signed integers.
pub fn convert_range_i32(lower: i32, upper: i32) -> Result<OmniSketchCell> {
    if upper < lower {
        return Ok(OmniSketchCell::new(Sample::new_sorted_vec(1)));
    }
    let width = (upper as i64 - lower as i64 + 1) as u64;
    if width > MAX_RANGE_WIDTH {
        return Err(OmniSketchError::InvalidParameter("range predicate exceeds the configured width cap"));
    }
    let values: Vec<Value> = (lower..=upper).map(Value::from_i32).collect();
    Ok(convert_set(&values))
}

/// One cell's wire shape: its live sample entries, in ascending hash order,
/// plus the exact record count offered to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedCell {
    /// Ascending live hashes held in the cell's sample.
    pub samples: Vec<u64>,
    /// Exact count of records routed into this cell.
    pub record_count: u64,
}

/// One `(table, column[, referencing_table])` sketch's wire shape: grid
/// geometry plus every cell's contents, row-major.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerializedSketch {
    /// Table the sketch was built over.
    pub table_name: String,
    /// Column the sketch was built over.
    pub column_name: String,
    /// Present when this is a pre-joined sketch built from a referencing
    /// table's foreign key rather than the table's own ingestion.
    pub referencing_table_name: Option<String>,
    /// Number of columns in the grid.
    pub width: usize,
    /// Number of rows in the grid.
    pub depth: usize,
    /// Per-cell sample capacity.
    pub sample_capacity: usize,
    /// Total records ingested.
    pub record_count: u64,
    /// Records observed with a null value for this column.
    pub null_count: u64,
    /// Smallest value ingested, as its raw hash, if the column is ordered
    /// and at least one value was ingested.
    pub min: Option<u64>,
    /// Largest value ingested, as its raw hash, under the same condition.
    pub max: Option<u64>,
    /// `depth` rows of `width` cells each.
    pub cells: Vec<Vec<SerializedCell>>,
}

/// The aggregate rid sample for one table, used as the starting probe set
/// when a query applies no column filters to it. One such file exists per
/// table in the persistence format this crate's structs describe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedRids {
    /// Table the rid sample was drawn from.
    pub table_name: String,
    /// The sampled record-id hashes, ascending.
    pub samples: Vec<u64>,
    /// The table's exact record count.
    pub record_count: u64,
}
