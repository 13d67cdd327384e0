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
//! The table→column→sketch catalog a query graph resolves its nodes
//! against.
//!
//! Unlike the process-wide singleton this is grounded on, [`Registry`] is a
//! plain owned struct: callers build one, register sketches into it, and
//! pass it by reference wherever a lookup is needed. Nothing about the
//! estimation algorithms requires global mutable state, and explicit
//! ownership makes it possible to run several registries side by side (one
//! per test, one per connection, ...).

use std::collections::HashMap;

use crate::cell::OmniSketchCell;
use crate::error::{OmniSketchError, Result};
use crate::sketch::PointOmniSketch;

/// The sketches registered for one column: the main ingestion sketch, plus
/// one pre-joined sketch per table that references this column as a
/// foreign key.
#[derive(Debug)]
struct OmniSketchEntry {
    main_sketch: PointOmniSketch,
    referencing_sketches: HashMap<String, PointOmniSketch>,
}

/// Catalog of every sketch built for a schema, keyed by table and column
/// name.
#[derive(Debug, Default)]
pub struct Registry {
    sketches: HashMap<String, HashMap<String, OmniSketchEntry>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Registry {
            sketches: HashMap::new(),
        }
    }

    /// Registers a freshly built sketch as the main sketch for
    /// `table.column`. Errors if one is already registered there.
    pub fn register_sketch(&mut self, table: &str, column: &str, sketch: PointOmniSketch) -> Result<()> {
        if self.has_sketch(table, column) {
            return Err(OmniSketchError::ContractViolation(format!(
                "sketch already registered for {table}.{column}"
            )));
        }
        tracing::debug!(table, column, "registering omni-sketch");
        self.sketches
            .entry(table.to_string())
            .or_default()
            .insert(
                column.to_string(),
                OmniSketchEntry {
                    main_sketch: sketch,
                    referencing_sketches: HashMap::new(),
                },
            );
        Ok(())
    }

    /// Registers a pre-joined sketch under `table.column`, tagged with the
    /// name of the table whose foreign key it was built from.
    pub fn register_referencing_sketch(
        &mut self,
        table: &str,
        column: &str,
        referencing_table: &str,
        sketch: PointOmniSketch,
    ) -> Result<()> {
        let entry = self.entry_mut(table, column)?;
        tracing::debug!(table, column, referencing_table, "registering referencing sketch");
        entry.referencing_sketches.insert(referencing_table.to_string(), sketch);
        Ok(())
    }

    /// The main sketch registered for `table.column`.
    pub fn get_sketch(&self, table: &str, column: &str) -> Result<&PointOmniSketch> {
        Ok(&self.entry(table, column)?.main_sketch)
    }

    /// The pre-joined sketch built against `table.column` for records
    /// joined in from `referencing_table`, if one was registered.
    pub fn find_referencing_sketch(
        &self,
        table: &str,
        column: &str,
        referencing_table: &str,
    ) -> Option<&PointOmniSketch> {
        self.entry(table, column)
            .ok()?
            .referencing_sketches
            .get(referencing_table)
    }

    /// Whether any sketch is registered for `table.column`.
    pub fn has_sketch(&self, table: &str, column: &str) -> bool {
        self.sketches
            .get(table)
            .map(|columns| columns.contains_key(column))
            .unwrap_or(false)
    }

    /// A sample of the table's own record ids, used as the starting probe
    /// set for a table with no surviving predicate of its own. Prefers a
    /// column whose name doesn't look like a join-key translator table,
    /// since those tend to carry few distinct values and a skewed sample.
    pub fn produce_rid_sample(&self, table: &str) -> Result<OmniSketchCell> {
        let columns = self.table_columns(table)?;
        let chosen = columns
            .iter()
            .find(|(name, _)| !name.contains("__translator"))
            .or_else(|| columns.iter().next())
            .ok_or_else(|| OmniSketchError::NotFound {
                kind: "sketch",
                table: table.to_string(),
                column: None,
            })?;
        Ok(chosen.1.main_sketch.get_rids())
    }

    /// The sample capacity of the best available sketch on `table`, used
    /// by the query-graph reducer to size a fallback rid sample.
    pub fn next_best_sample_count(&self, table: &str) -> Result<usize> {
        let columns = self.table_columns(table)?;
        let chosen = columns
            .iter()
            .find(|(name, _)| !name.contains("__translator"))
            .or_else(|| columns.iter().next())
            .ok_or_else(|| OmniSketchError::NotFound {
                kind: "sketch",
                table: table.to_string(),
                column: None,
            })?;
        Ok(chosen.1.main_sketch.min_hash_sketch_size())
    }

    /// A sample of record ids pre-joined in from `referencing_table`, if
    /// any column on `table` carries a referencing sketch for it.
    pub fn try_produce_referencing_rid_sample(
        &self,
        table: &str,
        referencing_table: &str,
    ) -> Option<OmniSketchCell> {
        let columns = self.sketches.get(table)?;
        let (_, entry) = columns.iter().next()?;
        entry
            .referencing_sketches
            .get(referencing_table)
            .map(|sketch| sketch.get_rids())
    }

    /// The base table's exact record count, read off any of its sketches.
    pub fn base_table_card(&self, table: &str) -> Result<u64> {
        let columns = self.table_columns(table)?;
        let (_, entry) = columns
            .iter()
            .next()
            .ok_or_else(|| OmniSketchError::NotFound {
                kind: "sketch",
                table: table.to_string(),
                column: None,
            })?;
        Ok(entry.main_sketch.record_count())
    }

    /// Total in-memory footprint of every sketch registered, in bytes.
    pub fn estimate_byte_size(&self) -> usize {
        self.sketches
            .values()
            .flat_map(|columns| columns.values())
            .map(|entry| {
                entry.main_sketch.estimate_byte_size()
                    + entry
                        .referencing_sketches
                        .values()
                        .map(|s| s.estimate_byte_size())
                        .sum::<usize>()
            })
            .sum()
    }

    /// Drops every registered sketch.
    pub fn clear(&mut self) {
        self.sketches.clear();
    }

    fn entry(&self, table: &str, column: &str) -> Result<&OmniSketchEntry> {
        self.sketches
            .get(table)
            .and_then(|columns| columns.get(column))
            .ok_or_else(|| OmniSketchError::NotFound {
                kind: "sketch",
                table: table.to_string(),
                column: Some(column.to_string()),
            })
    }

    fn entry_mut(&mut self, table: &str, column: &str) -> Result<&mut OmniSketchEntry> {
        self.sketches
            .get_mut(table)
            .and_then(|columns| columns.get_mut(column))
            .ok_or_else(|| OmniSketchError::NotFound {
                kind: "sketch",
                table: table.to_string(),
                column: Some(column.to_string()),
            })
    }

    fn table_columns(&self, table: &str) -> Result<&HashMap<String, OmniSketchEntry>> {
        self.sketches.get(table).ok_or_else(|| OmniSketchError::NotFound {
            kind: "table",
            table: table.to_string(),
            column: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::CellIndexMapper;
    use crate::sketch::SampleVariant;
    use crate::value::Value;

    fn sketch_with(values_and_rids: &[(u64, u64)]) -> PointOmniSketch {
        let mut sketch = PointOmniSketch::with_mapper(32, 3, 64, CellIndexMapper::default(), SampleVariant::SortedSet)
            .unwrap();
        for &(value, rid) in values_and_rids {
            sketch.add_value_record(&Value::from_u64(value), rid);
        }
        sketch
    }

    #[test]
    fn register_and_get_round_trips() {
        let mut registry = Registry::new();
        registry
            .register_sketch("orders", "customer_id", sketch_with(&[(1, 10), (2, 11)]))
            .unwrap();
        assert!(registry.has_sketch("orders", "customer_id"));
        assert_eq!(registry.get_sketch("orders", "customer_id").unwrap().record_count(), 2);
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut registry = Registry::new();
        registry
            .register_sketch("orders", "customer_id", sketch_with(&[(1, 10)]))
            .unwrap();
        let err = registry.register_sketch("orders", "customer_id", sketch_with(&[(2, 11)]));
        assert!(err.is_err());
    }

    #[test]
    fn missing_sketch_is_not_found() {
        let registry = Registry::new();
        assert!(registry.get_sketch("orders", "customer_id").is_err());
    }

    #[test]
    fn produce_rid_sample_skips_translator_columns() {
        let mut registry = Registry::new();
        registry
            .register_sketch("orders", "id__translator", sketch_with(&[(1, 10)]))
            .unwrap();
        registry
            .register_sketch("orders", "customer_id", sketch_with(&[(1, 10), (2, 11)]))
            .unwrap();
        let rid_sample = registry.produce_rid_sample("orders").unwrap();
        assert!(rid_sample.record_count() > 0);
    }

    #[test]
    fn base_table_card_reads_record_count() {
        let mut registry = Registry::new();
        registry
            .register_sketch("orders", "customer_id", sketch_with(&[(1, 10), (2, 11), (3, 12)]))
            .unwrap();
        assert_eq!(registry.base_table_card("orders").unwrap(), 3);
    }
}
