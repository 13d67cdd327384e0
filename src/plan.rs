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
//! One table's worth of filters and join expansions, reduced to a single
//! cardinality estimate.
//!
//! A [`PlanNode`] accumulates the predicates that apply to one table
//! (primary filters, filters pushed down from a referencing table,
//! primary-key expansions, and FK/FK joins folded in from the query graph
//! reducer) and turns them into one [`OmniSketchCell`] via [`Self::estimate`].

use std::rc::Rc;

use crate::cell::OmniSketchCell;
use crate::error::{OmniSketchError, Result};
use crate::registry::Registry;
use crate::sample::{self, Sample};
use crate::sketch::PointOmniSketch;

struct Filter {
    column_name: String,
    probe_values: OmniSketchCell,
}

struct SecondaryFilter {
    table_name: String,
    column_name: String,
    probe_values: OmniSketchCell,
}

struct PkJoinExpansion {
    foreign_key_column: String,
    foreign_key_node: Box<PlanNode>,
}

struct FkFkJoinExpansion {
    this_foreign_key_column: String,
    other_node: Rc<PlanNode>,
    other_foreign_key_column: String,
}

/// One per-probe-value match, paired with the largest exact record count
/// seen among the cells it was drawn from.
struct ProbeMatch {
    n_max: u64,
    rids: OmniSketchCell,
}

/// The outcome of probing one predicate: its matches, and the fraction of
/// the predicate's own domain that was actually sampled.
struct ProbeResultSet {
    p_sample: f64,
    results: Vec<ProbeMatch>,
}

/// A single table node in a reduced query graph: its base cardinality, the
/// predicates that apply to it, and any join expansions folded in by the
/// query-graph reducer.
pub struct PlanNode {
    table_name: String,
    base_card: u64,
    max_sample_count: usize,
    filters: Vec<Filter>,
    secondary_filters: Vec<SecondaryFilter>,
    pk_join_expansions: Vec<PkJoinExpansion>,
    fk_fk_join_expansions: Vec<FkFkJoinExpansion>,
}

impl PlanNode {
    /// A fresh node for `table_name` with no filters or expansions yet.
    pub fn new(table_name: impl Into<String>, base_card: u64, max_sample_count: usize) -> Self {
        PlanNode {
            table_name: table_name.into(),
            base_card,
            max_sample_count,
            filters: Vec::new(),
            secondary_filters: Vec::new(),
            pk_join_expansions: Vec::new(),
            fk_fk_join_expansions: Vec::new(),
        }
    }

    /// Adds a predicate directly on this table's own column.
    pub fn add_filter(&mut self, column_name: impl Into<String>, probe_values: OmniSketchCell) {
        self.filters.push(Filter {
            column_name: column_name.into(),
            probe_values,
        });
    }

    /// Adds a predicate pushed down through a pre-joined sketch from
    /// `table_name`'s own column onto this table.
    pub fn add_secondary_filter(
        &mut self,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        probe_values: OmniSketchCell,
    ) {
        self.secondary_filters.push(SecondaryFilter {
            table_name: table_name.into(),
            column_name: column_name.into(),
            probe_values,
        });
    }

    /// Registers that this table's `join_column_name` is a foreign key
    /// whose primary-key side has already been reduced to `fk_side`.
    pub fn add_pk_join_expansion(&mut self, join_column_name: impl Into<String>, fk_side: PlanNode) {
        self.pk_join_expansions.push(PkJoinExpansion {
            foreign_key_column: join_column_name.into(),
            foreign_key_node: Box::new(fk_side),
        });
    }

    /// Registers an FK/FK join against another already-reduced node. The
    /// other side is reference-counted since the query-graph reducer may
    /// fold the same reduced node into several neighbors' expansions.
    pub fn add_fk_fk_join_expansion(
        &mut self,
        this_column_name: impl Into<String>,
        other_side: Rc<PlanNode>,
        other_column_name: impl Into<String>,
    ) {
        self.fk_fk_join_expansions.push(FkFkJoinExpansion {
            this_foreign_key_column: this_column_name.into(),
            other_node: other_side,
            other_foreign_key_column: other_column_name.into(),
        });
    }

    /// The table this node estimates over.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The table's exact record count.
    pub fn base_card(&self) -> u64 {
        self.base_card
    }

    /// Reduces every filter and join expansion on this node to a single
    /// cardinality estimate.
    pub fn estimate(&self, registry: &Registry) -> Result<OmniSketchCell> {
        let mut filter_results = Vec::with_capacity(self.filters.len() + self.secondary_filters.len());
        let mut min_max_sample_count = usize::MAX;

        for filter in &self.filters {
            let omni_sketch = registry.get_sketch(&self.table_name, &filter.column_name)?;
            min_max_sample_count = min_max_sample_count.min(omni_sketch.min_hash_sketch_size());
            filter_results.push(Self::estimate_predicate(omni_sketch, &filter.probe_values));
        }

        for filter in &self.secondary_filters {
            let omni_sketch = registry
                .find_referencing_sketch(&filter.table_name, &filter.column_name, &self.table_name)
                .ok_or_else(|| OmniSketchError::NotFound {
                    kind: "referencing sketch",
                    table: filter.table_name.clone(),
                    column: Some(filter.column_name.clone()),
                })?;
            min_max_sample_count = min_max_sample_count.min(omni_sketch.min_hash_sketch_size());
            filter_results.push(Self::estimate_predicate(omni_sketch, &filter.probe_values));
        }

        if min_max_sample_count == usize::MAX {
            min_max_sample_count = registry.next_best_sample_count(&self.table_name)?;
        }

        let mut result = OmniSketchCell::new(Sample::new_sorted_vec(min_max_sample_count));

        if filter_results.len() == 1 {
            for m in &filter_results[0].results {
                result.combine(&m.rids);
            }
            let scaled = (result.record_count() as f64 / filter_results[0].p_sample).round() as u64;
            result.set_record_count(scaled);
        } else if !filter_results.is_empty() {
            let mut match_counts = vec![0.0_f64; filter_results.len()];
            for probe_result in &filter_results[0].results {
                match_counts[0] += probe_result.rids.record_count() as f64;
                Self::find_matches_in_next_join(
                    &filter_results,
                    probe_result.rids.sample(),
                    1,
                    probe_result.n_max,
                    min_max_sample_count,
                    &mut match_counts,
                    &mut result,
                );
            }

            let mut result_card = self.base_card as f64;
            for predicate_idx in 0..match_counts.len() {
                let last_card_unscaled = if predicate_idx == 0 {
                    self.base_card as f64
                } else {
                    match_counts[predicate_idx - 1]
                };
                let next_card_scaled = match_counts[predicate_idx] / filter_results[predicate_idx].p_sample;
                let sel = next_card_scaled / last_card_unscaled.max(1.0);
                result_card *= sel;
            }
            result.set_record_count(result_card.round() as u64);
        }

        let mut result = if filter_results.is_empty() {
            registry.produce_rid_sample(&self.table_name)?
        } else {
            result
        };

        for pk_join in &self.pk_join_expansions {
            result = pk_join
                .foreign_key_node
                .expand_primary_keys(registry, &pk_join.foreign_key_column, &result)?;
        }

        let fk_fk_multiple = self.calculate_fk_fk_multiple(registry)?;
        let scaled = (result.record_count() as f64 * fk_fk_multiple).round() as u64;
        result.set_record_count(scaled);

        Ok(result)
    }

    /// Expands a sample of primary keys for `column_name` on this table
    /// into the subset that also survives this node's own filters, scaling
    /// the record count to match.
    pub fn expand_primary_keys(
        &self,
        registry: &Registry,
        column_name: &str,
        primary_keys: &OmniSketchCell,
    ) -> Result<OmniSketchCell> {
        let omni_sketch = registry.get_sketch(&self.table_name, column_name)?;
        let filtered_rids = self.estimate(registry)?;
        let mut result_card = 0u64;

        let keys = primary_keys.sample().valid_hashes(primary_keys.sample_count());
        for hash in keys {
            let (probe_result, _n_max) = omni_sketch.probe_hash_with_n_max(hash);
            let filtered_probe_result = OmniSketchCell::intersect(&[&probe_result, &filtered_rids], None);
            if filtered_probe_result.record_count() > 0 {
                result_card += filtered_probe_result.record_count();
            }
        }

        let mut filtered_rids = filtered_rids;
        filtered_rids.set_record_count(result_card);
        Ok(filtered_rids)
    }

    fn calculate_fk_fk_multiple(&self, registry: &Registry) -> Result<f64> {
        if self.fk_fk_join_expansions.is_empty() {
            return Ok(1.0);
        }

        let mut multiple = 1.0_f64;
        for join in &self.fk_fk_join_expansions {
            let other_side_card_est = join.other_node.estimate(registry)?;
            let other_side_multiple =
                other_side_card_est.record_count() as f64 / join.other_node.base_card().max(1) as f64;
            multiple *= other_side_multiple;

            let this_omni_sketch = registry.get_sketch(&self.table_name, &join.this_foreign_key_column)?;
            let other_omni_sketch =
                registry.get_sketch(join.other_node.table_name(), &join.other_foreign_key_column)?;
            let combined_card = this_omni_sketch.multiply_record_counts(other_omni_sketch, other_side_multiple)?;
            let combined_multiple = combined_card as f64 / self.base_card.max(1) as f64;
            multiple *= combined_multiple;
        }

        Ok(multiple)
    }

    fn estimate_predicate(omni_sketch: &PointOmniSketch, probe_values: &OmniSketchCell) -> ProbeResultSet {
        if probe_values.sample_count() == 0 {
            return ProbeResultSet {
                p_sample: 1.0,
                results: vec![ProbeMatch {
                    n_max: omni_sketch.record_count(),
                    rids: omni_sketch.get_rids(),
                }],
            };
        }

        let hashes = probe_values.sample().valid_hashes(probe_values.sample_count());
        let mut results = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let (probe_result, n_max) = omni_sketch.probe_hash_with_n_max(hash);
            if probe_result.record_count() > 0 {
                results.push(ProbeMatch {
                    n_max,
                    rids: probe_result,
                });
            }
        }

        if results.is_empty() {
            results.push(ProbeMatch {
                n_max: 0,
                rids: OmniSketchCell::new(Sample::new_sorted_vec(1)),
            });
        }

        ProbeResultSet {
            p_sample: probe_values.sampling_probability(),
            results,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn find_matches_in_next_join(
        filter_results: &[ProbeResultSet],
        current: &Sample,
        join_idx: usize,
        current_n_max: u64,
        max_sample_count: usize,
        match_counts: &mut [f64],
        result: &mut OmniSketchCell,
    ) {
        for item in &filter_results[join_idx].results {
            let intersection = sample::intersect(&[current, item.rids.sample()], Some(max_sample_count));
            if intersection.size() == 0 {
                continue;
            }

            let next_n_max = current_n_max.max(item.n_max);
            let card_est = ((next_n_max as f64 / max_sample_count.max(1) as f64) * intersection.size() as f64)
                .max(intersection.size() as f64);
            match_counts[join_idx] += card_est;

            if join_idx < filter_results.len() - 1 {
                Self::find_matches_in_next_join(
                    filter_results,
                    &intersection,
                    join_idx + 1,
                    next_n_max,
                    max_sample_count,
                    match_counts,
                    result,
                );
            } else {
                let intersection_cell = OmniSketchCell::with_record_count(intersection, card_est.round() as u64);
                result.combine(&intersection_cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::CellIndexMapper;
    use crate::sketch::SampleVariant;
    use crate::value::Value;

    fn registry_with_one_table() -> Registry {
        let mut registry = Registry::new();
        let mut sketch =
            PointOmniSketch::with_mapper(32, 3, 64, CellIndexMapper::default(), SampleVariant::SortedSet).unwrap();
        for (value, rid) in [(1u64, 10u64), (1, 11), (2, 12), (3, 13)] {
            sketch.add_value_record(&Value::from_u64(value), rid);
        }
        registry.register_sketch("orders", "status", sketch).unwrap();
        registry
    }

    #[test]
    fn single_filter_estimate_never_exceeds_base_cardinality() {
        let registry = registry_with_one_table();
        let mut node = PlanNode::new("orders", 4, 64);
        let mut probe = OmniSketchCell::new(Sample::new_sorted_vec(8));
        probe.sample_mut().add(crate::hash::hash_u64(1));
        node.add_filter("status", probe);
        let estimate = node.estimate(&registry).unwrap();
        assert!(estimate.record_count() <= node.base_card());
    }

    #[test]
    fn no_filters_falls_back_to_rid_sample() {
        let registry = registry_with_one_table();
        let node = PlanNode::new("orders", 4, 64);
        let estimate = node.estimate(&registry).unwrap();
        assert_eq!(estimate.record_count(), 4);
    }

    #[test]
    fn no_fk_fk_joins_leaves_multiple_at_one() {
        let registry = registry_with_one_table();
        let node = PlanNode::new("orders", 4, 64);
        assert_eq!(node.calculate_fk_fk_multiple(&registry).unwrap(), 1.0);
    }
}
