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
//! Reduces a join graph of predicates down to a single cardinality
//! estimate.
//!
//! Every table with a predicate (or that sits between two predicated
//! tables) is a node; every PK/FK or FK/FK join is an edge. [`Self::estimate`]
//! repeatedly contracts the graph: merging a primary-key table with one
//! connection into its foreign-key neighbor, folding single FK/FK
//! connections, breaking cycles, and finally expanding primary keys through
//! a dangling foreign key, until one node remains, then hands its
//! accumulated filters to a [`PlanNode`].
//!
//! Termination depends on the join graph being alpha-acyclic; a query whose
//! join graph isn't reduces to [`OmniSketchError::StructuralInfeasibility`]
//! rather than looping forever.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::cell::OmniSketchCell;
use crate::error::{OmniSketchError, Result};
use crate::plan::PlanNode;
use crate::registry::Registry;
use crate::sample::Sample;

/// One edge of the join graph, recorded on both endpoints it connects.
#[derive(Debug, Clone)]
struct RelationEdge {
    this_column_name: String,
    other_table_name: String,
    other_column_name: String,
    is_fk_fk_join: bool,
}

/// A predicate queued on a node, in the exact shape the original reduction
/// steps push it: either a literal probe set, a predicate pushed down
/// through a pre-joined sketch from another table, or an already-reduced
/// neighbor folded in as a join expansion.
#[derive(Clone)]
enum TableFilter {
    Constant {
        column_name: String,
        probe_set: OmniSketchCell,
    },
    Secondary {
        original_table_name: String,
        column_name: String,
        probe_set: OmniSketchCell,
    },
    JoinExpansion {
        this_column_name: String,
        other_plan: Rc<PlanNode>,
        other_column_name: String,
    },
}

#[derive(Default)]
struct RelationNode {
    filters: Vec<TableFilter>,
    connections: Vec<RelationEdge>,
}

/// A join graph of predicated tables, reduced to one cardinality estimate.
#[derive(Default)]
pub struct QueryGraph {
    graph: HashMap<String, RelationNode>,
}

impl QueryGraph {
    /// An empty graph.
    pub fn new() -> Self {
        QueryGraph { graph: HashMap::new() }
    }

    /// Adds a literal predicate (`column IN probe_set`) on `table_name`.
    pub fn add_constant_predicate(&mut self, table_name: &str, column_name: &str, probe_set: OmniSketchCell) {
        self.get_or_create_node(table_name).filters.push(TableFilter::Constant {
            column_name: column_name.to_string(),
            probe_set,
        });
    }

    /// Adds a primary-key/foreign-key join: `fk_table.fk_column` references
    /// `pk_table`'s primary key.
    pub fn add_pk_fk_join(&mut self, fk_table_name: &str, fk_column_name: &str, pk_table_name: &str) {
        self.add_edge(fk_table_name, fk_column_name, pk_table_name, "");
    }

    /// Adds a foreign-key/foreign-key join: both columns reference the same
    /// primary key elsewhere in the schema.
    pub fn add_fk_fk_join(&mut self, table_name_1: &str, column_name_1: &str, table_name_2: &str, column_name_2: &str) {
        self.add_edge(table_name_1, column_name_1, table_name_2, column_name_2);
    }

    /// Reduces the graph and returns the estimated cardinality of the join
    /// query it describes.
    pub fn estimate(&mut self, registry: &Registry) -> Result<f64> {
        while self.graph.len() > 1 {
            let graph_size = self.graph.len();
            let removed_node = self.try_merge_single_connection(registry)?
                || self.try_merge_single_fk_fk_connection(registry)?
                || self.try_merge_multi_pk_connection(registry)?
                || self.try_expand_pk_connection(registry)?;

            if !removed_node {
                return Err(OmniSketchError::StructuralInfeasibility(
                    "join graph did not reduce to a single node, it is not alpha-acyclic".into(),
                ));
            }
            debug_assert!(self.graph.len() < graph_size);
        }

        let (table_name, node) = match self.graph.iter().next() {
            Some((name, node)) => (name.clone(), node),
            None => return Ok(0.0),
        };
        let base_card = registry.base_table_card(&table_name)?;
        let mut plan = PlanNode::new(table_name.clone(), base_card, usize::MAX);
        for filter in &node.filters {
            Self::add_cloned_filter_to_plan(&mut plan, filter);
        }

        let result = plan.estimate(registry)?;
        Ok(result.record_count() as f64)
    }

    fn add_edge(&mut self, t1: &str, c1: &str, t2: &str, c2: &str) {
        let is_fk_fk_join = !c1.is_empty() && !c2.is_empty();
        self.get_or_create_node(t1);
        self.get_or_create_node(t2);
        self.graph.get_mut(t1).unwrap().connections.push(RelationEdge {
            this_column_name: c1.to_string(),
            other_table_name: t2.to_string(),
            other_column_name: c2.to_string(),
            is_fk_fk_join,
        });
        self.graph.get_mut(t2).unwrap().connections.push(RelationEdge {
            this_column_name: c2.to_string(),
            other_table_name: t1.to_string(),
            other_column_name: c1.to_string(),
            is_fk_fk_join,
        });
    }

    fn remove_edge_one_side(&mut self, t1: &str, c1: &str, t2: &str, c2: &str) {
        let now_empty = match self.graph.get_mut(t1) {
            Some(node) => {
                node.connections
                    .retain(|edge| !(edge.other_table_name == t2 && edge.this_column_name == c1 && edge.other_column_name == c2));
                node.connections.is_empty()
            }
            None => false,
        };
        if now_empty && self.graph.len() > 1 {
            self.graph.remove(t1);
        }
    }

    fn remove_edge(&mut self, t1: &str, c1: &str, t2: &str, c2: &str) {
        self.remove_edge_one_side(t1, c1, t2, c2);
        self.remove_edge_one_side(t2, c2, t1, c1);
    }

    fn get_or_create_node(&mut self, table_name: &str) -> &mut RelationNode {
        self.graph.entry(table_name.to_string()).or_default()
    }

    /// A PK-side table with exactly one connection can be folded entirely
    /// into its foreign-key neighbor.
    fn try_merge_single_connection(&mut self, registry: &Registry) -> Result<bool> {
        let table_names: Vec<String> = self.graph.keys().cloned().collect();
        for table_name in table_names {
            let edge = match self.graph.get(&table_name) {
                Some(node) if node.connections.len() == 1 => node.connections[0].clone(),
                _ => continue,
            };
            if edge.other_column_name.is_empty() || edge.is_fk_fk_join {
                continue;
            }
            self.merge_pk_side_into_fk_side(&table_name, &edge, registry)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// A table whose only remaining connection is a single FK/FK join gets
    /// reduced on its own and folded into the other side as a join
    /// expansion, deferring to the neighbor if it has fewer filters (and so
    /// is cheaper to reduce first).
    fn try_merge_single_fk_fk_connection(&mut self, registry: &Registry) -> Result<bool> {
        let table_names: Vec<String> = self.graph.keys().cloned().collect();
        for this_table_name in table_names {
            let (edge, node_filter_count) = match self.graph.get(&this_table_name) {
                Some(node) if node.connections.len() == 1 => (node.connections[0].clone(), node.filters.len()),
                _ => continue,
            };
            if edge.other_column_name.is_empty() || !edge.is_fk_fk_join {
                continue;
            }

            let other_node = self.graph.get(&edge.other_table_name);
            if let Some(other) = other_node {
                if other.connections.len() == 1 && other.filters.len() < node_filter_count {
                    continue;
                }
            }

            let mut sample_count = usize::MAX;
            for filter in &self.graph.get(&this_table_name).unwrap().filters {
                if let TableFilter::Constant { column_name, .. } = filter {
                    let omni_sketch = registry.get_sketch(&this_table_name, column_name)?;
                    sample_count = sample_count.min(omni_sketch.min_hash_sketch_size());
                }
            }

            let base_card = registry.base_table_card(&this_table_name)?;
            let mut plan = PlanNode::new(this_table_name.clone(), base_card, sample_count);
            let filters = std::mem::take(&mut self.graph.get_mut(&this_table_name).unwrap().filters);
            for filter in &filters {
                Self::add_cloned_filter_to_plan(&mut plan, filter);
            }

            self.get_or_create_node(&edge.other_table_name)
                .filters
                .push(TableFilter::JoinExpansion {
                    this_column_name: edge.other_column_name.clone(),
                    other_plan: Rc::new(plan),
                    other_column_name: edge.this_column_name.clone(),
                });

            self.remove_edge(&this_table_name, &edge.this_column_name, &edge.other_table_name, &edge.other_column_name);
            return Ok(true);
        }
        Ok(false)
    }

    /// A table whose remaining connections are all PK-side or already
    /// reduced FK/FK joins is merged wholesale: if it sits on exactly one
    /// cycle it is folded entirely, otherwise edges are cut one cycle's
    /// worth at a time until it can be.
    ///
    /// Every connection reaching this point has an empty `this_column_name`
    /// (guaranteed by the guard below), which by construction in
    /// [`Self::add_edge`] means it can never be an FK/FK join, so each one
    /// is folded the same way, via [`Self::merge_pk_side_into_fk_side`].
    fn try_merge_multi_pk_connection(&mut self, registry: &Registry) -> Result<bool> {
        let table_names: Vec<String> = self.graph.keys().cloned().collect();
        for this_table_name in table_names {
            let connections = match self.graph.get(&this_table_name) {
                Some(node) if !node.connections.is_empty() => node.connections.clone(),
                _ => continue,
            };
            if connections.iter().any(|c| !c.this_column_name.is_empty()) {
                continue;
            }

            let cycles = self.find_cycles(&this_table_name);
            if cycles.len() == 1 {
                loop {
                    let connection = match self.graph.get(&this_table_name) {
                        Some(node) if !node.connections.is_empty() => node.connections[0].clone(),
                        _ => break,
                    };
                    self.merge_pk_side_into_fk_side(&this_table_name, &connection, registry)?;
                }
                return Ok(true);
            }

            for cycle in &cycles {
                for table_in_cycle in cycle.iter().take(cycle.len().saturating_sub(1)) {
                    loop {
                        let connection = self.graph.get(&this_table_name).and_then(|node| {
                            node.connections.iter().find(|c| &c.other_table_name == table_in_cycle).cloned()
                        });
                        match connection {
                            Some(connection) => self.merge_pk_side_into_fk_side(&this_table_name, &connection, registry)?,
                            None => break,
                        }
                    }
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// A table that is the sole remaining PK side for one of its FK
    /// neighbors, but whose own filters don't resolve it into a single
    /// connection, gets its primary keys expanded through that neighbor.
    fn try_expand_pk_connection(&mut self, registry: &Registry) -> Result<bool> {
        let table_names: Vec<String> = self.graph.keys().cloned().collect();
        for table_name in table_names {
            let connections = match self.graph.get(&table_name) {
                Some(node) if !node.connections.is_empty() => node.connections.clone(),
                _ => continue,
            };
            for connection in &connections {
                if connection.is_fk_fk_join || !connection.this_column_name.is_empty() {
                    continue;
                }
                let other_single_connection = self
                    .graph
                    .get(&connection.other_table_name)
                    .map(|n| n.connections.len() == 1)
                    .unwrap_or(false);
                if !other_single_connection {
                    continue;
                }

                let other_filters_empty = self
                    .graph
                    .get(&connection.other_table_name)
                    .map(|n| n.filters.is_empty())
                    .unwrap_or(true);

                let mut sample_count = usize::MAX;
                if let Some(other) = self.graph.get(&connection.other_table_name) {
                    for filter in &other.filters {
                        if let TableFilter::Constant { column_name, .. } = filter {
                            let omni_sketch = registry.get_sketch(&connection.other_table_name, column_name)?;
                            sample_count = sample_count.min(omni_sketch.min_hash_sketch_size());
                        }
                    }
                }
                if other_filters_empty {
                    sample_count = 1024;
                }

                let base_card = registry.base_table_card(&connection.other_table_name)?;
                let mut plan = PlanNode::new(connection.other_table_name.clone(), base_card, sample_count);
                let filters = std::mem::take(&mut self.graph.get_mut(&connection.other_table_name).unwrap().filters);
                for filter in &filters {
                    Self::add_cloned_filter_to_plan(&mut plan, filter);
                }

                self.get_or_create_node(&table_name)
                    .filters
                    .push(TableFilter::JoinExpansion {
                        this_column_name: String::new(),
                        other_plan: Rc::new(plan),
                        other_column_name: connection.other_column_name.clone(),
                    });
                self.remove_edge(
                    &table_name,
                    &connection.this_column_name,
                    &connection.other_table_name,
                    &connection.other_column_name,
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn merge_pk_side_into_fk_side(&mut self, this_table_name: &str, edge: &RelationEdge, registry: &Registry) -> Result<()> {
        let relation_filters = self
            .graph
            .get(this_table_name)
            .map(|node| node.filters.clone())
            .unwrap_or_default();
        let had_no_filters = relation_filters.is_empty();
        let mut remaining_filters = Vec::with_capacity(relation_filters.len());
        let mut sample_count = usize::MAX;

        for filter in relation_filters {
            match filter {
                TableFilter::Constant { column_name, probe_set } => {
                    let pushed_through_referencing_sketch = registry
                        .find_referencing_sketch(this_table_name, &edge.this_column_name, &edge.other_table_name)
                        .is_some();
                    if pushed_through_referencing_sketch {
                        self.get_or_create_node(&edge.other_table_name).filters.push(TableFilter::Secondary {
                            original_table_name: this_table_name.to_string(),
                            column_name,
                            probe_set,
                        });
                    } else {
                        let omni_sketch = registry.get_sketch(this_table_name, &column_name)?;
                        sample_count = sample_count.min(omni_sketch.min_hash_sketch_size());
                        remaining_filters.push(TableFilter::Constant { column_name, probe_set });
                    }
                }
                other => remaining_filters.push(other),
            }
        }

        if !remaining_filters.is_empty() {
            let base_card = registry.base_table_card(this_table_name)?;
            let mut plan = PlanNode::new(this_table_name, base_card, sample_count);
            for filter in &remaining_filters {
                Self::add_cloned_filter_to_plan(&mut plan, filter);
            }
            let estimate = plan.estimate(registry)?;
            self.get_or_create_node(&edge.other_table_name).filters.push(TableFilter::Constant {
                column_name: edge.other_column_name.clone(),
                probe_set: estimate,
            });
        } else if had_no_filters {
            let other_side_sketch = registry.get_sketch(&edge.other_table_name, &edge.other_column_name)?;
            if other_side_sketch.count_nulls() > 0 {
                self.get_or_create_node(&edge.other_table_name).filters.push(TableFilter::Constant {
                    column_name: edge.other_column_name.clone(),
                    probe_set: OmniSketchCell::new(Sample::new_sorted_vec(1)),
                });
            }
        }

        self.remove_edge(this_table_name, &edge.this_column_name, &edge.other_table_name, &edge.other_column_name);
        Ok(())
    }

    /// Groups this node's neighbors into connected components reachable
    /// without crossing back through `table_name`. Each component is one
    /// independent cycle (or simple chain) hanging off this node.
    fn find_cycles(&self, table_name: &str) -> Vec<Vec<String>> {
        let node = match self.graph.get(table_name) {
            Some(n) => n,
            None => return Vec::new(),
        };
        let mut connected_relations: HashSet<String> =
            node.connections.iter().map(|c| c.other_table_name.clone()).collect();

        let mut result = Vec::new();
        while let Some(start) = connected_relations.iter().next().cloned() {
            let mut in_cycle: HashSet<String> = HashSet::new();
            in_cycle.insert(table_name.to_string());

            let mut next_nodes = VecDeque::new();
            next_nodes.push_back(start);

            while let Some(current) = next_nodes.pop_front() {
                if !in_cycle.insert(current.clone()) {
                    continue;
                }
                if let Some(current_node) = self.graph.get(&current) {
                    for connection in &current_node.connections {
                        if !in_cycle.contains(&connection.other_table_name) {
                            next_nodes.push_back(connection.other_table_name.clone());
                        }
                    }
                }
            }

            let mut partial_result = Vec::new();
            connected_relations.retain(|name| {
                if in_cycle.contains(name) {
                    partial_result.push(name.clone());
                    false
                } else {
                    true
                }
            });
            result.push(partial_result);
        }

        result
    }

    fn add_cloned_filter_to_plan(plan: &mut PlanNode, filter: &TableFilter) {
        match filter {
            TableFilter::JoinExpansion {
                this_column_name,
                other_plan,
                other_column_name,
            } => {
                plan.add_fk_fk_join_expansion(this_column_name.clone(), Rc::clone(other_plan), other_column_name.clone());
            }
            TableFilter::Secondary {
                original_table_name,
                column_name,
                probe_set,
            } => {
                plan.add_secondary_filter(original_table_name.clone(), column_name.clone(), probe_set.clone());
            }
            TableFilter::Constant { column_name, probe_set } => {
                plan.add_filter(column_name.clone(), probe_set.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash_u64, CellIndexMapper};
    use crate::sketch::{PointOmniSketch, SampleVariant};
    use crate::value::Value;

    fn sketch_with(values_and_rids: &[(u64, u64)]) -> PointOmniSketch {
        let mut sketch = PointOmniSketch::with_mapper(32, 3, 64, CellIndexMapper::default(), SampleVariant::SortedSet)
            .unwrap();
        for &(value, rid) in values_and_rids {
            sketch.add_value_record(&Value::from_u64(value), rid);
        }
        sketch
    }

    fn probe_for(value: u64) -> OmniSketchCell {
        let mut cell = OmniSketchCell::new(Sample::new_sorted_vec(1));
        cell.sample_mut().add(hash_u64(value));
        cell
    }

    #[test]
    fn single_table_constant_predicate_reduces_directly() {
        let mut registry = Registry::new();
        registry
            .register_sketch("orders", "status", sketch_with(&[(1, 10), (1, 11), (2, 12)]))
            .unwrap();

        let mut graph = QueryGraph::new();
        graph.add_constant_predicate("orders", "status", probe_for(1));
        let estimate = graph.estimate(&registry).unwrap();
        assert!(estimate >= 0.0);
    }

    #[test]
    fn pk_fk_chain_reduces_to_one_node() {
        let mut registry = Registry::new();
        registry
            .register_sketch("customers", "id", sketch_with(&[(1, 1), (2, 2), (3, 3)]))
            .unwrap();
        registry
            .register_sketch("orders", "customer_id", sketch_with(&[(1, 10), (1, 11), (2, 12)]))
            .unwrap();

        let mut graph = QueryGraph::new();
        graph.add_constant_predicate("customers", "id", probe_for(1));
        graph.add_pk_fk_join("orders", "customer_id", "customers");
        let estimate = graph.estimate(&registry).unwrap();
        assert!(estimate >= 0.0);
    }
}
