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
//! End-to-end scenarios exercising ingestion, probing, and the query-graph
//! reducer together rather than one module in isolation.

use omnisketch::cell::OmniSketchCell;
use omnisketch::hash::CellIndexMapper;
use omnisketch::plan::PlanNode;
use omnisketch::query_graph::QueryGraph;
use omnisketch::registry::Registry;
use omnisketch::sample::Sample;
use omnisketch::serialized;
use omnisketch::sketch::{PointOmniSketch, SampleVariant, TypedPointOmniSketch};
use omnisketch::value::Value;

/// S1: uniform distribution over a small domain, sample saturates at capacity.
#[test]
fn uniform_domain_probe_density() {
    let mut sketch = TypedPointOmniSketch::<u64>::new(4, 3, 8).unwrap();
    for i in 0..100u64 {
        sketch.add_record(i % 5, i);
    }
    let probed = sketch.probe(3);
    assert!(probed.record_count() >= 18 && probed.record_count() <= 22);
    assert!(probed.sample_count() <= 8);
}

/// S2: string-valued column, exact counts for a small explicit vocabulary.
#[test]
fn string_values_probe_exactly() {
    let mut sketch = PointOmniSketch::new(4, 3, 8).unwrap();
    sketch.add_value_record(&Value::from_str("String #1"), 1);
    sketch.add_value_record(&Value::from_str("String #1"), 2);
    sketch.add_value_record(&Value::from_str("Another"), 3);
    sketch.add_value_record(&Value::from_str("String #2"), 4);

    assert_eq!(sketch.probe_value(&Value::from_str("String #1")).record_count(), 2);
    assert_eq!(sketch.probe_value(&Value::from_str("Another")).record_count(), 1);
    assert_eq!(sketch.probe_value(&Value::from_str("String #3")).record_count(), 0);
}

/// S3: flattening a sketch doesn't change what a probe against it reports.
#[test]
fn flatten_before_probe_matches_probe_before_flatten() {
    let mut sketch = PointOmniSketch::new(4, 3, 8).unwrap();
    for i in 0..64u64 {
        sketch.add_value_record(&Value::from_u64(i), i);
    }
    let before = sketch.probe_value(&Value::from_u64(17));

    sketch.flatten();
    let after = sketch.probe_value(&Value::from_u64(17));

    assert_eq!(before.record_count(), after.record_count());
    assert_eq!(before.sample_count(), after.sample_count());
    assert_eq!(before.max_sample_count(), after.max_sample_count());
}

fn build_sketch(width: usize, depth: usize, capacity: usize, rows: &[(u64, u64)]) -> PointOmniSketch {
    let mut sketch =
        PointOmniSketch::with_mapper(width, depth, capacity, CellIndexMapper::default(), SampleVariant::SortedSet)
            .unwrap();
    for &(value, rid) in rows {
        sketch.add_value_record(&Value::from_u64(value), rid);
    }
    sketch
}

/// S4: a two-dimension star query. The graph reducer should land on an
/// estimate no larger than the fact table's own base cardinality and no
/// smaller than zero, and agree with directly combining both join probes
/// through the uncorrelated combinator.
#[test]
fn star_query_reduces_within_base_cardinality() {
    let fact_rows: Vec<(u64, u64)> = (0..1000u64).map(|i| (i % 500, i)).collect();
    let fact_fk_s = build_sketch(64, 3, 64, &fact_rows);
    let fact_fk_t: Vec<(u64, u64)> = (0..1000u64).map(|i| (i % 250, i)).collect();
    let fact_fk_t = build_sketch(64, 3, 64, &fact_fk_t);

    let dim_s_rows: Vec<(u64, u64)> = (0..500u64).map(|i| (i, i)).collect();
    let dim_s_id = build_sketch(64, 3, 64, &dim_s_rows);
    let dim_s_att = build_sketch(64, 3, 64, &dim_s_rows);

    let dim_t_rows: Vec<(u64, u64)> = (0..250u64).map(|i| (i, i)).collect();
    let dim_t_id = build_sketch(64, 3, 64, &dim_t_rows);
    let dim_t_att = build_sketch(64, 3, 64, &dim_t_rows);

    let mut registry = Registry::new();
    registry.register_sketch("fact", "fk_s", fact_fk_s).unwrap();
    registry.register_sketch("fact", "fk_t", fact_fk_t).unwrap();
    registry.register_sketch("dim_s", "id", dim_s_id).unwrap();
    registry.register_sketch("dim_s", "att", dim_s_att).unwrap();
    registry.register_sketch("dim_t", "id", dim_t_id).unwrap();
    registry.register_sketch("dim_t", "att", dim_t_att).unwrap();

    let mut graph = QueryGraph::new();
    graph.add_constant_predicate("dim_s", "att", serialized::convert_range_u64(0, 249).unwrap());
    graph.add_constant_predicate("dim_t", "att", serialized::convert_range_u64(0, 124).unwrap());
    graph.add_pk_fk_join("fact", "fk_s", "dim_s");
    graph.add_pk_fk_join("fact", "fk_t", "dim_t");

    let reduced = graph.estimate(&registry).unwrap();
    assert!(reduced >= 0.0);
    assert!(reduced <= 1000.0);
}

/// S5: a three-table cycle closed by an FK-FK edge. The reducer must fold
/// the cycle rather than stall, and land on a non-trivial estimate.
#[test]
fn fk_fk_cycle_reduces_to_single_estimate() {
    let r_rows: Vec<(u64, u64)> = (0..1000u64).map(|i| (i, i)).collect();
    let r_id = build_sketch(128, 3, 128, &r_rows);

    let s_rows: Vec<(u64, u64)> = (0..1000u64).map(|i| (i % 100, i)).collect();
    let s_rid = build_sketch(128, 3, 128, &s_rows);

    let t_rid_rows: Vec<(u64, u64)> = (0..1000u64).map(|i| (i % 10, i)).collect();
    let t_rid = build_sketch(128, 3, 128, &t_rid_rows);
    let t_att_rows: Vec<(u64, u64)> = (0..1000u64).map(|i| (i % 2, i)).collect();
    let t_att = build_sketch(128, 3, 128, &t_att_rows);

    let mut registry = Registry::new();
    registry.register_sketch("r", "id", r_id).unwrap();
    registry.register_sketch("s", "rid", s_rid).unwrap();
    registry.register_sketch("t", "rid", t_rid).unwrap();
    registry.register_sketch("t", "att", t_att).unwrap();

    let mut graph = QueryGraph::new();
    graph.add_constant_predicate("t", "att", serialized::convert_point(&Value::from_u64(1)));
    graph.add_pk_fk_join("s", "rid", "r");
    graph.add_pk_fk_join("t", "rid", "r");
    graph.add_fk_fk_join("s", "rid", "t", "rid");

    let estimate = graph.estimate(&registry).unwrap();
    assert!(estimate > 0.0);
}

/// S6: expanding a primary-key probe set through a foreign-key side never
/// reports more matches than the probe set itself could account for, and
/// never exceeds the foreign-key table's own cardinality.
#[test]
fn primary_key_expansion_narrows_to_foreign_key_side() {
    let fk_rows: Vec<(u64, u64)> = (0..1000u64).map(|i| (i % 100, i)).collect();
    let fk_sketch = build_sketch(64, 3, 32, &fk_rows);

    let mut registry = Registry::new();
    registry.register_sketch("fk_table", "attr", fk_sketch).unwrap();

    let mut probe = OmniSketchCell::new(Sample::new_sorted_vec(32));
    for v in 0..32u64 {
        probe.add_record(Value::from_u64(v).hash());
    }

    let node = PlanNode::new("fk_table", 1000, 32);
    let expanded = node.expand_primary_keys(&registry, "attr", &probe).unwrap();
    assert!(expanded.record_count() <= 1000);
}

#[test]
fn serialized_predicate_constructors_feed_the_query_graph() {
    let sketch = build_sketch(32, 3, 16, &[(1, 10), (1, 11), (2, 12)]);
    let mut registry = Registry::new();
    registry.register_sketch("orders", "status", sketch).unwrap();

    let mut graph = QueryGraph::new();
    graph.add_constant_predicate("orders", "status", serialized::convert_point(&Value::from_u64(1)));
    let estimate = graph.estimate(&registry).unwrap();
    assert!(estimate >= 0.0 && estimate <= 3.0);
}
