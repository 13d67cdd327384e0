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
//! Combines several join-key probes into one cardinality estimate.
//!
//! [`uncorrelated_estimate`] assumes every predicate's selectivity is
//! independent and multiplies them together, cheap, and the default choice
//! when nothing is known about cross-column correlation.
//! [`exhaustive_estimate`] instead walks the Cartesian product of every
//! probe value's matched cells, recursively intersecting, and is exact
//! about correlation at the cost of `O(product of probe sample sizes)` work.

use crate::cell::OmniSketchCell;
use crate::sketch::point::PointOmniSketch;

/// One join hop in an [`uncorrelated_estimate`] chain: the sketch being
/// probed and the sample of join-key hashes to probe it with.
pub struct UncorrelatedJoin<'a> {
    pub sketch: &'a PointOmniSketch,
    pub probe_sample: &'a OmniSketchCell,
}

/// Combines several join hops assuming their selectivities are independent.
///
/// Each hop's selectivity is the fraction of the base table's records that
/// survive probing that hop, corrected for how much of the join key was
/// actually sampled; the combined selectivity is their product times the
/// base record count.
pub fn uncorrelated_estimate(joins: &[UncorrelatedJoin], max_output_size: usize) -> OmniSketchCell {
    assert!(!joins.is_empty(), "uncorrelated combinator needs at least one join");

    let base_card = joins[0].sketch.record_count();
    let mut query_selectivity = 1.0_f64;
    let mut join_result_samples = Vec::with_capacity(joins.len());

    for join in joins {
        let hashes = join
            .probe_sample
            .sample()
            .valid_hashes(join.probe_sample.sample_count());
        let join_result = join.sketch.probe_hashed_set(&hashes);

        let join_key_sampling_probability = join.probe_sample.sample_count() as f64
            / join.probe_sample.record_count().max(1) as f64;
        let join_selectivity = ((join_result.record_count() as f64 / join_key_sampling_probability)
            / base_card.max(1) as f64)
            .min(1.0);
        query_selectivity *= join_selectivity;

        join_result_samples.push(join_result.sample().clone());
    }

    let card_est = (base_card as f64 * query_selectivity).round() as u64;
    let sample_refs: Vec<&crate::sample::Sample> = join_result_samples.iter().collect();
    let result_sample = crate::sample::intersect(&sample_refs, Some(max_output_size));
    OmniSketchCell::with_record_count(result_sample, card_est)
}

/// One join hop in an [`exhaustive_estimate`] chain.
pub struct ExhaustiveJoin<'a> {
    pub sketch: &'a PointOmniSketch,
    pub probe_sample: &'a OmniSketchCell,
}

struct JoinMatch {
    cell: OmniSketchCell,
    n_max: u64,
}

/// Combines several join hops by walking the full Cartesian product of each
/// hop's per-probe-value matches, intersecting as it goes and discarding any
/// branch whose running intersection sample has gone empty.
pub fn exhaustive_estimate(joins: &[ExhaustiveJoin], max_output_size: usize) -> OmniSketchCell {
    assert!(!joins.is_empty(), "exhaustive combinator needs at least one join");

    let max_sample_count = joins[0].sketch.min_hash_sketch_size();
    let mut sampling_probability = 1.0_f64;
    let mut join_key_matches: Vec<Vec<JoinMatch>> = Vec::with_capacity(joins.len());

    for join in joins {
        sampling_probability *= join.probe_sample.sample_count() as f64
            / join.probe_sample.record_count().max(1) as f64;

        let hashes = join
            .probe_sample
            .sample()
            .valid_hashes(join.probe_sample.sample_count());
        let matches = hashes
            .iter()
            .map(|&hash| {
                let (cell, n_max) = join.sketch.probe_hash_with_n_max(hash);
                JoinMatch { cell, n_max }
            })
            .collect();
        join_key_matches.push(matches);
    }

    let result_variant = joins[0].sketch.sample_variant();
    let mut result = OmniSketchCell::new(result_variant.new_sample(max_output_size));

    if join_key_matches.len() == 1 {
        for join_match in &join_key_matches[0] {
            result.combine(&join_match.cell);
        }
        let scaled = (result.record_count() as f64 / sampling_probability).round() as u64;
        result.set_record_count(scaled);
        return result;
    }

    for join_match in &join_key_matches[0] {
        find_matches_in_next_join(
            &join_key_matches,
            &join_match.cell,
            1,
            join_match.n_max,
            max_sample_count,
            sampling_probability,
            &mut result,
        );
    }
    result
}

fn find_matches_in_next_join(
    join_key_matches: &[Vec<JoinMatch>],
    current: &OmniSketchCell,
    join_idx: usize,
    current_n_max: u64,
    max_sample_count: usize,
    sampling_probability: f64,
    result: &mut OmniSketchCell,
) {
    for join_match in &join_key_matches[join_idx] {
        let intersection = OmniSketchCell::intersect(&[current, &join_match.cell], None);
        if intersection.sample_count() == 0 {
            continue;
        }
        let next_n_max = current_n_max.max(join_match.n_max);

        if join_idx < join_key_matches.len() - 1 {
            find_matches_in_next_join(
                join_key_matches,
                &intersection,
                join_idx + 1,
                next_n_max,
                max_sample_count,
                sampling_probability,
                result,
            );
        } else {
            let mut card_est = (next_n_max as f64 / max_sample_count as f64) * intersection.sample_count() as f64;
            card_est /= sampling_probability;
            let mut scaled = intersection;
            scaled.set_record_count(card_est.round() as u64);
            result.combine(&scaled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::OmniSketchCell;
    use crate::value::Value;

    fn build_sketch(values_and_rids: &[(u64, u64)]) -> PointOmniSketch {
        let mut sketch = PointOmniSketch::new(32, 3, 64).unwrap();
        for &(value, rid) in values_and_rids {
            sketch.add_value_record(&Value::from_u64(value), rid);
        }
        sketch
    }

    fn probe_cell_for(hashes: &[u64], record_count: u64) -> OmniSketchCell {
        let mut sample = crate::sample::Sample::new_sorted_vec(hashes.len().max(1));
        for &h in hashes {
            sample.add(h);
        }
        OmniSketchCell::with_record_count(sample, record_count)
    }

    #[test]
    fn uncorrelated_single_join_never_exceeds_base_cardinality() {
        let sketch = build_sketch(&[(1, 10), (1, 11), (2, 12)]);
        let probe = probe_cell_for(&[crate::hash::hash_u64(1)], 1);
        let joins = [UncorrelatedJoin {
            sketch: &sketch,
            probe_sample: &probe,
        }];
        let result = uncorrelated_estimate(&joins, 32);
        assert!(result.record_count() <= sketch.record_count());
    }

    #[test]
    fn exhaustive_single_join_matches_plain_probe_density() {
        let sketch = build_sketch(&[(1, 10), (1, 11), (2, 12)]);
        let probe = probe_cell_for(&[crate::hash::hash_u64(1)], 1);
        let joins = [ExhaustiveJoin {
            sketch: &sketch,
            probe_sample: &probe,
        }];
        let result = exhaustive_estimate(&joins, 32);
        assert!(result.record_count() > 0);
    }
}
