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
//! An approximate join-cardinality estimator for star/snowflake schemas.
//!
//! Build an [`sketch::point::PointOmniSketch`] (or a
//! [`sketch::typed::TypedPointOmniSketch`] when range predicates matter) per
//! ingested column, register it in a [`registry::Registry`], then describe a
//! query as a [`query_graph::QueryGraph`] of constant predicates and PK/FK or
//! FK/FK joins. [`query_graph::QueryGraph::estimate`] reduces the graph to a
//! single cardinality without touching the base tables.
//!
//! - [`hash`]: deterministic hashing of typed values and record ids.
//! - [`value`]: typed probe values and value sets.
//! - [`sample`]: bounded min-hash samples (sorted set, sorted vector,
//!   key-value pair variants).
//! - [`cell`]: a min-hash sample paired with an exact record counter.
//! - [`sketch`]: the depth×width grid (plain, pre-joined, and typed
//!   variants) that cells live in.
//! - [`combinator`]: combines several join-key probes into one estimate,
//!   either assuming independence or walking the exhaustive join.
//! - [`registry`]: the table→column→sketch catalog queries resolve against.
//! - [`plan`]: one table's filters and join expansions, reduced to a cell.
//! - [`query_graph`]: the rule-driven reducer that contracts a join graph
//!   down to one terminal estimate.
//! - [`serialized`]: the data shapes an external CSV/JSON importer or
//!   exporter would round-trip through; this crate does not perform that
//!   I/O itself.
//! - [`error`]: the crate's error type and `Result` alias.

pub mod cell;
pub mod combinator;
pub mod error;
pub mod hash;
pub mod plan;
pub mod query_graph;
pub mod registry;
pub mod sample;
pub mod serialized;
pub mod sketch;
pub mod value;
