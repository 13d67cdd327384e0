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
//! Error types for sketch construction, ingestion, and query-graph reduction.

use thiserror::Error;

/// Errors returned by the omni-sketch estimator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OmniSketchError {
    /// A constructor or combination received shape-incompatible arguments
    /// (mismatched sample capacities, ingestion into a flattened sketch).
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// The query graph could not be reduced to a single node (not
    /// alpha-acyclic), or the registry is missing a referenced sketch.
    #[error("structural infeasibility: {0}")]
    StructuralInfeasibility(String),

    /// A value did not match the type a column was declared with.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The declared column type.
        expected: &'static str,
        /// The type actually observed at the boundary.
        actual: &'static str,
    },

    /// A named sketch or table was not present in the registry.
    #[error("unknown {kind}: table={table:?} column={column:?}")]
    NotFound {
        /// What kind of object was missing ("sketch", "table", ...).
        kind: &'static str,
        /// Table name involved.
        table: String,
        /// Column name involved, if applicable.
        column: Option<String>,
    },

    /// A constructor received an invalid parameter (zero capacity, etc).
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OmniSketchError>;
