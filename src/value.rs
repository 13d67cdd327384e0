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
//! Typed column values and predicate probe sets.
//!
//! A [`Value`] is whatever a caller ingests into or probes a sketch with; it
//! carries its own type tag so the estimator can reject cross-type
//! comparisons early (see [`crate::error::OmniSketchError::TypeMismatch`]).

use crate::hash::{hash_f64, hash_i32, hash_str, hash_u64};

/// The type tag carried by a [`Value`] and by typed sketch columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 64-bit unsigned integer (record ids, surrogate keys).
    UInt,
    /// 32-bit signed integer.
    Int,
    /// 64-bit floating point.
    Double,
    /// UTF-8 string.
    String,
}

impl ValueType {
    /// Human-readable name, used in [`crate::error::OmniSketchError::TypeMismatch`].
    pub fn name(self) -> &'static str {
        match self {
            ValueType::UInt => "uint",
            ValueType::Int => "int",
            ValueType::Double => "double",
            ValueType::String => "string",
        }
    }
}

/// A single probe value, already reduced to its type-tagged hash.
///
/// # Example
///
/// ```
/// use omnisketch::value::Value;
///
/// let a = Value::from_u64(42);
/// let b = Value::from_u64(42);
/// assert_eq!(a.hash(), b.hash());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value {
    hash: u64,
    ty: ValueType,
}

impl Value {
    /// Builds a value from an unsigned 64-bit integer.
    pub fn from_u64(v: u64) -> Self {
        Value {
            hash: hash_u64(v),
            ty: ValueType::UInt,
        }
    }

    /// Builds a value from a signed 32-bit integer.
    pub fn from_i32(v: i32) -> Self {
        Value {
            hash: hash_i32(v),
            ty: ValueType::Int,
        }
    }

    /// Builds a value from a 64-bit float.
    pub fn from_f64(v: f64) -> Self {
        Value {
            hash: hash_f64(v),
            ty: ValueType::Double,
        }
    }

    /// Builds a value from a string slice.
    pub fn from_str(v: &str) -> Self {
        Value {
            hash: hash_str(v),
            ty: ValueType::String,
        }
    }

    /// The 64-bit hash this value reduces to.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The type tag carried alongside the hash.
    pub fn value_type(&self) -> ValueType {
        self.ty
    }
}

/// A scalar type whose values can both be hashed into a [`Value`] and
/// ordered, letting a typed sketch track a running min/max alongside its
/// grid (see `sketch::point::TypedPointOmniSketch`).
pub trait TypedHash: Copy + PartialOrd {
    /// Hashes this value the same way it would be ingested into a sketch.
    fn to_value(self) -> Value;
}

impl TypedHash for u64 {
    fn to_value(self) -> Value {
        Value::from_u64(self)
    }
}

impl TypedHash for i32 {
    fn to_value(self) -> Value {
        Value::from_i32(self)
    }
}

impl TypedHash for f64 {
    fn to_value(self) -> Value {
        Value::from_f64(self)
    }
}

/// An ordered collection of probe values sharing one type, produced by an
/// `IN (...)` predicate or a range expansion.
///
/// # Example
///
/// ```
/// use omnisketch::value::ValueSet;
///
/// let set = ValueSet::from_u64_range(1, 5);
/// assert_eq!(set.hashes().len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct ValueSet {
    hashes: Vec<u64>,
    ty: ValueType,
}

impl ValueSet {
    /// Builds a value set from an inclusive range of unsigned integers.
    pub fn from_u64_range(lower: u64, upper: u64) -> Self {
        let hashes = (lower..=upper).map(hash_u64).collect();
        ValueSet {
            hashes,
            ty: ValueType::UInt,
        }
    }

    /// Builds a value set from an explicit slice of values, which must all
    /// share the same type tag.
    pub fn from_values(values: &[Value]) -> Option<Self> {
        let ty = values.first()?.value_type();
        if values.iter().any(|v| v.value_type() != ty) {
            return None;
        }
        Some(ValueSet {
            hashes: values.iter().map(Value::hash).collect(),
            ty,
        })
    }

    /// The hashes making up this set.
    pub fn hashes(&self) -> &[u64] {
        &self.hashes
    }

    /// The shared type tag.
    pub fn value_type(&self) -> ValueType {
        self.ty
    }
}
