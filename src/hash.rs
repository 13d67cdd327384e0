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
//! Deterministic 64-bit hashing and cell-index routing.
//!
//! Every value and record id that flows through the estimator is reduced to a
//! single 64-bit hash via [`murmur_mix64`]. The [`CellIndexMapper`] then turns
//! that hash into one column index per sketch row.

/// Mixing constant from the MurmurHash3 64-bit finalizer.
const MIX_CONST: u64 = 0xd6e8_feb8_6659_fd93;

/// Three-round xor/mul mixer used for both value hashes and record-id hashes.
pub fn murmur_mix64(mut x: u64) -> u64 {
    x ^= x >> 32;
    x = x.wrapping_mul(MIX_CONST);
    x ^= x >> 32;
    x = x.wrapping_mul(MIX_CONST);
    x ^= x >> 32;
    x
}

/// Hashes a record id (treated as a raw 64-bit integer).
pub fn hash_rid(rid: u64) -> u64 {
    murmur_mix64(rid)
}

/// Hashes an unsigned integer value.
pub fn hash_u64(value: u64) -> u64 {
    murmur_mix64(value)
}

/// Hashes a signed 32-bit integer value.
pub fn hash_i32(value: i32) -> u64 {
    murmur_mix64(value as u32 as u64)
}

/// Hashes a 64-bit floating point value through its bit pattern.
pub fn hash_f64(value: f64) -> u64 {
    murmur_mix64(value.to_bits())
}

/// Hashes a UTF-8 string by folding its bytes into a 64-bit accumulator via
/// FNV-1a, then finishing with the same mixer used for numeric values.
pub fn hash_str(value: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut acc = FNV_OFFSET;
    for byte in value.as_bytes() {
        acc ^= u64::from(*byte);
        acc = acc.wrapping_mul(FNV_PRIME);
    }
    murmur_mix64(acc)
}

/// Splits a 64-bit hash into its low and high 32-bit lanes.
pub fn split_hash(hash: u64) -> (u32, u32) {
    (hash as u32, (hash >> 32) as u32)
}

/// Largest prime below 2^19, used by the Barrett reducer.
const BARRETT_PRIME: u32 = (1 << 19) - 1;

/// Barrett reduction of `x` modulo [`BARRETT_PRIME`].
fn barrett_reduce(x: u32) -> u32 {
    const MU: u64 = u64::MAX / BARRETT_PRIME as u64;
    let q = ((x as u64).wrapping_mul(MU)) >> 32;
    let mut remainder = x.wrapping_sub((q as u32).wrapping_mul(BARRETT_PRIME));
    if remainder >= BARRETT_PRIME {
        remainder -= BARRETT_PRIME;
    }
    remainder
}

/// Maps a value hash to one column index per sketch row.
///
/// The variant is fixed for the lifetime of a sketch instance and chosen at
/// construction time, so this is a plain enum with a match rather than a
/// trait object: there is never more than one mapper active per sketch.
#[derive(Debug, Clone, Copy)]
pub enum CellIndexMapper {
    /// `(h1 + ((r+1)^2 mod 2^32) * h2) mod p) mod W`, lifting successive rows
    /// out of the same residue class. The default, recommended variant.
    BarrettQuadratic,
    /// `(h1 + r * h2) mod W`, suitable when `W` is already close to prime.
    LinearSplit,
}

impl CellIndexMapper {
    /// Computes the column index for row `row_idx` given a value hash,
    /// against a grid of `width` columns.
    pub fn column_index(self, hash: u64, row_idx: usize, width: usize) -> usize {
        let (h1, h2) = split_hash(hash);
        match self {
            CellIndexMapper::BarrettQuadratic => {
                let stride = ((row_idx + 1) as u32).wrapping_pow(2);
                let combined = h1.wrapping_add(stride.wrapping_mul(h2));
                (barrett_reduce(combined) as usize) % width
            }
            CellIndexMapper::LinearSplit => {
                let combined = h1.wrapping_add((row_idx as u32).wrapping_mul(h2));
                (combined as usize) % width
            }
        }
    }
}

impl Default for CellIndexMapper {
    fn default() -> Self {
        CellIndexMapper::BarrettQuadratic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_deterministic() {
        assert_eq!(murmur_mix64(42), murmur_mix64(42));
        assert_ne!(murmur_mix64(42), murmur_mix64(43));
    }

    #[test]
    fn string_hash_distinguishes_similar_values() {
        assert_ne!(hash_str("String #1"), hash_str("String #2"));
        assert_eq!(hash_str("repeat"), hash_str("repeat"));
    }

    #[test]
    fn split_hash_roundtrips_lanes() {
        let h = 0x1122_3344_5566_7788u64;
        let (lo, hi) = split_hash(h);
        assert_eq!(lo, 0x5566_7788);
        assert_eq!(hi, 0x1122_3344);
    }

    #[test]
    fn barrett_quadratic_spreads_rows_for_small_width() {
        let width = 4;
        let hash = hash_u64(12345);
        let mapper = CellIndexMapper::BarrettQuadratic;
        let columns: Vec<usize> = (0..3).map(|r| mapper.column_index(hash, r, width)).collect();
        assert!(columns.iter().all(|&c| c < width));
    }

    #[test]
    fn linear_split_stays_in_bounds() {
        let width = 17;
        let mapper = CellIndexMapper::LinearSplit;
        for row in 0..5 {
            let col = mapper.column_index(hash_u64(999), row, width);
            assert!(col < width);
        }
    }
}
