//! Fixed-popcount bitmasks in colexicographic order.
//!
//! A word with `k` set bits encodes a `k`-subset of `{0, .., 63}`. Colex order compares by the
//! most significant differing bit, which for equal popcount is plain numeric order.

use crate::combinatorics::binomial::binomial_u64;
use crate::error::ComputeError;

/// Successor of `x` among words with the same popcount (Gosper's hack).
///
/// Applying this to the last `k`-subset of the intended universe simply steps outside it (or
/// wraps for blocks touching bit 63); callers iterate exactly `C(m, k) - 1` times.
#[inline]
pub fn next_colex(x: u64) -> u64 {
    let r = x & x.wrapping_neg(); // lowest set bit
    let x = x.wrapping_add(r); // lowest block of ones collapses into the bit above it
    let z = (x & x.wrapping_neg()).wrapping_sub(r); // the lowest block, including that bit
    x | z.checked_shr(z.trailing_zeros() + 1).unwrap_or(0)
}

/// The first `k`-subset in colex order: the `k` lowest bits.
pub fn first_colex(k: u32) -> Result<u64, ComputeError> {
    match k {
        0 => Ok(0),
        1..=63 => Ok((1u64 << k) - 1),
        64 => Ok(u64::MAX),
        _ => Err(ComputeError::overflow(
            "first_colex",
            format!("{k} bits do not fit a u64 word"),
        )),
    }
}

/// Iterator over all `k`-subsets of `{0, .., m-1}` in colex order.
#[derive(Debug, Clone)]
pub struct ColexSubsets {
    next: u64,
    remaining: u64,
}

impl ColexSubsets {
    /// Fails if `m > 64`. Yields nothing when `k > m`.
    pub fn new(m: u32, k: u32) -> Result<Self, ComputeError> {
        if m > 64 {
            return Err(ComputeError::overflow(
                "colex_subsets",
                format!("universe of {m} elements does not fit a u64 word"),
            ));
        }
        if k > m {
            return Ok(Self {
                next: 0,
                remaining: 0,
            });
        }
        Ok(Self {
            next: first_colex(k)?,
            remaining: binomial_u64(m, k)?,
        })
    }
}

impl Iterator for ColexSubsets {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let cur = self.next;
        self.remaining -= 1;
        // Never step past the last subset.
        if self.remaining > 0 {
            self.next = next_colex(cur);
        }
        Some(cur)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Position of `x` in colex order among words of the same popcount.
///
/// With set bits `c_1 < c_2 < .. < c_k`, the rank is `sum C(c_i, i)`.
pub fn colex_rank(x: u64) -> u64 {
    let mut rank = 0u64;
    let mut bits = x;
    let mut i = 1u32;
    while bits != 0 {
        let c = bits.trailing_zeros();
        rank += small_binomial(c, i);
        bits &= bits - 1;
        i += 1;
    }
    rank
}

/// Inverse of [`colex_rank`] for `k`-subsets of a 64-bit word.
pub fn colex_unrank(rank: u64, k: u32) -> Result<u64, ComputeError> {
    if k > 64 {
        return Err(ComputeError::overflow(
            "colex_unrank",
            format!("{k} bits do not fit a u64 word"),
        ));
    }
    let count = binomial_u64(64, k)?;
    if rank >= count {
        return Err(ComputeError::Index {
            stage: "colex_unrank",
            gid: rank,
            size: count,
        });
    }

    let mut rest = rank;
    let mut x = 0u64;
    let mut c = 64u32;
    for i in (1..=k).rev() {
        // Largest c' below the previous bit with C(c', i) <= rest; C(i-1, i) = 0 bounds the scan.
        c -= 1;
        while small_binomial(c, i) > rest {
            c -= 1;
        }
        x |= 1u64 << c;
        rest -= small_binomial(c, i);
    }
    Ok(x)
}

/// `C(n, k)` for `n <= 64`, which always fits `u64`.
fn small_binomial(n: u32, k: u32) -> u64 {
    debug_assert!(n <= 64);
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 1..=k as u128 {
        acc = acc * (n as u128 - k as u128 + i) / i;
    }
    acc as u64
}
