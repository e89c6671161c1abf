use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::ComputeError;

/// Exact binomial coefficient `n! / (k! (n-k)!)`.
///
/// Returns 1 for `k == 0` or `k == n` and 0 for `k > n`. Uses the smaller of `k` and `n - k`.
pub fn binomial(n: u32, k: u32) -> BigUint {
    if k > n {
        return BigUint::zero();
    }
    if k == 0 || k == n {
        return BigUint::one();
    }
    let k = k.min(n - k);

    // After step i the accumulator equals C(n - k + i, i), so every division is exact.
    let mut acc = BigUint::one();
    for i in 1..=k {
        acc *= n - k + i;
        acc /= i;
    }
    acc
}

/// [`binomial`] constrained to `u64`; fails with [`ComputeError::Overflow`] if it does not fit.
pub fn binomial_u64(n: u32, k: u32) -> Result<u64, ComputeError> {
    if k > n {
        return Ok(0);
    }
    if k == 0 || k == n {
        return Ok(1);
    }
    binomial(n, k).to_u64().ok_or_else(|| {
        ComputeError::overflow("binomial_u64", format!("C({n},{k}) does not fit u64"))
    })
}
