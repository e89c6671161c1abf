//! Known codeword sets.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::core::array::LongArray;
use crate::error::ComputeError;
use crate::setcover::{candidates, MAX_UNIVERSE};

/// The 7 lines of the Fano plane PG(2,2) on points `0..7`.
///
/// Every pair of points lies on exactly one line, so this is a `(7,3,2)` covering design.
pub fn fano_plane() -> LongArray {
    const LINES: [[u32; 3]; 7] = [
        [0, 1, 2],
        [0, 3, 4],
        [0, 5, 6],
        [1, 3, 5],
        [1, 4, 6],
        [2, 3, 6],
        [2, 4, 5],
    ];
    LongArray::wrap(
        LINES
            .iter()
            .map(|line| line.iter().fold(0u64, |acc, &p| acc | (1u64 << p)))
            .collect(),
    )
}

/// Every `k`-subset of `{0..v-1}`; trivially covers for any `t <= min(k, m)`.
pub fn all_subsets(v: u32, k: u32) -> Result<LongArray, ComputeError> {
    candidates(v, k)
}

/// Greedy covering design.
///
/// Repeatedly picks the `k`-subset that covers the most still-uncovered `m`-subsets (ties go to
/// the first in colex order) until every `m`-subset of `{0..v-1}` is covered at threshold `t`.
pub fn greedy_cover(v: u32, m: u32, k: u32, t: u32) -> Result<LongArray, ComputeError> {
    if v > MAX_UNIVERSE {
        return Err(ComputeError::overflow(
            "greedy_cover",
            format!("universe size {v} exceeds {MAX_UNIVERSE}"),
        ));
    }
    if k > v || m > v {
        return Err(ComputeError::invalid(format!(
            "greedy_cover needs k <= v and m <= v (v={v}, m={m}, k={k})"
        )));
    }

    let targets = candidates(v, m)?;
    let blocks = candidates(v, k)?;
    let mut uncovered: FxHashSet<u64> = targets.iter().collect();
    let mut chosen: Vec<u64> = Vec::new();

    while !uncovered.is_empty() {
        let mut best = None;
        let mut best_gain = 0usize;
        for c in blocks.iter() {
            let gain = uncovered
                .iter()
                .filter(|&&p| (p & c).count_ones() >= t)
                .count();
            if gain > best_gain {
                best = Some(c);
                best_gain = gain;
            }
        }
        let Some(c) = best else {
            return Err(ComputeError::invalid(format!(
                "no {k}-subset covers the remaining {} {m}-subsets at t={t}",
                uncovered.len()
            )));
        };
        uncovered.retain(|&p| (p & c).count_ones() < t);
        chosen.push(c);
    }

    debug!(v, m, k, t, codewords = chosen.len(), "greedy cover built");
    Ok(LongArray::wrap(chosen))
}
