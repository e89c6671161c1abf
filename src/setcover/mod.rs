//! Set-cover workload: colex candidates tested against a list of codewords.
//!
//! A candidate `p` (an `m`-subset of `{0..v-1}` as a bitmask) is covered when some codeword `c`
//! satisfies `popcount(p & c) >= t`. Every candidate is evaluated independently and writes
//! exactly one output byte.

pub mod designs;
pub mod executor;

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::combinatorics::{binomial_u64, ColexSubsets};
use crate::core::array::{ByteArray, LongArray};
use crate::core::compress::Compressor;
use crate::core::shape::Shape;
use crate::error::ComputeError;

pub use executor::{
    CoverageExecutor, ExecutorRegistry, InProcessExecutor, ReferenceExecutor, SpaceExecutor,
};

/// Largest universe a `u64` bitmask can hold.
pub const MAX_UNIVERSE: u32 = 64;

/// `true` if some codeword shares at least `t` elements with `p`.
#[inline]
pub fn covers(p: u64, t: u32, codewords: &[u64]) -> bool {
    codewords.iter().any(|&c| (p & c).count_ones() >= t)
}

/// All `m`-subsets of `{0..v-1}` in colex order, starting at `(1 << m) - 1`.
pub fn candidates(v: u32, m: u32) -> Result<LongArray, ComputeError> {
    if v > MAX_UNIVERSE {
        return Err(ComputeError::overflow(
            "setcover_candidates",
            format!("universe size {v} exceeds {MAX_UNIVERSE}"),
        ));
    }
    let count = binomial_u64(v, m)?;
    let mut out = LongArray::allocate(Shape::linear(count))?;
    for (slot, p) in out.as_mut_slice().iter_mut().zip(ColexSubsets::new(v, m)?) {
        *slot = p;
    }
    debug!(v, m, count, "generated candidates");
    Ok(out)
}

/// A set-cover instance: universe size `v`, candidate size `m`, threshold `t` and codewords.
#[derive(Debug, Clone)]
pub struct SetCoverParams {
    v: u32,
    m: u32,
    t: u32,
    codewords: LongArray,
    candidates: LongArray,
}

impl SetCoverParams {
    /// Validate the parameters and generate all `C(v, m)` candidates.
    ///
    /// A threshold above `m` is accepted; no candidate can reach it, so nothing is covered.
    pub fn new(v: u32, m: u32, t: u32, codewords: LongArray) -> Result<Self, ComputeError> {
        if v > MAX_UNIVERSE {
            return Err(ComputeError::overflow(
                "setcover_params",
                format!("universe size {v} exceeds {MAX_UNIVERSE}"),
            ));
        }
        if m > v {
            return Err(ComputeError::invalid(format!(
                "subset size m={m} exceeds universe size v={v}"
            )));
        }
        let candidates = candidates(v, m)?;
        Ok(Self {
            v,
            m,
            t,
            codewords,
            candidates,
        })
    }

    pub fn v(&self) -> u32 {
        self.v
    }

    pub fn m(&self) -> u32 {
        self.m
    }

    pub fn t(&self) -> u32 {
        self.t
    }

    pub fn codewords(&self) -> &LongArray {
        &self.codewords
    }

    pub fn candidates(&self) -> &LongArray {
        &self.candidates
    }

    pub fn candidate_count(&self) -> u64 {
        self.candidates.len()
    }

    /// Run `executor` over every candidate.
    pub fn evaluate(&self, executor: &dyn CoverageExecutor) -> Result<Coverage, ComputeError> {
        let mut covered = ByteArray::allocate(self.candidates.shape())?;
        let start = Instant::now();
        executor.evaluate(
            self.candidates.as_slice(),
            self.codewords.as_slice(),
            self.t,
            covered.as_mut_slice(),
        )?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let covered_count = covered.iter().filter(|&b| b != 0).count() as u64;
        info!(
            executor = executor.name(),
            candidates = self.candidate_count(),
            covered = covered_count,
            elapsed_ms,
            "coverage evaluated"
        );
        Ok(Coverage {
            covered,
            covered_count,
            executor: executor.name().to_string(),
            elapsed_ms,
        })
    }

    /// Look up `name` in `registry` and run it.
    pub fn evaluate_with(
        &self,
        registry: &ExecutorRegistry,
        name: &str,
    ) -> Result<Coverage, ComputeError> {
        self.evaluate(registry.get(name)?)
    }
}

/// Output of one evaluation: one flag per candidate.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub covered: ByteArray,
    pub covered_count: u64,
    pub executor: String,
    pub elapsed_ms: u64,
}

impl Coverage {
    /// Every candidate is covered, i.e. the codewords form a covering design.
    pub fn is_complete(&self) -> bool {
        self.covered_count == self.covered.len()
    }

    /// Global indices of candidates no codeword covers.
    pub fn uncovered(&self) -> impl Iterator<Item = u64> + '_ {
        self.covered
            .iter()
            .enumerate()
            .filter(|&(_, b)| b == 0)
            .map(|(gid, _)| gid as u64)
    }
}

/// Read a codeword list stored as a binary `LongArray`.
pub fn load_codewords(path: &Path, compressor: Compressor) -> Result<LongArray, ComputeError> {
    LongArray::load(path, compressor)
}

pub fn save_codewords(
    codewords: &LongArray,
    path: &Path,
    compressor: Compressor,
) -> Result<(), ComputeError> {
    codewords.save(path, compressor)
}
