//! Executor boundary for the coverage test.
//!
//! An executor receives read-only candidate and codeword buffers, a threshold and an output
//! buffer of the same length as the candidates, and must set `covered[i]` to 1 if
//! `covers(candidates[i])` and to 0 otherwise. Callers interpret the output identically
//! whichever executor produced it.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::ComputeError;
use crate::setcover::covers;
use crate::space::FiniteSpace;

pub trait CoverageExecutor: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        candidates: &[u64],
        codewords: &[u64],
        t: u32,
        covered: &mut [u8],
    ) -> Result<(), ComputeError>;
}

fn check_output(candidates: &[u64], covered: &[u8]) -> Result<(), ComputeError> {
    if candidates.len() == covered.len() {
        Ok(())
    } else {
        Err(ComputeError::Index {
            stage: "executor_output_len",
            gid: covered.len() as u64,
            size: candidates.len() as u64,
        })
    }
}

/// Data-parallel loop on the current rayon pool, one candidate per task.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessExecutor;

impl CoverageExecutor for InProcessExecutor {
    fn name(&self) -> &str {
        "in-process"
    }

    fn evaluate(
        &self,
        candidates: &[u64],
        codewords: &[u64],
        t: u32,
        covered: &mut [u8],
    ) -> Result<(), ComputeError> {
        check_output(candidates, covered)?;
        covered
            .par_iter_mut()
            .zip(candidates.par_iter())
            .for_each(|(out, &p)| *out = u8::from(covers(p, t, codewords)));
        Ok(())
    }
}

/// Drives the enumeration engine over a `[blocks, block_len]` space.
///
/// Each first index owns a private output block, filled by one worker and copied back in order.
#[derive(Debug, Clone, Copy)]
pub struct SpaceExecutor {
    block_len: usize,
}

impl SpaceExecutor {
    pub const DEFAULT_BLOCK_LEN: usize = 4096;

    /// A `block_len` of 0 is treated as 1.
    pub fn new(block_len: usize) -> Self {
        Self {
            block_len: block_len.max(1),
        }
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }
}

impl Default for SpaceExecutor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_LEN)
    }
}

impl CoverageExecutor for SpaceExecutor {
    fn name(&self) -> &str {
        "space"
    }

    fn evaluate(
        &self,
        candidates: &[u64],
        codewords: &[u64],
        t: u32,
        covered: &mut [u8],
    ) -> Result<(), ComputeError> {
        check_output(candidates, covered)?;
        let n = candidates.len();
        let block_len = self.block_len;
        let blocks = n.div_ceil(block_len);

        let to_isize = |x: usize| {
            isize::try_from(x).map_err(|_| {
                ComputeError::overflow("space_executor", format!("{x} does not fit isize"))
            })
        };
        let space = FiniteSpace::new(&[to_isize(blocks)?, to_isize(block_len)?]);

        let parts = space.stream_collectors(
            |b| Vec::with_capacity(block_len.min(n - b * block_len)),
            |out: &mut Vec<u8>, tuple: &[usize]| {
                let gid = tuple[0] * block_len + tuple[1];
                if gid < n {
                    out.push(u8::from(covers(candidates[gid], t, codewords)));
                }
            },
        )?;

        for (chunk, part) in covered.chunks_mut(block_len).zip(parts) {
            chunk.copy_from_slice(&part);
        }
        Ok(())
    }
}

/// Sequential reference of the accelerator kernel.
///
/// Assumes every candidate covered, scans the codewords and clears the flag when none reaches
/// the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceExecutor;

impl CoverageExecutor for ReferenceExecutor {
    fn name(&self) -> &str {
        "reference"
    }

    fn evaluate(
        &self,
        candidates: &[u64],
        codewords: &[u64],
        t: u32,
        covered: &mut [u8],
    ) -> Result<(), ComputeError> {
        check_output(candidates, covered)?;
        'candidates: for (out, &p) in covered.iter_mut().zip(candidates) {
            *out = 1;
            for &c in codewords {
                if (p & c).count_ones() >= t {
                    continue 'candidates;
                }
            }
            *out = 0;
        }
        Ok(())
    }
}

/// Named executors, passed around explicitly.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: FxHashMap<String, Box<dyn CoverageExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `in-process`, `space` and `reference`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(InProcessExecutor));
        registry.register(Box::new(SpaceExecutor::default()));
        registry.register(Box::new(ReferenceExecutor));
        registry
    }

    /// Add `executor` under its own name, returning any executor it replaces.
    pub fn register(
        &mut self,
        executor: Box<dyn CoverageExecutor>,
    ) -> Option<Box<dyn CoverageExecutor>> {
        self.executors.insert(executor.name().to_string(), executor)
    }

    pub fn get(&self, name: &str) -> Result<&dyn CoverageExecutor, ComputeError> {
        self.executors
            .get(name)
            .map(|e| &**e)
            .ok_or_else(|| {
                ComputeError::invalid(format!(
                    "unknown executor {name:?} (registered: {})",
                    self.names().join(", ")
                ))
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.names())
            .finish()
    }
}
