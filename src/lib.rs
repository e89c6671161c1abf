//! Enumeration and search over finite combinatorial spaces.
//!
//! - [`core`]: shapes, typed arrays and their bit-exact binary format.
//! - [`combinatorics`]: exact binomials and colex-ordered `k`-subsets of a `u64` word.
//! - [`space`]: sequential/parallel traversal, lazy streams, search and per-partition collectors
//!   over N-dimensional index grids.
//! - [`setcover`]: the popcount coverage workload and its executor boundary.
//! - [`config`] and [`report`]: JSON run files, worker pools and exported results.

pub mod combinatorics;
pub mod config;
pub mod core;
pub mod error;
pub mod report;
pub mod setcover;
pub mod space;

pub use crate::error::ComputeError;
