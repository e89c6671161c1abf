//! Exact binomial coefficients and colexicographic subset enumeration.

pub mod binomial;
pub mod colex;

pub use binomial::{binomial, binomial_u64};
pub use colex::{colex_rank, colex_unrank, first_colex, next_colex, ColexSubsets};
