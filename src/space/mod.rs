//! Enumeration engine over finite N-dimensional index grids.
//!
//! A [`FiniteSpace`] is a descriptor, not an iterator: every traversal call is independent and
//! restartable. Tuples are visited in odometer order (the first index varies slowest).
//!
//! Parallel traversal partitions the first index across the current rayon pool; all tuples
//! sharing one first index are visited by one worker, in order.

mod fixed;
mod general;
mod tuples;

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rayon::prelude::*;
use tracing::debug;

use crate::error::ComputeError;

pub use tuples::Tuples;

/// Traversal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visiting {
    /// One thread, strictly increasing odometer order.
    Sequential,
    /// First index partitioned across the worker pool; no order across partitions.
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr {
    Empty,
    /// Unrolled walkers for up to 8 dimensions.
    Fixed(Vec<usize>),
    /// Generic odometer for any dimension count.
    General(Vec<usize>),
    /// Experimental product of two spaces.
    Composite(Box<FiniteSpace>, Box<FiniteSpace>),
}

/// A finite Cartesian product of index ranges `[0, n0) x [0, n1) x ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiniteSpace {
    repr: Repr,
}

impl FiniteSpace {
    pub const fn empty() -> Self {
        Self { repr: Repr::Empty }
    }

    /// Space over the given lengths.
    ///
    /// No lengths, or any length `<= 0`, yields the empty space. Up to 8 dimensions get the
    /// unrolled walkers, more use the generic odometer.
    pub fn new(dims: &[isize]) -> Self {
        match positive_lengths(dims) {
            Some(dims) => Self {
                repr: Repr::Fixed(dims),
            },
            None => Self::empty(),
        }
    }

    /// Like [`FiniteSpace::new`] but always uses the generic odometer.
    pub fn general(dims: &[isize]) -> Self {
        match positive_lengths(dims) {
            Some(dims) => Self {
                repr: Repr::General(dims),
            },
            None => Self::empty(),
        }
    }

    /// Cartesian product of `a` and `b`: each tuple is a tuple of `a` joined with a tuple of `b`.
    ///
    /// Experimental: traversal and streaming work, but [`FiniteSpace::find_any`] and
    /// [`FiniteSpace::stream_collectors`] fail with [`ComputeError::Unsupported`].
    pub fn composite(a: FiniteSpace, b: FiniteSpace) -> Self {
        Self {
            repr: Repr::Composite(Box::new(a), Box::new(b)),
        }
    }

    /// Short name of the underlying variant, as used in error messages.
    pub fn variant(&self) -> &'static str {
        match &self.repr {
            Repr::Empty => "empty",
            Repr::Fixed(_) => "fixed",
            Repr::General(_) => "general",
            Repr::Composite(..) => "composite",
        }
    }

    /// Number of indices in each tuple.
    pub fn dimension_count(&self) -> usize {
        match &self.repr {
            Repr::Empty => 0,
            Repr::Fixed(d) | Repr::General(d) => d.len(),
            Repr::Composite(a, b) => a.dimension_count() + b.dimension_count(),
        }
    }

    /// Exclusive upper bound of every index.
    pub fn dims(&self) -> Vec<usize> {
        match &self.repr {
            Repr::Empty => Vec::new(),
            Repr::Fixed(d) | Repr::General(d) => d.clone(),
            Repr::Composite(a, b) => {
                let mut d = a.dims();
                d.extend(b.dims());
                d
            }
        }
    }

    /// Exact number of tuples.
    pub fn cardinality(&self) -> BigUint {
        match &self.repr {
            Repr::Empty => BigUint::zero(),
            Repr::Fixed(d) | Repr::General(d) => d
                .iter()
                .fold(BigUint::one(), |acc, &n| acc * BigUint::from(n)),
            Repr::Composite(a, b) => a.cardinality() * b.cardinality(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Empty => true,
            Repr::Fixed(_) | Repr::General(_) => false,
            Repr::Composite(a, b) => a.is_empty() || b.is_empty(),
        }
    }

    /// Visit every tuple in the given mode.
    pub fn for_each(&self, visiting: Visiting, f: impl Fn(&[usize]) + Sync + Send) {
        match visiting {
            Visiting::Sequential => self.for_each_sequential(f),
            Visiting::Parallel => self.for_each_parallel(f),
        }
    }

    /// Visit every tuple on the current thread, in odometer order.
    pub fn for_each_sequential(&self, mut f: impl FnMut(&[usize])) {
        // A wrapper that cannot fail.
        self.try_for_each_sequential(|t| {
            f(t);
            Ok(())
        })
        .unwrap_or_else(|never: Infallible| match never {});
    }

    pub fn for_each_parallel(&self, f: impl Fn(&[usize]) + Sync + Send) {
        self.try_for_each(Visiting::Parallel, |t| {
            f(t);
            Ok(())
        })
        .unwrap_or_else(|never: Infallible| match never {});
    }

    /// Like [`FiniteSpace::for_each_sequential`], but stops at the first error and returns it.
    pub fn try_for_each_sequential<E>(
        &self,
        mut f: impl FnMut(&[usize]) -> Result<(), E>,
    ) -> Result<(), E> {
        self.walk_sequential(&mut f)
    }

    /// Fallible traversal in the given mode; an error aborts the remaining work of this call.
    ///
    /// In parallel mode partitions already running may finish their current tuple, and which
    /// error is returned when several partitions fail is unspecified.
    pub fn try_for_each<E: Send>(
        &self,
        visiting: Visiting,
        f: impl Fn(&[usize]) -> Result<(), E> + Sync + Send,
    ) -> Result<(), E> {
        match visiting {
            Visiting::Sequential => self.walk_sequential(&mut |t: &[usize]| f(t)),
            Visiting::Parallel => self.walk_parallel(&f),
        }
    }

    fn walk_sequential<E>(
        &self,
        f: &mut dyn FnMut(&[usize]) -> Result<(), E>,
    ) -> Result<(), E> {
        match &self.repr {
            Repr::Empty => Ok(()),
            Repr::Fixed(dims) | Repr::General(dims) => {
                let fixed = matches!(self.repr, Repr::Fixed(_));
                let mut visit = |t: &[usize]| match f(t) {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(e) => ControlFlow::Break(e),
                };
                for i0 in 0..dims[0] {
                    if let ControlFlow::Break(e) = walk_first(dims, fixed, i0, &mut visit) {
                        return Err(e);
                    }
                }
                Ok(())
            }
            Repr::Composite(a, b) => {
                let split = a.dimension_count();
                let mut buf = vec![0usize; split + b.dimension_count()];
                a.walk_sequential(&mut |va: &[usize]| {
                    buf[..split].copy_from_slice(va);
                    b.walk_sequential(&mut |vb: &[usize]| {
                        buf[split..].copy_from_slice(vb);
                        f(&buf)
                    })
                })
            }
        }
    }

    fn walk_parallel<E: Send>(
        &self,
        f: &(dyn Fn(&[usize]) -> Result<(), E> + Sync),
    ) -> Result<(), E> {
        match &self.repr {
            Repr::Empty => Ok(()),
            Repr::Fixed(dims) | Repr::General(dims) => {
                let fixed = matches!(self.repr, Repr::Fixed(_));
                debug!(
                    dims = ?dims,
                    threads = rayon::current_num_threads(),
                    "parallel traversal"
                );
                (0..dims[0]).into_par_iter().try_for_each(|i0| {
                    let mut visit = |t: &[usize]| match f(t) {
                        Ok(()) => ControlFlow::Continue(()),
                        Err(e) => ControlFlow::Break(e),
                    };
                    match walk_first(dims, fixed, i0, &mut visit) {
                        ControlFlow::Continue(()) => Ok(()),
                        ControlFlow::Break(e) => Err(e),
                    }
                })
            }
            Repr::Composite(a, b) => {
                let split = a.dimension_count();
                let width = split + b.dimension_count();
                a.walk_parallel(&|va: &[usize]| {
                    let mut buf = vec![0usize; width];
                    buf[..split].copy_from_slice(va);
                    b.walk_sequential(&mut |vb: &[usize]| {
                        buf[split..].copy_from_slice(vb);
                        f(&buf)
                    })
                })
            }
        }
    }

    /// Lazy sequential stream of all tuples, in odometer order.
    pub fn stream(&self) -> Tuples {
        Tuples::new(self.dims(), self.is_empty())
    }

    /// Parallel stream: one lazy sub-stream per first index.
    pub fn par_stream(&self) -> impl ParallelIterator<Item = Vec<usize>> {
        let dims = if self.is_empty() {
            Vec::new()
        } else {
            self.dims()
        };
        let n0 = dims.first().copied().unwrap_or(0);
        (0..n0)
            .into_par_iter()
            .flat_map_iter(move |i0| Tuples::with_first(dims.clone(), i0))
    }

    /// Parallel search for any tuple satisfying `predicate`.
    ///
    /// Once a match is seen, workers stop evaluating further tuples; tuples already being
    /// evaluated on other workers may still complete.
    pub fn find_any(
        &self,
        predicate: impl Fn(&[usize]) -> bool + Sync + Send,
    ) -> Result<Option<Vec<usize>>, ComputeError> {
        let (dims, fixed) = match &self.repr {
            Repr::Empty => return Ok(None),
            Repr::Fixed(d) => (d, true),
            Repr::General(d) => (d, false),
            Repr::Composite(..) => {
                return Err(ComputeError::Unsupported {
                    operation: "find_any",
                    variant: self.variant(),
                })
            }
        };

        let stop = AtomicBool::new(false);
        let found = (0..dims[0]).into_par_iter().find_map_any(|i0| {
            if stop.load(Ordering::Relaxed) {
                return None;
            }
            let mut visit = |t: &[usize]| {
                if stop.load(Ordering::Relaxed) {
                    ControlFlow::Break(None)
                } else if predicate(t) {
                    stop.store(true, Ordering::Relaxed);
                    ControlFlow::Break(Some(t.to_vec()))
                } else {
                    ControlFlow::Continue(())
                }
            };
            match walk_first(dims, fixed, i0, &mut visit) {
                ControlFlow::Break(hit) => hit,
                ControlFlow::Continue(()) => None,
            }
        });
        Ok(found)
    }

    /// One private collector per first index.
    ///
    /// For each `i0`, `factory(i0)` creates a collector, then `visit` receives it together with
    /// every tuple starting with `i0`, in order. Collectors are returned ordered by `i0`.
    pub fn stream_collectors<C: Send>(
        &self,
        factory: impl Fn(usize) -> C + Sync + Send,
        visit: impl Fn(&mut C, &[usize]) + Sync + Send,
    ) -> Result<Vec<C>, ComputeError> {
        let (dims, fixed) = match &self.repr {
            Repr::Empty => return Ok(Vec::new()),
            Repr::Fixed(d) => (d, true),
            Repr::General(d) => (d, false),
            Repr::Composite(..) => {
                return Err(ComputeError::Unsupported {
                    operation: "stream_collectors",
                    variant: self.variant(),
                })
            }
        };

        debug!(dims = ?dims, partitions = dims[0], "collector traversal");
        Ok((0..dims[0])
            .into_par_iter()
            .map(|i0| {
                let mut collector = factory(i0);
                let mut feed = |t: &[usize]| -> ControlFlow<Infallible> {
                    visit(&mut collector, t);
                    ControlFlow::Continue(())
                };
                if let ControlFlow::Break(never) = walk_first(dims, fixed, i0, &mut feed) {
                    match never {}
                }
                collector
            })
            .collect())
    }
}

fn positive_lengths(dims: &[isize]) -> Option<Vec<usize>> {
    if dims.is_empty() {
        return None;
    }
    dims.iter().map(|&n| usize::try_from(n).ok().filter(|&n| n > 0)).collect()
}

fn walk_first<B>(
    dims: &[usize],
    fixed: bool,
    i0: usize,
    f: &mut dyn FnMut(&[usize]) -> ControlFlow<B>,
) -> ControlFlow<B> {
    if fixed {
        fixed::walk_fixed(dims, i0, f)
    } else {
        general::walk_general(dims, i0, f)
    }
}
