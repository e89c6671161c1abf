//! Unrolled suffix walkers for spaces of 1 to 8 dimensions.
//!
//! Each walker fixes the first index to `i0` and visits every suffix in odometer order with one
//! plain `for` loop per remaining dimension, over a stack-allocated tuple.

use std::ops::ControlFlow;

use super::general::walk_general;

type Visit<'a, B> = &'a mut dyn FnMut(&[usize]) -> ControlFlow<B>;

macro_rules! nest {
    ($dims:ident, $t:ident, $f:ident;) => {
        $f(&$t[..])?;
    };
    ($dims:ident, $t:ident, $f:ident; $i:tt $($rest:tt)*) => {
        for x in 0..$dims[$i] {
            $t[$i] = x;
            nest!($dims, $t, $f; $($rest)*);
        }
    };
}

macro_rules! fixed_walker {
    ($name:ident, $n:literal; $($i:tt)+) => {
        fn $name<B>(dims: &[usize], i0: usize, f: Visit<'_, B>) -> ControlFlow<B> {
            let mut t = [0usize; $n];
            t[0] = i0;
            nest!(dims, t, f; $($i)+);
            ControlFlow::Continue(())
        }
    };
}

fn walk1<B>(i0: usize, f: Visit<'_, B>) -> ControlFlow<B> {
    f(std::slice::from_ref(&i0))
}

fixed_walker!(walk2, 2; 1);
fixed_walker!(walk3, 3; 1 2);
fixed_walker!(walk4, 4; 1 2 3);
fixed_walker!(walk5, 5; 1 2 3 4);
fixed_walker!(walk6, 6; 1 2 3 4 5);
fixed_walker!(walk7, 7; 1 2 3 4 5 6);
fixed_walker!(walk8, 8; 1 2 3 4 5 6 7);

/// Visit all tuples whose first index is `i0`, picking the walker for `dims.len()`.
///
/// Dimension counts above 8 fall through to the generic odometer.
pub(crate) fn walk_fixed<B>(dims: &[usize], i0: usize, f: Visit<'_, B>) -> ControlFlow<B> {
    match dims.len() {
        1 => walk1(i0, f),
        2 => walk2(dims, i0, f),
        3 => walk3(dims, i0, f),
        4 => walk4(dims, i0, f),
        5 => walk5(dims, i0, f),
        6 => walk6(dims, i0, f),
        7 => walk7(dims, i0, f),
        8 => walk8(dims, i0, f),
        _ => walk_general(dims, i0, f),
    }
}
