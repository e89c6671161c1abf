use std::ops::ControlFlow;

/// Odometer walk over every suffix of a tuple whose first index is fixed to `i0`.
///
/// Works for any dimension count >= 1; every length must be positive.
pub(crate) fn walk_general<B>(
    dims: &[usize],
    i0: usize,
    f: &mut dyn FnMut(&[usize]) -> ControlFlow<B>,
) -> ControlFlow<B> {
    let k = dims.len();
    let mut t = vec![0usize; k];
    t[0] = i0;
    loop {
        f(&t)?;
        // Advance the suffix; the last index turns fastest.
        let mut d = k;
        loop {
            d -= 1;
            if d == 0 {
                return ControlFlow::Continue(());
            }
            t[d] += 1;
            if t[d] < dims[d] {
                break;
            }
            t[d] = 0;
        }
    }
}
