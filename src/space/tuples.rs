/// Lazy, pull-based odometer over the tuples of a space.
///
/// Holds only the next tuple to yield; dropping it early produces nothing further.
#[derive(Debug, Clone)]
pub struct Tuples {
    dims: Vec<usize>,
    first_end: usize,
    next: Option<Vec<usize>>,
}

impl Tuples {
    /// All tuples of `dims`; yields nothing when `empty` is set.
    pub(crate) fn new(dims: Vec<usize>, empty: bool) -> Self {
        let first_end = dims.first().copied().unwrap_or(0);
        let next = if empty || dims.is_empty() || dims.contains(&0) {
            None
        } else {
            Some(vec![0; dims.len()])
        };
        Self {
            dims,
            first_end,
            next,
        }
    }

    /// Only the tuples whose first index is `i0`.
    pub(crate) fn with_first(dims: Vec<usize>, i0: usize) -> Self {
        let mut start = vec![0; dims.len()];
        let next = match start.first_mut() {
            Some(first) if i0 < dims[0] && !dims.contains(&0) => {
                *first = i0;
                Some(start)
            }
            _ => None,
        };
        Self {
            dims,
            first_end: i0 + 1,
            next,
        }
    }

    fn successor(&self, cur: &[usize]) -> Option<Vec<usize>> {
        let mut succ = cur.to_vec();
        for d in (0..succ.len()).rev() {
            let end = if d == 0 { self.first_end } else { self.dims[d] };
            succ[d] += 1;
            if succ[d] < end {
                return Some(succ);
            }
            succ[d] = 0;
        }
        None
    }
}

impl Iterator for Tuples {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let cur = self.next.take()?;
        self.next = self.successor(&cur);
        Some(cur)
    }
}
