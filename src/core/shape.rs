use std::convert::Infallible;
use std::ops::Range;

use rayon::prelude::*;

use crate::error::ComputeError;

/// Maximum number of dimensions a [`Shape`] can describe.
///
/// Arrays only ever use up to 3; the remaining capacity is there for enumeration spaces.
pub const MAX_DIMS: usize = 8;

/// A tuple of dimension lengths plus the derived total element count.
///
/// A global index `gid` in `[0, total_size)` maps to coordinates in row-major order, the last
/// coordinate varying fastest: `gid = ((i0 * len1 + i1) * len2 + i2) ...`.
///
/// The rank-0 shape is the empty shape (`total_size == 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    lengths: [u64; MAX_DIMS],
    rank: u8,
    total_size: u64,
}

impl Shape {
    pub const fn empty() -> Self {
        Self {
            lengths: [0; MAX_DIMS],
            rank: 0,
            total_size: 0,
        }
    }

    /// One-dimensional shape; cannot overflow.
    pub fn linear(size: u64) -> Self {
        let mut lengths = [0; MAX_DIMS];
        lengths[0] = size;
        Self {
            lengths,
            rank: 1,
            total_size: size,
        }
    }

    /// Build a shape from dimension lengths.
    ///
    /// Fails with [`ComputeError::Overflow`] if the product of the lengths does not fit `u64`, or
    /// if more than [`MAX_DIMS`] lengths are given. An empty slice yields [`Shape::empty`].
    pub fn of(lengths: &[u64]) -> Result<Self, ComputeError> {
        if lengths.is_empty() {
            return Ok(Self::empty());
        }
        if lengths.len() > MAX_DIMS {
            return Err(ComputeError::overflow(
                "shape_of",
                format!("rank {} exceeds MAX_DIMS={MAX_DIMS}", lengths.len()),
            ));
        }

        let mut total: u64 = 1;
        for &len in lengths {
            total = total.checked_mul(len).ok_or_else(|| {
                ComputeError::overflow(
                    "shape_of",
                    format!("total size of {lengths:?} does not fit u64"),
                )
            })?;
        }

        let mut buf = [0; MAX_DIMS];
        buf[..lengths.len()].copy_from_slice(lengths);
        Ok(Self {
            lengths: buf,
            rank: lengths.len() as u8,
            total_size: total,
        })
    }

    pub fn of2(size_x: u64, size_y: u64) -> Result<Self, ComputeError> {
        Self::of(&[size_x, size_y])
    }

    pub fn of3(size_x: u64, size_y: u64, size_z: u64) -> Result<Self, ComputeError> {
        Self::of(&[size_x, size_y, size_z])
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank as usize
    }

    #[inline]
    pub fn lengths(&self) -> &[u64] {
        &self.lengths[..self.rank()]
    }

    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_size == 0
    }

    /// Length of dimension `dim`, or 0 if the shape has fewer dimensions.
    #[inline]
    pub fn len_of(&self, dim: usize) -> u64 {
        if dim < self.rank() {
            self.lengths[dim]
        } else {
            0
        }
    }

    pub(crate) fn check_gid(&self, stage: &'static str, gid: u64) -> Result<(), ComputeError> {
        if gid < self.total_size {
            Ok(())
        } else {
            Err(ComputeError::Index {
                stage,
                gid,
                size: self.total_size,
            })
        }
    }

    /// Decompose a global index into per-dimension coordinates.
    pub fn to_coords(&self, gid: u64) -> Result<Vec<u64>, ComputeError> {
        self.check_gid("shape_to_coords", gid)?;
        let mut coords = vec![0u64; self.rank()];
        let mut rest = gid;
        for d in (0..self.rank()).rev() {
            let len = self.lengths[d];
            coords[d] = rest % len;
            rest /= len;
        }
        Ok(coords)
    }

    /// Inverse of [`Shape::to_coords`].
    pub fn from_coords(&self, coords: &[u64]) -> Result<u64, ComputeError> {
        if coords.len() != self.rank() {
            return Err(ComputeError::Index {
                stage: "shape_from_coords_arity",
                gid: coords.len() as u64,
                size: self.rank() as u64,
            });
        }
        let mut gid = 0u64;
        for (&c, &len) in coords.iter().zip(self.lengths()) {
            if c >= len {
                return Err(ComputeError::Index {
                    stage: "shape_from_coords",
                    gid: c,
                    size: len,
                });
            }
            gid = gid * len + c;
        }
        Ok(gid)
    }

    /// Global index for the 2-D coordinate `(i, j)`.
    #[inline]
    pub fn gid_2d(&self, i: u64, j: u64) -> u64 {
        i * self.len_of(1) + j
    }

    /// Global index for the 3-D coordinate `(i, j, k)`.
    #[inline]
    pub fn gid_3d(&self, i: u64, j: u64, k: u64) -> u64 {
        (i * self.len_of(1) + j) * self.len_of(2) + k
    }

    /// The global indices `0..total_size`.
    pub fn iter(&self) -> Range<u64> {
        0..self.total_size
    }

    /// Visit the global indices `0..total_size` in increasing order.
    pub fn for_each(&self, mut f: impl FnMut(u64)) {
        // A wrapper that cannot fail.
        self.try_for_each(|gid| {
            f(gid);
            Ok(())
        })
        .unwrap_or_else(|never: Infallible| match never {});
    }

    /// Like [`Shape::for_each`], but stops at the first error and returns it.
    pub fn try_for_each<E>(&self, mut f: impl FnMut(u64) -> Result<(), E>) -> Result<(), E> {
        let end = self.total_size;
        let mut gid = 0u64;
        while gid < end {
            f(gid)?;
            gid += 1;
        }
        Ok(())
    }

    /// Visit the global indices `offset..offset + size`.
    pub fn for_each_range(
        &self,
        offset: u64,
        size: u64,
        mut f: impl FnMut(u64),
    ) -> Result<(), ComputeError> {
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.total_size)
            .ok_or(ComputeError::Index {
                stage: "shape_for_each_range",
                gid: offset.saturating_add(size),
                size: self.total_size,
            })?;
        for gid in offset..end {
            f(gid);
        }
        Ok(())
    }

    /// Visit every global index on the current rayon pool. No ordering guarantee.
    pub fn par_for_each(&self, f: impl Fn(u64) + Sync + Send) {
        (0..self.total_size).into_par_iter().for_each(f);
    }

    /// Nested-loop visitor over `(i, j)`; a 1-D shape reports `j = 0`.
    pub fn for_each_2d(&self, mut f: impl FnMut(u64, u64)) -> Result<(), ComputeError> {
        match self.rank() {
            0 => Ok(()),
            1 => {
                for i in 0..self.lengths[0] {
                    f(i, 0);
                }
                Ok(())
            }
            2 => {
                let (nx, ny) = (self.lengths[0], self.lengths[1]);
                for i in 0..nx {
                    for j in 0..ny {
                        f(i, j);
                    }
                }
                Ok(())
            }
            _ => Err(ComputeError::Unsupported {
                operation: "for_each_2d",
                variant: "rank>2",
            }),
        }
    }

    /// Nested-loop visitor over `(i, j, k)`; missing trailing coordinates are reported as 0.
    pub fn for_each_3d(&self, mut f: impl FnMut(u64, u64, u64)) -> Result<(), ComputeError> {
        match self.rank() {
            0..=2 => self.for_each_2d(|i, j| f(i, j, 0)),
            3 => {
                let (nx, ny, nz) = (self.lengths[0], self.lengths[1], self.lengths[2]);
                for i in 0..nx {
                    for j in 0..ny {
                        for k in 0..nz {
                            f(i, j, k);
                        }
                    }
                }
                Ok(())
            }
            _ => Err(ComputeError::Unsupported {
                operation: "for_each_3d",
                variant: "rank>3",
            }),
        }
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::empty()
    }
}
