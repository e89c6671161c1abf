use std::io::{Read, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::core::codec;
use crate::core::compress::Compressor;
use crate::core::element::{Element, ElementKind};
use crate::core::shape::Shape;
use crate::error::ComputeError;

/// A [`Shape`] plus a contiguous, exactly-sized buffer of one primitive type.
///
/// Elements are addressed by global index. The array owns its buffer; parallel writers go through
/// [`Array::par_fill`], which hands each slot to exactly one worker.
#[derive(Debug, Clone)]
pub struct Array<T: Element> {
    shape: Shape,
    data: Vec<T>,
}

pub type ByteArray = Array<u8>;
pub type ShortArray = Array<i16>;
pub type LongArray = Array<u64>;
pub type DoubleArray = Array<f64>;

impl<T: Element> Array<T> {
    /// Zero-initialized array of the given shape.
    pub fn allocate(shape: Shape) -> Result<Self, ComputeError> {
        let data = try_alloc_vec("array_allocate", "element buffer", shape.total_size())?;
        Ok(Self { shape, data })
    }

    /// Array whose element at `gid` is `f(gid)`.
    pub fn from_fn(shape: Shape, f: impl FnMut(u64) -> T) -> Result<Self, ComputeError> {
        let mut array = Self::allocate(shape)?;
        array.fill(f);
        Ok(array)
    }

    /// One-dimensional array over the given values.
    pub fn wrap(values: Vec<T>) -> Self {
        Self {
            shape: Shape::linear(values.len() as u64),
            data: values,
        }
    }

    /// Array over existing values; `values.len()` must equal `shape.total_size()`.
    pub fn from_vec(shape: Shape, values: Vec<T>) -> Result<Self, ComputeError> {
        if values.len() as u64 != shape.total_size() {
            return Err(ComputeError::invalid(format!(
                "{} values do not fill a shape of total size {}",
                values.len(),
                shape.total_size()
            )));
        }
        Ok(Self {
            shape,
            data: values,
        })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn element_kind(&self) -> ElementKind {
        T::KIND
    }

    #[inline]
    pub fn bytes_per_element(&self) -> usize {
        T::BYTES
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.shape.total_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, gid: u64) -> Result<T, ComputeError> {
        self.shape.check_gid("array_get", gid)?;
        Ok(self.data[gid as usize])
    }

    pub fn put(&mut self, gid: u64, value: T) -> Result<&mut Self, ComputeError> {
        self.shape.check_gid("array_put", gid)?;
        self.data[gid as usize] = value;
        Ok(self)
    }

    /// Sequentially set every element to `f(gid)`.
    pub fn fill(&mut self, mut f: impl FnMut(u64) -> T) -> &mut Self {
        for (gid, slot) in self.data.iter_mut().enumerate() {
            *slot = f(gid as u64);
        }
        self
    }

    /// Set every element to `f(gid)` on the current rayon pool.
    pub fn par_fill(&mut self, f: impl Fn(u64) -> T + Sync + Send) -> &mut Self {
        self.data
            .par_iter_mut()
            .enumerate()
            .for_each(|(gid, slot)| *slot = f(gid as u64));
        self
    }

    /// Like [`Array::fill`], but aborts on the first generator error.
    ///
    /// Elements before the failing index keep their new values.
    pub fn try_fill<E>(&mut self, mut f: impl FnMut(u64) -> Result<T, E>) -> Result<&mut Self, E> {
        for (gid, slot) in self.data.iter_mut().enumerate() {
            *slot = f(gid as u64)?;
        }
        Ok(self)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied()
    }

    // -- IO

    /// Write the shape header followed by all elements in global-index order.
    pub fn write_to(&self, w: &mut dyn Write) -> Result<(), ComputeError> {
        codec::write_shape(w, &self.shape)?;
        codec::write_elements(w, &self.data)
    }

    /// Read an array written by [`Array::write_to`]. Truncated input is an error.
    pub fn read_from(r: &mut dyn Read) -> Result<Self, ComputeError> {
        let shape = codec::read_shape(r)?;
        let data = codec::read_elements(r, shape.total_size())?;
        Ok(Self { shape, data })
    }

    /// Write to `path`, wrapped by `compressor`.
    pub fn save(&self, path: &Path, compressor: Compressor) -> Result<(), ComputeError> {
        codec::write_file(path, compressor, |w| self.write_to(w))
    }

    /// Read from `path`, unwrapped by `compressor`.
    pub fn load(path: &Path, compressor: Compressor) -> Result<Self, ComputeError> {
        codec::read_file(path, compressor, |r| Self::read_from(r))
    }
}

impl<T: Element> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| a.same_bits(b))
    }
}

/// Allocate a zeroed vector of `len` elements, surfacing failure instead of aborting.
pub(crate) fn try_alloc_vec<T: Element>(
    stage: &'static str,
    structure: &'static str,
    len: u64,
) -> Result<Vec<T>, ComputeError> {
    let n = usize::try_from(len).map_err(|_| {
        ComputeError::overflow(stage, format!("{len} elements do not fit usize"))
    })?;
    let mut v: Vec<T> = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|_| ComputeError::AllocationFailed {
            stage,
            structure,
            requested: len,
        })?;
    v.resize(n, T::default());
    Ok(v)
}
