//! Bit-exact binary stream format for shapes and typed arrays.
//!
//! - Shape: one byte `dimension_count` (0 = empty shape, nothing follows), then one big-endian
//!   `u64` per dimension length.
//! - Array: a shape header, then `total_size` elements in increasing global-index order, each
//!   big-endian (`Byte` 1 byte, `Short` 2, `Long` 8, `Double` 8 as IEEE-754 bits).
//!
//! No padding, alignment or checksum. Reads never zero-fill: a short stream is an error.

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::core::compress::Compressor;
use crate::core::element::Element;
use crate::core::shape::{Shape, MAX_DIMS};
use crate::error::ComputeError;

/// Elements are moved through a scratch buffer of this many elements at a time.
const BLOCK_ELEMENTS: usize = 4096;

pub fn write_shape(w: &mut dyn Write, shape: &Shape) -> Result<(), ComputeError> {
    let rank = shape.rank();
    w.write_all(&[rank as u8])
        .map_err(|e| ComputeError::io("shape_write", e))?;
    let mut buf = [0u8; 8];
    for &len in shape.lengths() {
        len.encode_be(&mut buf);
        w.write_all(&buf)
            .map_err(|e| ComputeError::io("shape_write", e))?;
    }
    Ok(())
}

pub fn read_shape(r: &mut dyn Read) -> Result<Shape, ComputeError> {
    let mut rank = [0u8; 1];
    r.read_exact(&mut rank)
        .map_err(|e| ComputeError::io("shape_read_rank", e))?;
    let rank = rank[0] as usize;
    if rank == 0 {
        return Ok(Shape::empty());
    }
    if rank > MAX_DIMS {
        return Err(ComputeError::Io {
            stage: "shape_read_rank",
            path: None,
            error: format!("dimension count {rank} exceeds MAX_DIMS={MAX_DIMS}"),
        });
    }

    let mut lengths = [0u64; MAX_DIMS];
    let mut buf = [0u8; 8];
    for len in lengths.iter_mut().take(rank) {
        r.read_exact(&mut buf)
            .map_err(|e| ComputeError::io("shape_read_lengths", e))?;
        *len = u64::decode_be(&buf);
    }
    Shape::of(&lengths[..rank])
}

pub fn write_elements<T: Element>(w: &mut dyn Write, values: &[T]) -> Result<(), ComputeError> {
    let mut buf = vec![0u8; BLOCK_ELEMENTS * T::BYTES];
    for block in values.chunks(BLOCK_ELEMENTS) {
        let bytes = &mut buf[..block.len() * T::BYTES];
        for (v, out) in block.iter().zip(bytes.chunks_exact_mut(T::BYTES)) {
            v.encode_be(out);
        }
        w.write_all(bytes)
            .map_err(|e| ComputeError::io("elements_write", e))?;
    }
    Ok(())
}

/// Read exactly `count` elements.
///
/// The buffer grows only as data actually arrives, so a corrupt header declaring a huge shape
/// fails on the short read rather than on a giant up-front allocation.
pub fn read_elements<T: Element>(r: &mut dyn Read, count: u64) -> Result<Vec<T>, ComputeError> {
    let total = usize::try_from(count).map_err(|_| {
        ComputeError::overflow("elements_read", format!("{count} elements do not fit usize"))
    })?;

    let mut out: Vec<T> = Vec::new();
    out.try_reserve_exact(total.min(BLOCK_ELEMENTS))
        .map_err(|_| ComputeError::AllocationFailed {
            stage: "elements_read",
            structure: "element buffer",
            requested: count,
        })?;

    let mut buf = vec![0u8; BLOCK_ELEMENTS * T::BYTES];
    while out.len() < total {
        let n = (total - out.len()).min(BLOCK_ELEMENTS);
        let bytes = &mut buf[..n * T::BYTES];
        r.read_exact(bytes).map_err(|e| ComputeError::Io {
            stage: "elements_read",
            path: None,
            error: format!("after {} of {count} elements: {e}", out.len()),
        })?;
        out.try_reserve(n)
            .map_err(|_| ComputeError::AllocationFailed {
                stage: "elements_read",
                structure: "element buffer",
                requested: count,
            })?;
        out.extend(bytes.chunks_exact(T::BYTES).map(T::decode_be));
    }
    Ok(out)
}

/// Create `path`, wrap it with `compressor`, run `body`, then finish and flush the stream.
pub(crate) fn write_file(
    path: &Path,
    compressor: Compressor,
    body: impl FnOnce(&mut dyn Write) -> Result<(), ComputeError>,
) -> Result<(), ComputeError> {
    let f = fs::File::create(path).map_err(|e| ComputeError::io_at("file_create", path, e))?;
    let mut w = compressor.writer(BufWriter::new(f));
    body(&mut w).map_err(|e| with_path(e, path))?;
    let mut inner = w
        .finish()
        .map_err(|e| ComputeError::io_at("file_finish", path, e))?;
    inner
        .flush()
        .map_err(|e| ComputeError::io_at("file_flush", path, e))
}

/// Open `path`, unwrap it with `compressor` and run `body` on the decompressed stream.
pub(crate) fn read_file<T>(
    path: &Path,
    compressor: Compressor,
    body: impl FnOnce(&mut dyn Read) -> Result<T, ComputeError>,
) -> Result<T, ComputeError> {
    let f = fs::File::open(path).map_err(|e| ComputeError::io_at("file_open", path, e))?;
    let mut r = compressor.reader(BufReader::new(f));
    body(&mut r).map_err(|e| with_path(e, path))
}

fn with_path(e: ComputeError, path: &Path) -> ComputeError {
    match e {
        ComputeError::Io {
            stage,
            path: None,
            error,
        } => ComputeError::Io {
            stage,
            path: Some(path.display().to_string()),
            error,
        },
        other => other,
    }
}

impl Shape {
    /// Write this shape in the binary header format.
    pub fn write_to(&self, w: &mut dyn Write) -> Result<(), ComputeError> {
        write_shape(w, self)
    }

    /// Read a shape written by [`Shape::write_to`].
    pub fn read_from(r: &mut dyn Read) -> Result<Shape, ComputeError> {
        read_shape(r)
    }
}
