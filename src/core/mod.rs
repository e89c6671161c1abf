//! Memory model: shapes, typed arrays and their binary format.
//!
//! - [`shape`]: dimension lengths, global-index/coordinate conversion and index visitors.
//! - [`element`]: the primitive element kinds and their big-endian encoding.
//! - [`array`]: contiguous, exactly-sized buffers addressed by global index.
//! - [`codec`]: the length-prefixed binary stream format.
//! - [`compress`]: pluggable stream compression around that format.

pub mod array;
pub mod codec;
pub mod compress;
pub mod element;
pub mod shape;
