//! Opaque stream transforms wrapped around the binary format.
//!
//! The codec layer never inspects compressed bytes; it only asks a [`Compressor`] for a writer
//! or a reader around the raw stream.

use std::fmt;
use std::io::{self, Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compressor {
    /// Bytes pass through unchanged.
    #[default]
    None,
    Gzip,
    Zlib,
    Deflate,
}

impl Compressor {
    pub const ALL: [Compressor; 4] = [
        Compressor::None,
        Compressor::Gzip,
        Compressor::Zlib,
        Compressor::Deflate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Compressor::None => "none",
            Compressor::Gzip => "gzip",
            Compressor::Zlib => "zlib",
            Compressor::Deflate => "deflate",
        }
    }

    pub fn by_name(name: &str) -> Result<Self, ComputeError> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "pass-through" | "passthrough" => Ok(Compressor::None),
            "gzip" | "gz" => Ok(Compressor::Gzip),
            "zlib" => Ok(Compressor::Zlib),
            "deflate" => Ok(Compressor::Deflate),
            other => Err(ComputeError::invalid(format!(
                "unknown compressor {other:?} (expected one of none, gzip, zlib, deflate)"
            ))),
        }
    }

    pub fn writer<W: Write>(self, w: W) -> CompressWriter<W> {
        match self {
            Compressor::None => CompressWriter::Plain(w),
            Compressor::Gzip => CompressWriter::Gzip(GzEncoder::new(w, Compression::default())),
            Compressor::Zlib => CompressWriter::Zlib(ZlibEncoder::new(w, Compression::default())),
            Compressor::Deflate => {
                CompressWriter::Deflate(DeflateEncoder::new(w, Compression::default()))
            }
        }
    }

    pub fn reader<R: Read>(self, r: R) -> DecompressReader<R> {
        match self {
            Compressor::None => DecompressReader::Plain(r),
            Compressor::Gzip => DecompressReader::Gzip(GzDecoder::new(r)),
            Compressor::Zlib => DecompressReader::Zlib(ZlibDecoder::new(r)),
            Compressor::Deflate => DecompressReader::Deflate(DeflateDecoder::new(r)),
        }
    }
}

impl fmt::Display for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write side of a [`Compressor`]. Call [`CompressWriter::finish`] to emit trailers.
pub enum CompressWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Zlib(ZlibEncoder<W>),
    Deflate(DeflateEncoder<W>),
}

impl<W: Write> CompressWriter<W> {
    /// Flush remaining compressed data and return the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            CompressWriter::Plain(w) => Ok(w),
            CompressWriter::Gzip(e) => e.finish(),
            CompressWriter::Zlib(e) => e.finish(),
            CompressWriter::Deflate(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for CompressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CompressWriter::Plain(w) => w.write(buf),
            CompressWriter::Gzip(e) => e.write(buf),
            CompressWriter::Zlib(e) => e.write(buf),
            CompressWriter::Deflate(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CompressWriter::Plain(w) => w.flush(),
            CompressWriter::Gzip(e) => e.flush(),
            CompressWriter::Zlib(e) => e.flush(),
            CompressWriter::Deflate(e) => e.flush(),
        }
    }
}

pub enum DecompressReader<R: Read> {
    Plain(R),
    Gzip(GzDecoder<R>),
    Zlib(ZlibDecoder<R>),
    Deflate(DeflateDecoder<R>),
}

impl<R: Read> Read for DecompressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DecompressReader::Plain(r) => r.read(buf),
            DecompressReader::Gzip(d) => d.read(buf),
            DecompressReader::Zlib(d) => d.read(buf),
            DecompressReader::Deflate(d) => d.read(buf),
        }
    }
}
