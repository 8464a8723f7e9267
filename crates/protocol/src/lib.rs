//! Parley Persisted Blob Format — append-only stream primitives
//!
//! This crate defines the byte-level building blocks for blobs that the
//! desktop client persists between runs (session settings and the nested
//! sub-blobs they carry).
//!
//! # Format rules
//!
//! - Integers are little-endian and fixed width (`i8`, `i32`, `u64`).
//! - Booleans are written as `i32` 0/1.
//! - Strings are an `i32` byte length followed by UTF-8 bytes.
//! - Byte arrays are an `i32` length followed by the raw bytes.
//!
//! Blobs carry no version tag. A newer writer only ever appends fields, so
//! every older blob is a byte prefix of a newer one. Readers use
//! [`StreamReader::at_end`] between field groups to detect where an older
//! writer stopped. Never insert a field in the middle of an existing order.
//!
//! # Usage
//!
//! ```ignore
//! use parley_protocol::{StreamReader, StreamWriter};
//!
//! let mut writer = StreamWriter::new();
//! writer.write_i32(7);
//! writer.write_string("incoming");
//! let blob = writer.into_bytes();
//!
//! let mut reader = StreamReader::new(&blob);
//! let value = reader.read_i32()?;
//! if !reader.at_end() {
//!     let name = reader.read_string()?;
//! }
//! ```

use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// A read that could not be satisfied from the remaining bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("unexpected end of stream at offset {offset}: needed {needed} bytes, {remaining} left")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("negative length prefix {length} at offset {offset}")]
    NegativeLength { offset: usize, length: i32 },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
}

pub type Result<T> = std::result::Result<T, StreamError>;

// =============================================================================
// Writer
// =============================================================================

/// Appends fields to an in-memory blob.
#[derive(Debug, Default, Clone)]
pub struct StreamWriter {
    buf: Vec<u8>,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer with room for `capacity` bytes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_i32(i32::from(value));
    }

    /// Element count for a sequence that follows.
    ///
    /// Counts above `i32::MAX` saturate; no persisted collection gets close.
    pub fn write_count(&mut self, count: usize) {
        self.write_i32(i32::try_from(count).unwrap_or(i32::MAX));
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_count(value.len());
        self.buf.extend_from_slice(value);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Reads fields back from a borrowed blob.
///
/// A failed read leaves the position where it was, but callers are expected
/// to abandon the whole blob on the first error.
#[derive(Debug, Clone)]
pub struct StreamReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// True once every byte has been consumed.
    ///
    /// This is the only compatibility signal in the format: a blob from an
    /// older writer simply ends earlier.
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(StreamError::UnexpectedEnd {
                offset: self.pos,
                needed,
                remaining,
            });
        }
        let slice = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Reads an `i32` flag; only `1` counts as set.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_i32()? == 1)
    }

    /// Reads a sequence count, rejecting negative values.
    pub fn read_count(&mut self) -> Result<usize> {
        let offset = self.pos;
        let length = self.read_i32()?;
        usize::try_from(length).map_err(|_| {
            self.pos = offset;
            StreamError::NegativeLength { offset, length }
        })
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        let len = self.read_count()?;
        self.take(len).inspect_err(|_| self.pos = start)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let bytes = self.read_bytes()?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => {
                self.pos = start;
                Err(StreamError::InvalidUtf8 { offset: start })
            }
        }
    }
}
