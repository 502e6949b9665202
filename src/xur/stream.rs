//! Big-endian input/output streams.
//!
//! Every integer and float in a XUR container is big-endian and fixed width.
//! [`IStream`] reads from a borrowed section payload; [`OStream`] writes to any
//! `Write` sink while tracking the byte position, so the same encoder can fill
//! a buffer or just count bytes.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::util::{Error, Result};

/// Input stream over one payload slice.
pub struct IStream<'a> {
    data: &'a [u8],
    pos: usize,
    /// Offset of `data[0]` within the container, for diagnostics.
    base: u64,
}

impl<'a> IStream<'a> {
    /// Stream over `data`, which starts at container offset `base`.
    pub fn new(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    /// Position relative to the start of the payload.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Position relative to the start of the container.
    #[inline]
    pub fn absolute_pos(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Take the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::UnexpectedEof(self.absolute_pos() + len as u64));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.read_bytes(4)?))
    }

    /// Read a non-negative int32 count.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let pos = self.absolute_pos();
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| Error::invalid(format!("negative {} count {} at {:#X}", what, count, pos)))
    }
}

/// Output stream that tracks how many bytes have been written.
pub struct OStream<W: Write> {
    writer: W,
    pos: u64,
}

impl OStream<Vec<u8>> {
    /// Create a stream writing into a new buffer.
    pub fn buffer() -> Self {
        Self::new(Vec::new())
    }
}

impl OStream<BufWriter<File>> {
    /// Create a buffered stream writing to a new or truncated file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(BufWriter::with_capacity(256 * 1024, file)))
    }
}

impl OStream<io::Sink> {
    /// Create a stream that only counts bytes.
    pub fn counter() -> Self {
        Self::new(io::sink())
    }
}

impl<W: Write> OStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pos: 0 }
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Consume the stream, returning the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write bytes and advance position.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.pos += 1;
        Ok(())
    }

    /// Write an i8 value.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.writer.write_i8(value)?;
        self.pos += 1;
        Ok(())
    }

    /// Write an i16 value (big-endian).
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.writer.write_i16::<BigEndian>(value)?;
        self.pos += 2;
        Ok(())
    }

    /// Write a u16 value (big-endian).
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.writer.write_u16::<BigEndian>(value)?;
        self.pos += 2;
        Ok(())
    }

    /// Write an i32 value (big-endian).
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32::<BigEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Write a u32 value (big-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<BigEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Write an f32 value (big-endian).
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<BigEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Write a usize as an int32 count.
    pub fn write_count(&mut self, count: usize, what: &str) -> Result<()> {
        let value = i32::try_from(count)
            .map_err(|_| Error::invalid(format!("{} count {} exceeds int32", what, count)))?;
        self.write_i32(value)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
