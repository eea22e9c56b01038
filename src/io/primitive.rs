//! Primitive field reads over a BPM byte stream.
//!
//! All multi-byte integers and floats are little-endian. Text fields carry a
//! 7-bit variable-length length prefix (low group first, high bit set on every
//! byte but the last) followed by UTF-8 bytes.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{BpmError, Result};

/// Longest length prefix accepted; five 7-bit groups cover a `u32`.
const MAX_PREFIX_BYTES: usize = 5;

/// Forward-only cursor over a manifest stream.
///
/// Tracks the number of bytes consumed so that format errors can point at the
/// offending offset.
pub struct PrimitiveReader<R: Read> {
    inner: R,
    pos: u64,
}
impl<R: Read> PrimitiveReader<R> {
    /// Wraps a stream, starting the position count at zero.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Returns the underlying stream, positioned after the last consumed byte.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads one unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] if the stream is exhausted.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        let value = self.inner.read_u8()?;
        self.pos += 1;
        Ok(value)
    }

    /// Reads a little-endian signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] if fewer than 4 bytes remain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bpm::PrimitiveReader;
    /// use std::io::Cursor;
    ///
    /// # fn main() -> std::io::Result<()> {
    /// let mut rdr = PrimitiveReader::new(Cursor::new([0xFFu8, 0xFF, 0xFF, 0xFF, 0x07]));
    /// assert_eq!(rdr.read_i32()?, -1);
    /// assert_eq!(rdr.read_u8()?, 7);
    /// assert_eq!(rdr.position(), 5);
    /// assert!(rdr.read_u8().is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn read_i32(&mut self) -> io::Result<i32> {
        let value = self.inner.read_i32::<LittleEndian>()?;
        self.pos += 4;
        Ok(value)
    }

    /// Reads a little-endian unsigned 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> io::Result<u32> {
        let value = self.inner.read_u32::<LittleEndian>()?;
        self.pos += 4;
        Ok(value)
    }

    /// Reads a little-endian IEEE-754 single-precision float.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_f32(&mut self) -> io::Result<f32> {
        let value = self.inner.read_f32::<LittleEndian>()?;
        self.pos += 4;
        Ok(value)
    }

    /// Fills `buf` completely from the stream.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_exact(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    /// Discards exactly `n` bytes.
    pub fn skip(&mut self, n: u64) -> io::Result<()> {
        let copied = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        self.pos += copied;
        if copied < n {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected to skip {n} bytes, stream ended after {copied}"),
            ));
        }
        Ok(())
    }

    /// Reads the variable-length prefix of a text field.
    fn read_string_len(&mut self) -> Result<usize> {
        let start = self.pos;
        let mut len: u64 = 0;
        for group in 0..MAX_PREFIX_BYTES {
            let byte = self.read_u8()?;
            len |= u64::from(byte & 0x7F) << (7 * group);
            if byte & 0x80 == 0 {
                return usize::try_from(len).map_err(|_| BpmError::InvalidString {
                    pos: start,
                    reason: format!("length {len} does not fit in memory"),
                });
            }
        }
        Err(BpmError::InvalidString {
            pos: start,
            reason: format!("length prefix longer than {MAX_PREFIX_BYTES} bytes"),
        })
    }

    /// Reads one length-prefixed UTF-8 text field.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stream ends inside the prefix or the payload ([`BpmError::Io`]
    ///   with [`io::ErrorKind::UnexpectedEof`])
    /// - The prefix runs past five bytes ([`BpmError::InvalidString`])
    /// - The payload is not valid UTF-8 ([`BpmError::InvalidString`])
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bpm::PrimitiveReader;
    /// use std::io::Cursor;
    ///
    /// # fn main() -> bpm::Result<()> {
    /// let mut rdr = PrimitiveReader::new(Cursor::new(b"\x03BPM\x00"));
    /// assert_eq!(rdr.read_string()?, "BPM");
    /// assert_eq!(rdr.read_string()?, "");
    /// assert_eq!(rdr.position(), 5);
    /// # Ok(())
    /// # }
    /// ```
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_string_len()?;
        let start = self.pos;
        let mut buf = Vec::new();
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.pos += read as u64;
        if read < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} string bytes, stream ended after {read}"),
            )
            .into());
        }
        String::from_utf8(buf).map_err(|e| BpmError::InvalidString {
            pos: start,
            reason: e.to_string(),
        })
    }

    /// Consumes one text field without decoding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is malformed ([`BpmError::InvalidString`])
    /// or the stream ends before the payload does ([`BpmError::Io`]). The payload
    /// is not checked for UTF-8.
    pub fn skip_string(&mut self) -> Result<()> {
        let len = self.read_string_len()?;
        self.skip(len as u64)?;
        Ok(())
    }
}
