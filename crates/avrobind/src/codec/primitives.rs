//! Primitive encoding/decoding for the Avro binary format.
//!
//! Implements zig-zag varints, length-prefixed bytes/strings, booleans and
//! little-endian floats.

use crate::error::DecodeError;
use crate::limits::{MAX_VARINT_BYTES_INT, MAX_VARINT_BYTES_LONG};

// =============================================================================
// DECODING
// =============================================================================

/// Forward-only cursor for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling. A reader is owned by exactly
/// one decode call at a time.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::TruncatedInput { context })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_fixed(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::TruncatedInput { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads an unsigned base-128 varint of at most `max_bytes` bytes.
    ///
    /// Running out of input before the first byte is `TruncatedInput`;
    /// running out mid-sequence, or exceeding `max_bytes`, is `MalformedVarint`.
    fn read_varint(&mut self, max_bytes: usize, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;

        for i in 0..max_bytes {
            let Some(&byte) = self.data.get(self.pos) else {
                return Err(if i == 0 {
                    DecodeError::TruncatedInput { context }
                } else {
                    DecodeError::MalformedVarint { context }
                });
            };
            self.pos += 1;

            let value = (byte & 0x7F) as u64;
            let shift = 7 * i as u32;
            // The tenth byte may only contribute the top bit of a u64
            if shift == 63 && value > 1 {
                return Err(DecodeError::MalformedVarint { context });
            }
            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }

        Err(DecodeError::MalformedVarint { context })
    }

    /// Reads a zig-zag encoded 32-bit `int`.
    #[inline]
    pub fn read_int(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        let raw = self.read_varint(MAX_VARINT_BYTES_INT, context)?;
        let raw = u32::try_from(raw).map_err(|_| DecodeError::MalformedVarint { context })?;
        Ok(zigzag_decode_32(raw))
    }

    /// Reads a zig-zag encoded 64-bit `long`.
    #[inline]
    pub fn read_long(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        let raw = self.read_varint(MAX_VARINT_BYTES_LONG, context)?;
        Ok(zigzag_decode(raw))
    }

    /// Reads a little-endian f32.
    #[inline]
    pub fn read_float(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        let bytes = self.read_fixed(4, context)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(f32::from_le_bytes(buf))
    }

    /// Reads a little-endian f64.
    #[inline]
    pub fn read_double(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        let bytes = self.read_fixed(8, context)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(buf))
    }

    /// Reads a boolean byte (0x00 or 0x01).
    #[inline]
    pub fn read_bool(&mut self, context: &'static str) -> Result<bool, DecodeError> {
        match self.read_byte(context)? {
            0x00 => Ok(false),
            0x01 => Ok(true),
            value => Err(DecodeError::MalformedBoolean { value }),
        }
    }

    /// Reads a `long`-prefixed byte array, borrowing from the input.
    pub fn read_bytes(&mut self, max_len: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let len = self.read_long(context)?;
        let remaining = self.remaining_len();
        if len < 0 || len as u64 > remaining as u64 {
            return Err(DecodeError::MalformedLength {
                context,
                len,
                remaining,
            });
        }
        let len = len as usize;
        if len > max_len {
            return Err(DecodeError::LengthExceedsLimit {
                context,
                len,
                max: max_len,
            });
        }
        self.read_fixed(len, context)
    }

    /// Reads a `long`-prefixed UTF-8 string, borrowing from the input.
    pub fn read_str(&mut self, max_len: usize, context: &'static str) -> Result<&'a str, DecodeError> {
        let bytes = self.read_bytes(max_len, context)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { context })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes without a length prefix.
    #[inline]
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned base-128 varint.
    #[inline]
    fn write_varint(&mut self, mut value: u64) {
        // Stack buffer batches the writes
        let mut buf = [0u8; MAX_VARINT_BYTES_LONG];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }

    /// Writes a zig-zag encoded `int`.
    pub fn write_int(&mut self, value: i32) {
        self.write_varint(zigzag_encode_32(value) as u64);
    }

    /// Writes a zig-zag encoded `long`.
    pub fn write_long(&mut self, value: i64) {
        self.write_varint(zigzag_encode(value));
    }

    /// Writes a little-endian f32.
    pub fn write_float(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f64.
    pub fn write_double(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a boolean byte.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    /// Writes a `long`-prefixed byte array.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_long(bytes.len() as i64);
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a `long`-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }
}

// =============================================================================
// ZIGZAG ENCODING
// =============================================================================

/// Encodes a signed integer using zigzag encoding.
///
/// Maps negative numbers to odd positive numbers:
/// 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
#[inline]
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Decodes a zigzag-encoded unsigned integer back to signed.
#[inline]
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

/// 32-bit variant of [`zigzag_encode`].
#[inline]
pub fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// 32-bit variant of [`zigzag_decode`].
#[inline]
pub fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}
