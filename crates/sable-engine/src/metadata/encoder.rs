//! Binary encoding and decoding primitives
//!
//! Little-endian fixed-width integers and length-prefixed UTF-8 strings. A
//! string length of `u32::MAX` encodes a null string.

use thiserror::Error;

/// Length prefix marking a null string or array
pub const NULL_LENGTH: u32 = u32::MAX;

/// Errors that can occur while decoding binary metadata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Unexpected end of input
    #[error("Unexpected end of metadata at offset {0}")]
    UnexpectedEnd(usize),

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// Unknown tag byte
    #[error("Invalid tag {0:#04x} at offset {1}")]
    InvalidTag(u8, usize),

    /// Index outside the referenced table
    #[error("Index {index} out of range for {table} (length {len})")]
    IndexOutOfRange {
        /// Table name
        table: &'static str,
        /// Offending index
        index: u32,
        /// Table length
        len: usize,
    },
}

/// Writer for binary metadata
#[derive(Debug, Default)]
pub struct BinaryWriter {
    /// Internal buffer
    pub(crate) buffer: Vec<u8>,
}

impl BinaryWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Get the bytes written so far
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Current offset (number of bytes written)
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    // ===== Basic Emission =====

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a 16-bit unsigned integer
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 32-bit unsigned integer
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 64-bit unsigned integer
    pub fn emit_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 32-bit float
    pub fn emit_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 64-bit float
    pub fn emit_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit raw bytes
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Emit a length-prefixed string, or the null marker
    pub fn emit_string(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.emit_u32(s.len() as u32);
                self.buffer.extend_from_slice(s.as_bytes());
            }
            None => self.emit_u32(NULL_LENGTH),
        }
    }

    /// Emit a length-prefixed byte blob
    pub fn emit_blob(&mut self, bytes: &[u8]) {
        self.emit_u32(bytes.len() as u32);
        self.buffer.extend_from_slice(bytes);
    }

    /// Emit an optional index, `u32::MAX` standing for `None`
    pub fn emit_optional_index(&mut self, value: Option<u32>) {
        self.emit_u32(value.unwrap_or(u32::MAX));
    }

    /// Overwrite a previously emitted 32-bit value
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// Reader for binary metadata
#[derive(Debug)]
pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there are more bytes to read
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    // ===== Basic Reading =====

    /// Read raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEnd(self.position));
        }
        let bytes = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a 16-bit unsigned integer
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a 32-bit unsigned integer
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a 64-bit unsigned integer
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a 32-bit float
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a 64-bit float
    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Read a length-prefixed string that may be null
    pub fn read_nullable_string(&mut self) -> Result<Option<String>, DecodeError> {
        let len = self.read_u32()?;
        if len == NULL_LENGTH {
            return Ok(None);
        }
        let start = self.position;
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| DecodeError::InvalidUtf8(start))
    }

    /// Read a length-prefixed string; the null marker reads as empty
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        Ok(self.read_nullable_string()?.unwrap_or_default())
    }

    /// Read a length-prefixed byte blob
    pub fn read_blob(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_u32()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Read an optional index written by [`BinaryWriter::emit_optional_index`]
    pub fn read_optional_index(&mut self) -> Result<Option<u32>, DecodeError> {
        let value = self.read_u32()?;
        Ok((value != u32::MAX).then_some(value))
    }
}
