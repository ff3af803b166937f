//! Binary parcel buffer
//!
//! A parcel is a flat little-endian byte buffer with a read cursor.
//! Scalars take 4 bytes (8 for 64-bit values). Strings and byte blobs are
//! written as an `i32` byte length followed by the payload, zero padded to
//! a 4-byte boundary. Optional nested values are preceded by an `i32`
//! discriminator: [`VALUE_NULL`] when absent, [`VALUE_OBJECT`] when present.

use core_types::AbilityToken;
use thiserror::Error;

/// Discriminator written before an absent nested value
pub const VALUE_NULL: i32 = -1;

/// Discriminator written before a present nested value
pub const VALUE_OBJECT: i32 = 1;

const ALIGNMENT: usize = 4;

/// Errors raised while reading a parcel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParcelError {
    #[error("Unexpected end of parcel: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Invalid length prefix: {0}")]
    InvalidLength(i32),

    #[error("String is not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid discriminator: {0}")]
    InvalidDiscriminator(i32),

    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("{0} unread bytes after value")]
    TrailingBytes(usize),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: i32 },

    #[error("Length {0} does not fit a length prefix")]
    TooLarge(usize),
}

/// A value that can be written to and read back from a [`Parcel`]
pub trait Parcelable: Sized {
    /// Appends the value to the parcel
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError>;

    /// Reads a value from the parcel's cursor
    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError>;
}

/// Growable binary buffer with a read cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parcel {
    data: Vec<u8>,
    read_pos: usize,
}

impl Parcel {
    /// Creates an empty parcel
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps bytes received from the wire
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, read_pos: 0 }
    }

    /// Returns the written bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the parcel and returns its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Total number of bytes written
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing was written
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes not yet consumed by reads
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }

    /// Moves the read cursor back to the start
    pub fn rewind(&mut self) {
        self.read_pos = 0;
    }

    pub fn write_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_i32(i32::from(value));
    }

    /// Writes a length or count prefix
    ///
    /// Fails without writing anything when `len` exceeds `i32::MAX`.
    pub fn write_len(&mut self, len: usize) -> Result<(), ParcelError> {
        let prefix = i32::try_from(len).map_err(|_| ParcelError::TooLarge(len))?;
        self.write_i32(prefix);
        Ok(())
    }

    /// Writes a length-prefixed blob
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ParcelError> {
        self.write_len(bytes.len())?;
        self.data.extend_from_slice(bytes);
        self.pad();
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string
    pub fn write_string(&mut self, value: &str) -> Result<(), ParcelError> {
        self.write_bytes(value.as_bytes())
    }

    /// Writes a count-prefixed list of strings
    pub fn write_string_vec<S: AsRef<str>>(&mut self, values: &[S]) -> Result<(), ParcelError> {
        self.write_len(values.len())?;
        for value in values {
            self.write_string(value.as_ref())?;
        }
        Ok(())
    }

    pub fn write_token(&mut self, token: &AbilityToken) {
        self.data.extend_from_slice(&token.to_bytes());
    }

    /// Writes a discriminator and, when present, the nested value
    pub fn write_optional<T: Parcelable>(&mut self, value: Option<&T>) -> Result<(), ParcelError> {
        match value {
            Some(inner) => {
                self.write_i32(VALUE_OBJECT);
                inner.marshal(self)
            }
            None => {
                self.write_i32(VALUE_NULL);
                Ok(())
            }
        }
    }

    pub fn read_i32(&mut self) -> Result<i32, ParcelError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ParcelError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, ParcelError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(raw))
    }

    pub fn read_bool(&mut self) -> Result<bool, ParcelError> {
        Ok(self.read_i32()? != 0)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, ParcelError> {
        let len = self.read_len()?;
        let bytes = self.take(len)?.to_vec();
        self.skip_padding(len)?;
        Ok(bytes)
    }

    pub fn read_string(&mut self) -> Result<String, ParcelError> {
        String::from_utf8(self.read_bytes()?).map_err(|_| ParcelError::InvalidUtf8)
    }

    pub fn read_string_vec(&mut self) -> Result<Vec<String>, ParcelError> {
        let count = self.read_len()?;
        // Every string needs at least its 4-byte length prefix.
        let needed = count.saturating_mul(ALIGNMENT);
        if needed > self.remaining() {
            return Err(ParcelError::UnexpectedEof {
                needed,
                remaining: self.remaining(),
            });
        }
        (0..count).map(|_| self.read_string()).collect()
    }

    pub fn read_token(&mut self) -> Result<AbilityToken, ParcelError> {
        let bytes = self.take(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(bytes);
        Ok(AbilityToken::from_bytes(raw))
    }

    /// Reads a discriminator and, when present, the nested value
    pub fn read_optional<T: Parcelable>(&mut self) -> Result<Option<T>, ParcelError> {
        match self.read_i32()? {
            VALUE_NULL => Ok(None),
            VALUE_OBJECT => T::unmarshal(self).map(Some),
            other => Err(ParcelError::InvalidDiscriminator(other)),
        }
    }

    fn read_len(&mut self) -> Result<usize, ParcelError> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| ParcelError::InvalidLength(len))
    }

    fn take(&mut self, needed: usize) -> Result<&[u8], ParcelError> {
        if needed > self.remaining() {
            return Err(ParcelError::UnexpectedEof {
                needed,
                remaining: self.remaining(),
            });
        }
        let start = self.read_pos;
        self.read_pos += needed;
        Ok(&self.data[start..self.read_pos])
    }

    fn pad(&mut self) {
        while self.data.len() % ALIGNMENT != 0 {
            self.data.push(0);
        }
    }

    fn skip_padding(&mut self, len: usize) -> Result<(), ParcelError> {
        let padding = (ALIGNMENT - len % ALIGNMENT) % ALIGNMENT;
        self.take(padding).map(|_| ())
    }
}
