//! Varint Codec
//!
//! Unsigned LEB128 with a 64-bit ceiling, zigzag for signed values, and a
//! cursor over a byte slice that hands out borrowed length-delimited payloads
//! without copying.

use crate::error::WireError;
use kirin_common::limits::MAX_FIELD_LENGTH;

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

pub fn write_varint(buf: &mut Vec<u8>, value: u64) {
    let mut value = value;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Length prefix followed by the payload.
pub fn write_length_delimited(buf: &mut Vec<u8>, payload: &[u8]) {
    write_varint(buf, payload.len() as u64);
    buf.extend_from_slice(payload);
}

pub struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.cursor)
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    pub fn read_byte(&mut self) -> Result<u8, WireError> {
        let byte = *self
            .bytes
            .get(self.cursor)
            .ok_or(WireError::UnexpectedEof {
                offset: self.cursor,
            })?;
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let start = self.cursor;
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_byte()?;
            let chunk = u64::from(byte & 0x7F);
            // The tenth byte may only carry the single remaining bit.
            if shift == 63 && chunk > 1 {
                return Err(WireError::VarintOverflow { offset: start });
            }
            result |= chunk << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 63 {
                return Err(WireError::VarintOverflow { offset: start });
            }
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(WireError::UnexpectedEof {
                offset: self.bytes.len(),
            })?;
        let slice = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], WireError> {
        let length = self.read_varint()?;
        if length > MAX_FIELD_LENGTH as u64 {
            return Err(WireError::FieldTooLong {
                length,
                limit: MAX_FIELD_LENGTH,
            });
        }
        self.read_bytes(length as usize)
    }
}
