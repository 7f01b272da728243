//! Minimal wire reader shared by both schema generations.
//!
//! Module files use a varint / length-delimited record layout: every field
//! is a varint key `(field_number << 3) | wire_type` followed by either a
//! varint value (wire type 0) or a length-prefixed byte run (wire type 2).
//! Nested messages are byte runs decoded with a fresh [`Reader`]. Unknown
//! field numbers are the caller's business; unknown wire types are a
//! [`DecodeError`] because the record boundary can no longer be recovered.

use crate::error::DecodeError;

pub const WIRE_VARINT: u8 = 0;
pub const WIRE_BYTES: u8 = 2;

#[derive(Debug)]
pub enum WireValue<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
}

impl<'a> WireValue<'a> {
    pub fn varint(self) -> Result<u64, DecodeError> {
        match self {
            WireValue::Varint(v) => Ok(v),
            WireValue::Bytes(_) => Err(DecodeError::Shape(
                "expected varint field, found length-delimited".into(),
            )),
        }
    }

    pub fn bytes(self) -> Result<&'a [u8], DecodeError> {
        match self {
            WireValue::Bytes(b) => Ok(b),
            WireValue::Varint(_) => Err(DecodeError::Shape(
                "expected length-delimited field, found varint".into(),
            )),
        }
    }

    pub fn utf8(self) -> Result<&'a str, DecodeError> {
        Ok(std::str::from_utf8(self.bytes()?)?)
    }
}

pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or(DecodeError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn varint(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let b = self.byte()?;
            value |= u64::from(b & 0x7f) << shift;
            if b & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(DecodeError::Varint(self.pos));
            }
        }
    }

    fn slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::Truncated(self.pos))?;
        let run = &self.buf[self.pos..end];
        self.pos = end;
        Ok(run)
    }

    /// Next `(field_number, value)` pair, or `None` at end of buffer.
    pub fn next_field(&mut self) -> Result<Option<(u32, WireValue<'a>)>, DecodeError> {
        if self.is_empty() {
            return Ok(None);
        }
        let key = self.varint()?;
        let field = (key >> 3) as u32;
        let wire_type = (key & 0x7) as u8;
        let value = match wire_type {
            WIRE_VARINT => WireValue::Varint(self.varint()?),
            WIRE_BYTES => {
                let len = self.varint()? as usize;
                WireValue::Bytes(self.slice(len)?)
            }
            other => {
                return Err(DecodeError::WireType {
                    field,
                    wire_type: other,
                })
            }
        };
        Ok(Some((field, value)))
    }
}
