//! Schema-Driven Tag Dispatch
//!
//! Every message in a library is a sequence of `(key, value)` pairs where the
//! key is the varint `tag << 3 | wire_type`. Instead of a hand-written parser
//! per message, each message type is described by a static [`MessageSchema`]
//! (its field table) and one generic reader interprets any of them:
//!
//! - fields whose tag is not in the table are skipped by wire type, so
//!   libraries written by a newer writer still load;
//! - a known tag arriving with the wrong wire type is an error;
//! - required fields are checked once, after the whole message is scanned;
//! - length-delimited payloads are borrowed, and nested messages are only
//!   decoded when an accessor asks for them.
//!
//! [`MessageWriter`] is the encoding side.

use crate::error::WireError;
use crate::varint::{ByteReader, write_length_delimited, write_varint, zigzag_decode, zigzag_encode};
use kirin_common::limits::MAX_MESSAGE_NESTING;
use smallvec::SmallVec;

// =============================================================================
// Field tables
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    pub fn bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }

    pub fn from_bits(bits: u8) -> Option<WireType> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

#[derive(Copy, Clone, Debug)]
pub struct FieldSpec {
    pub tag: u32,
    pub name: &'static str,
    pub wire: WireType,
    pub cardinality: Cardinality,
}

impl FieldSpec {
    pub const fn optional(tag: u32, name: &'static str, wire: WireType) -> Self {
        Self {
            tag,
            name,
            wire,
            cardinality: Cardinality::Optional,
        }
    }

    pub const fn required(tag: u32, name: &'static str, wire: WireType) -> Self {
        Self {
            tag,
            name,
            wire,
            cardinality: Cardinality::Required,
        }
    }

    pub const fn repeated(tag: u32, name: &'static str, wire: WireType) -> Self {
        Self {
            tag,
            name,
            wire,
            cardinality: Cardinality::Repeated,
        }
    }
}

#[derive(Debug)]
pub struct MessageSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl MessageSchema {
    pub fn field(&self, tag: u32) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.tag == tag)
    }

    fn field_name(&self, tag: u32) -> &'static str {
        self.field(tag).map_or("<unknown>", |field| field.name)
    }

    /// Scan a top-level message.
    pub fn decode<'a>(&'static self, bytes: &'a [u8]) -> Result<Message<'a>, WireError> {
        self.decode_at_depth(bytes, 0)
    }

    fn decode_at_depth<'a>(&'static self, bytes: &'a [u8], depth: usize) -> Result<Message<'a>, WireError> {
        if depth > MAX_MESSAGE_NESTING {
            return Err(WireError::NestingTooDeep {
                limit: MAX_MESSAGE_NESTING,
            });
        }
        let mut reader = ByteReader::new(bytes);
        let mut values = SmallVec::new();
        while !reader.is_at_end() {
            let key = reader.read_varint()?;
            let tag = (key >> 3) as u32;
            let bits = (key & 0x7) as u8;
            let wire = WireType::from_bits(bits).ok_or(WireError::UnsupportedWireType {
                message: self.name,
                tag,
                wire_type: bits,
            })?;

            let Some(field) = self.field(tag) else {
                skip_field(&mut reader, wire)?;
                continue;
            };
            if field.wire != wire {
                return Err(WireError::WireTypeMismatch {
                    message: self.name,
                    field: field.name,
                    found: bits,
                    expected: field.wire.bits(),
                });
            }
            let value = match wire {
                WireType::Varint => FieldValue::Varint(reader.read_varint()?),
                WireType::LengthDelimited => FieldValue::Bytes(reader.read_length_delimited()?),
                WireType::Fixed64 => FieldValue::Bytes(reader.read_bytes(8)?),
                WireType::Fixed32 => FieldValue::Bytes(reader.read_bytes(4)?),
            };
            values.push((tag, value));
        }

        for field in self.fields {
            if field.cardinality == Cardinality::Required && !values.iter().any(|(tag, _)| *tag == field.tag) {
                return Err(WireError::MissingField {
                    message: self.name,
                    field: field.name,
                });
            }
        }

        Ok(Message {
            schema: self,
            values,
            depth,
        })
    }
}

fn skip_field(reader: &mut ByteReader<'_>, wire: WireType) -> Result<(), WireError> {
    match wire {
        WireType::Varint => reader.read_varint().map(drop),
        WireType::Fixed64 => reader.read_bytes(8).map(drop),
        WireType::LengthDelimited => reader.read_length_delimited().map(drop),
        WireType::Fixed32 => reader.read_bytes(4).map(drop),
    }
}

// =============================================================================
// Decoded messages
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
}

/// One scanned message: the known fields in wire order, payloads borrowed.
#[derive(Debug)]
pub struct Message<'a> {
    schema: &'static MessageSchema,
    values: SmallVec<[(u32, FieldValue<'a>); 8]>,
    depth: usize,
}

impl<'a> Message<'a> {
    pub fn schema(&self) -> &'static MessageSchema {
        self.schema
    }

    pub fn has(&self, tag: u32) -> bool {
        self.values.iter().any(|(t, _)| *t == tag)
    }

    /// Last occurrence wins for singular fields.
    fn last(&self, tag: u32) -> Option<FieldValue<'a>> {
        self.values
            .iter()
            .rev()
            .find(|(t, _)| *t == tag)
            .map(|(_, value)| *value)
    }

    fn missing(&self, tag: u32) -> WireError {
        WireError::MissingField {
            message: self.schema.name,
            field: self.schema.field_name(tag),
        }
    }

    pub fn opt_varint(&self, tag: u32) -> Option<u64> {
        match self.last(tag) {
            Some(FieldValue::Varint(value)) => Some(value),
            _ => None,
        }
    }

    pub fn varint(&self, tag: u32) -> Result<u64, WireError> {
        self.opt_varint(tag).ok_or_else(|| self.missing(tag))
    }

    /// Absent means `0`.
    pub fn varint_or_default(&self, tag: u32) -> u64 {
        self.opt_varint(tag).unwrap_or(0)
    }

    pub fn sint(&self, tag: u32) -> Result<i64, WireError> {
        self.varint(tag).map(zigzag_decode)
    }

    /// Absent means `false`.
    pub fn bool(&self, tag: u32) -> bool {
        self.varint_or_default(tag) != 0
    }

    /// A table index: must fit in `u32`.
    pub fn index(&self, tag: u32) -> Result<u32, WireError> {
        let value = self.varint(tag)?;
        self.narrow(tag, value)
    }

    pub fn opt_index(&self, tag: u32) -> Result<Option<u32>, WireError> {
        self.opt_varint(tag)
            .map(|value| self.narrow(tag, value))
            .transpose()
    }

    pub fn repeated_indices(&self, tag: u32) -> Result<Vec<u32>, WireError> {
        self.repeated_varints(tag)
            .map(|value| self.narrow(tag, value))
            .collect()
    }

    fn narrow(&self, tag: u32, value: u64) -> Result<u32, WireError> {
        u32::try_from(value).map_err(|_| WireError::InvalidValue {
            message: self.schema.name,
            field: self.schema.field_name(tag),
            value,
        })
    }

    /// Decode an enumeration stored as a varint.
    pub fn enumeration<T>(&self, tag: u32, from: impl Fn(u64) -> Option<T>) -> Result<T, WireError> {
        let value = self.varint_or_default(tag);
        from(value).ok_or(WireError::InvalidValue {
            message: self.schema.name,
            field: self.schema.field_name(tag),
            value,
        })
    }

    pub fn opt_bytes(&self, tag: u32) -> Option<&'a [u8]> {
        match self.last(tag) {
            Some(FieldValue::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn bytes(&self, tag: u32) -> Result<&'a [u8], WireError> {
        self.opt_bytes(tag).ok_or_else(|| self.missing(tag))
    }

    pub fn opt_message(&self, tag: u32, schema: &'static MessageSchema) -> Result<Option<Message<'a>>, WireError> {
        self.opt_bytes(tag)
            .map(|bytes| schema.decode_at_depth(bytes, self.depth + 1))
            .transpose()
    }

    pub fn message(&self, tag: u32, schema: &'static MessageSchema) -> Result<Message<'a>, WireError> {
        self.opt_message(tag, schema)?.ok_or_else(|| self.missing(tag))
    }

    pub fn repeated_varints(&self, tag: u32) -> impl Iterator<Item = u64> + '_ {
        self.values.iter().filter_map(move |(t, value)| match value {
            FieldValue::Varint(value) if *t == tag => Some(*value),
            _ => None,
        })
    }

    pub fn repeated_bytes(&self, tag: u32) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.values.iter().filter_map(move |(t, value)| match value {
            FieldValue::Bytes(bytes) if *t == tag => Some(*bytes),
            _ => None,
        })
    }

    pub fn repeated_messages(&self, tag: u32, schema: &'static MessageSchema) -> Result<Vec<Message<'a>>, WireError> {
        self.repeated_bytes(tag)
            .map(|bytes| schema.decode_at_depth(bytes, self.depth + 1))
            .collect()
    }

    /// The first tag of `alternatives` present in the message.
    pub fn oneof(&self, alternatives: &[u32]) -> Result<u32, WireError> {
        self.values
            .iter()
            .map(|(tag, _)| *tag)
            .find(|tag| alternatives.contains(tag))
            .ok_or(WireError::EmptyOneof {
                message: self.schema.name,
            })
    }
}

// =============================================================================
// Writer
// =============================================================================

#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, tag: u32, wire: WireType) {
        write_varint(&mut self.buf, (u64::from(tag) << 3) | u64::from(wire.bits()));
    }

    pub fn varint(&mut self, tag: u32, value: u64) -> &mut Self {
        self.key(tag, WireType::Varint);
        write_varint(&mut self.buf, value);
        self
    }

    pub fn opt_varint(&mut self, tag: u32, value: Option<u64>) -> &mut Self {
        if let Some(value) = value {
            self.varint(tag, value);
        }
        self
    }

    pub fn sint(&mut self, tag: u32, value: i64) -> &mut Self {
        self.varint(tag, zigzag_encode(value))
    }

    /// Only `true` is written; absence reads back as `false`.
    pub fn bool(&mut self, tag: u32, value: bool) -> &mut Self {
        if value {
            self.varint(tag, 1);
        }
        self
    }

    pub fn bytes(&mut self, tag: u32, payload: &[u8]) -> &mut Self {
        self.key(tag, WireType::LengthDelimited);
        write_length_delimited(&mut self.buf, payload);
        self
    }

    pub fn string(&mut self, tag: u32, value: &str) -> &mut Self {
        self.bytes(tag, value.as_bytes())
    }

    pub fn message(&mut self, tag: u32, message: MessageWriter) -> &mut Self {
        self.bytes(tag, &message.buf)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
