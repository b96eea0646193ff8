//! Event records surfaced by the pull cursor.
//!
//! Each [Event] captures one semantic step of a parse: a structural marker,
//! an object key, or a scalar. String and byte-string payloads are owned by
//! the event (a per-event scratch copy), so a record stays valid for as long
//! as the caller holds it.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

use crate::bignum::BigNum;
use crate::errors::{ConvError, ConvResult};

/// Semantic annotation attached to scalars, distinguishing encodings with
/// identical syntax. Tags never affect the equality of the underlying value;
/// they select conversions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SemanticTag {
    #[default]
    None,
    Undefined,
    DateTime,
    EpochTime,
    BigInteger,
    BigDecimal,
    Base16,
    Base64,
    Base64Url,
    Uri,
    Ext,
    RowMajor,
    ColumnMajor,
}

/// Enumeration of the kinds of event a cursor can surface
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Name,
    String,
    ByteString,
    Null,
    Bool,
    Int64,
    UInt64,
    Half,
    Double,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeginObject => write!(f, "begin_object"),
            Self::EndObject => write!(f, "end_object"),
            Self::BeginArray => write!(f, "begin_array"),
            Self::EndArray => write!(f, "end_array"),
            Self::Name => write!(f, "name"),
            Self::String => write!(f, "string_value"),
            Self::ByteString => write!(f, "byte_string_value"),
            Self::Null => write!(f, "null_value"),
            Self::Bool => write!(f, "bool_value"),
            Self::Int64 => write!(f, "int64_value"),
            Self::UInt64 => write!(f, "uint64_value"),
            Self::Half => write!(f, "half_value"),
            Self::Double => write!(f, "double_value"),
        }
    }
}

/// Payload variants selected by the event kind
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    None,
    /// Announced container length, `None` when unknown
    Container(Option<usize>),
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    /// IEEE-754 binary16 bits
    Half(u16),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// A single parse event together with its semantic tag
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    tag: SemanticTag,
    ext_tag: u64,
    payload: Payload,
}

impl Event {
    pub fn begin_object(length: Option<usize>, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::BeginObject,
            tag,
            ext_tag: 0,
            payload: Payload::Container(length),
        }
    }

    pub fn end_object() -> Self {
        Event {
            kind: EventKind::EndObject,
            tag: SemanticTag::None,
            ext_tag: 0,
            payload: Payload::None,
        }
    }

    pub fn begin_array(length: Option<usize>, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::BeginArray,
            tag,
            ext_tag: 0,
            payload: Payload::Container(length),
        }
    }

    pub fn end_array() -> Self {
        Event {
            kind: EventKind::EndArray,
            tag: SemanticTag::None,
            ext_tag: 0,
            payload: Payload::None,
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Event {
            kind: EventKind::Name,
            tag: SemanticTag::None,
            ext_tag: 0,
            payload: Payload::Text(name.into()),
        }
    }

    pub fn string(value: impl Into<String>, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::String,
            tag,
            ext_tag: 0,
            payload: Payload::Text(value.into()),
        }
    }

    pub fn byte_string(value: impl Into<Vec<u8>>, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::ByteString,
            tag,
            ext_tag: 0,
            payload: Payload::Bytes(value.into()),
        }
    }

    /// A byte string annotated with a format-specific extension tag
    pub fn byte_string_ext(value: impl Into<Vec<u8>>, ext_tag: u64) -> Self {
        Event {
            kind: EventKind::ByteString,
            tag: SemanticTag::Ext,
            ext_tag,
            payload: Payload::Bytes(value.into()),
        }
    }

    pub fn null(tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::Null,
            tag,
            ext_tag: 0,
            payload: Payload::None,
        }
    }

    pub fn bool_value(value: bool, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::Bool,
            tag,
            ext_tag: 0,
            payload: Payload::Bool(value),
        }
    }

    pub fn int64(value: i64, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::Int64,
            tag,
            ext_tag: 0,
            payload: Payload::Int64(value),
        }
    }

    pub fn uint64(value: u64, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::UInt64,
            tag,
            ext_tag: 0,
            payload: Payload::UInt64(value),
        }
    }

    pub fn half(bits: u16, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::Half,
            tag,
            ext_tag: 0,
            payload: Payload::Half(bits),
        }
    }

    pub fn double(value: f64, tag: SemanticTag) -> Self {
        Event {
            kind: EventKind::Double,
            tag,
            ext_tag: 0,
            payload: Payload::Double(value),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn tag(&self) -> SemanticTag {
        self.tag
    }

    /// Extension tag, meaningful only when `tag() == SemanticTag::Ext`
    pub fn ext_tag(&self) -> u64 {
        self.ext_tag
    }

    /// Announced container length for `begin_object`/`begin_array` events,
    /// `None` when unknown or not a container event
    pub fn container_length(&self) -> Option<usize> {
        match self.payload {
            Payload::Container(length) => length,
            _ => None,
        }
    }

    pub(crate) fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Length of a string or byte-string payload, or the announced container
    /// length (0 when unknown)
    pub fn size(&self) -> usize {
        match &self.payload {
            Payload::Text(s) => s.len(),
            Payload::Bytes(b) => b.len(),
            Payload::Container(l) => l.unwrap_or(0),
            _ => 0,
        }
    }

    /// Convert the event into an owned string. Byte strings are encoded
    /// according to the semantic tag, numerics are formatted canonically.
    pub fn get_string(&self) -> ConvResult<String> {
        match &self.payload {
            Payload::Text(s) => Ok(s.clone()),
            Payload::Bytes(b) => Ok(match self.tag {
                SemanticTag::Base16 => encode_base16(b),
                SemanticTag::Base64Url => URL_SAFE.encode(b),
                _ => STANDARD.encode(b),
            }),
            Payload::UInt64(u) => Ok(u.to_string()),
            Payload::Int64(i) => Ok(i.to_string()),
            Payload::Half(bits) => Ok(half::f16::from_bits(*bits).to_f64().to_string()),
            Payload::Double(d) => Ok(d.to_string()),
            Payload::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
            Payload::None if self.kind == EventKind::Null => Ok("null".to_string()),
            _ => Err(ConvError::NotString),
        }
    }

    /// Borrow the event's text, valid only for string and name events
    pub fn get_str(&self) -> ConvResult<&str> {
        match (&self.payload, self.kind) {
            (Payload::Text(s), EventKind::String) | (Payload::Text(s), EventKind::Name) => {
                Ok(s.as_str())
            }
            _ => Err(ConvError::NotStringView),
        }
    }

    /// Borrow the event's bytes, valid only for byte-string events
    pub fn get_bytes(&self) -> ConvResult<&[u8]> {
        match &self.payload {
            Payload::Bytes(b) => Ok(b.as_slice()),
            _ => Err(ConvError::NotByteStringView),
        }
    }

    /// Convert the event into owned bytes. Strings decode according to
    /// their base16/base64/base64url tag.
    pub fn get_byte_string(&self) -> ConvResult<Vec<u8>> {
        match &self.payload {
            Payload::Bytes(b) => Ok(b.clone()),
            Payload::Text(s) => match self.tag {
                SemanticTag::Base16 => decode_base16(s).ok_or(ConvError::NotByteString),
                SemanticTag::Base64 => {
                    STANDARD.decode(s).map_err(|_| ConvError::NotByteString)
                }
                SemanticTag::Base64Url => {
                    URL_SAFE.decode(s).map_err(|_| ConvError::NotByteString)
                }
                _ => Err(ConvError::NotByteString),
            },
            _ => Err(ConvError::NotByteString),
        }
    }

    /// Convert to a signed 64-bit integer. Floating values truncate toward
    /// zero, booleans map to 0/1, strings parse as decimal.
    pub fn get_i64(&self) -> ConvResult<i64> {
        match &self.payload {
            Payload::Text(s) => i64::from_str(s).map_err(|_| ConvError::NotInteger),
            Payload::Half(bits) => Ok(half::f16::from_bits(*bits).to_f64() as i64),
            Payload::Double(d) => Ok(*d as i64),
            Payload::Int64(i) => Ok(*i),
            Payload::UInt64(u) => Ok(*u as i64),
            Payload::Bool(b) => Ok(*b as i64),
            _ => Err(ConvError::NotInteger),
        }
    }

    /// Convert to an unsigned 64-bit integer
    pub fn get_u64(&self) -> ConvResult<u64> {
        match &self.payload {
            Payload::Text(s) => u64::from_str(s).map_err(|_| ConvError::NotInteger),
            Payload::Half(bits) => Ok(half::f16::from_bits(*bits).to_f64() as u64),
            Payload::Double(d) => Ok(*d as u64),
            Payload::Int64(i) => Ok(*i as u64),
            Payload::UInt64(u) => Ok(*u),
            Payload::Bool(b) => Ok(*b as u64),
            _ => Err(ConvError::NotInteger),
        }
    }

    /// Convert to a double. Half values decode per IEEE-754 binary16,
    /// strings parse as floating literals.
    pub fn get_f64(&self) -> ConvResult<f64> {
        match &self.payload {
            Payload::Text(s) => {
                fast_float::parse(s.as_bytes()).map_err(|_| ConvError::NotDouble)
            }
            Payload::Double(d) => Ok(*d),
            Payload::Int64(i) => Ok(*i as f64),
            Payload::UInt64(u) => Ok(*u as f64),
            Payload::Half(bits) => Ok(half::f16::from_bits(*bits).to_f64()),
            _ => Err(ConvError::NotDouble),
        }
    }

    /// Convert to a boolean; numerics compare against zero
    pub fn get_bool(&self) -> ConvResult<bool> {
        match &self.payload {
            Payload::Bool(b) => Ok(*b),
            Payload::Double(d) => Ok(*d != 0.0),
            Payload::Int64(i) => Ok(*i != 0),
            Payload::UInt64(u) => Ok(*u != 0),
            _ => Err(ConvError::NotBool),
        }
    }

    /// Convert to an arbitrary-precision integer. String payloads parse as
    /// signed decimal, floating payloads truncate.
    pub fn get_bignum(&self) -> ConvResult<BigNum> {
        match &self.payload {
            Payload::Text(s) => BigNum::from_str(s).map_err(|_| ConvError::NotInteger),
            Payload::Int64(i) => Ok(BigNum::from(*i)),
            Payload::UInt64(u) => Ok(BigNum::from(*u)),
            Payload::Half(bits) => Ok(BigNum::from(half::f16::from_bits(*bits).to_f64())),
            Payload::Double(d) => Ok(BigNum::from(*d)),
            _ => Err(ConvError::NotInteger),
        }
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn encode_base16(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

fn decode_base16(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    let digits: Vec<u32> = text.chars().map(|c| c.to_digit(16)).collect::<Option<_>>()?;
    Some(
        digits
            .chunks(2)
            .map(|pair| ((pair[0] << 4) | pair[1]) as u8)
            .collect(),
    )
}
