//! The DOM decoder.
//!
//! [DomDecoder] is a [Visitor] that materializes the event stream into a
//! [Value] tree using a flat item stack: each open container records the
//! stack offset where its contents begin, and the matching `end_*` event
//! folds everything above that offset into the container.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use crate::bignum::BigNum;
use crate::coords::Coords;
use crate::decoders::{DecoderSelector, Encoding};
use crate::errors::{ParserErrorDetails, ParserResult};
use crate::events::SemanticTag;
use crate::parser_error;
use crate::sax::JsonParser;
use crate::visitor::Visitor;

/// A materialized tree value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// An integer wider than both native ranges
    BigNum(BigNum),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Members in insertion order
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Look up an object member by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(members) => members
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Look up an array element by index
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(values) => values.get(index),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum StructureType {
    Root,
    Object,
    Array,
}

#[derive(Debug)]
struct StackItem {
    name: Option<String>,
    value: Value,
}

/// A visitor that builds a [Value] tree from pushed events
pub struct DomDecoder {
    stack: Vec<StackItem>,
    offsets: Vec<(usize, StructureType)>,
    result: Option<Value>,
}

impl Default for DomDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DomDecoder {
    pub fn new() -> Self {
        DomDecoder {
            stack: Vec::with_capacity(16),
            offsets: vec![(0, StructureType::Root)],
            result: None,
        }
    }

    /// True once a complete value has been materialized
    pub fn is_valid(&self) -> bool {
        self.result.is_some()
    }

    /// Take the materialized value, if any
    pub fn into_result(self) -> Option<Value> {
        self.result
    }

    /// A completed value lands either in the member slot opened by the
    /// enclosing object's last key, or on top of the stack
    fn push_value(&mut self, value: Value) {
        match self.offsets.last() {
            Some(&(_, StructureType::Object)) => {
                if let Some(item) = self.stack.last_mut() {
                    item.value = value;
                }
            }
            _ => self.stack.push(StackItem { name: None, value }),
        }
    }

    fn push_structure(&mut self, value: Value, structure: StructureType) {
        self.push_value(value);
        self.offsets.push((self.stack.len() - 1, structure));
    }

    fn end_structure(&mut self) {
        let Some((offset, structure)) = self.offsets.pop() else {
            return;
        };
        let items: Vec<StackItem> = self.stack.drain(offset + 1..).collect();
        let folded = match structure {
            StructureType::Object => Value::Object(
                items
                    .into_iter()
                    .map(|item| (item.name.unwrap_or_default(), item.value))
                    .collect(),
            ),
            _ => Value::Array(items.into_iter().map(|item| item.value).collect()),
        };
        if let Some(slot) = self.stack.get_mut(offset) {
            slot.value = folded;
        }
    }
}

impl Visitor for DomDecoder {
    fn begin_object(
        &mut self,
        _length: Option<usize>,
        _tag: SemanticTag,
        _ctx: &Coords,
    ) -> ParserResult<bool> {
        self.push_structure(Value::Object(vec![]), StructureType::Object);
        Ok(true)
    }

    fn end_object(&mut self, _ctx: &Coords) -> ParserResult<bool> {
        self.end_structure();
        Ok(true)
    }

    fn begin_array(
        &mut self,
        _length: Option<usize>,
        _tag: SemanticTag,
        _ctx: &Coords,
    ) -> ParserResult<bool> {
        self.push_structure(Value::Array(vec![]), StructureType::Array);
        Ok(true)
    }

    fn end_array(&mut self, _ctx: &Coords) -> ParserResult<bool> {
        self.end_structure();
        Ok(true)
    }

    fn name(&mut self, name: &str, _ctx: &Coords) -> ParserResult<bool> {
        self.stack.push(StackItem {
            name: Some(name.to_string()),
            value: Value::Null,
        });
        Ok(true)
    }

    fn null_value(&mut self, _tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.push_value(Value::Null);
        Ok(true)
    }

    fn bool_value(&mut self, value: bool, _tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.push_value(Value::Bool(value));
        Ok(true)
    }

    fn int64_value(&mut self, value: i64, _tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.push_value(Value::Integer(value));
        Ok(true)
    }

    fn uint64_value(&mut self, value: u64, _tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.push_value(Value::Unsigned(value));
        Ok(true)
    }

    fn half_value(&mut self, bits: u16, _tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.push_value(Value::Float(half::f16::from_bits(bits).to_f64()));
        Ok(true)
    }

    fn double_value(&mut self, value: f64, _tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.push_value(Value::Float(value));
        Ok(true)
    }

    fn string_value(
        &mut self,
        value: &str,
        tag: SemanticTag,
        _ctx: &Coords,
    ) -> ParserResult<bool> {
        let materialized = match tag {
            SemanticTag::BigInteger => match BigNum::from_str(value) {
                Ok(n) => Value::BigNum(n),
                Err(_) => Value::String(value.to_string()),
            },
            _ => Value::String(value.to_string()),
        };
        self.push_value(materialized);
        Ok(true)
    }

    fn byte_string_value(
        &mut self,
        value: &[u8],
        _tag: SemanticTag,
        _ctx: &Coords,
    ) -> ParserResult<bool> {
        self.push_value(Value::Bytes(value.to_vec()));
        Ok(true)
    }

    fn byte_string_ext(&mut self, value: &[u8], _ext_tag: u64, _ctx: &Coords) -> ParserResult<bool> {
        self.push_value(Value::Bytes(value.to_vec()));
        Ok(true)
    }

    fn flush(&mut self) {
        if self.stack.len() == 1 && self.offsets.len() == 1 {
            if let Some(item) = self.stack.pop() {
                self.result = Some(item.value);
            }
        }
    }
}

/// Convenience front-end that parses JSON text straight into a [Value]
pub struct Parser {
    decoders: DecoderSelector,
    encoding: Encoding,
}

impl Default for Parser {
    /// The default encoding is UTF-8
    fn default() -> Self {
        Self {
            decoders: Default::default(),
            encoding: Default::default(),
        }
    }
}

impl Parser {
    /// Create a new instance of the parser using a specific [Encoding]
    pub fn with_encoding(encoding: Encoding) -> Self {
        Self {
            decoders: Default::default(),
            encoding,
        }
    }

    pub fn parse_file<PathLike: AsRef<Path>>(&self, path: PathLike) -> ParserResult<Value> {
        match File::open(&path) {
            Ok(f) => {
                let mut reader = BufReader::new(f);
                let mut chars = self.decoders.new_decoder(&mut reader, self.encoding);
                self.parse(&mut chars)
            }
            Err(_) => {
                parser_error!(ParserErrorDetails::InvalidFile)
            }
        }
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> ParserResult<Value> {
        let mut reader = BufReader::new(bytes);
        let mut chars = self.decoders.default_decoder(&mut reader);
        self.parse(&mut chars)
    }

    pub fn parse_str(&self, str: &str) -> ParserResult<Value> {
        self.parse(&mut str.chars())
    }

    pub fn parse(&self, chars: &mut impl Iterator<Item = char>) -> ParserResult<Value> {
        let mut parser = JsonParser::new(chars);
        let mut decoder = DomDecoder::new();
        parser.parse(&mut decoder)?;
        match decoder.into_result() {
            Some(value) => Ok(value),
            None => parser_error!(ParserErrorDetails::EndOfInput),
        }
    }
}
