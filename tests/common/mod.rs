//! Shared plumbing for the integration tests: a visitor that records every
//! pushed call as an owned event, and a scripted event source for driving
//! cursors with hand-built push sequences.
#![allow(dead_code)]

use quarry_json::coords::Coords;
use quarry_json::cursor::EventSource;
use quarry_json::errors::ParserResult;
use quarry_json::events::{Event, SemanticTag};
use quarry_json::visitor::{TypedArraySlice, Visitor};

/// A sink visitor that records each call it receives
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    /// Number of times a typed array arrived in bulk form rather than
    /// element by element
    pub bulk_typed_arrays: usize,
    pub flushed: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<quarry_json::events::EventKind> {
        self.events.iter().map(|e| e.kind()).collect()
    }
}

impl Visitor for Recorder {
    fn begin_object(
        &mut self,
        length: Option<usize>,
        tag: SemanticTag,
        _ctx: &Coords,
    ) -> ParserResult<bool> {
        self.events.push(Event::begin_object(length, tag));
        Ok(true)
    }

    fn end_object(&mut self, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::end_object());
        Ok(true)
    }

    fn begin_array(
        &mut self,
        length: Option<usize>,
        tag: SemanticTag,
        _ctx: &Coords,
    ) -> ParserResult<bool> {
        self.events.push(Event::begin_array(length, tag));
        Ok(true)
    }

    fn end_array(&mut self, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::end_array());
        Ok(true)
    }

    fn name(&mut self, name: &str, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::name(name));
        Ok(true)
    }

    fn null_value(&mut self, tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::null(tag));
        Ok(true)
    }

    fn bool_value(&mut self, value: bool, tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::bool_value(value, tag));
        Ok(true)
    }

    fn int64_value(&mut self, value: i64, tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::int64(value, tag));
        Ok(true)
    }

    fn uint64_value(&mut self, value: u64, tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::uint64(value, tag));
        Ok(true)
    }

    fn half_value(&mut self, bits: u16, tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::half(bits, tag));
        Ok(true)
    }

    fn double_value(&mut self, value: f64, tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::double(value, tag));
        Ok(true)
    }

    fn string_value(&mut self, value: &str, tag: SemanticTag, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::string(value, tag));
        Ok(true)
    }

    fn byte_string_value(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        _ctx: &Coords,
    ) -> ParserResult<bool> {
        self.events.push(Event::byte_string(value, tag));
        Ok(true)
    }

    fn byte_string_ext(&mut self, value: &[u8], ext_tag: u64, _ctx: &Coords) -> ParserResult<bool> {
        self.events.push(Event::byte_string_ext(value, ext_tag));
        Ok(true)
    }

    fn typed_array(
        &mut self,
        data: TypedArraySlice<'_>,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.bulk_typed_arrays += 1;
        // record the equivalent expanded form so balance checks still hold
        self.begin_array(Some(data.len()), tag, ctx)?;
        match data {
            TypedArraySlice::U8(s) => {
                for &v in s {
                    self.uint64_value(v as u64, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::U16(s) => {
                for &v in s {
                    self.uint64_value(v as u64, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::U32(s) => {
                for &v in s {
                    self.uint64_value(v as u64, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::U64(s) => {
                for &v in s {
                    self.uint64_value(v, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::I8(s) => {
                for &v in s {
                    self.int64_value(v as i64, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::I16(s) => {
                for &v in s {
                    self.int64_value(v as i64, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::I32(s) => {
                for &v in s {
                    self.int64_value(v as i64, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::I64(s) => {
                for &v in s {
                    self.int64_value(v, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::F16(s) => {
                for &v in s {
                    self.half_value(v, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::F32(s) => {
                for &v in s {
                    self.double_value(v as f64, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::F64(s) => {
                for &v in s {
                    self.double_value(v, SemanticTag::None, ctx)?;
                }
            }
        }
        self.end_array(ctx)
    }

    fn flush(&mut self) {
        self.flushed = true;
    }
}

/// One canned push into a visitor
pub type Step = Box<dyn Fn(&mut dyn Visitor, &Coords) -> ParserResult<bool>>;

/// An event source replaying a fixed sequence of visitor calls
pub struct ScriptedSource {
    steps: std::vec::IntoIter<Step>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        ScriptedSource {
            steps: steps.into_iter(),
        }
    }
}

impl EventSource for ScriptedSource {
    fn advance(&mut self, visitor: &mut dyn Visitor) -> ParserResult<bool> {
        match self.steps.next() {
            Some(step) => step(visitor, &Coords::default()),
            None => Ok(true),
        }
    }

    fn finished(&self) -> bool {
        self.steps.len() == 0
    }

    fn context(&self) -> Coords {
        Coords::default()
    }
}
