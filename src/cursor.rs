//! The pull cursor layered over the push visitor protocol.
//!
//! [CursorVisitor] sits between a decoder and the caller: every pushed call
//! is captured into an [Event] and answered with a stop signal, suspending
//! the decoder until the caller asks for the next event. Compound pushes
//! (typed arrays, multi-dimensional shape headers) are expanded into
//! per-element events across successive pulls.
use std::ops::BitOr;

use crate::coords::Coords;
use crate::errors::{ConvError, ConvResult, ParserError, ParserResult};
use crate::events::{Event, EventKind, Payload, SemanticTag};
use crate::visitor::{TypedArraySlice, Visitor};

/// Filter predicate evaluated against each captured event and its input
/// position; returning `true` accepts the event for the caller
pub type EventPredicate = dyn Fn(&Event, &Coords) -> bool;

/// Expansion phases for compound events
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
enum ExpansionState {
    #[default]
    Idle,
    TypedArray,
    MultiDim,
    Shape,
}

/// Owned scratch copy of a typed-array push, consumed during expansion
#[derive(Debug, Clone, Default)]
enum TypedScratch {
    #[default]
    None,
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F16(Vec<u16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// One element drawn from a typed-array scratch, widened to its event family
enum Element {
    U(u64),
    I(i64),
    H(u16),
    D(f64),
}

impl TypedScratch {
    fn capture(data: &TypedArraySlice<'_>) -> Self {
        match data {
            TypedArraySlice::U8(s) => Self::U8(s.to_vec()),
            TypedArraySlice::U16(s) => Self::U16(s.to_vec()),
            TypedArraySlice::U32(s) => Self::U32(s.to_vec()),
            TypedArraySlice::U64(s) => Self::U64(s.to_vec()),
            TypedArraySlice::I8(s) => Self::I8(s.to_vec()),
            TypedArraySlice::I16(s) => Self::I16(s.to_vec()),
            TypedArraySlice::I32(s) => Self::I32(s.to_vec()),
            TypedArraySlice::I64(s) => Self::I64(s.to_vec()),
            TypedArraySlice::F16(s) => Self::F16(s.to_vec()),
            TypedArraySlice::F32(s) => Self::F32(s.to_vec()),
            TypedArraySlice::F64(s) => Self::F64(s.to_vec()),
        }
    }

    fn as_slice(&self) -> Option<TypedArraySlice<'_>> {
        match self {
            Self::None => None,
            Self::U8(v) => Some(TypedArraySlice::U8(v)),
            Self::U16(v) => Some(TypedArraySlice::U16(v)),
            Self::U32(v) => Some(TypedArraySlice::U32(v)),
            Self::U64(v) => Some(TypedArraySlice::U64(v)),
            Self::I8(v) => Some(TypedArraySlice::I8(v)),
            Self::I16(v) => Some(TypedArraySlice::I16(v)),
            Self::I32(v) => Some(TypedArraySlice::I32(v)),
            Self::I64(v) => Some(TypedArraySlice::I64(v)),
            Self::F16(v) => Some(TypedArraySlice::F16(v)),
            Self::F32(v) => Some(TypedArraySlice::F32(v)),
            Self::F64(v) => Some(TypedArraySlice::F64(v)),
        }
    }

    fn element(&self, index: usize) -> Option<Element> {
        match self {
            Self::None => None,
            Self::U8(v) => v.get(index).map(|&x| Element::U(x as u64)),
            Self::U16(v) => v.get(index).map(|&x| Element::U(x as u64)),
            Self::U32(v) => v.get(index).map(|&x| Element::U(x as u64)),
            Self::U64(v) => v.get(index).map(|&x| Element::U(x)),
            Self::I8(v) => v.get(index).map(|&x| Element::I(x as i64)),
            Self::I16(v) => v.get(index).map(|&x| Element::I(x as i64)),
            Self::I32(v) => v.get(index).map(|&x| Element::I(x as i64)),
            Self::I64(v) => v.get(index).map(|&x| Element::I(x)),
            Self::F16(v) => v.get(index).map(|&x| Element::H(x)),
            Self::F32(v) => v.get(index).map(|&x| Element::D(x as f64)),
            Self::F64(v) => v.get(index).map(|&x| Element::D(x)),
        }
    }
}

/// Forward a captured event to a sink visitor as the equivalent push call
pub fn replay_event(
    event: &Event,
    visitor: &mut dyn Visitor,
    ctx: &Coords,
) -> ParserResult<bool> {
    match (event.kind(), event.payload()) {
        (EventKind::BeginObject, _) => {
            visitor.begin_object(event.container_length(), event.tag(), ctx)
        }
        (EventKind::EndObject, _) => visitor.end_object(ctx),
        (EventKind::BeginArray, _) => {
            visitor.begin_array(event.container_length(), event.tag(), ctx)
        }
        (EventKind::EndArray, _) => visitor.end_array(ctx),
        (EventKind::Name, Payload::Text(s)) => visitor.name(s, ctx),
        (EventKind::String, Payload::Text(s)) => visitor.string_value(s, event.tag(), ctx),
        (EventKind::ByteString, Payload::Bytes(b)) => {
            if event.tag() == SemanticTag::Ext {
                visitor.byte_string_ext(b, event.ext_tag(), ctx)
            } else {
                visitor.byte_string_value(b, event.tag(), ctx)
            }
        }
        (EventKind::Null, _) => visitor.null_value(event.tag(), ctx),
        (EventKind::Bool, Payload::Bool(v)) => visitor.bool_value(*v, event.tag(), ctx),
        (EventKind::Int64, Payload::Int64(v)) => visitor.int64_value(*v, event.tag(), ctx),
        (EventKind::UInt64, Payload::UInt64(v)) => visitor.uint64_value(*v, event.tag(), ctx),
        (EventKind::Half, Payload::Half(v)) => visitor.half_value(*v, event.tag(), ctx),
        (EventKind::Double, Payload::Double(v)) => visitor.double_value(*v, event.tag(), ctx),
        _ => Ok(true),
    }
}

/// A visitor that captures pushed calls one event at a time.
///
/// Each incoming call stores the event, evaluates the predicate, and
/// reports *stop* upstream exactly when the predicate accepts, so the
/// decoder suspends and the owning cursor surfaces the event.
pub struct CursorVisitor {
    pred: Option<Box<EventPredicate>>,
    event: Event,
    state: ExpansionState,
    data: TypedScratch,
    shape: Vec<usize>,
    index: usize,
}

impl Default for CursorVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorVisitor {
    pub fn new() -> Self {
        CursorVisitor {
            pred: None,
            event: Event::null(SemanticTag::None),
            state: ExpansionState::default(),
            data: TypedScratch::None,
            shape: vec![],
            index: 0,
        }
    }

    pub fn with_filter(pred: impl Fn(&Event, &Coords) -> bool + 'static) -> Self {
        CursorVisitor {
            pred: Some(Box::new(pred)),
            ..Self::new()
        }
    }

    /// Return to the initial state, dropping any expansion in progress
    pub fn reset(&mut self) {
        self.event = Event::null(SemanticTag::None);
        self.state = ExpansionState::default();
        self.data = TypedScratch::None;
        self.shape.clear();
        self.index = 0;
    }

    /// The last captured event
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// True while a compound expansion still has events to deliver
    pub fn in_available(&self) -> bool {
        self.state != ExpansionState::Idle
    }

    fn is_typed_array(&self) -> bool {
        !matches!(self.data, TypedScratch::None)
    }

    /// Produce the next expansion event; returns the same keep-pushing
    /// signal as a visitor method
    pub fn send_available(&mut self, ctx: &Coords) -> ParserResult<bool> {
        match self.state {
            ExpansionState::TypedArray => self.advance_typed_array(ctx),
            ExpansionState::MultiDim | ExpansionState::Shape => self.advance_multi_dim(ctx),
            ExpansionState::Idle => Ok(true),
        }
    }

    fn advance_typed_array(&mut self, ctx: &Coords) -> ParserResult<bool> {
        match self.data.element(self.index) {
            Some(element) => {
                self.index += 1;
                match element {
                    Element::U(v) => self.uint64_value(v, SemanticTag::None, ctx),
                    Element::I(v) => self.int64_value(v, SemanticTag::None, ctx),
                    Element::H(v) => self.half_value(v, SemanticTag::None, ctx),
                    Element::D(v) => self.double_value(v, SemanticTag::None, ctx),
                }
            }
            None => {
                self.state = ExpansionState::Idle;
                self.data = TypedScratch::None;
                self.index = 0;
                self.end_array(ctx)
            }
        }
    }

    fn advance_multi_dim(&mut self, ctx: &Coords) -> ParserResult<bool> {
        if self.state == ExpansionState::MultiDim {
            self.state = ExpansionState::Shape;
            self.begin_array(Some(self.shape.len()), SemanticTag::None, ctx)
        } else if self.index < self.shape.len() {
            let dim = self.shape[self.index] as u64;
            self.index += 1;
            self.uint64_value(dim, SemanticTag::None, ctx)
        } else {
            self.state = ExpansionState::Idle;
            self.shape.clear();
            self.index = 0;
            self.end_array(ctx)
        }
    }

    /// Forward the current event, and any expansion still in flight, into a
    /// sink visitor. A typed array that has not yet delivered elements is
    /// forwarded as one bulk `typed_array` call, preserving compactness
    /// downstream; mid-stream expansions replay element by element.
    pub fn dump(&mut self, sink: &mut dyn Visitor, ctx: &Coords) -> ParserResult<bool> {
        if !self.is_typed_array() {
            return replay_event(&self.event, sink, ctx);
        }
        if self.index != 0 {
            let mut more = replay_event(&self.event, sink, ctx)?;
            while more && self.is_typed_array() {
                match self.data.element(self.index) {
                    Some(element) => {
                        self.index += 1;
                        more = match element {
                            Element::U(v) => sink.uint64_value(v, SemanticTag::None, ctx)?,
                            Element::I(v) => sink.int64_value(v, SemanticTag::None, ctx)?,
                            Element::H(v) => sink.half_value(v, SemanticTag::None, ctx)?,
                            Element::D(v) => sink.double_value(v, SemanticTag::None, ctx)?,
                        };
                    }
                    None => {
                        more = sink.end_array(ctx)?;
                        self.state = ExpansionState::Idle;
                        self.data = TypedScratch::None;
                        self.index = 0;
                    }
                }
            }
            Ok(more)
        } else {
            let more = match self.data.as_slice() {
                Some(slice) => sink.typed_array(slice, self.event.tag(), ctx)?,
                None => true,
            };
            self.state = ExpansionState::Idle;
            self.data = TypedScratch::None;
            Ok(more)
        }
    }

    fn capture(&mut self, event: Event, ctx: &Coords) -> ParserResult<bool> {
        self.event = event;
        let accepted = match &self.pred {
            Some(pred) => pred(&self.event, ctx),
            None => true,
        };
        Ok(!accepted)
    }
}

impl Visitor for CursorVisitor {
    fn begin_object(
        &mut self,
        length: Option<usize>,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.capture(Event::begin_object(length, tag), ctx)
    }

    fn end_object(&mut self, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::end_object(), ctx)
    }

    fn begin_array(
        &mut self,
        length: Option<usize>,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.capture(Event::begin_array(length, tag), ctx)
    }

    fn end_array(&mut self, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::end_array(), ctx)
    }

    fn name(&mut self, name: &str, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::name(name), ctx)
    }

    fn null_value(&mut self, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::null(tag), ctx)
    }

    fn bool_value(&mut self, value: bool, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::bool_value(value, tag), ctx)
    }

    fn int64_value(&mut self, value: i64, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::int64(value, tag), ctx)
    }

    fn uint64_value(&mut self, value: u64, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::uint64(value, tag), ctx)
    }

    fn half_value(&mut self, bits: u16, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::half(bits, tag), ctx)
    }

    fn double_value(&mut self, value: f64, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool> {
        self.capture(Event::double(value, tag), ctx)
    }

    fn string_value(
        &mut self,
        value: &str,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.capture(Event::string(value, tag), ctx)
    }

    fn byte_string_value(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.capture(Event::byte_string(value, tag), ctx)
    }

    fn byte_string_ext(
        &mut self,
        value: &[u8],
        ext_tag: u64,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.capture(Event::byte_string_ext(value, ext_tag), ctx)
    }

    fn typed_array(
        &mut self,
        data: TypedArraySlice<'_>,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.state = ExpansionState::TypedArray;
        self.data = TypedScratch::capture(&data);
        self.index = 0;
        self.begin_array(None, tag, ctx)
    }

    fn begin_multi_dim(
        &mut self,
        shape: &[usize],
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        self.state = ExpansionState::MultiDim;
        self.shape = shape.to_vec();
        self.index = 0;
        self.begin_array(Some(2), tag, ctx)
    }

    fn end_multi_dim(&mut self, ctx: &Coords) -> ParserResult<bool> {
        self.end_array(ctx)
    }
}

/// A resumable producer of visitor calls: the lower edge the cursor drives
/// one event at a time
pub trait EventSource {
    /// Push exactly one event into the visitor, returning the visitor's
    /// keep-pushing verdict. Implementations consume as much input as
    /// needed to produce that single event.
    fn advance(&mut self, visitor: &mut dyn Visitor) -> ParserResult<bool>;

    /// True once the source has no further events to push
    fn finished(&self) -> bool;

    /// Current position within the underlying input
    fn context(&self) -> Coords;
}

/// The pull interface over an event stream
pub trait Cursor {
    /// True when the source is exhausted and no expansion remains
    fn done(&self) -> bool;

    /// The most recent event; meaningless once [Cursor::done] is true
    fn current(&self) -> &Event;

    /// Advance by one event
    fn next(&mut self) -> ParserResult<()>;

    /// Forward the current event into a sink visitor, along with the entire
    /// balanced sub-tree when positioned on `begin_object`/`begin_array`
    fn read_to(&mut self, sink: &mut dyn Visitor) -> ParserResult<()>;

    /// Position of the underlying decoder within its input
    fn context(&self) -> Coords;

    /// Check that the current event can begin an array-like value: either
    /// `begin_array` or a byte string treated as a byte sequence
    fn array_expected(&self) -> ConvResult<()> {
        match self.current().kind() {
            EventKind::BeginArray | EventKind::ByteString => Ok(()),
            _ => Err(ConvError::NotVector),
        }
    }

    /// Layer a filter predicate over this cursor
    fn filter<'a, F>(&'a mut self, pred: F) -> FilterView<'a>
    where
        Self: Sized,
        F: Fn(&Event, &Coords) -> bool + 'a,
    {
        FilterView::new(self, pred)
    }
}

/// Pull cursor over any [EventSource]
pub struct EventCursor<S: EventSource> {
    source: S,
    visitor: CursorVisitor,
    eof: bool,
    failed: bool,
}

impl<S: EventSource> EventCursor<S> {
    /// Create a cursor accepting every event, positioned on the first one
    pub fn new(source: S) -> ParserResult<Self> {
        Self::with_visitor(source, CursorVisitor::new())
    }

    /// Create a cursor whose visitor only surfaces events accepted by the
    /// predicate
    pub fn with_filter(
        source: S,
        pred: impl Fn(&Event, &Coords) -> bool + 'static,
    ) -> ParserResult<Self> {
        Self::with_visitor(source, CursorVisitor::with_filter(pred))
    }

    fn with_visitor(source: S, visitor: CursorVisitor) -> ParserResult<Self> {
        let mut cursor = EventCursor {
            source,
            visitor,
            eof: false,
            failed: false,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    fn advance(&mut self) -> ParserResult<()> {
        loop {
            if self.visitor.in_available() {
                let ctx = self.source.context();
                match self.visitor.send_available(&ctx) {
                    Ok(true) => continue,
                    Ok(false) => return Ok(()),
                    Err(err) => {
                        self.failed = true;
                        return Err(err);
                    }
                }
            }
            if self.source.finished() {
                self.eof = true;
                return Ok(());
            }
            match self.source.advance(&mut self.visitor) {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(err) => {
                    self.failed = true;
                    return Err(err);
                }
            }
        }
    }
}

impl<S: EventSource> Cursor for EventCursor<S> {
    fn done(&self) -> bool {
        (self.eof || self.failed) && !self.visitor.in_available()
    }

    fn current(&self) -> &Event {
        self.visitor.event()
    }

    fn next(&mut self) -> ParserResult<()> {
        if self.done() {
            return Ok(());
        }
        self.advance()
    }

    fn read_to(&mut self, sink: &mut dyn Visitor) -> ParserResult<()> {
        let ctx = self.source.context();
        if self.visitor.is_typed_array() {
            self.visitor.dump(sink, &ctx)?;
            return Ok(());
        }
        let mut depth = 0usize;
        loop {
            match self.current().kind() {
                EventKind::BeginObject | EventKind::BeginArray => depth += 1,
                EventKind::EndObject | EventKind::EndArray => depth = depth.saturating_sub(1),
                _ => {}
            }
            replay_event(self.current(), sink, &self.source.context())?;
            if depth == 0 {
                return Ok(());
            }
            self.next()?;
            if self.done() {
                return Ok(());
            }
        }
    }

    fn context(&self) -> Coords {
        self.source.context()
    }
}

/// A filtering view over an existing cursor. The view settles onto the
/// first accepted event at construction and after each advance; views
/// compose with further predicates through [Cursor::filter] or `|`.
pub struct FilterView<'a> {
    cursor: &'a mut dyn Cursor,
    pred: Box<dyn Fn(&Event, &Coords) -> bool + 'a>,
    pending: Option<ParserError>,
}

impl<'a> FilterView<'a> {
    pub fn new(
        cursor: &'a mut dyn Cursor,
        pred: impl Fn(&Event, &Coords) -> bool + 'a,
    ) -> Self {
        let mut view = FilterView {
            cursor,
            pred: Box::new(pred),
            pending: None,
        };
        view.settle();
        view
    }

    fn settle(&mut self) {
        while !self.cursor.done() && !(self.pred)(self.cursor.current(), &self.cursor.context()) {
            if let Err(err) = self.cursor.next() {
                self.pending = Some(err);
                break;
            }
        }
    }
}

impl Cursor for FilterView<'_> {
    fn done(&self) -> bool {
        self.cursor.done()
    }

    fn current(&self) -> &Event {
        self.cursor.current()
    }

    fn next(&mut self) -> ParserResult<()> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }
        self.cursor.next()?;
        self.settle();
        match self.pending.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn read_to(&mut self, sink: &mut dyn Visitor) -> ParserResult<()> {
        self.cursor.read_to(sink)
    }

    fn context(&self) -> Coords {
        self.cursor.context()
    }
}

impl<'a, F> BitOr<F> for FilterView<'a>
where
    F: Fn(&Event, &Coords) -> bool + 'a,
{
    type Output = FilterView<'a>;

    /// Compose a further predicate; both must accept an event for it to
    /// surface
    fn bitor(self, rhs: F) -> FilterView<'a> {
        let FilterView {
            cursor,
            pred,
            pending,
        } = self;
        let mut view = FilterView {
            cursor,
            pred: Box::new(move |event, ctx| pred(event, ctx) && rhs(event, ctx)),
            pending,
        };
        view.settle();
        view
    }
}

impl<'a, S, F> BitOr<F> for &'a mut EventCursor<S>
where
    S: EventSource + 'a,
    F: Fn(&Event, &Coords) -> bool + 'a,
{
    type Output = FilterView<'a>;

    fn bitor(self, rhs: F) -> FilterView<'a> {
        FilterView::new(self, rhs)
    }
}
