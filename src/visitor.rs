//! The push protocol driven by the wire-format decoders.
//!
//! A decoder announces each semantic step by invoking one method of
//! [Visitor]. Every method answers with `Ok(true)` to keep the decoder
//! pushing or `Ok(false)` to suspend it; the stop signal is what lets the
//! pull cursor hand control back to its caller between events.
use crate::coords::Coords;
use crate::errors::ParserResult;
use crate::events::SemanticTag;

/// A borrowed view over a homogeneous array delivered in a single push
#[derive(Debug, Copy, Clone)]
pub enum TypedArraySlice<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
    U64(&'a [u64]),
    I8(&'a [i8]),
    I16(&'a [i16]),
    I32(&'a [i32]),
    I64(&'a [i64]),
    /// IEEE-754 binary16 bit patterns
    F16(&'a [u16]),
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl TypedArraySlice<'_> {
    /// Number of elements in the view
    pub fn len(&self) -> usize {
        match self {
            Self::U8(s) => s.len(),
            Self::U16(s) => s.len(),
            Self::U32(s) => s.len(),
            Self::U64(s) => s.len(),
            Self::I8(s) => s.len(),
            Self::I16(s) => s.len(),
            Self::I32(s) => s.len(),
            Self::I64(s) => s.len(),
            Self::F16(s) => s.len(),
            Self::F32(s) => s.len(),
            Self::F64(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The visitor protocol. Decoders push structural markers, object keys and
/// scalars through these methods; implementations return `false` to stop
/// the pusher.
///
/// The compound methods ([Visitor::typed_array], [Visitor::begin_multi_dim])
/// have default bodies that expand into plain structural and scalar calls,
/// so a sink only needs to override them when it can handle the compact
/// form directly.
pub trait Visitor {
    fn begin_object(
        &mut self,
        length: Option<usize>,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool>;

    fn end_object(&mut self, ctx: &Coords) -> ParserResult<bool>;

    fn begin_array(
        &mut self,
        length: Option<usize>,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool>;

    fn end_array(&mut self, ctx: &Coords) -> ParserResult<bool>;

    /// An object member key
    fn name(&mut self, name: &str, ctx: &Coords) -> ParserResult<bool>;

    fn null_value(&mut self, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool>;

    fn bool_value(&mut self, value: bool, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool>;

    fn int64_value(&mut self, value: i64, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool>;

    fn uint64_value(&mut self, value: u64, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool>;

    /// A half-precision value, delivered as its binary16 bits
    fn half_value(&mut self, bits: u16, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool>;

    fn double_value(&mut self, value: f64, tag: SemanticTag, ctx: &Coords) -> ParserResult<bool>;

    fn string_value(&mut self, value: &str, tag: SemanticTag, ctx: &Coords)
        -> ParserResult<bool>;

    fn byte_string_value(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool>;

    /// A byte string carrying a format-specific extension tag
    fn byte_string_ext(&mut self, value: &[u8], ext_tag: u64, ctx: &Coords)
        -> ParserResult<bool>;

    /// A homogeneous array delivered as a single contiguous view. The
    /// default expansion produces `begin_array`, one scalar per element,
    /// then `end_array`.
    fn typed_array(
        &mut self,
        data: TypedArraySlice<'_>,
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        let mut more = self.begin_array(Some(data.len()), tag, ctx)?;
        macro_rules! expand {
            ($slice:expr, $method:ident, $ty:ty) => {
                for &v in $slice {
                    if !more {
                        break;
                    }
                    more = self.$method(v as $ty, SemanticTag::None, ctx)?;
                }
            };
        }
        match data {
            TypedArraySlice::U8(s) => expand!(s, uint64_value, u64),
            TypedArraySlice::U16(s) => expand!(s, uint64_value, u64),
            TypedArraySlice::U32(s) => expand!(s, uint64_value, u64),
            TypedArraySlice::U64(s) => expand!(s, uint64_value, u64),
            TypedArraySlice::I8(s) => expand!(s, int64_value, i64),
            TypedArraySlice::I16(s) => expand!(s, int64_value, i64),
            TypedArraySlice::I32(s) => expand!(s, int64_value, i64),
            TypedArraySlice::I64(s) => expand!(s, int64_value, i64),
            TypedArraySlice::F16(s) => {
                for &v in s {
                    if !more {
                        break;
                    }
                    more = self.half_value(v, SemanticTag::None, ctx)?;
                }
            }
            TypedArraySlice::F32(s) => expand!(s, double_value, f64),
            TypedArraySlice::F64(s) => expand!(s, double_value, f64),
        }
        if more {
            more = self.end_array(ctx)?;
        }
        Ok(more)
    }

    /// The shape header of a multi-dimensional array. The default expansion
    /// wraps shape and body in a two-element array: `begin_array(2)`, then
    /// the shape as a nested array of sizes; the body array follows from
    /// the decoder, and [Visitor::end_multi_dim] closes the wrapper.
    fn begin_multi_dim(
        &mut self,
        shape: &[usize],
        tag: SemanticTag,
        ctx: &Coords,
    ) -> ParserResult<bool> {
        let mut more = self.begin_array(Some(2), tag, ctx)?;
        if more {
            more = self.begin_array(Some(shape.len()), SemanticTag::None, ctx)?;
        }
        for &dim in shape {
            if !more {
                break;
            }
            more = self.uint64_value(dim as u64, SemanticTag::None, ctx)?;
        }
        if more {
            more = self.end_array(ctx)?;
        }
        Ok(more)
    }

    fn end_multi_dim(&mut self, ctx: &Coords) -> ParserResult<bool> {
        self.end_array(ctx)
    }

    /// Signal that the decoder has delivered everything it has
    fn flush(&mut self) {}
}
