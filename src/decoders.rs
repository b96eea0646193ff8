//! Byte-stream to `char`-stream decoding.
//!
//! The lexer operates over a stream of `char`s produced by some flavour of
//! iterator. For byte sources, the [DecoderSelector] instantiates a decoder
//! for the requested [Encoding] (at present, only UTF-8 is supported);
//! string input needs no decoder at all.
use chisel_decoders::utf8::Utf8Decoder;
use std::io::BufRead;

/// Enumeration of different supported encoding types
#[derive(Debug, Copy, Clone, Default)]
pub enum Encoding {
    #[default]
    Utf8,
}

/// A factory for creating new instances of `char` iterators, based on a
/// specified encoding type
#[derive(Default)]
pub struct DecoderSelector {}

impl DecoderSelector {
    /// Create and return an instance of the default byte decoder / char iterator
    pub fn default_decoder<'a, Buffer: BufRead>(
        &'a self,
        buffer: &'a mut Buffer,
    ) -> impl Iterator<Item = char> + 'a {
        Utf8Decoder::new(buffer)
    }

    /// Create and return an instance of a given byte decoder / char iterator
    /// based on a specific encoding
    pub fn new_decoder<'a, Buffer: BufRead>(
        &'a self,
        buffer: &'a mut Buffer,
        encoding: Encoding,
    ) -> impl Iterator<Item = char> + 'a {
        match encoding {
            Encoding::Utf8 => Utf8Decoder::new(buffer),
        }
    }
}
