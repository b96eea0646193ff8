//! General error types for the lexing, parsing and cursor stages
use std::fmt::{Display, Formatter};

use crate::coords::Coords;

/// Global result type used throughout the parsing stages
pub type ParserResult<T> = Result<T, ParserError>;

/// Enumeration of the various different stages that can produce an error
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParserStage {
    /// The tokenization stage
    Lexer,
    /// The event production stage
    Parser,
    /// The pull cursor layered on top of the event stream
    Cursor,
}

/// A global enumeration of error details
#[derive(Debug, Clone, PartialEq)]
pub enum ParserErrorDetails {
    EndOfInput,
    StreamFailure,
    NonUtf8InputDetected,
    UnexpectedToken(String),
    PairExpected,
    InvalidObject,
    InvalidArray,
    InvalidRootValue,
    InvalidFile,
    InvalidCharacter(char),
    MatchFailed(String),
    InvalidNumericRepresentation(String),
    InvalidEscapeSequence(String),
    InvalidUnicodeEscapeSequence(String),
}

impl Display for ParserErrorDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfInput => write!(f, "end of input reached"),
            Self::StreamFailure => write!(f, "failure in the underlying stream"),
            Self::NonUtf8InputDetected => write!(f, "non-UTF-8 input detected"),
            Self::UnexpectedToken(t) => write!(f, "unexpected token: {}", t),
            Self::PairExpected => write!(f, "a name/value pair was expected"),
            Self::InvalidObject => write!(f, "invalid object structure"),
            Self::InvalidArray => write!(f, "invalid array structure"),
            Self::InvalidRootValue => write!(f, "invalid root value"),
            Self::InvalidFile => write!(f, "file could not be opened"),
            Self::InvalidCharacter(c) => write!(f, "invalid character found: '{}'", c),
            Self::MatchFailed(s) => write!(f, "match failed: {}", s),
            Self::InvalidNumericRepresentation(s) => write!(f, "invalid number: \"{}\"", s),
            Self::InvalidEscapeSequence(s) => write!(f, "invalid escape sequence: \"{}\"", s),
            Self::InvalidUnicodeEscapeSequence(s) => {
                write!(f, "invalid unicode escape sequence: \"{}\"", s)
            }
        }
    }
}

/// The general error structure
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    /// The originating stage for the error
    pub stage: ParserStage,
    /// The global error details
    pub details: ParserErrorDetails,
    /// Optional input coordinates
    pub coords: Option<Coords>,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.coords {
            Some(coords) => write!(f, "{:?} error: {} at {}", self.stage, self.details, coords),
            None => write!(f, "{:?} error: {}", self.stage, self.details),
        }
    }
}

impl std::error::Error for ParserError {}

#[macro_export]
macro_rules! lexer_error {
    ($details: expr, $coords: expr) => {
        Err($crate::errors::ParserError {
            stage: $crate::errors::ParserStage::Lexer,
            details: $details,
            coords: Some($coords),
        })
    };
    ($details: expr) => {
        Err($crate::errors::ParserError {
            stage: $crate::errors::ParserStage::Lexer,
            details: $details,
            coords: None,
        })
    };
}

#[macro_export]
macro_rules! parser_error {
    ($details: expr, $coords: expr) => {
        Err($crate::errors::ParserError {
            stage: $crate::errors::ParserStage::Parser,
            details: $details,
            coords: Some($coords),
        })
    };
    ($details: expr) => {
        Err($crate::errors::ParserError {
            stage: $crate::errors::ParserStage::Parser,
            details: $details,
            coords: None,
        })
    };
}

#[macro_export]
macro_rules! cursor_error {
    ($details: expr, $coords: expr) => {
        Err($crate::errors::ParserError {
            stage: $crate::errors::ParserStage::Cursor,
            details: $details,
            coords: Some($coords),
        })
    };
    ($details: expr) => {
        Err($crate::errors::ParserError {
            stage: $crate::errors::ParserStage::Cursor,
            details: $details,
            coords: None,
        })
    };
}

/// Failure modes for the typed conversions available on an event
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConvError {
    /// The event cannot be converted into a string
    NotString,
    /// The event does not carry a borrowable string view
    NotStringView,
    /// The event cannot be converted into a byte string
    NotByteString,
    /// The event does not carry a borrowable byte string view
    NotByteStringView,
    /// The event cannot be converted into an integer
    NotInteger,
    /// The event cannot be converted into a double
    NotDouble,
    /// The event cannot be converted into a boolean
    NotBool,
    /// The current event does not begin an array-like value
    NotVector,
}

impl Display for ConvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotString => write!(f, "not a string"),
            Self::NotStringView => write!(f, "not a string view"),
            Self::NotByteString => write!(f, "not a byte string"),
            Self::NotByteStringView => write!(f, "not a byte string view"),
            Self::NotInteger => write!(f, "not an integer"),
            Self::NotDouble => write!(f, "not a double"),
            Self::NotBool => write!(f, "not a bool"),
            Self::NotVector => write!(f, "not a vector"),
        }
    }
}

impl std::error::Error for ConvError {}

/// Result type for event conversions
pub type ConvResult<T> = Result<T, ConvError>;
