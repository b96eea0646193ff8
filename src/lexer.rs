//! Tokenizer for JSON text, operating over a stream of `char`s.
//!
//! Integer literals are classified by range: values that fit `u64`/`i64`
//! become native tokens, anything wider is carried as its decimal text so
//! the parser can deliver it with full fidelity.
use crate::coords::{Coords, Span};
use crate::errors::{ParserErrorDetails, ParserResult};
use crate::lexer_error;

/// Default capacity for the internal scratch buffer
const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Enumeration of valid JSON tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Colon,
    Comma,
    Str(String),
    /// A non-negative integer that fits `u64`
    Unsigned(u64),
    /// A negative integer that fits `i64`
    Integer(i64),
    Float(f64),
    /// An integer literal outside both native ranges, kept as decimal text
    BigInteger(String),
    Bool(bool),
    Null,
    EndOfInput,
}

/// A packed token consists of a [Token] and the [Span] associated with it
pub type PackedToken = (Token, Span);

/// Convenience macro for packing tokens along with their positional information
macro_rules! packed_token {
    ($t:expr, $s:expr, $e:expr) => {
        ($t, Span { start: $s, end: $e })
    };
    ($t:expr, $s:expr) => {
        ($t, Span { start: $s, end: $s })
    };
}

/// A lexer producing [PackedToken]s from an underlying `char` iterator
pub struct Lexer<I: Iterator<Item = char>> {
    /// The input character stream
    input: I,
    /// Single-character lookahead
    lookahead: Option<char>,
    /// Coordinates of the most recently consumed character
    coords: Coords,
    /// Scratch buffer for strings and numbers
    buffer: String,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(input: I) -> Self {
        Lexer {
            input,
            lookahead: None,
            coords: Coords::default(),
            buffer: String::with_capacity(DEFAULT_BUFFER_CAPACITY),
        }
    }

    /// Coordinates of the last character consumed from the input
    pub fn coords(&self) -> Coords {
        self.coords
    }

    /// Look at the next character without consuming it
    fn peek(&mut self) -> Option<char> {
        if self.lookahead.is_none() {
            self.lookahead = self.input.next();
        }
        self.lookahead
    }

    /// Consume the next character, updating the input coordinates
    fn advance(&mut self) -> Option<char> {
        let c = self.lookahead.take().or_else(|| self.input.next());
        if let Some(c) = c {
            self.coords.advance(c == '\n');
        }
        c
    }

    /// Consume the next [Token] from the input
    pub fn consume(&mut self) -> ParserResult<PackedToken> {
        loop {
            match self.advance() {
                None => return Ok(packed_token!(Token::EndOfInput, self.coords)),
                Some(c) if c.is_whitespace() => continue,
                Some('{') => return Ok(packed_token!(Token::StartObject, self.coords)),
                Some('}') => return Ok(packed_token!(Token::EndObject, self.coords)),
                Some('[') => return Ok(packed_token!(Token::StartArray, self.coords)),
                Some(']') => return Ok(packed_token!(Token::EndArray, self.coords)),
                Some(':') => return Ok(packed_token!(Token::Colon, self.coords)),
                Some(',') => return Ok(packed_token!(Token::Comma, self.coords)),
                Some('"') => return self.match_string(),
                Some('n') => return self.match_literal("ull", Token::Null),
                Some('t') => return self.match_literal("rue", Token::Bool(true)),
                Some('f') => return self.match_literal("alse", Token::Bool(false)),
                Some(c) if c == '-' || c.is_ascii_digit() => return self.match_number(c),
                Some(c) => {
                    return lexer_error!(ParserErrorDetails::InvalidCharacter(c), self.coords)
                }
            }
        }
    }

    /// Consume and match (exactly) the remaining characters of a literal
    /// whose first character has already been consumed
    fn match_literal(&mut self, rest: &str, token: Token) -> ParserResult<PackedToken> {
        let start = self.coords;
        for expected in rest.chars() {
            match self.advance() {
                Some(c) if c == expected => (),
                Some(c) => {
                    return lexer_error!(
                        ParserErrorDetails::MatchFailed(format!(
                            "was looking for '{}', found '{}'",
                            expected, c
                        )),
                        self.coords
                    )
                }
                None => return lexer_error!(ParserErrorDetails::EndOfInput, self.coords),
            }
        }
        Ok(packed_token!(token, start, self.coords))
    }

    /// Match a string token, validating and decoding escape sequences so
    /// the token carries the final character content
    fn match_string(&mut self) -> ParserResult<PackedToken> {
        let start = self.coords;
        self.buffer.clear();
        loop {
            match self.advance() {
                None => return lexer_error!(ParserErrorDetails::EndOfInput, self.coords),
                Some('"') => break,
                Some('\\') => {
                    let decoded = self.match_escape_sequence()?;
                    self.buffer.push(decoded);
                }
                Some(c) if (c as u32) < 0x20 => {
                    return lexer_error!(ParserErrorDetails::InvalidCharacter(c), self.coords)
                }
                Some(c) => self.buffer.push(c),
            }
        }
        Ok(packed_token!(
            Token::Str(self.buffer.clone()),
            start,
            self.coords
        ))
    }

    /// Match a single escape sequence, returning the character it denotes
    fn match_escape_sequence(&mut self) -> ParserResult<char> {
        match self.advance() {
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('b') => Ok('\u{0008}'),
            Some('f') => Ok('\u{000c}'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('u') => self.match_unicode_escape_sequence(),
            Some(c) => lexer_error!(
                ParserErrorDetails::InvalidEscapeSequence(format!("\\{}", c)),
                self.coords
            ),
            None => lexer_error!(ParserErrorDetails::EndOfInput, self.coords),
        }
    }

    /// Match a `uXXXX` escape, combining surrogate pairs into a single
    /// character
    fn match_unicode_escape_sequence(&mut self) -> ParserResult<char> {
        let high = self.match_hex_quad()?;
        if (0xd800..=0xdbff).contains(&high) {
            // expect the low half of a surrogate pair
            if self.advance() != Some('\\') || self.advance() != Some('u') {
                return lexer_error!(
                    ParserErrorDetails::InvalidUnicodeEscapeSequence(format!("\\u{:04x}", high)),
                    self.coords
                );
            }
            let low = self.match_hex_quad()?;
            if !(0xdc00..=0xdfff).contains(&low) {
                return lexer_error!(
                    ParserErrorDetails::InvalidUnicodeEscapeSequence(format!(
                        "\\u{:04x}\\u{:04x}",
                        high, low
                    )),
                    self.coords
                );
            }
            let code = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
            return char::from_u32(code).ok_or(()).or_else(|_| {
                lexer_error!(
                    ParserErrorDetails::InvalidUnicodeEscapeSequence(format!(
                        "\\u{:04x}\\u{:04x}",
                        high, low
                    )),
                    self.coords
                )
            });
        }
        char::from_u32(high).ok_or(()).or_else(|_| {
            lexer_error!(
                ParserErrorDetails::InvalidUnicodeEscapeSequence(format!("\\u{:04x}", high)),
                self.coords
            )
        })
    }

    fn match_hex_quad(&mut self) -> ParserResult<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            match self.advance() {
                Some(c) => match c.to_digit(16) {
                    Some(d) => code = (code << 4) | d,
                    None => {
                        return lexer_error!(
                            ParserErrorDetails::InvalidUnicodeEscapeSequence(c.to_string()),
                            self.coords
                        )
                    }
                },
                None => return lexer_error!(ParserErrorDetails::EndOfInput, self.coords),
            }
        }
        Ok(code)
    }

    /// Match a numeric token. Integer literals are range-classified;
    /// anything with a fraction or exponent parses as a double.
    fn match_number(&mut self, first: char) -> ParserResult<PackedToken> {
        let start = self.coords;
        self.buffer.clear();
        self.buffer.push(first);
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {
                    self.buffer.push(c);
                    self.advance();
                }
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.buffer.push(c);
                    self.advance();
                }
                '+' | '-' if matches!(self.buffer.chars().last(), Some('e') | Some('E')) => {
                    self.buffer.push(c);
                    self.advance();
                }
                _ => break,
            }
        }

        let digits = self.buffer.strip_prefix('-').unwrap_or(&self.buffer);
        let integral = digits
            .split(|c| c == '.' || c == 'e' || c == 'E')
            .next()
            .unwrap_or("");
        if integral.is_empty() || (integral.len() > 1 && integral.starts_with('0')) {
            return lexer_error!(
                ParserErrorDetails::InvalidNumericRepresentation(self.buffer.clone()),
                start
            );
        }

        if is_float {
            return match fast_float::parse(self.buffer.as_bytes()) {
                Ok(n) => Ok(packed_token!(Token::Float(n), start, self.coords)),
                Err(_) => lexer_error!(
                    ParserErrorDetails::InvalidNumericRepresentation(self.buffer.clone()),
                    start
                ),
            };
        }
        let token = if self.buffer.starts_with('-') {
            match self.buffer.parse::<i64>() {
                Ok(i) => Token::Integer(i),
                Err(_) => Token::BigInteger(self.buffer.clone()),
            }
        } else {
            match self.buffer.parse::<u64>() {
                Ok(u) => Token::Unsigned(u),
                Err(_) => Token::BigInteger(self.buffer.clone()),
            }
        };
        Ok(packed_token!(token, start, self.coords))
    }
}
