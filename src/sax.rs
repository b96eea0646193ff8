//! The streaming JSON parser.
//!
//! [JsonParser] pushes events into any [Visitor] as it consumes tokens.
//! Parsing state lives in an explicit container stack rather than the call
//! stack, so the parser can be driven one event at a time and a pull cursor
//! can suspend and resume it between events.
use crate::coords::{Coords, Span};
use crate::cursor::{EventCursor, EventSource};
use crate::errors::{ParserErrorDetails, ParserResult};
use crate::events::{Event, SemanticTag};
use crate::lexer::{Lexer, Token};
use crate::parser_error;
use crate::visitor::Visitor;

/// Containers open at any point during the parse
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Structure {
    Object,
    Array,
}

/// What the grammar allows at the current position
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    /// Expecting the root value
    Start,
    /// Expecting a value (after a comma or colon)
    Value,
    /// Expecting the first value of an array, or its immediate end
    ValueOrEnd,
    /// Expecting an object key or the object's end
    NameOrEnd,
    /// Expecting the colon between a key and its value
    Colon,
    /// Expecting a comma or the end of the enclosing container
    CommaOrEnd,
    /// The root value is complete
    Finished,
}

/// Streaming push parser over a `char` iterator
pub struct JsonParser<I: Iterator<Item = char>> {
    lexer: Lexer<I>,
    stack: Vec<Structure>,
    state: State,
}

impl<I: Iterator<Item = char>> JsonParser<I> {
    pub fn new(input: I) -> Self {
        JsonParser {
            lexer: Lexer::new(input),
            stack: vec![],
            state: State::Start,
        }
    }

    /// True once the root value has been fully delivered
    pub fn finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Position of the lexer within the input
    pub fn coords(&self) -> Coords {
        self.lexer.coords()
    }

    /// Push the whole document through the visitor, honoring its stop
    /// signal, and flush it at the end
    pub fn parse(&mut self, visitor: &mut dyn Visitor) -> ParserResult<()> {
        let mut more = true;
        while more && !self.finished() {
            more = self.step(visitor)?;
        }
        if more {
            // drains trailing whitespace, rejects trailing garbage
            self.step(visitor)?;
        }
        visitor.flush();
        Ok(())
    }

    /// Consume tokens until exactly one event has been pushed, returning
    /// the visitor's keep-pushing verdict
    pub fn step(&mut self, visitor: &mut dyn Visitor) -> ParserResult<bool> {
        loop {
            let (token, span) = self.lexer.consume()?;
            match self.state {
                State::Start | State::Value | State::ValueOrEnd => {
                    match token {
                        Token::StartObject => {
                            self.stack.push(Structure::Object);
                            self.state = State::NameOrEnd;
                            return visitor.begin_object(None, SemanticTag::None, &span.start);
                        }
                        Token::StartArray => {
                            self.stack.push(Structure::Array);
                            self.state = State::ValueOrEnd;
                            return visitor.begin_array(None, SemanticTag::None, &span.start);
                        }
                        Token::EndArray if self.state == State::ValueOrEnd => {
                            self.stack.pop();
                            self.close_value();
                            return visitor.end_array(&span.start);
                        }
                        Token::EndOfInput if self.state == State::Start => {
                            self.state = State::Finished;
                            return Ok(true);
                        }
                        Token::Str(_)
                        | Token::Unsigned(_)
                        | Token::Integer(_)
                        | Token::Float(_)
                        | Token::BigInteger(_)
                        | Token::Bool(_)
                        | Token::Null => {
                            self.close_value();
                            return self.emit_scalar(token, span, visitor);
                        }
                        _ => {
                            return parser_error!(
                                self.value_error_details(&token),
                                span.start
                            )
                        }
                    }
                }
                State::NameOrEnd => match token {
                    Token::Str(name) => {
                        self.state = State::Colon;
                        return visitor.name(&name, &span.start);
                    }
                    Token::EndObject => {
                        self.stack.pop();
                        self.close_value();
                        return visitor.end_object(&span.start);
                    }
                    _ => {
                        return parser_error!(ParserErrorDetails::InvalidObject, span.start);
                    }
                },
                State::Colon => match token {
                    Token::Colon => self.state = State::Value,
                    _ => return parser_error!(ParserErrorDetails::PairExpected, span.start),
                },
                State::CommaOrEnd => match (self.stack.last(), token) {
                    (Some(Structure::Object), Token::Comma) => self.state = State::NameOrEnd,
                    (Some(Structure::Object), Token::EndObject) => {
                        self.stack.pop();
                        self.close_value();
                        return visitor.end_object(&span.start);
                    }
                    (Some(Structure::Object), _) => {
                        return parser_error!(ParserErrorDetails::InvalidObject, span.start)
                    }
                    (Some(Structure::Array), Token::Comma) => self.state = State::Value,
                    (Some(Structure::Array), Token::EndArray) => {
                        self.stack.pop();
                        self.close_value();
                        return visitor.end_array(&span.start);
                    }
                    (Some(Structure::Array), _) => {
                        return parser_error!(ParserErrorDetails::InvalidArray, span.start)
                    }
                    (None, token) => {
                        return parser_error!(
                            ParserErrorDetails::UnexpectedToken(format!("{:?}", token)),
                            span.start
                        )
                    }
                },
                State::Finished => {
                    return match token {
                        Token::EndOfInput => Ok(true),
                        other => parser_error!(
                            ParserErrorDetails::UnexpectedToken(format!("{:?}", other)),
                            span.start
                        ),
                    };
                }
            }
        }
    }

    /// A value has been completed; settle the follow state
    fn close_value(&mut self) {
        self.state = if self.stack.is_empty() {
            State::Finished
        } else {
            State::CommaOrEnd
        };
    }

    fn emit_scalar(
        &mut self,
        token: Token,
        span: Span,
        visitor: &mut dyn Visitor,
    ) -> ParserResult<bool> {
        let ctx = span.start;
        match token {
            Token::Str(s) => visitor.string_value(&s, SemanticTag::None, &ctx),
            Token::Unsigned(u) => visitor.uint64_value(u, SemanticTag::None, &ctx),
            Token::Integer(i) => visitor.int64_value(i, SemanticTag::None, &ctx),
            Token::Float(d) => visitor.double_value(d, SemanticTag::None, &ctx),
            Token::BigInteger(s) => visitor.string_value(&s, SemanticTag::BigInteger, &ctx),
            Token::Bool(b) => visitor.bool_value(b, SemanticTag::None, &ctx),
            Token::Null => visitor.null_value(SemanticTag::None, &ctx),
            other => parser_error!(
                ParserErrorDetails::UnexpectedToken(format!("{:?}", other)),
                ctx
            ),
        }
    }

    fn value_error_details(&self, token: &Token) -> ParserErrorDetails {
        match (self.state, self.stack.last()) {
            (State::Start, _) => ParserErrorDetails::InvalidRootValue,
            (State::ValueOrEnd, _) | (_, Some(Structure::Array)) => {
                ParserErrorDetails::InvalidArray
            }
            _ => ParserErrorDetails::UnexpectedToken(format!("{:?}", token)),
        }
    }
}

impl<I: Iterator<Item = char>> EventSource for JsonParser<I> {
    fn advance(&mut self, visitor: &mut dyn Visitor) -> ParserResult<bool> {
        self.step(visitor)
    }

    fn finished(&self) -> bool {
        JsonParser::finished(self)
    }

    fn context(&self) -> Coords {
        self.lexer.coords()
    }
}

/// A pull cursor over JSON text held in memory
pub type JsonCursor<'a> = EventCursor<JsonParser<std::str::Chars<'a>>>;

/// Open a cursor over a string slice, positioned on the first event
pub fn json_cursor(input: &str) -> ParserResult<JsonCursor<'_>> {
    EventCursor::new(JsonParser::new(input.chars()))
}

/// Open a filtering cursor over a string slice
pub fn json_cursor_with_filter(
    input: &str,
    pred: impl Fn(&Event, &Coords) -> bool + 'static,
) -> ParserResult<JsonCursor<'_>> {
    EventCursor::with_filter(JsonParser::new(input.chars()), pred)
}

#[cfg(test)]
mod tests {
    use super::{json_cursor, JsonParser};
    use crate::cursor::Cursor;
    use crate::errors::ParserErrorDetails;
    use crate::events::{Event, EventKind, SemanticTag};

    fn events(input: &str) -> Vec<Event> {
        let mut cursor = json_cursor(input).unwrap();
        let mut out = vec![];
        while !cursor.done() {
            out.push(cursor.current().clone());
            cursor.next().unwrap();
        }
        out
    }

    fn parse_failure(input: &str) -> ParserErrorDetails {
        let mut parser = JsonParser::new(input.chars());
        let mut decoder = crate::dom::DomDecoder::new();
        parser.parse(&mut decoder).unwrap_err().details
    }

    #[test]
    fn should_stream_scalar_roots() {
        assert_eq!(events("42"), vec![Event::uint64(42, SemanticTag::None)]);
        assert_eq!(
            events("\"hi\""),
            vec![Event::string("hi", SemanticTag::None)]
        );
        assert_eq!(events("null"), vec![Event::null(SemanticTag::None)]);
        assert_eq!(events(""), vec![]);
    }

    #[test]
    fn should_stream_balanced_structures() {
        let stream = events(r#"{"a": [1, -2, 3.5], "b": {"c": true}}"#);
        let kinds: Vec<EventKind> = stream.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::BeginObject,
                EventKind::Name,
                EventKind::BeginArray,
                EventKind::UInt64,
                EventKind::Int64,
                EventKind::Double,
                EventKind::EndArray,
                EventKind::Name,
                EventKind::BeginObject,
                EventKind::Name,
                EventKind::Bool,
                EventKind::EndObject,
                EventKind::EndObject,
            ]
        );
        let opens = kinds
            .iter()
            .filter(|k| matches!(k, EventKind::BeginObject | EventKind::BeginArray))
            .count();
        let closes = kinds
            .iter()
            .filter(|k| matches!(k, EventKind::EndObject | EventKind::EndArray))
            .count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn should_deliver_big_integers_as_tagged_strings() {
        let stream = events("[18446744073709551616]");
        assert_eq!(stream[1].kind(), EventKind::String);
        assert_eq!(stream[1].tag(), SemanticTag::BigInteger);
        assert_eq!(stream[1].get_str().unwrap(), "18446744073709551616");
    }

    #[test]
    fn should_reject_structural_garbage() {
        assert_eq!(parse_failure("{1: 2}"), ParserErrorDetails::InvalidObject);
        assert_eq!(parse_failure("{\"a\" 1}"), ParserErrorDetails::PairExpected);
        assert_eq!(parse_failure("[1, ]"), ParserErrorDetails::InvalidArray);
        assert_eq!(parse_failure("[,1]"), ParserErrorDetails::InvalidArray);
        assert!(matches!(
            parse_failure("1 2"),
            ParserErrorDetails::UnexpectedToken(_)
        ));
        assert_eq!(parse_failure(":"), ParserErrorDetails::InvalidRootValue);
    }

    #[test]
    fn should_accept_empty_containers() {
        let kinds: Vec<EventKind> = events("[]").iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::BeginArray, EventKind::EndArray]);
        let kinds: Vec<EventKind> = events("{}").iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::BeginObject, EventKind::EndObject]);
    }
}
