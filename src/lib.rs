//! Streaming event cursor over JSON and JSON-adjacent encodings.
//!
//! The crate is built around a push visitor protocol ([visitor::Visitor])
//! driven by a decoder, and a pull cursor ([cursor::Cursor]) that inverts
//! it: each accepted event suspends the decoder, hands the event to the
//! caller, and resumes on the next pull. Integer fidelity across wire
//! formats is preserved by an arbitrary-precision integer
//! ([bignum::BigNum]); values too wide for `i64`/`u64` travel as tagged
//! decimal strings.
//!
//! ```
//! use quarry_json::cursor::Cursor;
//! use quarry_json::sax::json_cursor;
//!
//! let mut cursor = json_cursor(r#"[1, "a", null]"#).unwrap();
//! while !cursor.done() {
//!     println!("{}", cursor.current().kind());
//!     cursor.next().unwrap();
//! }
//! ```

pub mod bignum;
pub mod coords;
pub mod cursor;
pub mod decoders;
pub mod dom;
pub mod errors;
pub mod events;
pub mod lexer;
pub mod sax;
pub mod visitor;

pub use bignum::BigNum;
pub use coords::{Coords, Span};
pub use cursor::{Cursor, CursorVisitor, EventCursor, FilterView};
pub use dom::Value;
pub use errors::{ConvError, ParserError, ParserResult};
pub use events::{Event, EventKind, SemanticTag};
pub use sax::{json_cursor, JsonCursor, JsonParser};
pub use visitor::{TypedArraySlice, Visitor};
