//! Line-oriented vCard reading (RFC 2425/2426, RFC 6350).
//!
//! ## Usage
//!
//! ```rust
//! use kunai_rfc::rfc::vcard::parse::VCardReader;
//!
//! let input = "\
//! BEGIN:VCARD\r\n\
//! VERSION:3.0\r\n\
//! N:Doe;John;;;\r\n\
//! FN:John Doe\r\n\
//! GEO:40.7;-74\r\n\
//! END:VCARD\r\n";
//!
//! let mut reader = VCardReader::new(input.as_bytes());
//! let vcard = reader.read_next().unwrap().unwrap();
//! assert_eq!(vcard.formatted_name(), Some("John Doe"));
//! assert!(reader.warnings().is_empty());
//! ```
//!
//! ## Features
//!
//! - Reads 2.1, 3.0 and 4.0, several documents per stream
//! - Unfolds continuation lines and quoted-printable soft breaks
//! - Decodes quoted-printable values by `CHARSET`
//! - Classifies nameless 2.1 parameters
//! - RFC 6868 caret encoding for parameters
//! - Embedded vCards in `AGENT`, as a 2.1 block or a 3.0 inline value

mod error;
mod lexer;
mod line_reader;
pub mod quoted_printable;
mod reader;
mod values;

#[cfg(test)]
mod error_tests;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{ContentLine, classify_nameless, parse_content_line, unfold};
pub use line_reader::{LineReader, LogicalLine};
pub use reader::{VCardReader, parse_str};
pub use values::{
    expand_escaped_newlines, split_component, split_structured, split_unescaped, unescape_text,
};
