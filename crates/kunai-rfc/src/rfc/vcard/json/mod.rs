//! jCard (RFC 7095).
//!
//! A jCard is `["vcard", [property, ...]]` where each property is
//! `[name, {parameters}, type, value, ...]`. Parsing and output go through
//! `serde_json::Value`.

mod reader;
mod value;
mod writer;

pub use reader::{JCardReader, parse_jcard};
pub use value::{JCardValue, value_to_string};
pub use writer::{JCardWriter, write_jcard};
