//! xCard (RFC 6351).
//!
//! Documents are parsed with quick-xml into a small owned [`Element`] tree,
//! which the scribes read and build. The same tree backs the hCard codec.

mod element;
mod reader;
mod writer;

pub use element::{DOCUMENT_ROOT, Element, Node};
pub use reader::{XCardReader, parse_xcard};
pub use writer::{XCardWriter, write_xcard};
