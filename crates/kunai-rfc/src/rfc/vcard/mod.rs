//! vCard implementation (RFC 2426, RFC 6350, RFC 6351, RFC 7095, hCard).
//!
//! This module provides the vCard document model and readers and writers
//! for every vCard syntax.
//!
//! ## Overview
//!
//! A [`VCard`] is an ordered list of properties plus a version. Each property
//! carries a typed payload. A [`Scribe`](scribe::Scribe) converts one payload
//! type to and from every format, and a per-reader/writer
//! [`ScribeRegistry`] decides which scribe handles which property.
//!
//! ## Usage
//!
//! ### Reading
//!
//! ```rust
//! use kunai_rfc::rfc::vcard::{VCardReader, VCardVersion};
//!
//! let input = "\
//! BEGIN:VCARD\r\n\
//! VERSION:3.0\r\n\
//! N:Doe;John;;;\r\n\
//! FN:John Doe\r\n\
//! EMAIL;TYPE=work:john@example.com\r\n\
//! END:VCARD\r\n";
//!
//! let mut reader = VCardReader::new(input.as_bytes());
//! let card = reader.read_next().unwrap().unwrap();
//! assert_eq!(card.version, VCardVersion::V3_0);
//! assert_eq!(card.formatted_name(), Some("John Doe"));
//! ```
//!
//! ### Writing
//!
//! ```rust
//! use kunai_rfc::rfc::vcard::{FormattedName, StructuredName, VCard, VCardVersion, write_string};
//!
//! let card = VCard::new(VCardVersion::V4_0)
//!     .with(StructuredName::simple("Doe", "Jane"))
//!     .with(FormattedName::new("Jane Doe"));
//!
//! let output = write_string(&card, VCardVersion::V3_0).unwrap();
//! assert!(output.contains("VERSION:3.0\r\n"));
//! assert!(output.contains("FN:Jane Doe\r\n"));
//! ```
//!
//! ## Warnings
//!
//! Readers and writers never fail on bad content. Malformed values,
//! properties the target version cannot carry and missing required
//! properties are reported through `warnings()`, cleared on every call.
//!
//! ## Submodules
//!
//! - [`core`] - Document model and payload types
//! - [`scribe`] - Scribe trait, registry and built-in scribes
//! - [`parse`] - Text reader
//! - [`build`] - Text writer
//! - [`xml`] - xCard
//! - [`json`] - jCard
//! - [`html`] - hCard
//! - [`options`] - Reader and writer options

pub mod build;
pub mod core;
pub mod html;
pub mod json;
pub mod options;
pub mod parse;
pub mod scribe;
pub mod xml;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use build::{VCardWriter, write_string};
pub use self::core::{
    Address, Agent, Birthday, Categories, CompatibilityMode, DataType, Email, FormattedName, Geo,
    Nickname, Note, Organization, Photo, RawProperty, Revision, StructuredName, Telephone, Url,
    VCard, VCardParameter, VCardParameters, VCardProperty, VCardVersion, Warning, XmlProperty,
};
pub use html::{HCardReader, HCardWriter};
pub use json::{JCardReader, JCardWriter};
pub use options::{LabelPolicy, ParameterStyle, ReaderOptions, WriterOptions};
pub use parse::{ParseError, VCardReader, parse_str};
pub use scribe::{Scribe, ScribeRegistry};
pub use xml::{XCardReader, XCardWriter};
