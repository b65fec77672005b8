//! vCard reading, writing and marshalling.
//!
//! See [`rfc::vcard`] for the document model and the format readers/writers.

pub mod error;
pub mod rfc;
