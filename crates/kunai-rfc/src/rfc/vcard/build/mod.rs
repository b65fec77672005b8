//! Line-oriented vCard writing.
//!
//! - Escape: text and parameter value escaping
//! - Fold: content line folding at 75 octets, plain or quoted-printable
//! - Writer: documents in 2.1, 3.0 or 4.0 with version gating

mod escape;
mod fold;
mod writer;


pub use escape::{escape_param_value, escape_text, join_list, join_structured};
pub use fold::FoldingScheme;
pub use writer::{VCardWriter, write_string};
