//! vCard document model and payload types.

mod agent;
mod binary;
mod compat;
mod data_type;
mod date;
mod geo;
mod parameter;
mod property;
mod raw;
mod structured;
mod text;
mod vcard;
mod version;
mod warning;

pub use agent::Agent;
pub use binary::{BinaryContent, DataUri, Photo, image_media_type};
pub use compat::CompatibilityMode;
pub use data_type::DataType;
pub use date::{Birthday, Revision, format_date, format_timestamp, parse_date, parse_timestamp};
pub use geo::{Geo, format_coordinate};
pub use parameter::{VCardParameter, VCardParameters};
pub use property::{KnownProperty, PropertyValue, VCardProperty};
pub use raw::{RawProperty, XmlProperty};
pub use structured::{Address, Organization, StructuredName};
pub use text::{
    Categories, Classification, Email, FormattedName, Kind, Label, Mailer, Nickname, Note,
    ProductId, Profile, Role, SortString, Telephone, TextListValue, TextValue, Title, Uid, Url,
};
pub use vcard::VCard;
pub use version::VCardVersion;
pub use warning::Warning;
