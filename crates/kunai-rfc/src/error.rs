use thiserror::Error;

use crate::rfc::vcard::parse::ParseError;

/// vCard reading, writing and registration errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Scribe registration error: {0}")]
    RegistrationError(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),
}

impl From<quick_xml::Error> for RfcError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for RfcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlError(err.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for RfcError {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        Self::XmlError(err.to_string())
    }
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
