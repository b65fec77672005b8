//! Fallback payloads for properties without a dedicated scribe.

use super::{DataType, KnownProperty};

/// An unrecognized property: the value exactly as found on the wire.
///
/// For the line formats the value is not unescaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProperty {
    pub value: String,
    /// Data type from jCard/xCard, when the source declared one.
    pub data_type: Option<DataType>,
}

impl RawProperty {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            data_type: None,
        }
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

/// Markup kept verbatim from an xCard document (4.0 `XML`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlProperty {
    pub value: String,
}

impl XmlProperty {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl KnownProperty for XmlProperty {
    const NAME: &'static str = "XML";
}
