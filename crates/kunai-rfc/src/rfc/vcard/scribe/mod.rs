//! Property scribes.
//!
//! A scribe converts one property kind between its typed payload and every
//! wire format. Readers and writers look scribes up in a [`ScribeRegistry`]
//! by property name (reading) or payload type (writing) and dispatch through
//! the [`Scribe`] trait.
//!
//! ## Outcomes
//!
//! Scribes never raise errors for control flow. Writing yields a
//! [`Marshalled`] value, a skip, or an embedded vCard; reading yields an
//! [`Unmarshalled`] payload, a skip, or an [`Injector`] that receives a
//! nested vCard once the reader has parsed it.
//!
//! A format a scribe cannot handle returns [`ScribeError::Unsupported`],
//! which the engine downgrades to a generic representation plus a warning.

mod address;
mod agent;
mod binary;
mod date;
mod dispatch;
mod geo;
mod raw;
mod registry;
mod structured;
mod text;

use std::any::{TypeId, type_name};
use std::fmt;

use kunai_core::constants::XCARD_NAMESPACE;

use super::core::{
    CompatibilityMode, DataType, PropertyValue, VCard, VCardParameters, VCardProperty,
    VCardVersion,
};
use super::json::JCardValue;
use super::options::LabelPolicy;
use super::xml::Element;

pub use address::{AddressScribe, merge_labels};
pub use agent::AgentScribe;
pub use binary::PhotoScribe;
pub use date::{BirthdayScribe, RevisionScribe};
pub use dispatch::{
    Planned, ReadTarget, Signature, drain_warnings, drop_default_value_type, is_extension_name,
    missing_required, plan,
};
pub use geo::GeoScribe;
pub use raw::{RawScribe, XmlScribe};
pub use registry::ScribeRegistry;
pub use structured::{OrganizationScribe, StructuredNameScribe};
pub use text::{HtmlForm, TextListScribe, TextScribe};

/// A wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Xml,
    Json,
    Html,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Xml => "xCard",
            Self::Json => "jCard",
            Self::Html => "hCard",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    #[error("property cannot be represented in {0}")]
    Unsupported(Format),

    #[error("cannot parse value: {0}")]
    CannotParse(String),

    #[error("payload is not a {0}")]
    WrongPayload(&'static str),
}

pub type ScribeResult<T> = Result<T, ScribeError>;

/// Result of writing one payload.
#[derive(Debug)]
pub enum Marshalled<'a, T> {
    Value(T),
    /// Omit the property; the reason becomes a warning.
    Skip(String),
    /// The value is a whole vCard, written by the engine.
    Embedded(&'a VCard),
}

/// Receives a nested vCard and builds the property payload around it.
pub type Injector = Box<dyn FnOnce(VCard) -> Box<dyn PropertyValue> + Send>;

/// Result of reading one property value.
pub enum Unmarshalled {
    Value(Box<dyn PropertyValue>),
    /// Drop the property; the reason becomes a warning.
    Skip(String),
    /// The value is a nested vCard the engine must parse first.
    Embedded(Injector),
}

impl Unmarshalled {
    #[must_use]
    pub fn value(payload: impl PropertyValue) -> Self {
        Self::Value(Box::new(payload))
    }
}

impl fmt::Debug for Unmarshalled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(payload) => f.debug_tuple("Value").field(payload).finish(),
            Self::Skip(reason) => f.debug_tuple("Skip").field(reason).finish(),
            Self::Embedded(_) => f.write_str("Embedded(..)"),
        }
    }
}

/// Per-call state handed to every scribe.
#[derive(Debug, Clone)]
pub struct ScribeContext {
    pub version: VCardVersion,
    pub compatibility: CompatibilityMode,
    pub label_policy: LabelPolicy,
    warnings: Vec<String>,
}

impl ScribeContext {
    #[must_use]
    pub fn new(version: VCardVersion, compatibility: CompatibilityMode) -> Self {
        Self {
            version,
            compatibility,
            label_policy: LabelPolicy::default(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label_policy(mut self, label_policy: LabelPolicy) -> Self {
        self.label_policy = label_policy;
        self
    }

    /// Records a warning for the property being processed.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

/// Marshals one property kind.
///
/// Only the text pair is required. The other formats default to
/// [`ScribeError::Unsupported`].
pub trait Scribe: Send + Sync {
    /// Canonical upper-case property name.
    fn name(&self) -> &str;

    /// Type of the payload this scribe reads and writes.
    fn payload_type(&self) -> TypeId;

    /// Builds an empty payload.
    fn new_payload(&self) -> Box<dyn PropertyValue>;

    fn xml_namespace(&self) -> &str {
        XCARD_NAMESPACE
    }

    /// xCard element name.
    fn xml_name(&self) -> String {
        self.name().to_ascii_lowercase()
    }

    /// hCard class name.
    fn html_class(&self) -> String {
        self.name().to_ascii_lowercase()
    }

    /// Versions the property may be written in.
    fn supported_versions(&self) -> &[VCardVersion] {
        VCardVersion::ALL
    }

    /// Value type assumed when no `VALUE` parameter is present.
    fn default_data_type(&self, _version: VCardVersion) -> Option<DataType> {
        Some(DataType::Text)
    }

    /// Parameters to write alongside the value.
    fn prepare_parameters(
        &self,
        _payload: &dyn PropertyValue,
        params: &VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> VCardParameters {
        params.clone()
    }

    /// Extra properties written right after this one.
    fn companion_properties(
        &self,
        _payload: &dyn PropertyValue,
        _params: &VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> Vec<VCardProperty> {
        Vec::new()
    }

    /// ## Errors
    /// Returns an error if the payload is not this scribe's type.
    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>>;

    /// Reads a text value. `value` is still escaped; quoted-printable has
    /// already been decoded.
    ///
    /// ## Errors
    /// Returns `CannotParse` when no payload can be built.
    fn read_text(
        &self,
        params: &mut VCardParameters,
        value: &str,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled>;

    /// Value elements placed inside the property element.
    ///
    /// ## Errors
    /// Returns `Unsupported` unless overridden.
    fn write_xml<'a>(
        &self,
        _payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        Err(ScribeError::Unsupported(Format::Xml))
    }

    /// ## Errors
    /// Returns `Unsupported` unless overridden.
    fn read_xml(
        &self,
        _element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Err(ScribeError::Unsupported(Format::Xml))
    }

    /// ## Errors
    /// Returns `Unsupported` unless overridden.
    fn write_json<'a>(
        &self,
        _payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        Err(ScribeError::Unsupported(Format::Json))
    }

    /// ## Errors
    /// Returns `Unsupported` unless overridden.
    fn read_json(
        &self,
        _value: &JCardValue,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Err(ScribeError::Unsupported(Format::Json))
    }

    /// The property element, carrying [`Scribe::html_class`].
    ///
    /// ## Errors
    /// Returns `Unsupported` unless overridden.
    fn write_html<'a>(
        &self,
        _payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        Err(ScribeError::Unsupported(Format::Html))
    }

    /// ## Errors
    /// Returns `Unsupported` unless overridden.
    fn read_html(
        &self,
        _element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Err(ScribeError::Unsupported(Format::Html))
    }
}

/// Downcasts a payload to the scribe's concrete type.
///
/// ## Errors
/// Returns `WrongPayload` on a type mismatch.
pub fn downcast<T: 'static>(payload: &dyn PropertyValue) -> ScribeResult<&T> {
    payload
        .as_any()
        .downcast_ref::<T>()
        .ok_or(ScribeError::WrongPayload(type_name::<T>()))
}

/// `<type>value</type>` in the xCard namespace.
#[must_use]
pub fn xml_value(data_type: &DataType, value: impl Into<String>) -> Element {
    Element::text_element(Some(XCARD_NAMESPACE), data_type.as_str(), value)
}

/// First value element of an xCard property (skipping `<parameters>`).
#[must_use]
pub fn xml_first_value(element: &Element) -> Option<(DataType, String)> {
    element
        .child_elements()
        .find(|child| child.name != "parameters")
        .map(|child| (DataType::parse(&child.name), child.text()))
}

/// Texts of every `<name>` child.
#[must_use]
pub fn xml_values(element: &Element, name: &str) -> Vec<String> {
    element.children_named(name).map(Element::text).collect()
}

/// An hCard element carrying one class.
#[must_use]
pub fn html_element(tag: &str, class: &str) -> Element {
    Element::new(tag).with_attribute("class", class)
}
