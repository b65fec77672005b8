//! Scribes for values kept verbatim: unrecognized properties and `XML`.

use std::any::TypeId;

use super::{
    Marshalled, Scribe, ScribeContext, ScribeResult, Unmarshalled, downcast, html_element,
    xml_first_value, xml_value,
};
use crate::rfc::vcard::build::escape_text;
use crate::rfc::vcard::core::{
    DataType, KnownProperty, PropertyValue, RawProperty, VCardParameters, VCardVersion,
    XmlProperty,
};
use crate::rfc::vcard::html::element_value;
use crate::rfc::vcard::json::JCardValue;
use crate::rfc::vcard::parse::unescape_text;
use crate::rfc::vcard::xml::Element;

/// Marshals a [`RawProperty`] under whatever name it was read with.
///
/// Not part of any registry: the engine builds one per unrecognized name.
#[derive(Debug, Clone)]
pub struct RawScribe {
    name: String,
}

impl RawScribe {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Scribe for RawScribe {
    fn name(&self) -> &str {
        &self.name
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<RawProperty>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(RawProperty::default())
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<DataType> {
        None
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        Ok(Marshalled::Value(downcast::<RawProperty>(payload)?.value.clone()))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(RawProperty::new(value)))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        let raw = downcast::<RawProperty>(payload)?;
        let data_type = raw.data_type.clone().unwrap_or(DataType::Unknown);
        Ok(Marshalled::Value(vec![xml_value(&data_type, raw.value.as_str())]))
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let raw = match xml_first_value(element) {
            Some((data_type, value)) => RawProperty::new(value).with_data_type(data_type),
            None => RawProperty::new(element.text()),
        };
        Ok(Unmarshalled::value(raw))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        let raw = downcast::<RawProperty>(payload)?;
        let data_type = raw.data_type.clone().unwrap_or(DataType::Unknown);
        Ok(Marshalled::Value(JCardValue::single(data_type, raw.value.as_str())))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(
            RawProperty::new(value.to_raw_string()).with_data_type(value.data_type.clone()),
        ))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let raw = downcast::<RawProperty>(payload)?;
        Ok(Marshalled::Value(
            html_element("span", &self.html_class()).with_text(raw.value.as_str()),
        ))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(RawProperty::new(element_value(element))))
    }
}

/// `XML` (4.0): markup carried in a text or jCard document.
///
/// xCard writers place the markup directly inside `<vcard>` instead of going
/// through this scribe.
#[derive(Debug, Default)]
pub struct XmlScribe;

impl Scribe for XmlScribe {
    fn name(&self) -> &str {
        XmlProperty::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<XmlProperty>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(XmlProperty::default())
    }

    fn supported_versions(&self) -> &[VCardVersion] {
        &[VCardVersion::V4_0]
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        Ok(Marshalled::Value(escape_text(
            &downcast::<XmlProperty>(payload)?.value,
        )))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(XmlProperty::new(unescape_text(value))))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        Ok(Marshalled::Value(JCardValue::text(
            downcast::<XmlProperty>(payload)?.value.as_str(),
        )))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(XmlProperty::new(value.as_single())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::CompatibilityMode;

    #[test]
    fn raw_value_is_untouched() {
        let scribe = RawScribe::new("x-custom");
        assert_eq!(scribe.name(), "x-custom");
        assert_eq!(scribe.xml_name(), "x-custom");

        let mut ctx = ScribeContext::new(VCardVersion::V3_0, CompatibilityMode::Rfc);
        let Unmarshalled::Value(payload) = scribe
            .read_text(&mut VCardParameters::new(), "a\\,b;c", &mut ctx)
            .unwrap()
        else {
            panic!("expected value");
        };
        let raw = payload.as_any().downcast_ref::<RawProperty>().unwrap();
        assert_eq!(raw.value, "a\\,b;c");

        let Marshalled::Value(text) = scribe.write_text(raw, &mut ctx).unwrap() else {
            panic!("expected value");
        };
        assert_eq!(text, "a\\,b;c");
    }

    #[test]
    fn raw_json_keeps_declared_type() {
        let scribe = RawScribe::new("x-count");
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let value = JCardValue::single(DataType::Integer, 42);
        let Unmarshalled::Value(payload) = scribe
            .read_json(&value, &mut VCardParameters::new(), &mut ctx)
            .unwrap()
        else {
            panic!("expected value");
        };
        assert_eq!(
            payload.as_any().downcast_ref::<RawProperty>(),
            Some(&RawProperty::new("42").with_data_type(DataType::Integer))
        );
    }

    #[test]
    fn xml_property_is_v4_only() {
        assert_eq!(XmlScribe.supported_versions(), [VCardVersion::V4_0]);
    }
}
