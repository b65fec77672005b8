//! Scribes for plain text and text-list properties.

use std::any::TypeId;
use std::marker::PhantomData;

use super::{
    Marshalled, Scribe, ScribeContext, ScribeResult, Unmarshalled, downcast, html_element,
    xml_first_value, xml_value, xml_values,
};
use crate::rfc::vcard::build::{escape_text, join_list};
use crate::rfc::vcard::core::{
    DataType, PropertyValue, TextListValue, TextValue, VCardParameters, VCardVersion,
};
use crate::rfc::vcard::html::{element_value, link_value};
use crate::rfc::vcard::json::JCardValue;
use crate::rfc::vcard::parse::{split_component, unescape_text};
use crate::rfc::vcard::xml::Element;

/// How a text property appears in hCard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlForm {
    /// `<span class="note">text</span>`
    Span,
    /// `<a class="email" href="mailto:text">text</a>` with the given scheme
    /// prefix.
    Link(&'static str),
}

/// Scribe for a payload holding one text value.
pub struct TextScribe<T> {
    versions: &'static [VCardVersion],
    data_type: DataType,
    expected: Option<&'static str>,
    html: HtmlForm,
    payload: PhantomData<fn() -> T>,
}

impl<T: TextValue> Default for TextScribe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TextValue> TextScribe<T> {
    /// A `text` property valid in every version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            versions: VCardVersion::ALL,
            data_type: DataType::Text,
            expected: None,
            html: HtmlForm::Span,
            payload: PhantomData,
        }
    }

    #[must_use]
    pub fn versions(mut self, versions: &'static [VCardVersion]) -> Self {
        self.versions = versions;
        self
    }

    /// Values are URIs: written without backslash escaping.
    #[must_use]
    pub fn uri(mut self) -> Self {
        self.data_type = DataType::Uri;
        self
    }

    /// Warns when a read value differs from `value` (case-insensitive).
    #[must_use]
    pub fn expect_value(mut self, value: &'static str) -> Self {
        self.expected = Some(value);
        self
    }

    #[must_use]
    pub fn html(mut self, html: HtmlForm) -> Self {
        self.html = html;
        self
    }

    fn text<'a>(&self, payload: &'a dyn PropertyValue) -> ScribeResult<&'a str> {
        Ok(downcast::<T>(payload)?.text())
    }

    fn finish(&self, value: String, ctx: &mut ScribeContext) -> Unmarshalled {
        if let Some(expected) = self
            .expected
            .filter(|expected| !value.trim().eq_ignore_ascii_case(expected))
        {
            ctx.warn(format!("{} value should be \"{expected}\", found \"{value}\"", T::NAME));
        }
        Unmarshalled::value(T::from_text(value))
    }
}

impl<T: TextValue> Scribe for TextScribe<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(T::default())
    }

    fn supported_versions(&self) -> &[VCardVersion] {
        self.versions
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<DataType> {
        Some(self.data_type.clone())
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        let text = self.text(payload)?;
        Ok(Marshalled::Value(if self.data_type == DataType::Uri {
            text.to_string()
        } else {
            escape_text(text)
        }))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let value = if self.data_type == DataType::Uri {
            value.to_string()
        } else {
            unescape_text(value)
        };
        Ok(self.finish(value, ctx))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        Ok(Marshalled::Value(vec![xml_value(
            &self.data_type,
            self.text(payload)?,
        )]))
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let value = xml_first_value(element)
            .map(|(_, text)| text)
            .unwrap_or_default();
        Ok(self.finish(value, ctx))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        Ok(Marshalled::Value(JCardValue::single(
            self.data_type.clone(),
            self.text(payload)?,
        )))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(self.finish(value.as_single(), ctx))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let text = self.text(payload)?;
        let class = self.html_class();
        let element = match self.html {
            HtmlForm::Span => html_element("span", &class).with_text(text),
            HtmlForm::Link(scheme) => html_element("a", &class)
                .with_attribute("href", format!("{scheme}{text}"))
                .with_text(text),
        };
        Ok(Marshalled::Value(element))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let value = match self.html {
            HtmlForm::Span => element_value(element),
            HtmlForm::Link(_) => link_value(element),
        };
        Ok(self.finish(value, ctx))
    }
}

/// Scribe for a payload holding a comma-separated list.
pub struct TextListScribe<T> {
    versions: &'static [VCardVersion],
    html_class: Option<&'static str>,
    payload: PhantomData<fn() -> T>,
}

impl<T: TextListValue> Default for TextListScribe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TextListValue> TextListScribe<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            versions: VCardVersion::ALL,
            html_class: None,
            payload: PhantomData,
        }
    }

    #[must_use]
    pub fn versions(mut self, versions: &'static [VCardVersion]) -> Self {
        self.versions = versions;
        self
    }

    /// hCard class when it is not the lower-cased property name.
    #[must_use]
    pub fn html_class_name(mut self, class: &'static str) -> Self {
        self.html_class = Some(class);
        self
    }

    fn values<'a>(&self, payload: &'a dyn PropertyValue) -> ScribeResult<&'a [String]> {
        Ok(downcast::<T>(payload)?.values())
    }
}

impl<T: TextListValue> Scribe for TextListScribe<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(T::default())
    }

    fn html_class(&self) -> String {
        self.html_class
            .map_or_else(|| T::NAME.to_ascii_lowercase(), String::from)
    }

    fn supported_versions(&self) -> &[VCardVersion] {
        self.versions
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        Ok(Marshalled::Value(join_list(self.values(payload)?)))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(T::from_values(split_component(value))))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        Ok(Marshalled::Value(
            self.values(payload)?
                .iter()
                .map(|v| xml_value(&DataType::Text, v.as_str()))
                .collect(),
        ))
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(T::from_values(xml_values(
            element, "text",
        ))))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        Ok(Marshalled::Value(JCardValue::multi(
            DataType::Text,
            self.values(payload)?,
        )))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(T::from_values(value.as_strings())))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        Ok(Marshalled::Value(
            html_element("span", &self.html_class()).with_text(self.values(payload)?.join(", ")),
        ))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let values = element_value(element)
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        Ok(Unmarshalled::value(T::from_values(values)))
    }
}
