//! Scribes for `N` and `ORG`.

use std::any::TypeId;

use super::{
    Marshalled, Scribe, ScribeContext, ScribeResult, Unmarshalled, downcast, html_element,
    xml_value, xml_values,
};
use crate::rfc::vcard::build::{escape_text, join_structured};
use crate::rfc::vcard::core::{
    CompatibilityMode, DataType, KnownProperty, Organization, PropertyValue, StructuredName,
    VCardParameters,
};
use crate::rfc::vcard::html::{element_value, find_by_class};
use crate::rfc::vcard::json::JCardValue;
use crate::rfc::vcard::parse::{split_component, split_structured, unescape_text};
use crate::rfc::vcard::xml::Element;
use kunai_core::constants::XCARD_NAMESPACE;

/// xCard element names of the `N` components, in wire order.
const NAME_XML: [&str; 5] = ["surname", "given", "additional", "prefix", "suffix"];

/// hCard class names of the `N` components, in wire order.
const NAME_HTML: [&str; 5] = [
    "family-name",
    "given-name",
    "additional-name",
    "honorific-prefix",
    "honorific-suffix",
];

/// Splits a structured text value into `count` components.
///
/// With `split_commas` each component is a comma-separated list; otherwise
/// commas are literal. Missing trailing components are empty.
#[must_use]
pub fn read_components(value: &str, count: usize, split_commas: bool) -> Vec<Vec<String>> {
    let mut components: Vec<Vec<String>> = split_structured(value)
        .into_iter()
        .take(count)
        .map(|part| {
            if split_commas {
                split_component(part)
            } else if part.is_empty() {
                Vec::new()
            } else {
                vec![unescape_text(part)]
            }
        })
        .collect();
    components.resize_with(count, Vec::new);
    components
}

/// Writes xCard component elements; an empty component is one empty element.
#[must_use]
pub fn xml_components(names: &[&str], components: &[&Vec<String>]) -> Vec<Element> {
    let mut elements = Vec::new();
    for (name, values) in names.iter().zip(components) {
        if values.is_empty() {
            elements.push(Element::in_namespace(XCARD_NAMESPACE, *name));
        } else {
            elements.extend(
                values
                    .iter()
                    .map(|v| Element::text_element(Some(XCARD_NAMESPACE), name, v.as_str())),
            );
        }
    }
    elements
}

/// Reads xCard component elements, dropping empty ones.
#[must_use]
pub fn xml_read_components(element: &Element, names: &[&str]) -> Vec<Vec<String>> {
    names
        .iter()
        .map(|name| {
            xml_values(element, name)
                .into_iter()
                .filter(|v| !v.is_empty())
                .collect()
        })
        .collect()
}

/// Writes an hCard compound element with one child per component value.
#[must_use]
pub fn html_components(class: &str, names: &[&str], components: &[&Vec<String>]) -> Element {
    let mut element = html_element("span", class);
    for (name, values) in names.iter().zip(components) {
        for value in *values {
            element.push_child(html_element("span", name).with_text(value.as_str()));
        }
    }
    element
}

/// Reads hCard component values by class name.
#[must_use]
pub fn html_read_components(element: &Element, names: &[&str]) -> Vec<Vec<String>> {
    names
        .iter()
        .map(|name| {
            find_by_class(element, name)
                .into_iter()
                .map(element_value)
                .filter(|v| !v.is_empty())
                .collect()
        })
        .collect()
}

fn name_from(components: Vec<Vec<String>>) -> StructuredName {
    let mut parts = components.into_iter();
    StructuredName {
        family: parts.next().unwrap_or_default(),
        given: parts.next().unwrap_or_default(),
        additional: parts.next().unwrap_or_default(),
        prefixes: parts.next().unwrap_or_default(),
        suffixes: parts.next().unwrap_or_default(),
    }
}

/// `N`
#[derive(Debug, Default)]
pub struct StructuredNameScribe;

impl Scribe for StructuredNameScribe {
    fn name(&self) -> &str {
        StructuredName::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<StructuredName>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(StructuredName::default())
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        let name = downcast::<StructuredName>(payload)?;
        Ok(Marshalled::Value(join_structured(
            &name.components().map(Vec::as_slice),
        )))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let split_commas = ctx.compatibility != CompatibilityMode::MacAddressBook;
        Ok(Unmarshalled::value(name_from(read_components(
            value,
            NAME_XML.len(),
            split_commas,
        ))))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        let name = downcast::<StructuredName>(payload)?;
        Ok(Marshalled::Value(xml_components(
            &NAME_XML,
            &name.components(),
        )))
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(name_from(xml_read_components(
            element, &NAME_XML,
        ))))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        let name = downcast::<StructuredName>(payload)?;
        Ok(Marshalled::Value(JCardValue::structured(
            &name.components().map(Vec::as_slice),
        )))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(name_from(value.as_structured())))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let name = downcast::<StructuredName>(payload)?;
        Ok(Marshalled::Value(html_components(
            &self.html_class(),
            &NAME_HTML,
            &name.components(),
        )))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(name_from(html_read_components(
            element, &NAME_HTML,
        ))))
    }
}

/// `ORG`
#[derive(Debug, Default)]
pub struct OrganizationScribe;

impl Scribe for OrganizationScribe {
    fn name(&self) -> &str {
        Organization::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Organization>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(Organization::default())
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        let org = downcast::<Organization>(payload)?;
        Ok(Marshalled::Value(
            org.values()
                .into_iter()
                .map(escape_text)
                .collect::<Vec<_>>()
                .join(";"),
        ))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let values = split_structured(value)
            .into_iter()
            .map(unescape_text)
            .collect();
        Ok(Unmarshalled::value(Organization::from_values(values)))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        let org = downcast::<Organization>(payload)?;
        Ok(Marshalled::Value(
            org.values()
                .into_iter()
                .map(|v| xml_value(&DataType::Text, v))
                .collect(),
        ))
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(Organization::from_values(xml_values(
            element, "text",
        ))))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        let org = downcast::<Organization>(payload)?;
        let values = org.values();
        Ok(Marshalled::Value(if org.units.is_empty() {
            JCardValue::text(org.name.as_str())
        } else {
            let components: Vec<[&str; 1]> = values.iter().map(|v| [*v]).collect();
            let slices: Vec<&[&str]> = components.iter().map(|c| &c[..]).collect();
            JCardValue::structured(&slices)
        }))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(Organization::from_values(
            value.as_strings(),
        )))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let org = downcast::<Organization>(payload)?;
        let mut element = html_element("span", &self.html_class())
            .with_child(html_element("span", "organization-name").with_text(org.name.as_str()));
        for unit in &org.units {
            element.push_child(html_element("span", "organization-unit").with_text(unit.as_str()));
        }
        Ok(Marshalled::Value(element))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let name = find_by_class(element, "organization-name")
            .first()
            .map_or_else(|| element_value(element), |e| element_value(e));
        let units = find_by_class(element, "organization-unit")
            .into_iter()
            .map(element_value)
            .collect();
        Ok(Unmarshalled::value(Organization::with_units(name, units)))
    }
}
