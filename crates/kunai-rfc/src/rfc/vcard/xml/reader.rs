//! xCard reader (RFC 6351).

use std::collections::VecDeque;
use std::sync::Arc;

use kunai_core::constants::XCARD_NAMESPACE;

use super::element::Element;
use crate::error::RfcResult;
use crate::rfc::vcard::core::{
    CompatibilityMode, PropertyValue, RawProperty, VCard, VCardParameters, VCardProperty,
    VCardVersion, Warning, XmlProperty,
};
use crate::rfc::vcard::scribe::{
    RawScribe, Scribe, ScribeContext, ScribeRegistry, Unmarshalled, drain_warnings,
    drop_default_value_type, is_extension_name, xml_first_value,
};

/// Reads vCards from an xCard document.
///
/// The whole document is parsed up front; [`XCardReader::read_next`] then
/// hands out one `<vcard>` element at a time. Every document is 4.0.
pub struct XCardReader {
    documents: VecDeque<Element>,
    registry: ScribeRegistry,
    warnings: Vec<Warning>,
}

impl XCardReader {
    /// ## Summary
    /// Parses an xCard document and collects its `<vcard>` elements, at any
    /// depth.
    ///
    /// ## Errors
    /// Returns `RfcError::XmlError` for malformed XML.
    #[tracing::instrument(skip(input), fields(input_len = input.len()))]
    pub fn new(input: &[u8]) -> RfcResult<Self> {
        let root = Element::parse_xml(input)?;
        let mut documents = VecDeque::new();
        collect_vcards(&root, &mut documents);
        tracing::debug!(count = documents.len(), "Found xCard documents");
        Ok(Self {
            documents,
            registry: ScribeRegistry::new(),
            warnings: Vec::new(),
        })
    }

    /// ## Summary
    /// Adds an extension scribe for this reader.
    ///
    /// ## Errors
    /// Returns an error if the scribe fails registration checks.
    pub fn register_scribe<S: Scribe + 'static>(&mut self, scribe: S) -> RfcResult<()> {
        self.registry.register(scribe)
    }

    pub fn registry_mut(&mut self) -> &mut ScribeRegistry {
        &mut self.registry
    }

    /// Warnings from the last read.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Reads the next vCard, or `None` once every `<vcard>` was read.
    pub fn read_next(&mut self) -> Option<VCard> {
        self.warnings.clear();
        let element = self.documents.pop_front()?;
        Some(self.read_document(&element))
    }

    /// Reads every remaining vCard. Warnings of all documents are kept.
    pub fn read_all(&mut self) -> Vec<VCard> {
        let mut vcards = Vec::new();
        let mut warnings = Vec::new();
        while let Some(vcard) = self.read_next() {
            warnings.append(&mut self.warnings);
            vcards.push(vcard);
        }
        self.warnings = warnings;
        vcards
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "xCard read warning");
        self.warnings.push(warning);
    }

    fn read_document(&mut self, element: &Element) -> VCard {
        let mut vcard = VCard::new(VCardVersion::V4_0);
        for child in element.child_elements() {
            if child.is(XCARD_NAMESPACE, "group") {
                let group = child.attribute("name").map(String::from);
                for member in child.child_elements() {
                    if let Some(property) = self.read_property(member, group.clone()) {
                        vcard.push(property);
                    }
                }
            } else if let Some(property) = self.read_property(child, None) {
                vcard.push(property);
            }
        }
        tracing::debug!(properties = vcard.len(), "Read xCard document");
        vcard
    }

    fn read_property(&mut self, element: &Element, group: Option<String>) -> Option<VCardProperty> {
        if element.namespace.as_deref() != Some(XCARD_NAMESPACE) {
            return self.keep_markup(element, group);
        }

        let (scribe, name): (Arc<dyn Scribe>, String) =
            match self.registry.lookup_xml(XCARD_NAMESPACE, &element.name) {
                Some(scribe) => {
                    let name = scribe.name().to_string();
                    (scribe, name)
                }
                None if is_extension_name(&element.name) => {
                    let name = element.name.to_ascii_uppercase();
                    (Arc::new(RawScribe::new(name.as_str())), name)
                }
                None => return self.keep_markup(element, group),
            };

        let mut params = read_parameters(element);
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let outcome = scribe.read_xml(element, &mut params, &mut ctx);
        drain_warnings(&mut ctx, &name, None, &mut self.warnings);

        let payload: Box<dyn PropertyValue> = match outcome {
            Ok(Unmarshalled::Value(payload)) => payload,
            Ok(Unmarshalled::Skip(reason)) => {
                self.warn(Warning::new(reason).with_property(name));
                return None;
            }
            Ok(Unmarshalled::Embedded(_)) => {
                self.warn(
                    Warning::new("embedded vCards cannot be read from xCard; omitted")
                        .with_property(name),
                );
                return None;
            }
            Err(err) => {
                self.warn(Warning::new(format!("{err}; kept as raw value")).with_property(&name));
                Box::new(raw_value(element))
            }
        };

        drop_default_value_type(&mut params, scribe.as_ref(), VCardVersion::V4_0);
        let mut property = VCardProperty::from_boxed(name, payload).with_parameters(params);
        property.group = group;
        Some(property)
    }

    /// Keeps an element no scribe handles as an `XML` property.
    fn keep_markup(&mut self, element: &Element, group: Option<String>) -> Option<VCardProperty> {
        match element.to_markup(false) {
            Ok(markup) => {
                tracing::trace!(element = %element.name, "Keeping unknown element as XML");
                let mut property = VCardProperty::of(XmlProperty::new(markup));
                property.group = group;
                Some(property)
            }
            Err(err) => {
                self.warn(
                    Warning::new(format!("cannot keep element: {err}")).with_property(&element.name),
                );
                None
            }
        }
    }
}

fn collect_vcards(element: &Element, out: &mut VecDeque<Element>) {
    if element.is(XCARD_NAMESPACE, "vcard") {
        out.push_back(element.clone());
        return;
    }
    for child in element.child_elements() {
        collect_vcards(child, out);
    }
}

fn raw_value(element: &Element) -> RawProperty {
    match xml_first_value(element) {
        Some((data_type, value)) => RawProperty::new(value).with_data_type(data_type),
        None => RawProperty::new(element.text()),
    }
}

/// Reads the `<parameters>` child. Each parameter element holds typed value
/// elements; a parameter without any holds its value as text.
fn read_parameters(element: &Element) -> VCardParameters {
    let mut params = VCardParameters::new();
    let Some(parameters) = element
        .child("parameters")
        .filter(|child| child.namespace.as_deref() == Some(XCARD_NAMESPACE))
    else {
        return params;
    };

    for param in parameters.child_elements() {
        let name = param.name.to_ascii_uppercase();
        let mut values = param.child_elements().map(Element::text).peekable();
        if values.peek().is_none() {
            params.add(&name, param.text());
        } else {
            params.add_all(&name, values);
        }
    }
    params
}

/// ## Summary
/// Reads every vCard of an xCard document.
///
/// ## Errors
/// Returns `RfcError::XmlError` for malformed XML.
pub fn parse_xcard(input: &str) -> RfcResult<Vec<VCard>> {
    Ok(XCardReader::new(input.as_bytes())?.read_all())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::{FormattedName, Geo, Note, StructuredName, Telephone};

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vcards xmlns="urn:ietf:params:xml:ns:vcard-4.0">
  <vcard>
    <fn><text>Simon Perreault</text></fn>
    <n>
      <surname>Perreault</surname>
      <given>Simon</given>
      <additional/>
      <prefix/>
      <suffix>ing. jr</suffix>
      <suffix>M.Sc.</suffix>
    </n>
    <group name="item1">
      <tel>
        <parameters><type><text>work</text><text>voice</text></type><pref><integer>1</integer></pref></parameters>
        <uri>tel:+1-418-656-9254;ext=102</uri>
      </tel>
    </group>
    <geo><uri>geo:46.772673,-71.282945</uri></geo>
    <x-custom><unknown>hello</unknown></x-custom>
    <a:b xmlns:a="http://example.com/ns">foreign</a:b>
    <mystery><text>?</text></mystery>
  </vcard>
</vcards>"#;

    #[test]
    fn reads_standard_properties() {
        let vcards = parse_xcard(DOC).unwrap();
        assert_eq!(vcards.len(), 1);
        let vcard = &vcards[0];
        assert_eq!(vcard.version, VCardVersion::V4_0);
        assert_eq!(vcard.formatted_name(), Some("Simon Perreault"));

        let name = vcard.first::<StructuredName>().unwrap();
        assert_eq!(name.family, ["Perreault"]);
        assert_eq!(name.suffixes, ["ing. jr", "M.Sc."]);

        let geo = vcard.first::<Geo>().unwrap();
        assert_eq!(geo.latitude, Some(46.772_673));
    }

    #[test]
    fn reads_groups_and_parameters() {
        let vcards = parse_xcard(DOC).unwrap();
        let tel = vcards[0].by_name("TEL").next().unwrap();
        assert_eq!(tel.group.as_deref(), Some("item1"));
        assert_eq!(tel.parameters.types(), ["work", "voice"]);
        assert_eq!(tel.parameters.first("PREF"), Some("1"));
        assert_eq!(
            tel.value::<Telephone>().unwrap().as_str(),
            "tel:+1-418-656-9254;ext=102"
        );
    }

    #[test]
    fn unknown_elements() {
        let vcards = parse_xcard(DOC).unwrap();
        let vcard = &vcards[0];

        let custom = vcard.by_name("X-CUSTOM").next().unwrap();
        assert_eq!(custom.value::<RawProperty>().unwrap().value, "hello");

        let markup: Vec<&str> = vcard
            .all::<XmlProperty>()
            .map(|xml| xml.value.as_str())
            .collect();
        assert_eq!(markup.len(), 2);
        assert!(markup[0].contains("http://example.com/ns"));
        assert!(markup[1].starts_with("<mystery"));
    }

    #[test]
    fn vcards_at_any_depth() {
        let doc = r#"<root><wrapper><vcard xmlns="urn:ietf:params:xml:ns:vcard-4.0"><note><text>a</text></note></vcard></wrapper><vcard xmlns="urn:ietf:params:xml:ns:vcard-4.0"><fn><text>b</text></fn></vcard></root>"#;
        let mut reader = XCardReader::new(doc.as_bytes()).unwrap();

        let first = reader.read_next().unwrap();
        assert_eq!(first.first::<Note>().unwrap().as_str(), "a");
        assert!(reader.warnings().is_empty());

        let second = reader.read_next().unwrap();
        assert_eq!(second.first::<FormattedName>().unwrap().as_str(), "b");
        assert!(reader.read_next().is_none());
    }

    #[test]
    fn malformed_xml_is_error() {
        assert!(parse_xcard("<vcards><vcard></vcards>").is_err());
    }
}
