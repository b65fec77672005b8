//! hCard reader.

use std::collections::VecDeque;
use std::sync::Arc;

use kunai_core::constants::MAX_NESTING_DEPTH;

use super::{VCARD_CLASS, element_types, element_value, find_by_class, nested_vcard};
use crate::error::RfcResult;
use crate::rfc::vcard::core::{
    CompatibilityMode, PropertyValue, RawProperty, VCard, VCardParameters, VCardProperty,
    VCardVersion, Warning,
};
use crate::rfc::vcard::scribe::{Scribe, ScribeContext, ScribeRegistry, Unmarshalled, drain_warnings};
use crate::rfc::vcard::xml::Element;

/// Version given to every hCard document.
const HCARD_VERSION: VCardVersion = VCardVersion::V3_0;

/// Reads vCards from an HTML page.
///
/// The page is parsed up front; each top-level element with class `vcard`
/// is one document. Nested `vcard` elements are embedded documents of the
/// property element containing them.
pub struct HCardReader {
    documents: VecDeque<Element>,
    registry: ScribeRegistry,
    warnings: Vec<Warning>,
}

impl HCardReader {
    /// ## Summary
    /// Parses an HTML page and collects its `vcard` elements.
    ///
    /// ## Errors
    /// Returns `RfcError::XmlError` when the input cannot be tokenized.
    #[tracing::instrument(skip(input), fields(input_len = input.len()))]
    pub fn new(input: &[u8]) -> RfcResult<Self> {
        let root = Element::parse_html(input)?;
        let documents: VecDeque<Element> = find_by_class(&root, VCARD_CLASS)
            .into_iter()
            .cloned()
            .collect();
        tracing::debug!(count = documents.len(), "Found hCard documents");
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

    /// Reads the next vCard, or `None` once every document was read.
    pub fn read_next(&mut self) -> Option<VCard> {
        self.warnings.clear();
        let element = self.documents.pop_front()?;
        Some(self.read_document(&element, 0))
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
        tracing::warn!(%warning, "hCard read warning");
        self.warnings.push(warning);
    }

    /// Reads every property element below `element`, in document order.
    fn read_document(&mut self, element: &Element, depth: usize) -> VCard {
        let mut vcard = VCard::new(HCARD_VERSION);
        let mut pending = Vec::new();
        self.collect_properties(element, &mut pending);

        for (property_element, scribe) in pending {
            if let Some(property) = self.read_property(property_element, scribe.as_ref(), depth) {
                vcard.push(property);
            }
        }
        tracing::debug!(depth, properties = vcard.len(), "Read hCard document");
        vcard
    }

    fn collect_properties<'a>(
        &self,
        element: &'a Element,
        out: &mut Vec<(&'a Element, Arc<dyn Scribe>)>,
    ) {
        for child in element.child_elements() {
            for class in child.classes() {
                if let Some(scribe) = self.registry.lookup_html(class) {
                    out.push((child, scribe));
                }
            }
            if !child.has_class(VCARD_CLASS) {
                self.collect_properties(child, out);
            }
        }
    }

    fn read_property(
        &mut self,
        element: &Element,
        scribe: &dyn Scribe,
        depth: usize,
    ) -> Option<VCardProperty> {
        let name = scribe.name().to_string();
        let mut params = VCardParameters::new();
        if !element.has_class(VCARD_CLASS) {
            for value in element_types(element) {
                params.add_type(value);
            }
        }

        let mut ctx = ScribeContext::new(HCARD_VERSION, CompatibilityMode::Rfc);
        let outcome = scribe.read_html(element, &mut params, &mut ctx);
        drain_warnings(&mut ctx, &name, None, &mut self.warnings);

        let payload: Box<dyn PropertyValue> = match outcome {
            Ok(Unmarshalled::Value(payload)) => payload,
            Ok(Unmarshalled::Skip(reason)) => {
                self.warn(Warning::new(reason).with_property(name));
                return None;
            }
            Ok(Unmarshalled::Embedded(inject)) => {
                let Some(nested) = nested_vcard(element) else {
                    self.warn(Warning::new("no embedded vCard found").with_property(name));
                    return None;
                };
                if depth >= MAX_NESTING_DEPTH {
                    self.warn(
                        Warning::new(format!(
                            "nesting deeper than {MAX_NESTING_DEPTH} levels; kept as raw text"
                        ))
                        .with_property(&name),
                    );
                    Box::new(RawProperty::new(element_value(nested)))
                } else {
                    inject(self.read_document(nested, depth + 1))
                }
            }
            Err(err) => {
                self.warn(Warning::new(format!("{err}; kept as raw text")).with_property(&name));
                Box::new(RawProperty::new(element_value(element)))
            }
        };

        Some(VCardProperty::from_boxed(name, payload).with_parameters(params))
    }
}

/// ## Summary
/// Reads every vCard of an HTML page.
///
/// ## Errors
/// Returns `RfcError::XmlError` when the page cannot be tokenized.
pub fn parse_hcard(input: &str) -> RfcResult<Vec<VCard>> {
    Ok(HCardReader::new(input.as_bytes())?.read_all())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::{
        Address, Agent, Categories, Email, FormattedName, Geo, Organization, Photo,
        StructuredName, Telephone, Url,
    };

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Contacts</title></head><body>
<div class="vcard">
  <a class="url fn" href="http://example.com/jo">Jo Doe</a>
  <span class="n"><span class="given-name">Jo</span> <span class="family-name">Doe</span></span>
  <div class="org"><span class="organization-name">Acme</span>, <span class="organization-unit">Labs</span></div>
  <div class="adr"><span class="type">work</span>
    <span class="street-address">1 Main St</span>
    <span class="locality">Springfield</span>
  </div>
  <div class="tel"><span class="type">home</span> <span class="value">+1 555 0100</span></div>
  <a class="email" href="mailto:jo@example.com">Email me</a>
  <span class="geo"><abbr class="latitude" title="37.386013">N 37</abbr> <abbr class="longitude" title="-122.082932">W 122</abbr></span>
  <img class="photo" src="http://example.com/jo.png" alt="">
  <span class="category">friends</span>
  <div class="agent vcard"><span class="fn">Assistant</span><br></div>
</div>
<p class="vcard"><span class="fn">Second</span></p>
</body></html>"#;

    #[test]
    fn reads_page() {
        let mut reader = HCardReader::new(PAGE.as_bytes()).unwrap();
        let vcard = reader.read_next().unwrap();
        assert_eq!(vcard.version, VCardVersion::V3_0);

        assert_eq!(vcard.first::<FormattedName>().unwrap().as_str(), "Jo Doe");
        assert_eq!(vcard.first::<Url>().unwrap().as_str(), "http://example.com/jo");

        let name = vcard.first::<StructuredName>().unwrap();
        assert_eq!(name.given, ["Jo"]);
        assert_eq!(name.family, ["Doe"]);

        let org = vcard.first::<Organization>().unwrap();
        assert_eq!(org.name, "Acme");
        assert_eq!(org.units, ["Labs"]);

        let adr = vcard.by_name("ADR").next().unwrap();
        assert_eq!(adr.parameters.types(), ["work"]);
        let address = adr.value::<Address>().unwrap();
        assert_eq!(address.street, ["1 Main St"]);
        assert_eq!(address.locality, ["Springfield"]);

        let tel = vcard.by_name("TEL").next().unwrap();
        assert_eq!(tel.parameters.types(), ["home"]);
        assert_eq!(tel.value::<Telephone>().unwrap().as_str(), "+1 555 0100");

        assert_eq!(vcard.first::<Email>().unwrap().as_str(), "jo@example.com");
        assert_eq!(vcard.first::<Geo>().unwrap().longitude, Some(-122.082_932));
        assert!(vcard.first::<Photo>().is_some());
        assert_eq!(vcard.first::<Categories>().unwrap().values, ["friends"]);
    }

    #[test]
    fn nested_agent_is_embedded() {
        let vcards = parse_hcard(PAGE).unwrap();
        assert_eq!(vcards.len(), 2);

        let agent = vcards[0].first::<Agent>().unwrap();
        let nested = agent.as_vcard().unwrap();
        assert_eq!(nested.formatted_name(), Some("Assistant"));
        // The nested name is not a property of the outer document.
        assert_eq!(vcards[0].all::<FormattedName>().count(), 1);

        assert_eq!(vcards[1].formatted_name(), Some("Second"));
    }

    #[test]
    fn page_without_vcards() {
        let mut reader = HCardReader::new(b"<html><body><p>nothing</p></body></html>").unwrap();
        assert!(reader.read_next().is_none());
    }
}
