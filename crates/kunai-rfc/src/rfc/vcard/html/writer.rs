//! hCard writer.

use std::io::Write;

use kunai_core::constants::MAX_NESTING_DEPTH;

use super::{TYPE_CLASS, VCARD_CLASS};
use crate::error::{RfcError, RfcResult};
use crate::rfc::vcard::core::{VCard, Warning};
use crate::rfc::vcard::options::WriterOptions;
use crate::rfc::vcard::parse::unescape_text;
use crate::rfc::vcard::scribe::{
    Marshalled, Planned, Scribe, ScribeContext, ScribeError, ScribeRegistry, Signature,
    drain_warnings, html_element, missing_required, plan,
};
use crate::rfc::vcard::xml::{Element, Node};

/// Writes vCards as hCard markup, one `<div class="vcard">` per document.
///
/// Properties are gated against the version in the writer's options.
/// No `PRODID` or `X-GENERATOR` is added.
pub struct HCardWriter<W> {
    inner: W,
    registry: ScribeRegistry,
    options: WriterOptions,
    indent: bool,
    warnings: Vec<Warning>,
}

impl<W: Write> HCardWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default(), false)
    }

    pub fn with_options(inner: W, options: WriterOptions, indent: bool) -> Self {
        Self {
            inner,
            registry: ScribeRegistry::new(),
            options,
            indent,
            warnings: Vec::new(),
        }
    }

    /// ## Summary
    /// Adds an extension scribe for this writer.
    ///
    /// ## Errors
    /// Returns an error if the scribe fails registration checks.
    pub fn register_scribe<S: Scribe + 'static>(&mut self, scribe: S) -> RfcResult<()> {
        self.registry.register(scribe)
    }

    pub fn registry_mut(&mut self) -> &mut ScribeRegistry {
        &mut self.registry
    }

    /// Warnings from the last write.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// ## Summary
    /// Writes one vCard element followed by a newline.
    ///
    /// ## Errors
    /// Returns an error if the underlying stream fails.
    #[tracing::instrument(skip(self, vcard), fields(version = %self.options.version, properties = vcard.len()))]
    pub fn write(&mut self, vcard: &VCard) -> RfcResult<()> {
        self.warnings.clear();
        let element = self.build(vcard, VCARD_CLASS, 0);
        let markup = element.to_markup(self.indent)?;
        self.inner.write_all(markup.as_bytes())?;
        self.inner.write_all(b"\n")?;
        tracing::debug!(bytes = markup.len(), warnings = self.warnings.len(), "Wrote hCard");
        Ok(())
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "hCard write warning");
        self.warnings.push(warning);
    }

    fn build(&mut self, vcard: &VCard, class: &str, depth: usize) -> Element {
        let version = self.options.version;
        for warning in missing_required(vcard, version) {
            self.warn(warning);
        }

        let mut ctx = ScribeContext::new(version, self.options.compatibility_mode)
            .with_label_policy(self.options.label_policy);
        let planned = plan(vcard, &self.registry, &mut ctx, Signature::NONE, &mut self.warnings);

        let mut root = html_element("div", class);
        for item in &planned {
            if let Some(element) = self.property_element(item, &mut ctx, depth) {
                root.push_child(element);
            }
        }
        root
    }

    fn property_element(
        &mut self,
        item: &Planned<'_>,
        ctx: &mut ScribeContext,
        depth: usize,
    ) -> Option<Element> {
        let outcome = item.scribe.write_html(item.property.payload(), ctx);
        drain_warnings(ctx, item.name(), None, &mut self.warnings);

        let mut element = match outcome {
            Ok(Marshalled::Value(element)) => element,
            Ok(Marshalled::Skip(reason)) => {
                self.warn(Warning::new(reason).with_property(item.name()));
                return None;
            }
            Ok(Marshalled::Embedded(nested)) => {
                if depth >= MAX_NESTING_DEPTH {
                    self.warn(
                        Warning::new(format!("nesting deeper than {MAX_NESTING_DEPTH} levels; omitted"))
                            .with_property(item.name()),
                    );
                    return None;
                }
                let class = format!("{} {VCARD_CLASS}", item.scribe.html_class());
                return Some(self.build(nested, &class, depth + 1));
            }
            Err(err @ ScribeError::Unsupported(_)) => {
                let Ok(Marshalled::Value(text)) =
                    item.scribe.write_text(item.property.payload(), ctx)
                else {
                    self.warn(Warning::new(format!("{err}; omitted")).with_property(item.name()));
                    return None;
                };
                drain_warnings(ctx, item.name(), None, &mut self.warnings);
                self.warn(
                    Warning::new(format!("{err}; written as plain text"))
                        .with_property(item.name()),
                );
                html_element("span", &item.scribe.html_class()).with_text(unescape_text(&text))
            }
            Err(err) => {
                self.warn(Warning::new(format!("{err}; omitted")).with_property(item.name()));
                return None;
            }
        };

        let mut children: Vec<Node> = item
            .parameters
            .types()
            .iter()
            .map(|value| Node::Element(html_element("span", TYPE_CLASS).with_text(value.as_str())))
            .collect();
        children.append(&mut element.children);
        element.children = children;
        Some(element)
    }
}

/// ## Summary
/// Writes vCards as hCard markup, in 3.0.
///
/// ## Errors
/// Returns an error if the markup cannot be produced.
pub fn write_hcard(vcards: &[VCard]) -> RfcResult<String> {
    let mut writer = HCardWriter::new(Vec::new());
    for vcard in vcards {
        writer.write(vcard)?;
    }
    String::from_utf8(writer.into_inner())
        .map_err(|e| RfcError::XmlError(format!("generated markup is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::{
        Agent, FormattedName, Geo, Note, StructuredName, Telephone, VCardProperty, VCardVersion,
    };
    use crate::rfc::vcard::html::HCardReader;

    fn person(name: &str) -> VCard {
        VCard::new(VCardVersion::V3_0)
            .with(StructuredName::simple(name, "Jo"))
            .with(FormattedName::new(format!("Jo {name}")))
    }

    #[test]
    fn writes_div_per_document() {
        let vcard = person("Doe")
            .with_property(VCardProperty::of(Telephone::new("+1 555")).with_parameter("TYPE", "work"))
            .with(Geo::new(1.0, 2.0));
        let markup = write_hcard(&[vcard]).unwrap();

        assert!(markup.starts_with(r#"<div class="vcard">"#));
        assert!(markup.contains(r#"<span class="fn">Jo Doe</span>"#));
        assert!(markup.contains(
            r#"<a class="tel" href="tel:+1 555"><span class="type">work</span>+1 555</a>"#
        ));
        assert!(markup.contains(r#"<abbr class="latitude" title="1">1</abbr>"#));
        assert!(markup.ends_with("</div>\n"));
    }

    #[test]
    fn round_trip_with_embedded_agent() {
        let assistant = person("Smith");
        let vcard = person("Doe")
            .with(Note::new("Likes tea"))
            .with(Agent::vcard(assistant.clone()));

        let markup = write_hcard(&[vcard]).unwrap();
        assert!(markup.contains(r#"<div class="agent vcard">"#));

        let mut reader = HCardReader::new(markup.as_bytes()).unwrap();
        let parsed = reader.read_next().unwrap();
        assert!(reader.warnings().is_empty(), "{:?}", reader.warnings());
        assert_eq!(parsed.formatted_name(), Some("Jo Doe"));
        assert_eq!(parsed.first::<Note>().unwrap().as_str(), "Likes tea");

        let nested = parsed.first::<Agent>().unwrap().as_vcard().unwrap();
        assert_eq!(nested.formatted_name(), Some("Jo Smith"));
        assert_eq!(
            nested.first::<StructuredName>(),
            assistant.first::<StructuredName>()
        );
        assert!(reader.read_next().is_none());
    }

    #[test]
    fn version_gating_uses_options() {
        let vcard = person("Doe").with(Agent::url("http://example.com/agent"));
        let options = WriterOptions::for_version(VCardVersion::V4_0);
        let mut writer = HCardWriter::with_options(Vec::new(), options, false);
        writer.write(&vcard).unwrap();
        assert_eq!(writer.warnings().len(), 1);
        let markup = String::from_utf8(writer.into_inner()).unwrap();
        assert!(!markup.contains("agent"));
    }
}
