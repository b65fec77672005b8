//! xCard writer (RFC 6351).

use std::io::Write;

use kunai_core::constants::{EXTENSION_PREFIX, XCARD_NAMESPACE};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use super::element::{Element, Node};
use crate::error::{RfcError, RfcResult};
use crate::rfc::vcard::core::{DataType, VCard, VCardParameters, VCardVersion, Warning, XmlProperty};
use crate::rfc::vcard::options::WriterOptions;
use crate::rfc::vcard::parse::unescape_text;
use crate::rfc::vcard::scribe::{
    Marshalled, Planned, Scribe, ScribeContext, ScribeError, ScribeRegistry, Signature,
    drain_warnings, missing_required, plan, xml_value,
};

/// Writes vCards as one xCard document.
///
/// The `<vcards>` root is opened by the first [`XCardWriter::write`] and
/// closed by [`XCardWriter::finish`]. Output is always 4.0, whatever
/// version the options name.
pub struct XCardWriter<W: Write> {
    writer: Writer<W>,
    registry: ScribeRegistry,
    options: WriterOptions,
    started: bool,
    warnings: Vec<Warning>,
}

impl<W: Write> XCardWriter<W> {
    /// A compact writer with default options.
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default(), false)
    }

    /// A writer indenting nested elements by two spaces.
    pub fn indented(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default(), true)
    }

    pub fn with_options(inner: W, options: WriterOptions, indent: bool) -> Self {
        let writer = if indent {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };
        Self {
            writer,
            registry: ScribeRegistry::new(),
            options,
            started: false,
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

    /// ## Summary
    /// Writes one `<vcard>` element.
    ///
    /// ## Errors
    /// Returns an error if the underlying stream fails.
    #[tracing::instrument(skip(self, vcard), fields(properties = vcard.len()))]
    pub fn write(&mut self, vcard: &VCard) -> RfcResult<()> {
        self.warnings.clear();
        self.start()?;
        let element = self.build(vcard);
        element.write_to(&mut self.writer, Some(XCARD_NAMESPACE))?;
        tracing::debug!(warnings = self.warnings.len(), "Wrote xCard document");
        Ok(())
    }

    /// ## Summary
    /// Closes the `<vcards>` root and returns the stream.
    ///
    /// ## Errors
    /// Returns an error if the underlying stream fails.
    pub fn finish(mut self) -> RfcResult<W> {
        self.start()?;
        self.writer
            .write_event(Event::End(BytesEnd::new("vcards")))?;
        let mut inner = self.writer.into_inner();
        inner.flush()?;
        Ok(inner)
    }

    fn start(&mut self) -> RfcResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut root = BytesStart::new("vcards");
        root.push_attribute(("xmlns", XCARD_NAMESPACE));
        self.writer.write_event(Event::Start(root))?;
        Ok(())
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "xCard write warning");
        self.warnings.push(warning);
    }

    fn build(&mut self, vcard: &VCard) -> Element {
        let version = VCardVersion::V4_0;
        for warning in missing_required(vcard, version) {
            self.warn(warning);
        }

        let signature = Signature {
            prod_id: self.options.add_prod_id,
            generator: self.options.add_generator,
        };
        let mut ctx = ScribeContext::new(version, self.options.compatibility_mode)
            .with_label_policy(self.options.label_policy);
        let planned = plan(vcard, &self.registry, &mut ctx, signature, &mut self.warnings);

        let mut root = Element::in_namespace(XCARD_NAMESPACE, "vcard");
        // Index of each group element in `root.children`.
        let mut groups: Vec<(String, usize)> = Vec::new();

        for item in &planned {
            let Some(element) = self.property_element(item, &mut ctx) else {
                continue;
            };
            match &item.property.group {
                None => root.push_child(element),
                Some(group) => {
                    let index = match groups.iter().find(|(name, _)| name == group) {
                        Some(&(_, index)) => index,
                        None => {
                            root.push_child(
                                Element::in_namespace(XCARD_NAMESPACE, "group")
                                    .with_attribute("name", group.as_str()),
                            );
                            groups.push((group.clone(), root.children.len() - 1));
                            root.children.len() - 1
                        }
                    };
                    if let Some(Node::Element(group)) = root.children.get_mut(index) {
                        group.push_child(element);
                    }
                }
            }
        }
        root
    }

    fn property_element(&mut self, item: &Planned<'_>, ctx: &mut ScribeContext) -> Option<Element> {
        if let Some(xml) = item.property.value::<XmlProperty>() {
            return match Element::parse_xml(xml.value.as_bytes()) {
                Ok(element) => Some(element),
                Err(err) => {
                    self.warn(
                        Warning::new(format!("{err}; omitted")).with_property(item.name()),
                    );
                    None
                }
            };
        }

        let outcome = item.scribe.write_xml(item.property.payload(), ctx);
        drain_warnings(ctx, item.name(), None, &mut self.warnings);

        let values = match outcome {
            Ok(Marshalled::Value(values)) => values,
            Ok(Marshalled::Skip(reason)) => {
                self.warn(Warning::new(reason).with_property(item.name()));
                return None;
            }
            Ok(Marshalled::Embedded(_)) => {
                self.warn(
                    Warning::new("embedded vCards cannot be written to xCard; omitted")
                        .with_property(item.name()),
                );
                return None;
            }
            Err(err @ ScribeError::Unsupported(_)) => {
                let text = match item.scribe.write_text(item.property.payload(), ctx) {
                    Ok(Marshalled::Value(text)) => text,
                    _ => {
                        self.warn(Warning::new(format!("{err}; omitted")).with_property(item.name()));
                        return None;
                    }
                };
                drain_warnings(ctx, item.name(), None, &mut self.warnings);
                self.warn(
                    Warning::new(format!("{err}; written as unknown text"))
                        .with_property(item.name()),
                );
                vec![xml_value(&DataType::Unknown, unescape_text(&text))]
            }
            Err(err) => {
                self.warn(Warning::new(format!("{err}; omitted")).with_property(item.name()));
                return None;
            }
        };

        let mut element = Element::in_namespace(item.scribe.xml_namespace(), item.scribe.xml_name());
        if let Some(parameters) = parameters_element(&item.parameters) {
            element.push_child(parameters);
        }
        for value in values {
            element.push_child(value);
        }
        Some(element)
    }
}

/// Builds `<parameters>`, or `None` when nothing is left to write. The value
/// type is carried by the value element, so `VALUE` is never written.
fn parameters_element(params: &VCardParameters) -> Option<Element> {
    let mut parameters = Element::in_namespace(XCARD_NAMESPACE, "parameters");
    for param in params {
        if param.name == "VALUE" || param.name == "ENCODING" {
            continue;
        }
        let data_type = parameter_type(&param.name);
        let mut element = Element::in_namespace(XCARD_NAMESPACE, param.name.to_ascii_lowercase());
        for value in &param.values {
            element.push_child(xml_value(&data_type, value.as_str()));
        }
        parameters.push_child(element);
    }
    (!parameters.children.is_empty()).then_some(parameters)
}

fn parameter_type(name: &str) -> DataType {
    match name {
        "LANGUAGE" => DataType::LanguageTag,
        "PREF" => DataType::Integer,
        _ if name.starts_with(EXTENSION_PREFIX) => DataType::Unknown,
        _ => DataType::Text,
    }
}

/// ## Summary
/// Writes vCards as an xCard string.
///
/// ## Errors
/// Returns an error if the output is not valid UTF-8, which cannot happen
/// for markup built from Rust strings.
pub fn write_xcard(vcards: &[VCard], indent: bool) -> RfcResult<String> {
    let mut writer = XCardWriter::with_options(Vec::new(), WriterOptions::default(), indent);
    for vcard in vcards {
        writer.write(vcard)?;
    }
    String::from_utf8(writer.finish()?)
        .map_err(|e| RfcError::XmlError(format!("generated markup is not UTF-8: {e}")))
}
