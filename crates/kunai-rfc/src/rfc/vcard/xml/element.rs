//! A small owned element tree shared by the xCard and hCard codecs.

use std::borrow::Cow;
use std::io::Write;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{RfcError, RfcResult};

/// HTML elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Name of the synthetic element wrapping a parsed HTML document.
pub const DOCUMENT_ROOT: &str = "#document";

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML or HTML element with resolved namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub namespace: Option<String>,
    /// Local name.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_namespace(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates `<name>text</name>` in the given namespace.
    #[must_use]
    pub fn text_element(namespace: Option<&str>, name: &str, text: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(String::from),
            name: name.to_string(),
            attributes: Vec::new(),
            children: vec![Node::Text(text.into())],
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Node::Text(text));
        }
    }

    /// Looks up an attribute (case-insensitive name).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of this element and all descendants.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// Values of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or_default().split_whitespace()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Whether the element is in the given namespace and has the given name.
    #[must_use]
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.name == name
    }

    /// Parses an XML document and returns its root element.
    ///
    /// ## Errors
    /// Returns an error for malformed XML or a document without a root.
    #[tracing::instrument(skip(input), fields(input_len = input.len()))]
    pub fn parse_xml(input: &[u8]) -> RfcResult<Self> {
        let root = TreeBuilder::new(false).build(input)?;
        let element = root
            .child_elements()
            .next()
            .cloned()
            .ok_or_else(|| RfcError::XmlError("document has no root element".to_string()));
        element
    }

    /// Parses HTML leniently into a synthetic [`DOCUMENT_ROOT`] element.
    ///
    /// Void elements, unquoted attributes and unclosed tags are accepted.
    ///
    /// ## Errors
    /// Returns an error when the input cannot be tokenized at all.
    #[tracing::instrument(skip(input), fields(input_len = input.len()))]
    pub fn parse_html(input: &[u8]) -> RfcResult<Self> {
        TreeBuilder::new(true).build(input)
    }

    /// Serializes the element as markup.
    ///
    /// ## Errors
    /// Returns an error if writing fails.
    pub fn to_markup(&self, indent: bool) -> RfcResult<String> {
        let mut writer = if indent {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        self.write_to(&mut writer, None)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| RfcError::XmlError(format!("generated markup is not UTF-8: {e}")))
    }

    /// Writes the element, declaring its namespace when it differs from the
    /// parent's.
    ///
    /// ## Errors
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut Writer<W>,
        parent_namespace: Option<&str>,
    ) -> RfcResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        match self.namespace.as_deref() {
            Some(ns) if parent_namespace != Some(ns) => start.push_attribute(("xmlns", ns)),
            _ => {}
        }
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_to(writer, self.namespace.as_deref())?,
                Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

/// An element under construction plus the namespace scope it opened.
struct Frame {
    element: Element,
    prefixes: Vec<(String, String)>,
}

/// Builds an element tree from quick-xml events.
struct TreeBuilder {
    html: bool,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new(html: bool) -> Self {
        Self {
            html,
            stack: vec![Frame {
                element: Element::new(DOCUMENT_ROOT),
                prefixes: Vec::new(),
            }],
        }
    }

    fn build(mut self, input: &[u8]) -> RfcResult<Element> {
        let mut reader = Reader::from_reader(input);
        {
            let config = reader.config_mut();
            config.trim_text(false);
            if self.html {
                config.check_end_names = false;
                config.allow_unmatched_ends = true;
            }
        }

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let frame = self.open(&e)?;
                    if self.html && is_void(&frame.element.name) {
                        self.append(frame.element);
                    } else {
                        self.stack.push(frame);
                    }
                }
                Event::Empty(e) => {
                    let frame = self.open(&e)?;
                    self.append(frame.element);
                }
                Event::End(e) => {
                    let qname = e.name();
                    let name = reader.decoder().decode(qname.as_ref())?;
                    self.close(local_part(&name));
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(e.as_ref())?;
                    self.text(&text);
                }
                Event::CData(e) => {
                    let text = reader.decoder().decode(e.as_ref())?;
                    self.text(&text);
                }
                Event::GeneralRef(e) => {
                    let name = reader.decoder().decode(e.as_ref())?;
                    self.text(&resolve_entity(&name));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        while self.stack.len() > 1 {
            if let Some(frame) = self.stack.pop() {
                self.append(frame.element);
            }
        }

        self.stack
            .pop()
            .map(|frame| frame.element)
            .ok_or_else(|| RfcError::XmlError("empty element stack".to_string()))
    }

    fn open(&self, start: &BytesStart<'_>) -> RfcResult<Frame> {
        let qname = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| RfcError::XmlError(e.to_string()))?
            .to_string();

        let mut prefixes = Vec::new();
        let mut attributes = Vec::new();
        let attrs = if self.html {
            start.html_attributes()
        } else {
            start.attributes()
        };
        for attr in attrs {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| RfcError::XmlError(e.to_string()))?;
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|e| RfcError::XmlError(e.to_string()))?;
            let value = quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw));

            if !self.html && key == "xmlns" {
                prefixes.push((String::new(), value.into_owned()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:").filter(|_| !self.html) {
                prefixes.push((prefix.to_string(), value.into_owned()));
            } else {
                let key = if self.html {
                    key.to_ascii_lowercase()
                } else {
                    key.to_string()
                };
                attributes.push((key, value.into_owned()));
            }
        }

        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None => ("", qname.as_str()),
        };

        let (namespace, name) = if self.html {
            (None, local.to_ascii_lowercase())
        } else {
            (self.resolve_prefix(prefix, &prefixes), local.to_string())
        };

        Ok(Frame {
            element: Element {
                namespace,
                name,
                attributes,
                children: Vec::new(),
            },
            prefixes,
        })
    }

    fn resolve_prefix(&self, prefix: &str, own: &[(String, String)]) -> Option<String> {
        own.iter()
            .chain(self.stack.iter().rev().flat_map(|f| f.prefixes.iter()))
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn append(&mut self, element: Element) {
        if let Some(parent) = self.stack.last_mut() {
            parent.element.push_child(element);
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(parent) = self.stack.last_mut() {
            parent.element.push_text(text);
        }
    }

    /// Closes the innermost open element named `name`, closing any unclosed
    /// elements above it. Unmatched end tags are ignored.
    fn close(&mut self, name: &str) {
        let html = self.html;
        let Some(pos) = self.stack.iter().skip(1).rposition(|frame| {
            if html {
                frame.element.name.eq_ignore_ascii_case(name)
            } else {
                frame.element.name == name
            }
        }) else {
            return;
        };

        while self.stack.len() > pos + 1 {
            if let Some(frame) = self.stack.pop() {
                self.append(frame.element);
            }
        }
    }
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn local_part(qname: &str) -> &str {
    qname.split_once(':').map_or(qname, |(_, local)| local)
}

/// Resolves a general entity reference (`&name;`) to its text.
fn resolve_entity(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        if let Some(c) = parsed.and_then(char::from_u32) {
            return c.to_string();
        }
    }

    match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => "\u{a0}".to_string(),
        _ => format!("&{name};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:ietf:params:xml:ns:vcard-4.0";

    #[test]
    fn parse_xml_resolves_namespaces() {
        let xml = br#"<v:vcards xmlns:v="urn:ietf:params:xml:ns:vcard-4.0"><v:vcard><v:fn><v:text>A &amp; B</v:text></v:fn><x:foo xmlns:x="http://example.com">bar</x:foo></v:vcard></v:vcards>"#;
        let root = Element::parse_xml(xml).unwrap();
        assert!(root.is(NS, "vcards"));

        let vcard = root.child("vcard").unwrap();
        let fn_element = vcard.child("fn").unwrap();
        assert_eq!(fn_element.namespace.as_deref(), Some(NS));
        assert_eq!(fn_element.text(), "A & B");

        let foo = vcard.child("foo").unwrap();
        assert_eq!(foo.namespace.as_deref(), Some("http://example.com"));
    }

    #[test]
    fn default_namespace_applies_to_children() {
        let xml = br#"<vcards xmlns="urn:ietf:params:xml:ns:vcard-4.0"><vcard/></vcards>"#;
        let root = Element::parse_xml(xml).unwrap();
        assert!(root.child("vcard").unwrap().is(NS, "vcard"));
    }

    #[test]
    fn malformed_xml_is_error() {
        assert!(Element::parse_xml(b"<a><b></a>").is_err());
        assert!(Element::parse_xml(b"").is_err());
    }

    #[test]
    fn markup_declares_namespace_once() {
        let element = Element::in_namespace(NS, "fn")
            .with_child(Element::text_element(Some(NS), "text", "Tom & Jerry"));
        assert_eq!(
            element.to_markup(false).unwrap(),
            r#"<fn xmlns="urn:ietf:params:xml:ns:vcard-4.0"><text>Tom &amp; Jerry</text></fn>"#
        );
    }

    #[test]
    fn parse_html_is_lenient() {
        let html = b"<html><body><div class=vcard><span class=\"fn\">Jo&nbsp;Doe</span><br><img src=\"a.png\"><p>unclosed</div></body></html>";
        let root = Element::parse_html(html).unwrap();
        assert_eq!(root.name, DOCUMENT_ROOT);

        let body = root.child("html").unwrap().child("body").unwrap();
        let card = body.child("div").unwrap();
        assert!(card.has_class("vcard"));
        assert_eq!(card.child("span").unwrap().text(), "Jo\u{a0}Doe");
        assert_eq!(card.child("img").unwrap().attribute("src"), Some("a.png"));
        assert_eq!(card.child("p").unwrap().text(), "unclosed");
    }

    #[test]
    fn numeric_entities() {
        assert_eq!(resolve_entity("#65"), "A");
        assert_eq!(resolve_entity("#x263A"), "\u{263a}");
        assert_eq!(resolve_entity("unknown"), "&unknown;");
    }
}
