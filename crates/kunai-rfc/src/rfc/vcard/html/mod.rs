//! hCard (microformat) reading and writing.
//!
//! Pages are parsed leniently into the [`Element`] tree shared with xCard.
//! Every element carrying class `vcard` is a document; properties are found
//! by class name below it, never crossing into a nested `vcard`.

mod reader;
mod writer;

use super::xml::{Element, Node};

pub use reader::{HCardReader, parse_hcard};
pub use writer::{HCardWriter, write_hcard};

/// Class marking a document element.
pub const VCARD_CLASS: &str = "vcard";

/// Class of the elements giving `TYPE` values.
const TYPE_CLASS: &str = "type";

/// Class of the elements holding the machine-readable value.
const VALUE_CLASS: &str = "value";

/// Descendants of `element` carrying `class`, in document order.
///
/// A nested `vcard` element can match but is not searched further.
#[must_use]
pub fn find_by_class<'a>(element: &'a Element, class: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    collect_by_class(element, class, &mut found);
    found
}

fn collect_by_class<'a>(element: &'a Element, class: &str, found: &mut Vec<&'a Element>) {
    for child in element.child_elements() {
        if child.has_class(class) {
            found.push(child);
        }
        if !child.has_class(VCARD_CLASS) {
            collect_by_class(child, class, found);
        }
    }
}

/// The document embedded in a property element: the element itself when it
/// carries class `vcard`, otherwise its first `vcard` descendant.
#[must_use]
pub fn nested_vcard(element: &Element) -> Option<&Element> {
    if element.has_class(VCARD_CLASS) {
        return Some(element);
    }
    find_by_class(element, VCARD_CLASS).into_iter().next()
}

/// The value of a property element.
///
/// `value` sub-elements win and are concatenated. Otherwise `abbr` gives its
/// title, `img` its source, `object` its data, and anything else its text
/// without `type` sub-elements, with whitespace collapsed.
#[must_use]
pub fn element_value(element: &Element) -> String {
    let parts = find_by_class(element, VALUE_CLASS);
    if parts.is_empty() {
        tag_value(element)
    } else {
        parts.into_iter().map(tag_value).collect()
    }
}

/// Like [`element_value`], but links give their target with any `mailto:`
/// or `tel:` scheme removed.
#[must_use]
pub fn link_value(element: &Element) -> String {
    match element.attribute("href").filter(|_| is_link(element)) {
        Some(href) => strip_scheme(href).to_string(),
        None => element_value(element),
    }
}

/// `TYPE` values from `type` sub-elements, lower-cased.
#[must_use]
pub fn element_types(element: &Element) -> Vec<String> {
    find_by_class(element, TYPE_CLASS)
        .into_iter()
        .map(|e| collapse_whitespace(&e.text()).to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_link(element: &Element) -> bool {
    matches!(element.name.as_str(), "a" | "area" | "link")
}

fn strip_scheme(href: &str) -> &str {
    ["mailto:", "tel:"]
        .iter()
        .find_map(|scheme| {
            href.get(..scheme.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
                .map(|_| &href[scheme.len()..])
        })
        .unwrap_or(href)
}

fn tag_value(element: &Element) -> String {
    let attribute = match element.name.as_str() {
        "abbr" => element.attribute("title"),
        "img" => element.attribute("src"),
        "object" => element.attribute("data"),
        _ => None,
    };
    match attribute {
        Some(value) => value.trim().to_string(),
        None => {
            let mut text = String::new();
            visible_text(element, &mut text);
            collapse_whitespace(&text)
        }
    }
}

/// Text content without `type` sub-elements. `<br>` counts as a newline.
fn visible_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if e.name == "br" => out.push('\n'),
            Node::Element(e) if e.has_class(TYPE_CLASS) => {}
            Node::Element(e) => visible_text(e, out),
        }
    }
}

/// Collapses runs of spaces and tabs, keeping line breaks.
fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Element {
        Element::parse_html(html.as_bytes()).unwrap()
    }

    #[test]
    fn value_sources() {
        let root = parse(
            r#"<p><abbr class="bday" title="1970-01-01">Jan 1st</abbr>
            <img class="photo" src="me.png">
            <span class="tel"><span class="type">Work</span> +1  555
              0100</span>
            <span class="tel"><span class="type">home</span><span class="value">+1</span> (ignored) <span class="value">555</span></span>
            <a class="email" href="mailto:jo@example.com">Mail Jo</a></p>"#,
        );
        let p = root.child("p").unwrap();

        assert_eq!(element_value(p.child("abbr").unwrap()), "1970-01-01");
        assert_eq!(element_value(p.child("img").unwrap()), "me.png");

        let tels = find_by_class(p, "tel");
        assert_eq!(element_value(tels[0]), "+1 555\n0100");
        assert_eq!(element_types(tels[0]), ["work"]);
        assert_eq!(element_value(tels[1]), "+1555");

        let email = p.child("a").unwrap();
        assert_eq!(element_value(email), "Mail Jo");
        assert_eq!(link_value(email), "jo@example.com");
    }

    #[test]
    fn search_stops_at_nested_vcards() {
        let root = parse(
            r#"<div class="vcard"><span class="fn">Outer</span>
            <div class="agent vcard"><span class="fn">Inner</span></div></div>"#,
        );
        let outer = root.child("div").unwrap();
        let names: Vec<String> = find_by_class(outer, "fn")
            .into_iter()
            .map(element_value)
            .collect();
        assert_eq!(names, ["Outer"]);

        let agent = find_by_class(outer, "agent")[0];
        assert!(std::ptr::eq(nested_vcard(agent).unwrap(), agent));
    }

    #[test]
    fn nested_vcard_below_property() {
        let root = parse(r#"<span class="agent"><b><span class="vcard"></span></b></span>"#);
        let agent = root.child("span").unwrap();
        assert!(nested_vcard(agent).unwrap().has_class("vcard"));
        assert!(nested_vcard(agent.child("b").unwrap().child("span").unwrap()).is_some());
        assert!(nested_vcard(&Element::new("span")).is_none());
    }
}
