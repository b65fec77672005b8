//! Backslash escaping for values and RFC 6868 encoding for parameters.

use crate::rfc::vcard::core::VCardVersion;

/// Backslash-escapes `\`, `,`, `;` and newlines. `\r` is dropped so that
/// CRLF and LF both come out as `\n`.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        let escaped = match c {
            '\r' => continue,
            '\n' => "\\n",
            '\\' => "\\\\",
            ';' => "\\;",
            ',' => "\\,",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push_str(escaped);
    }
    out
}

/// Comma-joined list of escaped values.
#[must_use]
pub fn join_list<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_text(value.as_ref()));
    }
    out
}

/// Semicolon-joined components, each a comma-joined list.
#[must_use]
pub fn join_structured<S: AsRef<str>>(components: &[&[S]]) -> String {
    components
        .iter()
        .map(|component| join_list(component))
        .collect::<Vec<_>>()
        .join(";")
}

/// Encodes a parameter value and reports whether it must be quoted.
///
/// 3.0 and 4.0 use caret sequences for `^`, newline and `"`. 2.1 knows no
/// quoting, so `"`, `:` and `;` are removed there and newlines become spaces.
#[must_use]
pub fn escape_param_value(s: &str, version: VCardVersion) -> (String, bool) {
    let modern = version != VCardVersion::V2_1;
    let mut out = String::with_capacity(s.len());
    let mut quote = false;

    for c in s.chars() {
        match (c, modern) {
            ('^', true) => out.push_str("^^"),
            ('\n', true) => out.push_str("^n"),
            ('"', true) => {
                out.push_str("^'");
                quote = true;
            }
            (':' | ';' | ',', true) => {
                out.push(c);
                quote = true;
            }
            ('"' | ':' | ';', false) => {}
            ('\n', false) => out.push(' '),
            _ if c.is_control() => {}
            _ => out.push(c),
        }
    }

    (out, quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::parse::unescape_text;

    #[test]
    fn special_characters_get_backslashes() {
        assert_eq!(escape_text("nothing special"), "nothing special");
        assert_eq!(escape_text("x;y,z\\"), "x\\;y\\,z\\\\");
        assert_eq!(escape_text("one\r\ntwo\nthree"), "one\\ntwo\\nthree");
    }

    #[test]
    fn unescape_undoes_escape() {
        for value in [
            "",
            "tab\tinside",
            "ends with \\",
            "a\n\nb",
            "\\n stays literal",
            ",;\\,;\\",
        ] {
            assert_eq!(unescape_text(&escape_text(value)), value);
        }
    }

    #[test]
    fn lists_and_components() {
        assert_eq!(join_list(&["a,b", "c"]), "a\\,b,c");
        let none: &[&str] = &[];
        assert_eq!(join_list(none), "");

        let family: &[&str] = &["Smith"];
        let given: &[&str] = &["Ann", "Marie"];
        let prefix: &[&str] = &["Ms."];
        let joined = join_structured(&[family, given, none, prefix, none]);
        assert_eq!(joined, "Smith;Ann,Marie;;Ms.;");
    }

    #[test]
    fn plain_parameter_needs_no_quotes() {
        assert_eq!(escape_param_value("home", VCardVersion::V4_0), ("home".to_string(), false));
    }

    #[test]
    fn separators_force_quotes() {
        let (value, quote) = escape_param_value("geo:1,2", VCardVersion::V3_0);
        assert_eq!(value, "geo:1,2");
        assert!(quote);
    }

    #[test]
    fn caret_sequences_in_modern_versions() {
        let (value, quote) = escape_param_value("\"Main\" St\nx^y", VCardVersion::V4_0);
        assert_eq!(value, "^'Main^' St^nx^^y");
        assert!(quote);
    }

    #[test]
    fn legacy_parameters_lose_unsafe_characters() {
        let (value, quote) = escape_param_value("p;q:\"r\"\ns^\u{7}", VCardVersion::V2_1);
        assert_eq!(value, "pqr s^");
        assert!(!quote);
    }
}
