//! Content lines: `[group.]NAME[;PARAM[=VALUE[,VALUE]]]*:value`.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::vcard::core::{VCardParameters, VCardVersion};

/// Bare 2.1 parameters that name an `ENCODING`.
const ENCODING_TOKENS: &[&str] = &["QUOTED-PRINTABLE", "BASE64", "7BIT", "8BIT", "B"];

/// Bare 2.1 parameters that name a `VALUE`.
const VALUE_TOKENS: &[&str] = &["URL", "CONTENT-ID", "CID", "INLINE"];

/// Joins folded physical lines back into logical lines.
///
/// A break (CRLF, LF or CR) followed by a single space or tab is removed
/// together with that one whitespace character. Other breaks become `\n`.
#[must_use]
pub fn unfold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(['\r', '\n']) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos..];
        let after = after
            .strip_prefix("\r\n")
            .or_else(|| after.strip_prefix('\r'))
            .or_else(|| after.strip_prefix('\n'))
            .unwrap_or(after);
        rest = match after.strip_prefix([' ', '\t']) {
            Some(continued) => continued,
            None => {
                out.push('\n');
                after
            }
        };
    }

    out.push_str(rest);
    out
}

/// One logical line split into its parts; the value is still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// `item1` in `item1.TEL`.
    pub group: Option<String>,
    /// Case preserved.
    pub name: String,
    pub params: VCardParameters,
    /// Everything after the separating colon, untouched.
    pub value: String,
}

impl ContentLine {
    fn is_marker(&self, marker: &str) -> bool {
        self.name.eq_ignore_ascii_case(marker) && self.value.trim().eq_ignore_ascii_case("VCARD")
    }

    #[must_use]
    pub fn is_begin(&self) -> bool {
        self.is_marker("BEGIN")
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.is_marker("END")
    }
}

/// Splits `line` into group, name, parameters and value.
///
/// ## Errors
/// Fails when no unquoted `:` is present, when the name contains characters
/// outside `[A-Za-z0-9_-]`, or when a parameter has `=` but no name.
pub fn parse_content_line(
    line: &str,
    line_num: usize,
    version: VCardVersion,
) -> ParseResult<ContentLine> {
    let Some(colon) = find_value_separator(line) else {
        return Err(ParseError::new(
            ParseErrorKind::MissingSeparator,
            line_num,
            "no ':' between name and value",
        ));
    };
    let head = &line[..colon];
    let value = &line[colon + 1..];

    let (qualified, param_list) = match find_unquoted(head, ';') {
        Some(semi) => (&head[..semi], Some(&head[semi + 1..])),
        None => (head, None),
    };
    let (group, name) = split_group(qualified.trim());

    let valid_name = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !valid_name {
        return Err(ParseError::invalid_name(line_num, name));
    }

    let mut params = VCardParameters::new();
    if let Some(list) = param_list {
        for segment in split_unquoted(list, ';') {
            add_parameter(segment.trim(), line_num, version, &mut params)?;
        }
    }

    Ok(ContentLine {
        group: group.map(str::to_owned),
        name: name.to_owned(),
        params,
        value: value.to_owned(),
    })
}

/// Byte offset of the first `:` outside double quotes.
#[must_use]
pub fn find_value_separator(line: &str) -> Option<usize> {
    find_unquoted(line, ':')
}

fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut quoted = false;
    s.char_indices().find_map(|(i, c)| {
        if c == '"' {
            quoted = !quoted;
        }
        (c == target && !quoted).then_some(i)
    })
}

fn split_unquoted(s: &str, target: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(pos) = find_unquoted(rest, target) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + target.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// A group is a non-empty run of `[A-Za-z0-9-]` before the first dot.
fn split_group(s: &str) -> (Option<&str>, &str) {
    match s.split_once('.') {
        Some((group, name))
            if !group.is_empty()
                && group.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') =>
        {
            (Some(group), name)
        }
        _ => (None, s),
    }
}

fn add_parameter(
    segment: &str,
    line_num: usize,
    version: VCardVersion,
    params: &mut VCardParameters,
) -> ParseResult<()> {
    if segment.is_empty() {
        return Ok(());
    }

    match find_unquoted(segment, '=') {
        None => params.add(classify_nameless(segment), segment),
        Some(0) => {
            return Err(ParseError::invalid_parameter(
                line_num,
                format!("parameter without a name: {segment}"),
            ));
        }
        Some(eq) => {
            let caret = version != VCardVersion::V2_1;
            let values = param_values(&segment[eq + 1..], caret);
            params.add_all(segment[..eq].trim(), values);
        }
    }
    Ok(())
}

/// Names a 2.1 parameter written without `NAME=`.
#[must_use]
pub fn classify_nameless(value: &str) -> &'static str {
    let is = |tokens: &[&str]| tokens.iter().any(|t| t.eq_ignore_ascii_case(value));
    if is(ENCODING_TOKENS) {
        "ENCODING"
    } else if is(VALUE_TOKENS) {
        "VALUE"
    } else {
        "TYPE"
    }
}

/// Comma-separated values; quotes are removed, and with `caret` the RFC 6868
/// sequences `^n`, `^'` and `^^` are decoded.
fn param_values(raw: &str, caret: bool) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut values = vec![String::new()];
    let mut quoted = false;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        let Some(current) = values.last_mut() else {
            break;
        };
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => values.push(String::new()),
            '^' if caret => {
                let mut lookahead = chars.clone();
                let decoded = match lookahead.next() {
                    Some('n' | 'N') => Some('\n'),
                    Some('\'') => Some('"'),
                    Some('^') => Some('^'),
                    _ => None,
                };
                match decoded {
                    Some(ch) => {
                        current.push(ch);
                        chars = lookahead;
                    }
                    None => current.push('^'),
                }
            }
            _ => current.push(c),
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> ContentLine {
        parse_content_line(text, 1, VCardVersion::V3_0).unwrap()
    }

    #[test]
    fn continuation_whitespace_is_removed_once() {
        assert_eq!(unfold("FN:Jo\r\n Doe"), "FN:JoDoe");
        assert_eq!(unfold("NOTE:a\r\n  b"), "NOTE:a b");
        assert_eq!(unfold("FN:Jo\n Doe"), "FN:JoDoe");
        assert_eq!(unfold("FN:Jo\r\tDoe\rN:x"), "FN:JoDoe\nN:x");
        assert_eq!(unfold("A:1\r\nB:2\r\n"), "A:1\nB:2\n");
    }

    #[test]
    fn name_and_value_only() {
        let parsed = line("NICKNAME:Jojo");
        assert_eq!(parsed.group, None);
        assert_eq!(parsed.name, "NICKNAME");
        assert_eq!(parsed.params.len(), 0);
        assert_eq!(parsed.value, "Jojo");
    }

    #[test]
    fn group_prefix() {
        let parsed = line("home-1.EMAIL:jo@example.com");
        assert_eq!(parsed.group.as_deref(), Some("home-1"));
        assert_eq!(parsed.name, "EMAIL");

        let err = parse_content_line("X_1.TEL:1", 1, VCardVersion::V3_0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
    }

    #[test]
    fn parameters_and_repeats() {
        let parsed = line("EMAIL;TYPE=work,internet;PREF=2:jo@example.com");
        assert_eq!(parsed.params.types(), ["work", "internet"]);
        assert_eq!(parsed.params.first("PREF"), Some("2"));

        let repeated = line("TEL;TYPE=CELL;type=home;TYPE=cell:1");
        assert_eq!(repeated.params.types(), ["cell", "home"]);
    }

    #[test]
    fn quoted_parameter_hides_separators() {
        let parsed = line("ADR;LABEL=\"Unit 4; Block B: East\":;;9 Elm Rd");
        assert_eq!(parsed.params.label(), Some("Unit 4; Block B: East"));
        assert_eq!(parsed.value, ";;9 Elm Rd");
    }

    #[test]
    fn caret_sequences_depend_on_version() {
        let parsed = line("ADR;LABEL=Floor 2^nRoom ^'B^' ^^ ^x:;;x");
        assert_eq!(parsed.params.label(), Some("Floor 2\nRoom \"B\" ^ ^x"));

        let legacy = parse_content_line("NOTE;X-A=a^nb:x", 1, VCardVersion::V2_1).unwrap();
        assert_eq!(legacy.params.first("X-A"), Some("a^nb"));
    }

    #[test]
    fn bare_legacy_parameters() {
        let parsed =
            parse_content_line("PHOTO;WORK;BASE64;URL:x", 1, VCardVersion::V2_1).unwrap();
        assert_eq!(parsed.params.types(), ["work"]);
        assert_eq!(parsed.params.encoding(), Some("base64"));
        assert_eq!(parsed.params.first("VALUE"), Some("url"));
    }

    #[test]
    fn later_colons_belong_to_the_value() {
        let parsed = line("SOURCE:ldap://ldap.example.com:389/cn=x");
        assert_eq!(parsed.value, "ldap://ldap.example.com:389/cn=x");
    }

    #[test]
    fn markers_tolerate_spacing() {
        assert!(line("BEGIN : VCARD").is_begin());
        assert!(line("end:vcard").is_end());
        assert_eq!(line("NOTE:  padded ").value, "  padded ");
    }

    #[test]
    fn malformed_lines() {
        let err = parse_content_line("NOTE without separator", 7, VCardVersion::V3_0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingSeparator);
        assert_eq!(err.line, 7);

        let err = parse_content_line("FULL NAME:x", 1, VCardVersion::V3_0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);

        let err = parse_content_line("TEL;=x:1", 1, VCardVersion::V3_0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidParameter);
    }
}
