//! Backslash escapes and component splitting for text values.

/// Resolves `\n`, `\N`, `\,`, `\;` and `\\`. A backslash before anything
/// else stays as written.
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        let tail = &rest[at + 1..];
        match tail.chars().next() {
            Some('n' | 'N') => out.push('\n'),
            Some(c @ (',' | ';' | '\\')) => out.push(c),
            _ => {
                out.push('\\');
                rest = tail;
                continue;
            }
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

/// [`split_unescaped`] on `;`.
#[must_use]
pub fn split_structured(s: &str) -> Vec<&str> {
    split_unescaped(s, ';')
}

/// Cuts `s` at every `delimiter` not preceded by an escaping backslash.
/// Escapes inside the parts are left alone.
#[must_use]
pub fn split_unescaped(s: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == delimiter {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        } else {
            // part continues
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Splits a component value on unescaped commas and unescapes each part.
///
/// An empty component yields no values.
#[must_use]
pub fn split_component(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }

    split_unescaped(s, ',')
        .into_iter()
        .map(unescape_text)
        .collect()
}

/// Replaces `\n` escapes with CRLF while leaving every other escape intact.
#[must_use]
pub fn expand_escaped_newlines(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n' | 'N') => {
                    chars.next();
                    result.push_str("\r\n");
                }
                Some(&next) => {
                    chars.next();
                    result.push(c);
                    result.push(next);
                }
                None => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_known_sequences() {
        assert_eq!(unescape_text(r"one\ntwo\Nthree"), "one\ntwo\nthree");
        assert_eq!(unescape_text(r"a\,b\;c\\d"), "a,b;c\\d");
        assert_eq!(unescape_text(r"C:\temp\"), r"C:\temp\");
        assert_eq!(unescape_text(r"\\n"), r"\n");
    }

    #[test]
    fn split_structured_basic() {
        let parts = split_structured("Doe;John;Q;Mr.;Jr.");
        assert_eq!(parts, vec!["Doe", "John", "Q", "Mr.", "Jr."]);
    }

    #[test]
    fn split_structured_escaped() {
        let parts = split_structured(r"Doe\;Smith;John");
        assert_eq!(parts, vec![r"Doe\;Smith", "John"]);
    }

    #[test]
    fn split_structured_after_escaped_backslash() {
        let parts = split_structured(r"Doe\\;John");
        assert_eq!(parts, vec![r"Doe\\", "John"]);
    }

    #[test]
    fn split_component_commas() {
        assert_eq!(split_component("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_component(r"Richter\, James"), vec!["Richter, James"]);
        assert!(split_component("").is_empty());
    }

    #[test]
    fn expand_newlines_only() {
        assert_eq!(expand_escaped_newlines(r"a\nb\,c\\n"), "a\r\nb\\,c\\\\n");
    }
}
