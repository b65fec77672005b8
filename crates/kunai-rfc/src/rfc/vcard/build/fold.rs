//! vCard line folding.

use kunai_core::constants::DEFAULT_FOLD_LINE_LENGTH;

/// How long lines are wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldingScheme {
    /// Maximum physical line length in octets, including the indent.
    pub line_length: usize,
    /// Continuation character, a space or a tab.
    pub indent: char,
}

impl Default for FoldingScheme {
    fn default() -> Self {
        Self {
            line_length: DEFAULT_FOLD_LINE_LENGTH,
            indent: ' ',
        }
    }
}

impl FoldingScheme {
    /// Folds a line to the maximum length.
    ///
    /// Inserts `newline` followed by the indent character, never splitting a
    /// UTF-8 character.
    #[must_use]
    pub fn fold(&self, line: &str, newline: &str) -> String {
        let max = self.line_length.max(self.indent.len_utf8() + 4);
        if line.len() <= max {
            return line.to_string();
        }

        let mut result = String::with_capacity(line.len() + line.len() / max * 3);
        let mut current_len = 0;

        for c in line.chars() {
            let char_len = c.len_utf8();

            if current_len + char_len > max {
                result.push_str(newline);
                result.push(self.indent);
                current_len = self.indent.len_utf8();
            }

            result.push(c);
            current_len += char_len;
        }

        result
    }

    /// Folds a quoted-printable line using soft line breaks.
    ///
    /// Each physical line ends in `=` and stays within the maximum length;
    /// `=XX` escapes are never split.
    #[must_use]
    pub fn fold_quoted_printable(&self, line: &str, newline: &str) -> String {
        let max = self.line_length.max(5);
        if line.len() <= max {
            return line.to_string();
        }

        let mut result = String::with_capacity(line.len() + line.len() / max * 3);
        let mut current_len = 0;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            let mut token = String::from(c);
            if c == '=' {
                token.extend(chars.next());
                token.extend(chars.next());
            }

            if current_len + token.len() > max - 1 && chars.peek().is_some() {
                result.push('=');
                result.push_str(newline);
                current_len = 0;
            }

            current_len += token.len();
            result.push_str(&token);
        }

        result
    }
}
