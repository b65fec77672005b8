//! Errors raised while splitting a content line.

use std::fmt;

pub type ParseResult<T> = Result<T, ParseError>;

/// A content line that could not be split into name, parameters and value.
///
/// The reader turns these into warnings and skips the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based.
    pub line: usize,
    pub message: String,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_name(line: usize, name: &str) -> Self {
        Self::new(
            ParseErrorKind::InvalidPropertyName,
            line,
            format!("{name:?}"),
        )
    }

    #[must_use]
    pub fn invalid_parameter(line: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidParameter, line, message)
    }

    #[must_use]
    pub fn invalid_utf8(line: usize, err: &std::string::FromUtf8Error) -> Self {
        Self::new(
            ParseErrorKind::EncodingError,
            line,
            format!("line is not valid UTF-8: {}", err.utf8_error()),
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.kind, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No `:` after the name and parameters.
    MissingSeparator,
    InvalidPropertyName,
    /// Unterminated quote or empty parameter name.
    InvalidParameter,
    EncodingError,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingSeparator => "missing separator",
            Self::InvalidPropertyName => "invalid property name",
            Self::InvalidParameter => "invalid parameter",
            Self::EncodingError => "encoding error",
        })
    }
}
