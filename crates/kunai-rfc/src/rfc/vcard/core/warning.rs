//! Non-fatal problems recorded while reading or writing.

use std::fmt;

/// A warning attached to a read or write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Property the warning relates to.
    pub property: Option<String>,
    /// Line number (1-based) in the input, for the line-oriented reader.
    pub line: Option<usize>,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            property: None,
            line: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.property = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, &self.property) {
            (Some(line), Some(name)) => write!(f, "Line {line} ({name} property): {}", self.message),
            (Some(line), None) => write!(f, "Line {line}: {}", self.message),
            (None, Some(name)) => write!(f, "{name} property: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_context() {
        let warning = Warning::new("bad value").with_property("GEO").with_line(7);
        assert_eq!(warning.to_string(), "Line 7 (GEO property): bad value");
    }

    #[test]
    fn display_plain() {
        assert_eq!(Warning::new("oops").to_string(), "oops");
    }
}
