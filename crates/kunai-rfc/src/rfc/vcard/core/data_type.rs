//! Value data types shared by the `VALUE` parameter, xCard and jCard.

use std::fmt;

/// The data type of a property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Text,
    Uri,
    Date,
    Time,
    DateTime,
    DateAndOrTime,
    Timestamp,
    Boolean,
    Integer,
    Float,
    UtcOffset,
    LanguageTag,
    /// 2.1 `VALUE=url`.
    Url,
    /// 2.1 `VALUE=content-id`.
    ContentId,
    /// 2.1 `VALUE=inline`.
    Inline,
    /// 3.0 `VALUE=binary`.
    Binary,
    /// Type not known to this library, or none declared.
    Unknown,
    /// Any other value type name, kept lower-cased.
    Other(String),
}

impl DataType {
    /// Parses a data type name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "uri" => Self::Uri,
            "date" => Self::Date,
            "time" => Self::Time,
            "date-time" => Self::DateTime,
            "date-and-or-time" => Self::DateAndOrTime,
            "timestamp" => Self::Timestamp,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "float" => Self::Float,
            "utc-offset" => Self::UtcOffset,
            "language-tag" => Self::LanguageTag,
            "url" => Self::Url,
            "content-id" | "cid" => Self::ContentId,
            "inline" => Self::Inline,
            "binary" => Self::Binary,
            "unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the lower-case name used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Uri => "uri",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "date-time",
            Self::DateAndOrTime => "date-and-or-time",
            Self::Timestamp => "timestamp",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::UtcOffset => "utc-offset",
            Self::LanguageTag => "language-tag",
            Self::Url => "url",
            Self::ContentId => "content-id",
            Self::Inline => "inline",
            Self::Binary => "binary",
            Self::Unknown => "unknown",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(DataType::parse("URI"), DataType::Uri);
        assert_eq!(DataType::parse("Date-Time"), DataType::DateTime);
    }

    #[test]
    fn unknown_names_are_kept() {
        let dt = DataType::parse("X-Custom");
        assert_eq!(dt, DataType::Other("x-custom".to_string()));
        assert_eq!(dt.as_str(), "x-custom");
    }
}
