//! Typed jCard property values.

use serde_json::Value;

use crate::rfc::vcard::core::DataType;

/// The value part of a jCard property: its value type plus one or more
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct JCardValue {
    pub data_type: DataType,
    pub values: Vec<Value>,
}

impl JCardValue {
    /// A single `text` value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::single(DataType::Text, value.into())
    }

    #[must_use]
    pub fn single(data_type: DataType, value: impl Into<Value>) -> Self {
        Self {
            data_type,
            values: vec![value.into()],
        }
    }

    /// One value per item (`["categories", {}, "text", "a", "b"]`).
    #[must_use]
    pub fn multi<S: AsRef<str>>(data_type: DataType, values: &[S]) -> Self {
        Self {
            data_type,
            values: values
                .iter()
                .map(|v| Value::String(v.as_ref().to_string()))
                .collect(),
        }
    }

    /// A structured `text` value: one array whose items are strings, or
    /// arrays for multi-valued components.
    #[must_use]
    pub fn structured<S: AsRef<str>>(components: &[&[S]]) -> Self {
        let items = components
            .iter()
            .map(|values| match values {
                [] => Value::String(String::new()),
                [single] => Value::String(single.as_ref().to_string()),
                many => Value::Array(
                    many.iter()
                        .map(|v| Value::String(v.as_ref().to_string()))
                        .collect(),
                ),
            })
            .collect();
        Self::single(DataType::Text, Value::Array(items))
    }

    /// The first value rendered as a string.
    #[must_use]
    pub fn as_single(&self) -> String {
        self.values.first().map(value_to_string).unwrap_or_default()
    }

    /// Every value rendered as a string; nested arrays are flattened.
    #[must_use]
    pub fn as_strings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for value in &self.values {
            match value {
                Value::Array(items) => out.extend(items.iter().map(value_to_string)),
                other => out.push(value_to_string(other)),
            }
        }
        out
    }

    /// Components of a structured value. Accepts both the single-array form
    /// and one trailing value per component.
    #[must_use]
    pub fn as_structured(&self) -> Vec<Vec<String>> {
        let items: &[Value] = match self.values.as_slice() {
            [Value::Array(items)] => items,
            values => values,
        };
        items.iter().map(component_values).collect()
    }

    /// The text form used when a value must be kept verbatim.
    #[must_use]
    pub fn to_raw_string(&self) -> String {
        self.values
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn component_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let s = value_to_string(other);
            if s.is_empty() { Vec::new() } else { vec![s] }
        }
    }
}

/// Renders a JSON value the way it would appear in a text vCard.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(";"),
        other => other.to_string(),
    }
}
