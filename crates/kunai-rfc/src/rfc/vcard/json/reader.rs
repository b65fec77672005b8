//! jCard reader (RFC 7095).

use std::collections::VecDeque;

use serde::de::Error as _;
use serde_json::Value;

use super::value::{JCardValue, value_to_string};
use crate::error::RfcResult;
use crate::rfc::vcard::core::{
    CompatibilityMode, DataType, PropertyValue, RawProperty, VCard, VCardParameters,
    VCardProperty, VCardVersion, Warning,
};
use crate::rfc::vcard::scribe::{
    ReadTarget, Scribe, ScribeContext, ScribeRegistry, Unmarshalled, drain_warnings,
    drop_default_value_type,
};

/// Parameter carrying the property group.
pub(super) const GROUP_PARAMETER: &str = "group";

/// Reads vCards from a jCard document: one `["vcard", [...]]` array, or an
/// array of them.
pub struct JCardReader {
    documents: VecDeque<Value>,
    registry: ScribeRegistry,
    warnings: Vec<Warning>,
}

impl JCardReader {
    /// ## Summary
    /// Parses a jCard document.
    ///
    /// ## Errors
    /// Returns `RfcError::JsonError` for malformed JSON, or JSON that is not
    /// a vCard array or an array of them.
    #[tracing::instrument(skip(input), fields(input_len = input.len()))]
    pub fn new(input: &[u8]) -> RfcResult<Self> {
        let root: Value = serde_json::from_slice(input)?;
        let documents: VecDeque<Value> = match root {
            Value::Array(items) if is_vcard_array(&items) => VecDeque::from([Value::Array(items)]),
            Value::Array(items) => items.into(),
            _ => {
                return Err(serde_json::Error::custom("expected a jCard array").into());
            }
        };
        tracing::debug!(count = documents.len(), "Found jCard documents");
        Ok(Self {
            documents,
            registry: ScribeRegistry::new(),
            warnings: Vec::new(),
        })
    }

    /// ## Summary
    /// Adds an extension scribe for this reader.
    ///
    /// ## Errors
    /// Returns an error if the scribe fails registration checks.
    pub fn register_scribe<S: Scribe + 'static>(&mut self, scribe: S) -> RfcResult<()> {
        self.registry.register(scribe)
    }

    pub fn registry_mut(&mut self) -> &mut ScribeRegistry {
        &mut self.registry
    }

    /// Warnings from the last read.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Reads the next vCard. Entries that are not vCard arrays are skipped
    /// with a warning.
    pub fn read_next(&mut self) -> Option<VCard> {
        self.warnings.clear();
        while let Some(document) = self.documents.pop_front() {
            match document {
                Value::Array(items) if is_vcard_array(&items) => {
                    return Some(self.read_document(&items));
                }
                _ => self.warn(Warning::new("entry is not a jCard vcard array; skipped")),
            }
        }
        None
    }

    /// Reads every remaining vCard. Warnings of all documents are kept.
    pub fn read_all(&mut self) -> Vec<VCard> {
        let mut vcards = Vec::new();
        let mut warnings = Vec::new();
        while let Some(vcard) = self.read_next() {
            warnings.append(&mut self.warnings);
            vcards.push(vcard);
        }
        warnings.append(&mut self.warnings);
        self.warnings = warnings;
        vcards
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "jCard read warning");
        self.warnings.push(warning);
    }

    fn read_document(&mut self, items: &[Value]) -> VCard {
        let mut vcard = VCard::new(VCardVersion::V4_0);
        let mut version_seen = false;

        let properties = match items.get(1) {
            Some(Value::Array(properties)) => properties.as_slice(),
            _ => {
                self.warn(Warning::new("vcard array has no property list"));
                &[]
            }
        };

        for property in properties {
            let Some(fields) = property.as_array().filter(|fields| fields.len() >= 4) else {
                self.warn(Warning::new(format!("malformed jCard property: {property}")));
                continue;
            };
            let name = match fields.first() {
                Some(Value::String(name)) => name.as_str(),
                _ => {
                    self.warn(Warning::new(format!("property without a name: {property}")));
                    continue;
                }
            };

            if name.eq_ignore_ascii_case("version") {
                let value = fields.get(3).map(value_to_string).unwrap_or_default();
                if value != VCardVersion::V4_0.as_str() {
                    self.warn(
                        Warning::new(format!("jCard version must be 4.0, found \"{value}\""))
                            .with_property("VERSION"),
                    );
                }
                version_seen = true;
                continue;
            }

            if let Some(property) = self.read_property(name, fields) {
                vcard.push(property);
            }
        }

        if !version_seen {
            self.warn(Warning::new("no version property").with_property("VERSION"));
        }
        tracing::debug!(properties = vcard.len(), "Read jCard document");
        vcard
    }

    fn read_property(&mut self, name: &str, fields: &[Value]) -> Option<VCardProperty> {
        let upper = name.to_ascii_uppercase();
        let (mut params, group) = read_parameters(fields.get(1));
        let data_type = fields
            .get(2)
            .and_then(Value::as_str)
            .map_or(DataType::Unknown, DataType::parse);
        let value = JCardValue {
            data_type,
            values: fields.get(3..).map(<[Value]>::to_vec).unwrap_or_default(),
        };

        let target = ReadTarget::resolve(&self.registry, &upper);
        if let Some(message) = &target.warning {
            self.warn(Warning::new(message.as_str()).with_property(upper.as_str()));
        }
        let name = target.property_name(&upper).to_string();

        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let outcome = target.scribe.read_json(&value, &mut params, &mut ctx);
        drain_warnings(&mut ctx, &name, None, &mut self.warnings);

        let payload: Box<dyn PropertyValue> = match outcome {
            Ok(Unmarshalled::Value(payload)) => payload,
            Ok(Unmarshalled::Skip(reason)) => {
                self.warn(Warning::new(reason).with_property(name));
                return None;
            }
            Ok(Unmarshalled::Embedded(_)) => {
                self.warn(
                    Warning::new("embedded vCards cannot be read from jCard; omitted")
                        .with_property(name),
                );
                return None;
            }
            Err(err) => {
                self.warn(Warning::new(format!("{err}; kept as raw value")).with_property(&name));
                Box::new(RawProperty::new(value.to_raw_string()).with_data_type(value.data_type))
            }
        };

        drop_default_value_type(&mut params, target.scribe.as_ref(), VCardVersion::V4_0);
        let mut property = VCardProperty::from_boxed(name, payload).with_parameters(params);
        property.group = group;
        Some(property)
    }
}

fn is_vcard_array(items: &[Value]) -> bool {
    matches!(items.first(), Some(Value::String(tag)) if tag.eq_ignore_ascii_case("vcard"))
}

/// Reads the parameter object; the `group` member becomes the group.
fn read_parameters(value: Option<&Value>) -> (VCardParameters, Option<String>) {
    let mut params = VCardParameters::new();
    let mut group = None;
    let Some(Value::Object(members)) = value else {
        return (params, group);
    };

    for (name, value) in members {
        if name.eq_ignore_ascii_case(GROUP_PARAMETER) {
            group = Some(value_to_string(value));
            continue;
        }
        let name = name.to_ascii_uppercase();
        match value {
            Value::Array(values) => params.add_all(&name, values.iter().map(value_to_string)),
            other => params.add(&name, value_to_string(other)),
        }
    }
    (params, group)
}

/// ## Summary
/// Reads every vCard of a jCard document.
///
/// ## Errors
/// Returns `RfcError::JsonError` for malformed JSON.
pub fn parse_jcard(input: &str) -> RfcResult<Vec<VCard>> {
    Ok(JCardReader::new(input.as_bytes())?.read_all())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::{Categories, FormattedName, StructuredName, Telephone};

    const DOC: &str = r#"["vcard",
      [
        ["version", {}, "text", "4.0"],
        ["fn", {}, "text", "Simon Perreault"],
        ["n", {}, "text", ["Perreault", "Simon", "", "", ["ing. jr", "M.Sc."]]],
        ["tel", {"group": "item1", "type": ["work", "voice"], "pref": "1"}, "uri", "tel:+1-418-656-9254;ext=102"],
        ["categories", {}, "text", "computers", "cameras"],
        ["x-shoe-size", {}, "integer", 42],
        ["favorite-color", {}, "text", "blue"]
      ]
    ]"#;

    #[test]
    fn reads_properties() {
        let mut reader = JCardReader::new(DOC.as_bytes()).unwrap();
        let vcard = reader.read_next().unwrap();
        assert!(reader.read_next().is_none());

        assert_eq!(vcard.first::<FormattedName>().unwrap().as_str(), "Simon Perreault");
        let name = vcard.first::<StructuredName>().unwrap();
        assert_eq!(name.given, ["Simon"]);
        assert_eq!(name.suffixes, ["ing. jr", "M.Sc."]);
        assert_eq!(
            vcard.first::<Categories>().unwrap().values,
            ["computers", "cameras"]
        );

        let tel = vcard.by_name("TEL").next().unwrap();
        assert_eq!(tel.group.as_deref(), Some("item1"));
        assert_eq!(tel.parameters.types(), ["work", "voice"]);
        assert_eq!(tel.parameters.first("PREF"), Some("1"));
        assert!(tel.value::<Telephone>().is_some());
    }

    #[test]
    fn unknown_properties_are_raw() {
        let mut reader = JCardReader::new(DOC.as_bytes()).unwrap();
        let vcard = reader.read_next().unwrap();

        let shoe = vcard.by_name("X-SHOE-SIZE").next().unwrap();
        let raw = shoe.value::<RawProperty>().unwrap();
        assert_eq!(raw.value, "42");
        assert_eq!(raw.data_type, Some(DataType::Integer));

        assert!(vcard.by_name("FAVORITE-COLOR").next().is_some());
        // Only the unprefixed name is reported.
        assert_eq!(reader.warnings().len(), 1);
        assert_eq!(reader.warnings()[0].property.as_deref(), Some("FAVORITE-COLOR"));
    }

    #[test]
    fn version_is_required() {
        let mut reader =
            JCardReader::new(br#"["vcard", [["fn", {}, "text", "A"]]]"#).unwrap();
        reader.read_next().unwrap();
        assert_eq!(reader.warnings().len(), 1);

        let mut reader =
            JCardReader::new(br#"["vcard", [["version", {}, "text", "3.0"]]]"#).unwrap();
        let vcard = reader.read_next().unwrap();
        assert!(vcard.is_empty());
        assert_eq!(reader.warnings().len(), 1);
    }

    #[test]
    fn array_of_documents() {
        let doc = r#"[
          ["vcard", [["version", {}, "text", "4.0"], ["fn", {}, "text", "A"]]],
          ["vcard", [["version", {}, "text", "4.0"], ["fn", {}, "text", "B"]]]
        ]"#;
        let vcards = parse_jcard(doc).unwrap();
        assert_eq!(vcards.len(), 2);
        assert_eq!(vcards[1].formatted_name(), Some("B"));
    }

    #[test]
    fn structural_errors() {
        assert!(parse_jcard("[\"vcard\", ").is_err());
        assert!(parse_jcard("{\"vcard\": []}").is_err());
    }
}
