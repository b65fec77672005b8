//! jCard writer (RFC 7095).

use std::io::Write;

use serde_json::{Map, Value};

use super::reader::GROUP_PARAMETER;
use super::value::JCardValue;
use crate::error::{RfcError, RfcResult};
use crate::rfc::vcard::core::{DataType, VCard, VCardParameters, VCardVersion, Warning};
use crate::rfc::vcard::options::WriterOptions;
use crate::rfc::vcard::parse::unescape_text;
use crate::rfc::vcard::scribe::{
    Marshalled, Planned, Scribe, ScribeContext, ScribeError, ScribeRegistry, Signature,
    drain_warnings, missing_required, plan,
};

/// Writes vCards as jCard.
///
/// Documents are collected by [`JCardWriter::write`] and emitted by
/// [`JCardWriter::finish`]: a single vCard array when one document was
/// written, an array of them otherwise. Output is always 4.0.
pub struct JCardWriter<W: Write> {
    inner: W,
    registry: ScribeRegistry,
    options: WriterOptions,
    pretty: bool,
    documents: Vec<Value>,
    warnings: Vec<Warning>,
}

impl<W: Write> JCardWriter<W> {
    /// A compact writer with default options.
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default(), false)
    }

    pub fn with_options(inner: W, options: WriterOptions, pretty: bool) -> Self {
        Self {
            inner,
            registry: ScribeRegistry::new(),
            options,
            pretty,
            documents: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// ## Summary
    /// Adds an extension scribe for this writer.
    ///
    /// ## Errors
    /// Returns an error if the scribe fails registration checks.
    pub fn register_scribe<S: Scribe + 'static>(&mut self, scribe: S) -> RfcResult<()> {
        self.registry.register(scribe)
    }

    pub fn registry_mut(&mut self) -> &mut ScribeRegistry {
        &mut self.registry
    }

    /// Warnings from the last write.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Marshals one vCard.
    #[tracing::instrument(skip(self, vcard), fields(properties = vcard.len()))]
    pub fn write(&mut self, vcard: &VCard) {
        self.warnings.clear();
        let document = self.build(vcard);
        self.documents.push(document);
        tracing::debug!(warnings = self.warnings.len(), "Marshalled jCard document");
    }

    /// ## Summary
    /// Serializes every written vCard and returns the stream.
    ///
    /// ## Errors
    /// Returns an error if serialization or the underlying stream fails.
    pub fn finish(mut self) -> RfcResult<W> {
        let root = if self.documents.len() == 1 {
            self.documents.swap_remove(0)
        } else {
            Value::Array(std::mem::take(&mut self.documents))
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.inner, &root)?;
        } else {
            serde_json::to_writer(&mut self.inner, &root)?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "jCard write warning");
        self.warnings.push(warning);
    }

    fn build(&mut self, vcard: &VCard) -> Value {
        let version = VCardVersion::V4_0;
        for warning in missing_required(vcard, version) {
            self.warn(warning);
        }

        let signature = Signature {
            prod_id: self.options.add_prod_id,
            generator: self.options.add_generator,
        };
        let mut ctx = ScribeContext::new(version, self.options.compatibility_mode)
            .with_label_policy(self.options.label_policy);
        let planned = plan(vcard, &self.registry, &mut ctx, signature, &mut self.warnings);

        let mut properties = vec![property_array(
            "version",
            Map::new(),
            JCardValue::text(version.as_str()),
        )];
        for item in &planned {
            if let Some(value) = self.marshal(item, &mut ctx) {
                let params = parameters_object(&item.parameters, item.property.group.as_deref());
                properties.push(property_array(
                    &item.scribe.name().to_ascii_lowercase(),
                    params,
                    value,
                ));
            }
        }

        Value::Array(vec![
            Value::String("vcard".to_string()),
            Value::Array(properties),
        ])
    }

    fn marshal(&mut self, item: &Planned<'_>, ctx: &mut ScribeContext) -> Option<JCardValue> {
        let outcome = item.scribe.write_json(item.property.payload(), ctx);
        drain_warnings(ctx, item.name(), None, &mut self.warnings);

        match outcome {
            Ok(Marshalled::Value(value)) => Some(value),
            Ok(Marshalled::Skip(reason)) => {
                self.warn(Warning::new(reason).with_property(item.name()));
                None
            }
            Ok(Marshalled::Embedded(_)) => {
                self.warn(
                    Warning::new("embedded vCards cannot be written to jCard; omitted")
                        .with_property(item.name()),
                );
                None
            }
            Err(err @ ScribeError::Unsupported(_)) => {
                let Ok(Marshalled::Value(text)) =
                    item.scribe.write_text(item.property.payload(), ctx)
                else {
                    self.warn(Warning::new(format!("{err}; omitted")).with_property(item.name()));
                    return None;
                };
                drain_warnings(ctx, item.name(), None, &mut self.warnings);
                self.warn(
                    Warning::new(format!("{err}; written as unknown text"))
                        .with_property(item.name()),
                );
                Some(JCardValue::single(DataType::Unknown, unescape_text(&text)))
            }
            Err(err) => {
                self.warn(Warning::new(format!("{err}; omitted")).with_property(item.name()));
                None
            }
        }
    }
}

fn property_array(name: &str, params: Map<String, Value>, value: JCardValue) -> Value {
    let mut fields = Vec::with_capacity(3 + value.values.len());
    fields.push(Value::String(name.to_string()));
    fields.push(Value::Object(params));
    fields.push(Value::String(value.data_type.as_str().to_string()));
    fields.extend(value.values);
    Value::Array(fields)
}

/// The value type is positional in jCard, so `VALUE` is never written.
fn parameters_object(params: &VCardParameters, group: Option<&str>) -> Map<String, Value> {
    let mut object = Map::new();
    if let Some(group) = group {
        object.insert(GROUP_PARAMETER.to_string(), Value::String(group.to_string()));
    }
    for param in params {
        if param.name == "VALUE" || param.name == "ENCODING" {
            continue;
        }
        let value = match param.values.as_slice() {
            [single] => Value::String(single.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        };
        object.insert(param.name.to_ascii_lowercase(), value);
    }
    object
}

/// ## Summary
/// Writes vCards as a jCard string.
///
/// ## Errors
/// Returns an error if serialization fails.
pub fn write_jcard(vcards: &[VCard], pretty: bool) -> RfcResult<String> {
    let mut writer = JCardWriter::with_options(Vec::new(), WriterOptions::default(), pretty);
    for vcard in vcards {
        writer.write(vcard);
    }
    String::from_utf8(writer.finish()?).map_err(|err| {
        RfcError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}
