//! Line-oriented vCard writer (2.1, 3.0, 4.0).

use std::borrow::Cow;
use std::io::{self, Write};

use kunai_core::constants::MAX_NESTING_DEPTH;

use super::escape::{escape_param_value, escape_text};
use crate::error::{RfcError, RfcResult};
use crate::rfc::vcard::core::{CompatibilityMode, VCard, VCardParameters, VCardVersion, Warning};
use crate::rfc::vcard::options::{ParameterStyle, WriterOptions};
use crate::rfc::vcard::parse::expand_escaped_newlines;
use crate::rfc::vcard::parse::quoted_printable;
use crate::rfc::vcard::scribe::{
    Marshalled, Planned, Scribe, ScribeContext, ScribeRegistry, Signature, drain_warnings,
    missing_required, plan,
};

/// Parameters whose 2.1 values are written upper-case.
const KEYWORD_PARAMETERS: &[&str] = &["VALUE", "ENCODING", "CALSCALE"];

/// Writes vCards to a text stream.
///
/// Every document is written in the target version of the writer's
/// [`WriterOptions`], whatever version it was read as.
pub struct VCardWriter<W> {
    inner: W,
    registry: ScribeRegistry,
    options: WriterOptions,
    warnings: Vec<Warning>,
}

impl<W: Write> VCardWriter<W> {
    /// A writer with default options (3.0, folded, signed).
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default())
    }

    pub fn with_options(inner: W, options: WriterOptions) -> Self {
        Self {
            inner,
            registry: ScribeRegistry::new(),
            options,
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

    #[must_use]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// ## Errors
    /// Returns an error if the underlying stream cannot be flushed.
    pub fn flush(&mut self) -> RfcResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// ## Summary
    /// Writes one vCard.
    ///
    /// Properties the target version cannot carry are omitted with a
    /// warning, as are missing required properties.
    ///
    /// ## Errors
    /// Returns an error if the underlying stream fails.
    #[tracing::instrument(skip(self, vcard), fields(version = %self.options.version, properties = vcard.len()))]
    pub fn write(&mut self, vcard: &VCard) -> RfcResult<()> {
        self.warnings.clear();
        let signature = Signature {
            prod_id: self.options.add_prod_id,
            generator: self.options.add_generator,
        };
        let mut out = String::new();
        self.render(&mut out, vcard, signature, true, 0);
        self.inner.write_all(out.as_bytes())?;
        tracing::debug!(bytes = out.len(), warnings = self.warnings.len(), "Wrote vCard");
        Ok(())
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "vCard write warning");
        self.warnings.push(warning);
    }

    fn render(&mut self, out: &mut String, vcard: &VCard, signature: Signature, fold: bool, depth: usize) {
        let version = self.options.version;
        for warning in missing_required(vcard, version) {
            self.warn(warning);
        }

        let mut ctx = ScribeContext::new(version, self.options.compatibility_mode)
            .with_label_policy(self.options.label_policy);
        let planned = plan(vcard, &self.registry, &mut ctx, signature, &mut self.warnings);

        self.push_line(out, "BEGIN:VCARD", fold);
        self.push_line(out, &format!("VERSION:{version}"), fold);
        for item in &planned {
            let outcome = item.scribe.write_text(item.property.payload(), &mut ctx);
            drain_warnings(&mut ctx, item.name(), None, &mut self.warnings);
            match outcome {
                Ok(Marshalled::Value(value)) => self.write_property(out, item, &value, fold),
                Ok(Marshalled::Skip(reason)) => {
                    self.warn(Warning::new(reason).with_property(item.name()));
                }
                Ok(Marshalled::Embedded(nested)) => {
                    self.write_embedded(out, item, nested, fold, depth);
                }
                Err(err) => {
                    self.warn(Warning::new(format!("{err}; omitted")).with_property(item.name()));
                }
            }
        }
        self.push_line(out, "END:VCARD", fold);
    }

    /// 2.1 writes an empty value followed by the nested block; later
    /// versions escape the nested document into the value.
    fn write_embedded(
        &mut self,
        out: &mut String,
        item: &Planned<'_>,
        nested: &VCard,
        fold: bool,
        depth: usize,
    ) {
        if depth >= MAX_NESTING_DEPTH {
            self.warn(
                Warning::new(format!("nesting deeper than {MAX_NESTING_DEPTH} levels; omitted"))
                    .with_property(item.name()),
            );
            return;
        }
        if self.options.version == VCardVersion::V2_1 {
            self.write_property(out, item, "", fold);
            self.render(out, nested, Signature::NONE, fold, depth + 1);
        } else {
            let mut inline = String::new();
            self.render(&mut inline, nested, Signature::NONE, false, depth + 1);
            self.write_property(out, item, &escape_text(&inline), fold);
        }
    }

    fn write_property(&self, out: &mut String, item: &Planned<'_>, value: &str, fold: bool) {
        let mut params = Cow::Borrowed(&item.parameters);
        let mut value = Cow::Borrowed(value);

        let legacy = self.options.version == VCardVersion::V2_1;
        let outlook = legacy
            && self.options.compatibility_mode == CompatibilityMode::MsOutlook
            && quoted_printable::needs_encoding(&expand_escaped_newlines(&value));
        let line_break = value.contains(['\r', '\n']);

        // A raw line break would end the content line early.
        let quoted_printable = outlook || (legacy && line_break);
        if quoted_printable {
            let plain = if outlook {
                expand_escaped_newlines(&value)
            } else {
                value.replace("\r\n", "\n").replace('\n', "\r\n")
            };
            value = Cow::Owned(quoted_printable::encode(&plain));
            let params = params.to_mut();
            params.set("ENCODING", "QUOTED-PRINTABLE");
            params.set("CHARSET", "UTF-8");
        } else if line_break {
            value = Cow::Owned(value.replace("\r\n", "\\n").replace(['\r', '\n'], "\\n"));
        }

        let mut line = String::with_capacity(value.len() + 32);
        if let Some(group) = &item.property.group {
            let group: String = group
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect();
            if !group.is_empty() {
                line.push_str(&group);
                line.push('.');
            }
        }
        line.push_str(item.name());
        self.push_parameters(&mut line, &params);
        line.push(':');
        line.push_str(&value);

        match (&self.options.folding, fold) {
            (Some(folding), true) if quoted_printable => {
                out.push_str(&folding.fold_quoted_printable(&line, &self.options.newline));
            }
            (Some(folding), true) => out.push_str(&folding.fold(&line, &self.options.newline)),
            _ => out.push_str(&line),
        }
        out.push_str(&self.options.newline);
    }

    fn push_line(&self, out: &mut String, line: &str, fold: bool) {
        match (&self.options.folding, fold) {
            (Some(folding), true) => out.push_str(&folding.fold(line, &self.options.newline)),
            _ => out.push_str(line),
        }
        out.push_str(&self.options.newline);
    }

    fn push_parameters(&self, line: &mut String, params: &VCardParameters) {
        let version = self.options.version;
        let legacy = version == VCardVersion::V2_1;

        for param in params {
            if legacy && param.name == "TYPE" {
                for value in &param.values {
                    let (mut token, _) = escape_param_value(&value.to_ascii_uppercase(), version);
                    token.retain(|c| c != '=');
                    if token.is_empty() {
                        continue;
                    }
                    line.push(';');
                    line.push_str(&token);
                }
                continue;
            }

            let values: Vec<String> = param
                .values
                .iter()
                .map(|value| {
                    let value = if legacy && KEYWORD_PARAMETERS.contains(&param.name.as_str()) {
                        value.to_ascii_uppercase()
                    } else {
                        value.clone()
                    };
                    match escape_param_value(&value, version) {
                        (escaped, true) => format!("\"{escaped}\""),
                        (escaped, false) => escaped,
                    }
                })
                .collect();

            if legacy || self.options.parameter_style == ParameterStyle::Repeated {
                for value in values {
                    line.push(';');
                    line.push_str(&param.name);
                    line.push('=');
                    line.push_str(&value);
                }
            } else {
                line.push(';');
                line.push_str(&param.name);
                line.push('=');
                line.push_str(&values.join(","));
            }
        }
    }
}

/// ## Summary
/// Writes one vCard as a string in `version`, with default options.
///
/// ## Errors
/// Returns an error if the output is not valid UTF-8, which a registered
/// scribe cannot produce.
pub fn write_string(vcard: &VCard, version: VCardVersion) -> RfcResult<String> {
    let mut writer = VCardWriter::with_options(Vec::new(), WriterOptions::for_version(version));
    writer.write(vcard)?;
    String::from_utf8(writer.into_inner())
        .map_err(|err| RfcError::IoError(io::Error::new(io::ErrorKind::InvalidData, err)))
}
