//! Line-oriented vCard reader (2.1, 3.0, 4.0).

use std::io::BufRead;

use super::lexer::{ContentLine, parse_content_line};
use super::line_reader::{LineReader, LogicalLine};
use super::quoted_printable::{self, Charset};
use super::values::unescape_text;
use crate::error::RfcResult;
use crate::rfc::vcard::core::{
    PropertyValue, RawProperty, VCard, VCardParameters, VCardProperty, VCardVersion, Warning,
};
use crate::rfc::vcard::options::ReaderOptions;
use crate::rfc::vcard::scribe::{
    ReadTarget, Scribe, ScribeContext, ScribeRegistry, Unmarshalled, drain_warnings,
    drop_default_value_type, merge_labels,
};

/// Where the value of an embedded-document property ended up.
enum Nested {
    Card(VCard),
    /// Nesting limit reached: the nested text, kept verbatim.
    Flattened(String),
    Missing,
}

/// Reads vCards one at a time from a text stream.
///
/// Multiple documents per stream are returned in order. Non-fatal problems
/// are collected as [`Warning`]s, cleared at the start of each
/// [`VCardReader::read_next`].
pub struct VCardReader<R> {
    lines: LineReader<R>,
    registry: ScribeRegistry,
    options: ReaderOptions,
    /// Nesting depth of the documents this reader produces.
    depth: usize,
    warnings: Vec<Warning>,
}

impl<R: BufRead> VCardReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, ReaderOptions::default())
    }

    pub fn with_options(inner: R, options: ReaderOptions) -> Self {
        Self {
            lines: LineReader::new(inner),
            registry: ScribeRegistry::new(),
            options,
            depth: 0,
            warnings: Vec::new(),
        }
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

    pub fn into_inner(self) -> R {
        self.lines.into_inner()
    }

    /// ## Summary
    /// Reads the next vCard. Lines before `BEGIN:VCARD` are skipped.
    ///
    /// ## Errors
    /// Returns an error on I/O failure or invalid UTF-8. Malformed content
    /// produces warnings instead.
    pub fn read_next(&mut self) -> RfcResult<Option<VCard>> {
        self.warnings.clear();

        loop {
            let Some(line) = self.lines.next_line()? else {
                return Ok(None);
            };
            if self.content_line(&line).is_some_and(|content| content.is_begin()) {
                tracing::debug!(line = line.line, depth = self.depth, "Found BEGIN:VCARD");
                break;
            }
            tracing::trace!(line = line.line, "Skipping line outside vCard");
        }

        self.read_document(self.depth)
    }

    /// ## Summary
    /// Reads every remaining vCard. Warnings of all documents are kept.
    ///
    /// ## Errors
    /// Returns the first I/O or encoding error.
    pub fn read_all(&mut self) -> RfcResult<Vec<VCard>> {
        let mut vcards = Vec::new();
        let mut warnings = Vec::new();
        while let Some(vcard) = self.read_next()? {
            warnings.append(&mut self.warnings);
            vcards.push(vcard);
        }
        warnings.append(&mut self.warnings);
        self.warnings = warnings;
        Ok(vcards)
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "vCard read warning");
        self.warnings.push(warning);
    }

    /// Splits a logical line, ignoring lines that cannot be split.
    fn content_line(&self, line: &LogicalLine) -> Option<ContentLine> {
        parse_content_line(&line.text, line.line, self.options.default_version).ok()
    }

    /// Reads properties until `END:VCARD`. The `BEGIN` line is consumed.
    fn read_document(&mut self, depth: usize) -> RfcResult<Option<VCard>> {
        let mut vcard = VCard::new(self.options.default_version);
        let mut version_seen = false;

        loop {
            let Some(line) = self.lines.next_line()? else {
                self.warn(Warning::new("unexpected end of input inside a vCard"));
                return Ok(if vcard.is_empty() {
                    None
                } else {
                    Some(finish(vcard))
                });
            };

            let content = match parse_content_line(&line.text, line.line, vcard.version) {
                Ok(content) => content,
                Err(err) => {
                    self.warn(
                        Warning::new(format!("skipped line: {}", err.message)).with_line(line.line),
                    );
                    continue;
                }
            };

            if content.is_end() {
                break;
            }
            if content.is_begin() {
                self.warn(
                    Warning::new("nested vCard without a property to hold it; ignored")
                        .with_line(line.line),
                );
                if depth + 1 >= self.options.max_nesting_depth {
                    self.warn_depth(line.line);
                    self.flatten_block(line)?;
                } else {
                    self.read_document(depth + 1)?;
                }
                continue;
            }
            if content.name.eq_ignore_ascii_case("VERSION") {
                if !version_seen {
                    version_seen = true;
                    match VCardVersion::parse(content.value.trim()) {
                        Some(version) => vcard.version = version,
                        None => self.warn(
                            Warning::new(format!(
                                "unknown version \"{}\"; using {}",
                                content.value, vcard.version
                            ))
                            .with_property("VERSION")
                            .with_line(line.line),
                        ),
                    }
                }
                continue;
            }

            if let Some(property) = self.read_property(content, line.line, vcard.version, depth)? {
                vcard.push(property);
            }
        }

        if !version_seen {
            self.warn(Warning::new(format!(
                "no VERSION property; assuming {}",
                vcard.version
            )));
        }
        tracing::debug!(properties = vcard.len(), version = %vcard.version, "Read vCard");
        Ok(Some(finish(vcard)))
    }

    fn read_property(
        &mut self,
        content: ContentLine,
        line: usize,
        version: VCardVersion,
        depth: usize,
    ) -> RfcResult<Option<VCardProperty>> {
        let ContentLine {
            group,
            name,
            mut params,
            mut value,
        } = content;

        if params.encoding() == Some("quoted-printable") {
            value = self.decode_quoted_printable(&mut params, &value, &name, line);
        }

        let target = ReadTarget::resolve(&self.registry, &name);
        if let Some(message) = &target.warning {
            self.warn(Warning::new(message.as_str()).with_property(name.as_str()).with_line(line));
        }

        let mut ctx = ScribeContext::new(version, self.options.compatibility_mode);
        let outcome = target.scribe.read_text(&mut params, &value, &mut ctx);
        drain_warnings(&mut ctx, &name, Some(line), &mut self.warnings);

        let payload: Box<dyn PropertyValue> = match outcome {
            Ok(Unmarshalled::Value(payload)) => payload,
            Ok(Unmarshalled::Skip(reason)) => {
                self.warn(Warning::new(reason).with_property(name.as_str()).with_line(line));
                return Ok(None);
            }
            Ok(Unmarshalled::Embedded(inject)) => match self.read_nested(&value, line, depth)? {
                Nested::Card(vcard) => inject(vcard),
                Nested::Flattened(text) => Box::new(RawProperty::new(text)),
                Nested::Missing => return Ok(None),
            },
            Err(err) => {
                self.warn(
                    Warning::new(format!("{err}; kept as raw text"))
                        .with_property(name.as_str())
                        .with_line(line),
                );
                Box::new(RawProperty::new(value))
            }
        };

        drop_default_value_type(&mut params, target.scribe.as_ref(), version);
        let mut property = VCardProperty::from_boxed(target.property_name(&name), payload)
            .with_parameters(params);
        property.group = group;
        Ok(Some(property))
    }

    fn decode_quoted_printable(
        &mut self,
        params: &mut VCardParameters,
        value: &str,
        name: &str,
        line: usize,
    ) -> String {
        params.remove("ENCODING");
        let label = params
            .remove("CHARSET")
            .and_then(|param| param.value().map(String::from));
        let charset = match label {
            None => Charset::Utf8,
            Some(label) => Charset::from_label(&label).unwrap_or_else(|| {
                self.warn(
                    Warning::new(format!("unknown charset \"{label}\"; decoded as UTF-8"))
                        .with_property(name)
                        .with_line(line),
                );
                Charset::Utf8
            }),
        };
        quoted_printable::decode(value, charset)
            .replace("\r\n", "\n")
            .replace('\r', "\n")
    }

    /// Reads the vCard held by an embedded-document property: the block
    /// that follows an empty 2.1 value, or the escaped 3.0 inline value.
    fn read_nested(&mut self, value: &str, line: usize, depth: usize) -> RfcResult<Nested> {
        let too_deep = depth >= self.options.max_nesting_depth;

        if !value.trim().is_empty() {
            if too_deep {
                self.warn_depth(line);
                return Ok(Nested::Flattened(value.to_string()));
            }
            let text = unescape_text(value);
            let mut nested = VCardReader {
                lines: LineReader::new(text.as_bytes()),
                registry: self.registry.clone(),
                options: self.options.clone(),
                depth: depth + 1,
                warnings: Vec::new(),
            };
            let vcard = nested.read_next()?;
            self.warnings.append(&mut nested.warnings);
            return Ok(vcard.map_or(Nested::Missing, Nested::Card));
        }

        let Some(next) = self.lines.next_line()? else {
            return Ok(Nested::Missing);
        };
        if !self.content_line(&next).is_some_and(|content| content.is_begin()) {
            self.warn(Warning::new("empty value and no nested vCard follows; skipped").with_line(line));
            self.lines.unread(next);
            return Ok(Nested::Missing);
        }
        if too_deep {
            self.warn_depth(line);
            return Ok(Nested::Flattened(self.flatten_block(next)?));
        }
        Ok(self
            .read_document(depth + 1)?
            .map_or(Nested::Missing, Nested::Card))
    }

    fn warn_depth(&mut self, line: usize) {
        self.warn(
            Warning::new(format!(
                "nesting deeper than {} levels; nested vCard kept as raw text",
                self.options.max_nesting_depth
            ))
            .with_line(line),
        );
    }

    /// Collects a nested block verbatim, from its `BEGIN` to the matching
    /// `END`, joined with CRLF.
    fn flatten_block(&mut self, begin: LogicalLine) -> RfcResult<String> {
        let mut lines = vec![begin.text];
        let mut open = 1_usize;
        while open > 0 {
            let Some(line) = self.lines.next_line()? else {
                break;
            };
            match self.content_line(&line) {
                Some(content) if content.is_begin() => open += 1,
                Some(content) if content.is_end() => open -= 1,
                _ => {}
            }
            lines.push(line.text);
        }
        Ok(lines.join("\r\n"))
    }
}

fn finish(mut vcard: VCard) -> VCard {
    if vcard.version.is_legacy() {
        merge_labels(&mut vcard);
    }
    vcard
}

/// ## Summary
/// Parses every vCard in a string.
///
/// ## Errors
/// Returns an error if the input cannot be read. Malformed content is
/// skipped; use [`VCardReader`] to see the warnings.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse_str(input: &str) -> RfcResult<Vec<VCard>> {
    tracing::debug!("Parsing vCard text");
    let mut reader = VCardReader::new(input.as_bytes());
    let vcards = reader.read_all()?;
    tracing::debug!(count = vcards.len(), warnings = reader.warnings().len(), "Parsed vCard text");
    Ok(vcards)
}
