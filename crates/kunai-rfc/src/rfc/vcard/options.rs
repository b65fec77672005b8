//! Reader and writer options.

use std::fmt;
use std::str::FromStr;

use kunai_core::config::Settings;
use kunai_core::constants::MAX_NESTING_DEPTH;

use super::build::FoldingScheme;
use super::core::{CompatibilityMode, VCardVersion};
use crate::error::{RfcError, RfcResult};

/// How multi-valued parameters are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterStyle {
    /// `TYPE=home,work`
    #[default]
    ValueList,
    /// `TYPE=home;TYPE=work`
    Repeated,
}

impl FromStr for ParameterStyle {
    type Err = RfcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "value_list" | "value-list" => Ok(Self::ValueList),
            "repeated" => Ok(Self::Repeated),
            other => Err(RfcError::InvalidSetting(format!(
                "unknown parameter style: {other}"
            ))),
        }
    }
}

/// Where an address label is written.
///
/// 4.0 carries it as the `LABEL` parameter of `ADR`; 2.1 and 3.0 as a
/// separate `LABEL` property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Parameter for 4.0, property for 2.1 and 3.0.
    #[default]
    Auto,
    /// Always the `LABEL` parameter.
    Parameter,
    /// Always a `LABEL` property. 4.0 has no such property, so the label is
    /// dropped there with a warning.
    Property,
}

impl LabelPolicy {
    /// Whether the label goes into the `LABEL` parameter for `version`.
    #[must_use]
    pub fn uses_parameter(self, version: VCardVersion) -> bool {
        match self {
            Self::Auto => !version.is_legacy(),
            Self::Parameter => true,
            Self::Property => false,
        }
    }
}

impl FromStr for LabelPolicy {
    type Err = RfcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "parameter" => Ok(Self::Parameter),
            "property" => Ok(Self::Property),
            other => Err(RfcError::InvalidSetting(format!(
                "unknown label policy: {other}"
            ))),
        }
    }
}

impl fmt::Display for LabelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Parameter => "parameter",
            Self::Property => "property",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Version assumed until a `VERSION` line is seen.
    pub default_version: VCardVersion,
    pub compatibility_mode: CompatibilityMode,
    /// Deepest embedded vCard that is still parsed.
    pub max_nesting_depth: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            default_version: VCardVersion::V2_1,
            compatibility_mode: CompatibilityMode::Rfc,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl ReaderOptions {
    /// ## Summary
    /// Builds reader options from loaded settings.
    ///
    /// ## Errors
    /// Returns `RfcError::InvalidSetting` for an unknown version or mode.
    pub fn from_config(settings: &Settings) -> RfcResult<Self> {
        let reader = &settings.reader;
        Ok(Self {
            default_version: parse_version(&reader.default_version)?,
            compatibility_mode: parse_mode(&reader.compatibility_mode)?,
            max_nesting_depth: reader.max_nesting_depth,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Target version.
    pub version: VCardVersion,
    pub compatibility_mode: CompatibilityMode,
    pub parameter_style: ParameterStyle,
    /// `None` disables folding.
    pub folding: Option<FoldingScheme>,
    pub newline: String,
    /// Add `PRODID` (`X-PRODID` in 2.1) to top-level documents.
    pub add_prod_id: bool,
    /// Add `X-GENERATOR` to top-level documents.
    pub add_generator: bool,
    pub label_policy: LabelPolicy,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            version: VCardVersion::V3_0,
            compatibility_mode: CompatibilityMode::Rfc,
            parameter_style: ParameterStyle::ValueList,
            folding: Some(FoldingScheme::default()),
            newline: "\r\n".to_string(),
            add_prod_id: true,
            add_generator: true,
            label_policy: LabelPolicy::Auto,
        }
    }
}

impl WriterOptions {
    /// Default options for a target version.
    #[must_use]
    pub fn for_version(version: VCardVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Options without `PRODID` or `X-GENERATOR`.
    #[must_use]
    pub fn without_signature(mut self) -> Self {
        self.add_prod_id = false;
        self.add_generator = false;
        self
    }

    /// ## Summary
    /// Builds writer options from loaded settings.
    ///
    /// ## Errors
    /// Returns `RfcError::InvalidSetting` for an unknown version, mode,
    /// parameter style, label policy or fold indent.
    pub fn from_config(settings: &Settings) -> RfcResult<Self> {
        let writer = &settings.writer;

        let folding = if writer.fold_line_length == 0 {
            None
        } else {
            let mut chars = writer.fold_indent.chars();
            let indent = match (chars.next(), chars.next()) {
                (Some(c @ (' ' | '\t')), None) => c,
                _ => {
                    return Err(RfcError::InvalidSetting(format!(
                        "fold indent must be a space or a tab: {:?}",
                        writer.fold_indent
                    )));
                }
            };
            Some(FoldingScheme {
                line_length: writer.fold_line_length,
                indent,
            })
        };

        Ok(Self {
            version: parse_version(&writer.version)?,
            compatibility_mode: parse_mode(&writer.compatibility_mode)?,
            parameter_style: writer.parameter_style.parse()?,
            folding,
            newline: writer.newline_sequence().to_string(),
            add_prod_id: writer.add_prod_id,
            add_generator: writer.add_generator,
            label_policy: writer.label_policy.parse()?,
        })
    }
}

/// ## Summary
/// Loads `.env`, environment and `kunai.toml` settings and derives both
/// option sets.
///
/// ## Errors
/// Returns an error if the settings cannot be loaded or hold invalid values.
pub fn load_options() -> anyhow::Result<(ReaderOptions, WriterOptions)> {
    let settings = kunai_core::config::load_config()?;
    let reader = ReaderOptions::from_config(&settings)?;
    let writer = WriterOptions::from_config(&settings)?;
    tracing::debug!(?reader, ?writer, "Loaded vCard options");
    Ok((reader, writer))
}

fn parse_version(value: &str) -> RfcResult<VCardVersion> {
    VCardVersion::parse(value)
        .ok_or_else(|| RfcError::InvalidSetting(format!("unknown vCard version: {value}")))
}

fn parse_mode(value: &str) -> RfcResult<CompatibilityMode> {
    value.parse().map_err(RfcError::InvalidSetting)
}
