use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_FOLD_LINE_LENGTH, MAX_NESTING_DEPTH};
use crate::error::{CoreError, CoreResult};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub reader: ReaderConfig,
    pub writer: WriterConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// Version assumed when a vCard has no `VERSION` line.
    pub default_version: String,
    pub compatibility_mode: String,
    pub max_nesting_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriterConfig {
    pub version: String,
    pub compatibility_mode: String,
    /// `value_list` or `repeated`.
    pub parameter_style: String,
    /// Fold width in octets, 0 disables folding.
    pub fold_line_length: usize,
    pub fold_indent: String,
    /// `crlf` or `lf`.
    pub newline: String,
    pub add_prod_id: bool,
    pub add_generator: bool,
    /// `auto`, `parameter` or `property`.
    pub label_policy: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl WriterConfig {
    /// ## Summary
    /// Returns the configured newline sequence.
    #[must_use]
    pub fn newline_sequence(&self) -> &'static str {
        if self.newline.eq_ignore_ascii_case("lf") {
            "\n"
        } else {
            "\r\n"
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `kunai.toml`.
    /// Environment variables take precedence over built-in defaults.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Self::load_from("kunai.toml")
    }

    /// ## Summary
    /// Same as [`Settings::load`] with an explicit configuration file name.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load_from(file_name: &str) -> Result<Self> {
        let max_depth = u64::try_from(MAX_NESTING_DEPTH)?;
        let fold_length = u64::try_from(DEFAULT_FOLD_LINE_LENGTH)?;

        let settings = Config::builder()
            .set_default("reader.default_version", "2.1")?
            .set_default("reader.compatibility_mode", "rfc")?
            .set_default("reader.max_nesting_depth", max_depth)?
            .set_default("writer.version", "3.0")?
            .set_default("writer.compatibility_mode", "rfc")?
            .set_default("writer.parameter_style", "value_list")?
            .set_default("writer.fold_line_length", fold_length)?
            .set_default("writer.fold_indent", " ")?
            .set_default("writer.newline", "crlf")?
            .set_default("writer.add_prod_id", true)?
            .set_default("writer.add_generator", true)?
            .set_default("writer.label_policy", "auto")?
            .set_default("logging.level", "info")?
            // Environment
            .add_source(
                config::Environment::with_prefix("KUNAI")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name(file_name).required(false))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks the values `serde` cannot constrain.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` naming the first invalid value.
    pub fn validate(&self) -> CoreResult<()> {
        if self.reader.max_nesting_depth == 0 {
            return Err(CoreError::ConfigError(
                "reader.max_nesting_depth must be at least 1".to_string(),
            ));
        }
        if !matches!(self.writer.fold_indent.as_str(), " " | "\t") {
            return Err(CoreError::ConfigError(format!(
                "writer.fold_indent must be a space or a tab, got {:?}",
                self.writer.fold_indent
            )));
        }
        if !["crlf", "lf"]
            .iter()
            .any(|n| self.writer.newline.eq_ignore_ascii_case(n))
        {
            return Err(CoreError::ConfigError(format!(
                "writer.newline must be crlf or lf, got {:?}",
                self.writer.newline
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reader: ReaderConfig {
                default_version: "2.1".to_string(),
                compatibility_mode: "rfc".to_string(),
                max_nesting_depth: MAX_NESTING_DEPTH,
            },
            writer: WriterConfig {
                version: "3.0".to_string(),
                compatibility_mode: "rfc".to_string(),
                parameter_style: "value_list".to_string(),
                fold_line_length: DEFAULT_FOLD_LINE_LENGTH,
                fold_indent: " ".to_string(),
                newline: "crlf".to_string(),
                add_prod_id: true,
                add_generator: true,
                label_policy: "auto".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    tracing::debug!("Loading kunai settings");
    Settings::load()
}
