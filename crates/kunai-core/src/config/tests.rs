//! Tests for configuration module.

use super::*;

#[test_log::test]
fn test_load_defaults_without_file() {
    tracing::debug!("Loading settings with no config file present");

    let settings = Settings::load_from("kunai-test-missing.toml").unwrap();

    assert_eq!(settings.reader.max_nesting_depth, MAX_NESTING_DEPTH);
    assert_eq!(settings.writer.fold_line_length, DEFAULT_FOLD_LINE_LENGTH);
    assert_eq!(settings.writer.parameter_style, "value_list");
    assert!(settings.writer.add_prod_id);
}

#[test]
fn test_default_matches_loaded_defaults() {
    let defaults = Settings::default();
    let loaded = Settings::load_from("kunai-test-missing.toml").unwrap();

    assert_eq!(defaults.reader.default_version, loaded.reader.default_version);
    assert_eq!(defaults.writer.version, loaded.writer.version);
    assert_eq!(defaults.writer.label_policy, loaded.writer.label_policy);
    assert_eq!(defaults.logging.level, loaded.logging.level);
}

#[test]
fn test_newline_sequence() {
    let mut settings = Settings::default();
    assert_eq!(settings.writer.newline_sequence(), "\r\n");

    settings.writer.newline = "LF".to_string();
    assert_eq!(settings.writer.newline_sequence(), "\n");
}

#[test]
fn test_settings_debug() {
    let settings = Settings::default();

    let debug_str = format!("{settings:?}");
    assert!(debug_str.contains("Settings"));
    assert!(debug_str.contains("reader"));
    assert!(debug_str.contains("writer"));
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());

    settings.writer.fold_indent = "--".to_string();
    assert!(matches!(settings.validate(), Err(CoreError::ConfigError(_))));

    let mut settings = Settings::default();
    settings.writer.newline = "cr".to_string();
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.reader.max_nesting_depth = 0;
    assert!(settings.validate().is_err());
}
