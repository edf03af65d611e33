/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::time::Duration;

use polysub::app_config::{Config, LogLevel, TranslationProvider};
use polysub::file_utils::PostAction;
use polysub::language_utils::DEFAULT_TARGET_LANGUAGES;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_languages.len(), DEFAULT_TARGET_LANGUAGES.len());
    assert_eq!(config.target_languages[0], "es");
    assert_eq!(config.translation.provider, TranslationProvider::Google);
    assert_eq!(config.translation.retry_count, 3);
    assert!(config.translation.degrade_on_failure);
    assert!(config.cache.enabled);
    assert!(!config.output.overwrite);
    assert_eq!(config.output.post_action, PostAction::Leave);
    assert!(config.output.relocate_on_failure);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "invalid".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();
    assert!(config.validate().is_ok());

    config.target_languages.clear();
    assert!(config.validate().is_err());
    config.target_languages = vec!["fr".to_string(), "zh-CN".to_string()];
    assert!(config.validate().is_ok());

    config.translation.batch_size = 0;
    assert!(config.validate().is_err());
    config.translation.batch_size = 10;

    config.translation.retry_count = 0;
    assert!(config.validate().is_err());
}

/// Test that a missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.source_language, "auto");
    Ok(())
}

/// Test that partial config files are completed with defaults
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"target_languages": ["fr"], "output": {"post_action": "move", "relocate_on_failure": false}}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.target_languages, vec!["fr"]);
    assert_eq!(config.output.post_action, PostAction::Move);
    assert!(!config.output.relocate_on_failure);
    assert_eq!(config.translation.batch_size, 40);
    Ok(())
}

/// Test that translation settings map onto batch settings
#[test]
fn test_batch_settings_shouldCarryTranslationConfig() {
    let mut config = Config::default();
    config.translation.retry_count = 5;
    config.translation.retry_backoff_ms = 250;
    config.translation.rate_limit_delay_ms = 0;
    config.translation.degrade_on_failure = false;

    let settings = config.translation.batch_settings("en");

    assert_eq!(settings.source_language, "en");
    assert_eq!(settings.retry.max_attempts, 5);
    assert_eq!(settings.retry.base_delay, Duration::from_millis(250));
    assert_eq!(settings.request_delay, Duration::ZERO);
    assert!(!settings.degrade_on_failure);
}

/// Test provider endpoint defaults
#[test]
fn test_get_endpoint_withoutOverride_shouldUseProviderDefault() {
    let mut config = Config::default();
    assert!(config.translation.get_endpoint().contains("translate.googleapis.com"));

    config.translation.provider = TranslationProvider::LibreTranslate;
    assert_eq!(config.translation.get_endpoint(), "http://localhost:5000");

    config.translation.endpoint = "http://example.org:5000".to_string();
    assert_eq!(config.translation.get_endpoint(), "http://example.org:5000");
}
