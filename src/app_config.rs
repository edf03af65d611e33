//! Configuration file loading, validation and mapping onto engine settings

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::document::OutputEncoding;
use crate::file_utils::PostAction;
use crate::language_utils;
use crate::translation::batch::BatchSettings;
use crate::translation::retry::RetryPolicy;

/// polysub settings as stored in `conf.json`; every section falls back to
/// defaults when missing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code, or "auto" to let the provider detect it
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language codes, processed in this order
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Cache config
    #[serde(default)]
    pub cache: CacheConfig,

    /// Output config
    #[serde(default)]
    pub output: OutputConfig,

    /// Folder watch config
    #[serde(default)]
    pub watch: WatchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Translate public web endpoint
    #[default]
    Google,
    // @provider: LibreTranslate server
    LibreTranslate,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::LibreTranslate => "LibreTranslate",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::LibreTranslate => "libretranslate".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Service URL; empty means the provider's default
    #[serde(default)]
    pub endpoint: String,

    /// API key, only used by LibreTranslate
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of segments handed to the batch translator at once
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound on the joined text sent in one provider call
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,

    /// Attempts per batch before giving up
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Cap on a single backoff sleep
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Delay in milliseconds between consecutive provider calls
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Return source text for items that still fail after all retries
    #[serde(default = "default_true")]
    pub degrade_on_failure: bool,

    /// Strip a leading "Speaker:" label before translating
    #[serde(default = "default_true")]
    pub strip_speaker_labels: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            max_chars_per_request: default_max_chars_per_request(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            degrade_on_failure: true,
            strip_speaker_labels: true,
        }
    }
}

impl TranslationConfig {
    /// Retry policy shared by every provider-calling path
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_count,
            Duration::from_millis(self.retry_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }

    /// Settings for the batch translator
    pub fn batch_settings(&self, source_language: &str) -> BatchSettings {
        BatchSettings {
            source_language: source_language.to_string(),
            max_chars_per_request: self.max_chars_per_request,
            degrade_on_failure: self.degrade_on_failure,
            strip_speaker_labels: self.strip_speaker_labels,
            request_delay: Duration::from_millis(self.rate_limit_delay_ms),
            retry: self.retry_policy(),
            ..BatchSettings::default()
        }
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }

        match self.provider {
            TranslationProvider::Google => default_google_endpoint(),
            TranslationProvider::LibreTranslate => default_libretranslate_endpoint(),
        }
    }
}

/// Persistent cache settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether translations are cached on disk
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory; defaults to the user cache directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

impl CacheConfig {
    /// Directory that holds one cache file per language
    pub fn resolve_directory(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.directory {
            return Ok(dir.clone());
        }

        let base = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

        Ok(base.join("polysub"))
    }
}

/// Where and how translated files are written
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Replace output files that already exist
    #[serde(default)]
    pub overwrite: bool,

    /// What happens to the source file after all languages were attempted
    #[serde(default)]
    pub post_action: PostAction,

    /// Root for output folders; defaults to the source file's directory
    #[serde(default)]
    pub output_root: Option<PathBuf>,

    /// Apply the post action even when some languages failed
    #[serde(default = "default_true")]
    pub relocate_on_failure: bool,

    /// Encoding of written subtitle files
    #[serde(default)]
    pub encoding: OutputEncoding,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            post_action: PostAction::default(),
            output_root: None,
            relocate_on_failure: true,
            encoding: OutputEncoding::default(),
        }
    }
}

/// Folder watch settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Directories watched when `watch` is run without arguments
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// File extensions picked up by the watcher
    #[serde(default = "default_watch_extensions")]
    pub extensions: Vec<String>,

    /// Queue files already present when a directory is added
    #[serde(default = "default_true")]
    pub process_existing: bool,

    /// Periodic re-listing interval; 0 disables it
    #[serde(default = "default_rescan_interval_secs")]
    pub rescan_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            extensions: default_watch_extensions(),
            process_existing: true,
            rescan_interval_secs: default_rescan_interval_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_languages() -> Vec<String> {
    language_utils::DEFAULT_TARGET_LANGUAGES
        .iter()
        .map(|(_, code)| (*code).to_string())
        .collect()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    40
}

fn default_max_chars_per_request() -> usize {
    // Google's web endpoint rejects payloads much above 5000 characters
    4500
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_rate_limit_delay_ms() -> u64 {
    200
}

fn default_rescan_interval_secs() -> u64 {
    30
}

fn default_watch_extensions() -> Vec<String> {
    vec!["srt".to_string(), "ass".to_string(), "txt".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_libretranslate_endpoint() -> String {
    "http://localhost:5000".to_string()
}

impl Config {
    /// Load the configuration, writing a default file when none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.source_language.eq_ignore_ascii_case("auto") {
            language_utils::validate_language_code(&self.source_language)?;
        }

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        for code in &self.target_languages {
            language_utils::validate_language_code(code)?;
        }

        if self.translation.batch_size == 0 {
            return Err(anyhow!("translation.batch_size must be greater than zero"));
        }

        if self.translation.retry_count == 0 {
            return Err(anyhow!("translation.retry_count must be at least 1"));
        }

        if self.translation.max_chars_per_request < 100 {
            return Err(anyhow!(
                "translation.max_chars_per_request is too small: {}",
                self.translation.max_chars_per_request
            ));
        }

        if self.watch.extensions.is_empty() {
            return Err(anyhow!("watch.extensions cannot be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_languages: default_target_languages(),
            translation: TranslationConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
            watch: WatchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
