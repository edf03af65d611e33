/*!
 * Common test utilities for the polysub test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use polysub::job::{JobOrchestrator, OrchestratorSettings};
use polysub::providers::mock::MockProvider;
use polysub::translation::{BatchSettings, BatchTranslator, CacheStore, RetryPolicy};

/// Three-entry SRT used across tests
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";

/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// Batch settings without backoff delays
pub fn fast_batch_settings() -> BatchSettings {
    BatchSettings {
        retry: RetryPolicy::immediate(3),
        ..BatchSettings::default()
    }
}

/// Orchestrator settings without delays, caching under `cache_dir`
pub fn fast_orchestrator_settings(cache_dir: Option<&Path>) -> OrchestratorSettings {
    OrchestratorSettings {
        batch_size: 2,
        batch: fast_batch_settings(),
        cache_dir: cache_dir.map(Path::to_path_buf),
        ..OrchestratorSettings::default()
    }
}

/// French batch translator backed by an in-memory cache
pub fn french_translator(provider: &MockProvider) -> BatchTranslator {
    BatchTranslator::new(
        Arc::new(provider.clone()),
        CacheStore::in_memory("fr"),
        "fr",
        fast_batch_settings(),
    )
}

/// Orchestrator around a mock provider
pub fn orchestrator(provider: &MockProvider, settings: OrchestratorSettings) -> JobOrchestrator {
    JobOrchestrator::new(Arc::new(provider.clone()), settings)
}

/// Convert string slices to owned strings
pub fn strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}
