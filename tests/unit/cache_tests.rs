/*!
 * Tests for the persistent per-language cache
 */

use anyhow::Result;
use std::fs;

use polysub::errors::CacheError;
use polysub::translation::{content_hash, CacheStore};
use polysub::translation::cache::CACHE_FORMAT_VERSION;
use crate::common;

/// Test that the hash is stable and content-sensitive
#[test]
fn test_content_hash_shouldBeStableHex() {
    let hash = content_hash("Hello");

    assert_eq!(hash, content_hash("Hello"));
    assert_ne!(hash, content_hash("hello"));
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

/// Test that entries survive a persist and reopen
#[test]
fn test_persist_withEntries_shouldReloadInNewStore() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let mut store = CacheStore::open(temp_dir.path(), "fr");
    store.insert(content_hash("Hello"), "Bonjour".to_string());
    store.persist()?;

    let mut reopened = CacheStore::open(temp_dir.path(), "fr");
    assert_eq!(reopened.get(&content_hash("Hello")), Some("Bonjour".to_string()));
    assert_eq!(reopened.len(), 1);
    Ok(())
}

/// Test that languages never share entries
#[test]
fn test_open_withOtherLanguage_shouldNotSeeEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let mut french = CacheStore::open(temp_dir.path(), "fr");
    french.insert(content_hash("Hello"), "Bonjour".to_string());
    french.persist()?;

    let mut german = CacheStore::open(temp_dir.path(), "de");
    assert_eq!(german.get(&content_hash("Hello")), None);
    assert!(german.is_empty());
    Ok(())
}

/// Test that a corrupt cache file is treated as empty
#[test]
fn test_open_withCorruptFile_shouldStartEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut store = CacheStore::open(temp_dir.path(), "fr");
    let path = store.path().map(|p| p.to_path_buf()).expect("file-backed store has a path");
    fs::write(&path, "{ this is not json")?;

    assert_eq!(store.get(&content_hash("Hello")), None);

    // Writing afterwards replaces the corrupt file with a valid one
    store.insert(content_hash("Hello"), "Bonjour".to_string());
    store.persist()?;
    let content = fs::read_to_string(&path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    assert_eq!(json["version"], CACHE_FORMAT_VERSION);
    Ok(())
}

/// Test that a clean store does not touch the disk
#[test]
fn test_persist_withoutChanges_shouldNotCreateFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut store = CacheStore::open(temp_dir.path(), "es");

    store.persist()?;

    assert!(!store.path().expect("file-backed store has a path").exists());
    Ok(())
}

/// Test that a blocked cache location reports an I/O error and keeps entries
#[test]
fn test_persist_withFileInPlaceOfDirectory_shouldReturnIoError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let blocker = common::create_test_file(temp_dir.path(), "cache", "occupied")?;

    let mut store = CacheStore::open(&blocker, "fr");
    store.insert(content_hash("Hello"), "Bonjour".to_string());
    let result = store.persist();

    assert!(matches!(result, Err(CacheError::Io { ref language, .. }) if language == "fr"));
    assert_eq!(store.get(&content_hash("Hello")), Some("Bonjour".to_string()));
    assert_eq!(fs::read_to_string(&blocker)?, "occupied");
    Ok(())
}

/// Test hit and miss counters
#[test]
fn test_stats_afterLookups_shouldCountHitsAndMisses() {
    let mut store = CacheStore::in_memory("fr");
    store.insert(content_hash("a"), "A".to_string());

    let _ = store.get(&content_hash("a"));
    let _ = store.get(&content_hash("b"));
    let _ = store.get(&content_hash("a"));

    let stats = store.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    assert!(store.persist().is_ok());
}
