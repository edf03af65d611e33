/*!
 * Persistent per-language translation cache.
 *
 * Each target language owns one `CacheStore`, backed by one JSON file
 * `<dir>/<language>.json`. The file is read lazily on first lookup and
 * written back with `persist()` through a temporary file and a rename,
 * so a crash never leaves a half-written cache behind.
 *
 * A missing or unreadable cache file is not an error: the store starts
 * empty and the problem is logged.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::CacheError;

/// Current on-disk cache layout version
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Compute the SHA-256 hex digest used as cache key
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// On-disk representation of one language cache
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    language: String,
    entries: BTreeMap<String, String>,
}

/// Hit and miss counters for one store
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that found nothing
    pub misses: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Translation cache for a single target language
#[derive(Debug)]
pub struct CacheStore {
    /// Cache namespace (target language code)
    language: String,

    /// Backing file, `None` for a memory-only store
    path: Option<PathBuf>,

    /// Content hash to translated text
    entries: HashMap<String, String>,

    /// Whether the backing file has been read
    loaded: bool,

    /// Whether entries changed since the last persist
    dirty: bool,

    /// Lookup counters
    stats: CacheStats,
}

impl CacheStore {
    /// Create a store backed by `<directory>/<language>.json`
    ///
    /// Nothing is read until the first lookup.
    pub fn open(directory: &Path, language: &str) -> Self {
        Self {
            language: language.to_string(),
            path: Some(directory.join(format!("{}.json", language))),
            entries: HashMap::new(),
            loaded: false,
            dirty: false,
            stats: CacheStats::default(),
        }
    }

    /// Create a store that never touches the disk
    pub fn in_memory(language: &str) -> Self {
        Self {
            language: language.to_string(),
            path: None,
            entries: HashMap::new(),
            loaded: true,
            dirty: false,
            stats: CacheStats::default(),
        }
    }

    /// Cache namespace
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up the translation stored under `hash`
    pub fn get(&mut self, hash: &str) -> Option<String> {
        self.ensure_loaded();

        match self.entries.get(hash) {
            Some(text) => {
                self.stats.hits += 1;
                Some(text.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a translation under `hash`
    pub fn insert(&mut self, hash: String, translation: String) {
        self.ensure_loaded();

        if self.entries.get(&hash) != Some(&translation) {
            self.entries.insert(hash, translation);
            self.dirty = true;
        }
    }

    /// Number of cached entries
    pub fn len(&mut self) -> usize {
        self.ensure_loaded();
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Lookup counters since creation
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Write the store to its backing file if anything changed
    pub fn persist(&mut self) -> Result<(), CacheError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let io_error = |source| CacheError::Io {
            language: self.language.clone(),
            source,
        };

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(io_error)?;

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            language: self.language.clone(),
            entries: self.entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|source| CacheError::Serialize {
            language: self.language.clone(),
            source,
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_error)?;
        temp.write_all(&json).map_err(io_error)?;
        temp.flush().map_err(io_error)?;
        temp.persist(&path).map_err(|e| io_error(e.error))?;

        self.dirty = false;
        debug!("Persisted {} cache entries for '{}' to {}", self.entries.len(), self.language, path.display());
        Ok(())
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let Some(path) = &self.path else {
            return;
        };
        if !path.exists() {
            debug!("No cache file for '{}' yet", self.language);
            return;
        }

        let loaded = fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice::<CacheFile>(&bytes).map_err(|e| e.to_string()));

        match loaded {
            Ok(file) if file.version == CACHE_FORMAT_VERSION => {
                debug!("Loaded {} cache entries for '{}'", file.entries.len(), self.language);
                self.entries = file.entries.into_iter().collect();
            }
            Ok(file) => {
                warn!(
                    "Ignoring cache file {} with unknown version {}",
                    path.display(),
                    file.version
                );
            }
            Err(e) => {
                warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
            }
        }
    }
}
