use anyhow::{Context, Result};
use log::{debug, warn};
use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

use crate::file_utils::FileManager;

/// Filesystem notifications for a set of directories
///
/// Notifications carry no file information on purpose: every event on a
/// directory only sends that directory down the `rescan` channel, and the
/// receiver lists the directory again. Renames, atomic saves and editors
/// that write through temp files all end up as "something changed here".
pub struct FolderWatcher {
    /// One notify watcher per directory
    watchers: HashMap<PathBuf, RecommendedWatcher>,

    /// Extensions considered when listing
    extensions: Vec<String>,

    /// Directories that need to be listed again
    rescan: UnboundedSender<PathBuf>,
}

impl FolderWatcher {
    /// Create a watcher that reports changed directories on `rescan`
    pub fn new(extensions: Vec<String>, rescan: UnboundedSender<PathBuf>) -> Self {
        Self {
            watchers: HashMap::new(),
            extensions,
            rescan,
        }
    }

    /// Start receiving notifications for `dir` (non-recursive)
    pub fn add_directory(&mut self, dir: &Path) -> Result<()> {
        if self.watchers.contains_key(dir) {
            return Ok(());
        }

        let sender = self.rescan.clone();
        let watched = dir.to_path_buf();
        let mut watcher = recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if event.kind.is_create() || event.kind.is_modify() || event.kind.is_other() {
                    let _ = sender.send(watched.clone());
                }
            }
            Err(e) => warn!("Watch error on {}: {}", watched.display(), e),
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;

        debug!("Watching {}", dir.display());
        self.watchers.insert(dir.to_path_buf(), watcher);
        Ok(())
    }

    /// Stop notifications for `dir`; returns false if it was not watched
    pub fn remove_directory(&mut self, dir: &Path) -> bool {
        // Dropping the watcher unregisters it
        self.watchers.remove(dir).is_some()
    }

    /// Whether `dir` is watched
    pub fn is_watching(&self, dir: &Path) -> bool {
        self.watchers.contains_key(dir)
    }

    /// Matching, non-empty files currently in `dir`
    ///
    /// Empty files are usually still being written and are left for a later listing.
    pub fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = FileManager::find_supported_files(dir, &self.extensions)?;
        Ok(files
            .into_iter()
            .filter(|path| path.metadata().map(|m| m.len() > 0).unwrap_or(false))
            .collect())
    }
}
