use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// What happened to an offered path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer {
    /// Nothing was running; start this path now
    Start(PathBuf),
    /// Something is running; the path waits at position `depth`
    Queued { depth: usize },
    /// The path was seen before and is ignored
    AlreadySeen,
}

/// Single-flight FIFO of detected files
///
/// At most one path is "running" at a time. Every other detected path waits
/// in arrival order, whatever directory it came from.
#[derive(Debug, Default)]
pub struct WatchQueue {
    /// Paths waiting for the running one to finish
    pending: VecDeque<PathBuf>,

    /// Paths already seen, per watched directory
    seen: HashMap<PathBuf, HashSet<PathBuf>>,

    /// Path currently being processed
    running: Option<PathBuf>,
}

impl WatchQueue {
    /// Create an empty, idle queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `dir`; returns false when it was already tracked
    pub fn add_directory(&mut self, dir: &Path) -> bool {
        if self.seen.contains_key(dir) {
            return false;
        }
        self.seen.insert(dir.to_path_buf(), HashSet::new());
        true
    }

    /// Stop tracking `dir`
    ///
    /// Paths from `dir` that are already queued stay queued.
    pub fn remove_directory(&mut self, dir: &Path) -> bool {
        self.seen.remove(dir).is_some()
    }

    /// Whether `dir` is tracked
    pub fn is_watching(&self, dir: &Path) -> bool {
        self.seen.contains_key(dir)
    }

    /// Tracked directories
    pub fn directories(&self) -> Vec<PathBuf> {
        self.seen.keys().cloned().collect()
    }

    /// Record `path` as seen without queuing it
    pub fn mark_seen(&mut self, dir: &Path, path: &Path) {
        self.seen
            .entry(dir.to_path_buf())
            .or_default()
            .insert(path.to_path_buf());
    }

    /// Offer a newly detected `path` from `dir`
    ///
    /// Offers for untracked directories are ignored.
    pub fn offer(&mut self, dir: &Path, path: &Path) -> Offer {
        let Some(seen) = self.seen.get_mut(dir) else {
            debug!("Ignoring {} from unwatched directory {}", path.display(), dir.display());
            return Offer::AlreadySeen;
        };
        if !seen.insert(path.to_path_buf()) {
            return Offer::AlreadySeen;
        }

        if self.running.is_none() {
            self.running = Some(path.to_path_buf());
            return Offer::Start(path.to_path_buf());
        }

        self.pending.push_back(path.to_path_buf());
        Offer::Queued {
            depth: self.pending.len(),
        }
    }

    /// Mark the running path finished and start the next one, if any
    pub fn finish(&mut self) -> Option<PathBuf> {
        self.running = self.pending.pop_front();
        self.running.clone()
    }

    /// Path being processed
    pub fn running(&self) -> Option<&Path> {
        self.running.as_deref()
    }

    /// Number of waiting paths, excluding the running one
    pub fn depth(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is running
    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }
}
