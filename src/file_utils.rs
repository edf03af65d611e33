use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// What happens to a source file once all its languages were attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostAction {
    /// Move the source into its output folder
    Move,
    /// Copy the source into its output folder
    Copy,
    /// Leave the source where it is
    #[default]
    Leave,
}

impl std::fmt::Display for PostAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Copy => write!(f, "copy"),
            Self::Leave => write!(f, "leave"),
        }
    }
}

impl std::str::FromStr for PostAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "copy" => Ok(Self::Copy),
            "leave" | "none" => Ok(Self::Leave),
            _ => Err(anyhow!("Invalid post action: {}", s)),
        }
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @returns: Folder holding every output of `input_file`
    // @params: input_file, output_root (defaults to the input's own directory)
    pub fn output_dir_for<P: AsRef<Path>>(input_file: P, output_root: Option<&Path>) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default();
        let base = output_root
            .map(Path::to_path_buf)
            .or_else(|| input_file.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        base.join(stem)
    }

    // @generates: `<output_dir>/<stem>_<LanguageName>.<extension>`
    pub fn output_path_for<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        language_name: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default().to_string_lossy();
        output_dir
            .as_ref()
            .join(format!("{}_{}.{}", stem, language_name, extension))
    }

    /// Find supported documents directly inside `dir` (not recursive), sorted by name
    pub fn find_supported_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::has_extension(path, extensions) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    // @checks: Extension against a case-insensitive allow list
    pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }

    /// Write `content` to `path` through a temp file in the same directory
    ///
    /// Readers never observe a partially written file.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::ensure_dir(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        temp.write_all(content)
            .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
        temp.persist(path)
            .map_err(|e| anyhow!("Failed to replace {}: {}", path.display(), e.error))?;

        Ok(())
    }

    /// Copy a file, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        Ok(())
    }

    /// Move a file, falling back to copy and delete across filesystems
    pub fn move_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        if fs::rename(from, to).is_ok() {
            return Ok(());
        }

        Self::copy_file(from, to)?;
        fs::remove_file(from).with_context(|| format!("Failed to remove {:?} after copy", from))?;
        Ok(())
    }

    /// Apply `action` to `source`, placing it inside `target_dir`
    ///
    /// Returns the new location, or `None` when the file was left in place.
    pub fn apply_post_action<P1: AsRef<Path>, P2: AsRef<Path>>(
        action: PostAction,
        source: P1,
        target_dir: P2,
    ) -> Result<Option<PathBuf>> {
        let source = source.as_ref();
        let file_name = source
            .file_name()
            .ok_or_else(|| anyhow!("Source has no file name: {:?}", source))?;
        let destination = target_dir.as_ref().join(file_name);

        match action {
            PostAction::Leave => return Ok(None),
            PostAction::Copy => Self::copy_file(source, &destination)?,
            PostAction::Move => Self::move_file(source, &destination)?,
        }

        debug!("Applied post action '{}' to {:?} -> {:?}", action, source, destination);
        Ok(Some(destination))
    }
}
