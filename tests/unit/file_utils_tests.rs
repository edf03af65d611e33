/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use polysub::file_utils::{FileManager, PostAction};
use crate::common;

/// Test that ensure_dir creates nested directories
#[test]
fn test_ensure_dir_withNonExistentDir_shouldCreateDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;

    assert!(nested.is_dir());
    Ok(())
}

/// Test the per-file output folder and output filenames
#[test]
fn test_output_path_for_withLanguageName_shouldUseStemFolder() {
    let input = Path::new("/media/movies/film.ass");

    let dir = FileManager::output_dir_for(input, None);
    assert_eq!(dir, PathBuf::from("/media/movies/film"));

    let output = FileManager::output_path_for(input, &dir, "Spanish", "srt");
    assert_eq!(output, PathBuf::from("/media/movies/film/film_Spanish.srt"));

    let rooted = FileManager::output_dir_for(input, Some(Path::new("/translated")));
    assert_eq!(rooted, PathBuf::from("/translated/film"));
}

/// Test directory listing for supported documents
#[test]
fn test_find_supported_files_withMixedFiles_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_subtitle(temp_dir.path(), "b.srt")?;
    common::create_test_file(temp_dir.path(), "a.txt", "hello")?;
    common::create_test_file(temp_dir.path(), "movie.mkv", "binary")?;

    let extensions = common::strings(&["srt", "txt"]);
    let files = FileManager::find_supported_files(temp_dir.path(), &extensions)?;

    assert_eq!(files, vec![temp_dir.path().join("a.txt"), temp_dir.path().join("b.srt")]);
    Ok(())
}

/// Test atomic writes into a missing directory
#[test]
fn test_write_atomic_withMissingParent_shouldCreateAndWrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("film_French.srt");

    FileManager::write_atomic(&path, b"1\n")?;

    assert_eq!(fs::read_to_string(&path)?, "1\n");
    Ok(())
}

/// Test moving a source into its output folder
#[test]
fn test_apply_post_action_withMove_shouldRelocateSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_subtitle(temp_dir.path(), "film.srt")?;
    let target = FileManager::output_dir_for(&source, None);

    let destination = FileManager::apply_post_action(PostAction::Move, &source, &target)?;

    assert_eq!(destination, Some(target.join("film.srt")));
    assert!(!source.exists());
    assert!(target.join("film.srt").exists());
    Ok(())
}

/// Test post action parsing and display
#[test]
fn test_post_action_parse_withKnownNames_shouldRoundTripDisplay() -> Result<()> {
    for action in [PostAction::Move, PostAction::Copy, PostAction::Leave] {
        assert_eq!(action.to_string().parse::<PostAction>()?, action);
    }
    assert!("shred".parse::<PostAction>().is_err());
    Ok(())
}
