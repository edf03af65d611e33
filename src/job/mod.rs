/*!
 * Translation jobs.
 *
 * A `Job` is a list of source files and a list of target languages. The
 * `JobOrchestrator` runs it file by file and language by language, reporting
 * what happens through `JobEvent`s and finishing with a `JobOutcome`.
 */

use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::file_utils::PostAction;
use crate::translation::BatchStats;

pub use self::cancel::CancellationToken;
pub use self::orchestrator::{JobOrchestrator, OrchestratorSettings};

pub mod cancel;
pub mod orchestrator;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created, not started
    Queued,
    /// Being processed
    Running,
    /// Every file was attempted; individual languages may still have failed
    Completed,
    /// The orchestrator itself could not continue
    Failed,
    /// Stopped on request
    Cancelled,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// A unit of work: source files times target languages
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique job id
    pub id: Uuid,
    /// Files to translate, in processing order
    pub source_paths: Vec<PathBuf>,
    /// Target language codes, in processing order
    pub target_languages: Vec<String>,
    /// Current state
    pub state: JobState,
}

impl Job {
    /// Create a queued job
    pub fn new(source_paths: Vec<PathBuf>, target_languages: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_paths,
            target_languages,
            state: JobState::Queued,
        }
    }
}

/// Position of the job within files, languages and segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 1-based index of the current file
    pub file_index: usize,
    /// Number of files in the job
    pub file_total: usize,
    /// 1-based index of the current language
    pub language_index: usize,
    /// Number of languages in the job
    pub language_total: usize,
    /// Segments translated so far for this file and language
    pub segments_done: usize,
    /// Segments in the current file
    pub segments_total: usize,
}

/// Everything a job reports while it runs
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// The job started
    JobStarted { job_id: Uuid, file_total: usize },
    /// A file was parsed and is about to be translated
    FileStarted { file_index: usize, path: PathBuf, segments: usize },
    /// A file could not be parsed or is not supported
    FileSkipped { path: PathBuf, reason: String },
    /// A language is about to be translated
    LanguageStarted { path: PathBuf, language: String },
    /// The output for a language already exists and overwrite is off
    LanguageSkipped { path: PathBuf, language: String, output: PathBuf },
    /// Segments were translated
    Progress(ProgressEvent),
    /// A language was written
    LanguageCompleted {
        path: PathBuf,
        language: String,
        output: PathBuf,
        stats: BatchStats,
    },
    /// A language could not be translated; the job continues
    LanguageFailed { path: PathBuf, language: String, error: String },
    /// The post action was applied to a source file
    PostActionApplied {
        path: PathBuf,
        action: PostAction,
        destination: Option<PathBuf>,
    },
    /// All languages of a file were attempted
    FileFinished { path: PathBuf },
    /// The job reached a terminal state
    JobFinished { job_id: Uuid, state: JobState },
}

/// Result of one language of one file
#[derive(Debug, Clone, PartialEq)]
pub enum LanguageResult {
    /// Written to `output`
    Completed { output: PathBuf, stats: BatchStats },
    /// Output already existed
    Skipped { output: PathBuf },
    /// Translation failed
    Failed { error: String },
}

/// Per-file summary
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// Source file
    pub path: PathBuf,
    /// One entry per attempted language, in order
    pub languages: Vec<(String, LanguageResult)>,
    /// Where the source ended up after the post action
    pub relocated_to: Option<PathBuf>,
}

impl FileReport {
    /// Number of languages that failed
    pub fn failed_count(&self) -> usize {
        self.languages
            .iter()
            .filter(|(_, r)| matches!(r, LanguageResult::Failed { .. }))
            .count()
    }

    /// Outputs written for this file
    pub fn outputs(&self) -> Vec<&PathBuf> {
        self.languages
            .iter()
            .filter_map(|(_, r)| match r {
                LanguageResult::Completed { output, .. } => Some(output),
                _ => None,
            })
            .collect()
    }
}

/// Final result of running a job
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// Job id
    pub job_id: Uuid,
    /// Terminal state
    pub state: JobState,
    /// Files that were translated (fully or partially)
    pub files: Vec<FileReport>,
    /// Files skipped with the reason
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Orchestrator-level error for `Failed`
    pub error: Option<String>,
}

impl JobOutcome {
    /// Every output written by the job
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .flat_map(|f| f.outputs().into_iter().cloned())
            .collect()
    }

    /// Accumulated batch statistics over all completed languages
    pub fn total_stats(&self) -> BatchStats {
        let mut total = BatchStats::default();
        for file in &self.files {
            for (_, result) in &file.languages {
                if let LanguageResult::Completed { stats, .. } = result {
                    total.merge(stats);
                }
            }
        }
        total
    }
}
