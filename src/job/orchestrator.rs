/*!
 * Job orchestration.
 *
 * Files are processed in input order, languages in input order, batches in
 * segment order; nothing runs concurrently inside a job. One
 * `BatchTranslator` (and so one cache store) exists per language for the
 * whole job, so a language cache is loaded at most once.
 *
 * Failures are absorbed as close to their source as possible: a file that
 * cannot be parsed is skipped, a language that cannot be translated is
 * reported and the next language starts. Only faults that make the job as
 * a whole impossible end it in `JobState::Failed`.
 */

use anyhow::Result;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    CancellationToken, FileReport, Job, JobEvent, JobOutcome, JobState, LanguageResult, ProgressEvent,
};
use crate::app_config::{Config, OutputConfig};
use crate::document::{Document, DocumentAdapter, DocumentFormat};
use crate::errors::{AppError, TranslationError};
use crate::file_utils::{FileManager, PostAction};
use crate::language_utils;
use crate::providers::Provider;
use crate::translation::{BatchSettings, BatchStats, BatchTranslator, CacheStore};

/// Everything the orchestrator needs besides the provider
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Segments per batch
    pub batch_size: usize,
    /// Batch translator tunables
    pub batch: BatchSettings,
    /// Cache directory; `None` keeps caches in memory only
    pub cache_dir: Option<PathBuf>,
    /// Output placement and post-processing
    pub output: OutputConfig,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            batch_size: 40,
            batch: BatchSettings::default(),
            cache_dir: None,
            output: OutputConfig::default(),
        }
    }
}

impl OrchestratorSettings {
    /// Derive settings from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache_dir = if config.cache.enabled {
            Some(config.cache.resolve_directory()?)
        } else {
            None
        };

        Ok(Self {
            batch_size: config.translation.batch_size,
            batch: config.translation.batch_settings(&config.source_language),
            cache_dir,
            output: config.output.clone(),
        })
    }
}

/// Why a run stopped before the last file
enum RunStop {
    Cancelled,
    Fault(AppError),
}

/// Fixed position of the current file and language, for progress events
#[derive(Clone, Copy)]
struct Position {
    file_index: usize,
    file_total: usize,
    language_index: usize,
    language_total: usize,
}

/// Runs jobs against one provider
pub struct JobOrchestrator {
    /// Translation backend shared by every language
    provider: Arc<dyn Provider>,

    /// Batch, cache and output settings
    settings: OrchestratorSettings,

    /// Event sink, if anyone listens
    events: Option<UnboundedSender<JobEvent>>,

    /// Shared cancellation flag
    cancel: CancellationToken,
}

impl JobOrchestrator {
    /// Create an orchestrator with its own cancellation token
    pub fn new(provider: Arc<dyn Provider>, settings: OrchestratorSettings) -> Self {
        Self {
            provider,
            settings,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Send events to `sender`
    pub fn with_events(mut self, sender: UnboundedSender<JobEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels this orchestrator's jobs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation of the running job
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Active settings
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run `job` to a terminal state
    pub async fn run(&self, job: &mut Job) -> JobOutcome {
        job.state = JobState::Running;
        info!(
            "Job {} started: {} file(s) x {} language(s)",
            job.id,
            job.source_paths.len(),
            job.target_languages.len()
        );
        self.emit(JobEvent::JobStarted {
            job_id: job.id,
            file_total: job.source_paths.len(),
        });

        let mut outcome = JobOutcome {
            job_id: job.id,
            state: JobState::Running,
            files: Vec::new(),
            skipped_files: Vec::new(),
            error: None,
        };
        let mut translators: HashMap<String, BatchTranslator> = HashMap::new();

        let mut result = Ok(());
        for (file_index, path) in job.source_paths.iter().enumerate() {
            let position = Position {
                file_index: file_index + 1,
                file_total: job.source_paths.len(),
                language_index: 0,
                language_total: job.target_languages.len(),
            };
            result = self
                .process_file(path, position, &job.target_languages, &mut translators, &mut outcome)
                .await;
            if result.is_err() {
                break;
            }
        }

        // Translations gathered before a stop are still valid
        for translator in translators.values_mut() {
            if let Err(e) = translator.persist_cache() {
                warn!("Failed to persist cache: {}", e);
            }
        }

        let state = match result {
            Ok(()) => JobState::Completed,
            Err(RunStop::Cancelled) => {
                info!("Job {} cancelled", job.id);
                JobState::Cancelled
            }
            Err(RunStop::Fault(e)) => {
                error!("Job {} failed: {}", job.id, e);
                outcome.error = Some(e.to_string());
                JobState::Failed
            }
        };

        job.state = state;
        outcome.state = state;
        self.emit(JobEvent::JobFinished { job_id: job.id, state });
        outcome
    }

    async fn process_file(
        &self,
        path: &Path,
        mut position: Position,
        languages: &[String],
        translators: &mut HashMap<String, BatchTranslator>,
        outcome: &mut JobOutcome,
    ) -> Result<(), RunStop> {
        if self.cancel.is_cancelled() {
            return Err(RunStop::Cancelled);
        }

        let document = match DocumentFormat::detect(path).and_then(|format| format.adapter().parse(path)) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                outcome.skipped_files.push((path.to_path_buf(), e.to_string()));
                self.emit(JobEvent::FileSkipped {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };
        let adapter = document.format.adapter();

        let output_dir = FileManager::output_dir_for(path, self.settings.output.output_root.as_deref());
        FileManager::ensure_dir(&output_dir).map_err(|e| {
            RunStop::Fault(AppError::File(format!(
                "Cannot create output directory {}: {:#}",
                output_dir.display(),
                e
            )))
        })?;

        info!("Processing file: {} ({} segments)", path.display(), document.len());
        self.emit(JobEvent::FileStarted {
            file_index: position.file_index,
            path: path.to_path_buf(),
            segments: document.len(),
        });

        let mut report = FileReport {
            path: path.to_path_buf(),
            languages: Vec::new(),
            relocated_to: None,
        };

        for (language_index, language) in languages.iter().enumerate() {
            position.language_index = language_index + 1;

            if self.cancel.is_cancelled() {
                outcome.files.push(report);
                return Err(RunStop::Cancelled);
            }

            let result = self
                .process_language(path, &document, adapter, &output_dir, language, position, translators)
                .await;

            match result {
                Ok(result) => report.languages.push((language.clone(), result)),
                Err(TranslationError::Cancelled) => {
                    info!("Discarding unfinished '{}' output for {}", language, path.display());
                    outcome.files.push(report);
                    return Err(RunStop::Cancelled);
                }
                Err(e) => {
                    error!("Error processing {} for {}: {}", path.display(), language, e);
                    self.emit(JobEvent::LanguageFailed {
                        path: path.to_path_buf(),
                        language: language.clone(),
                        error: e.to_string(),
                    });
                    report.languages.push((language.clone(), LanguageResult::Failed { error: e.to_string() }));
                }
            }
        }

        report.relocated_to = self.apply_post_action(path, &output_dir, report.failed_count());

        info!("Finished processing: {}", path.display());
        self.emit(JobEvent::FileFinished { path: path.to_path_buf() });
        outcome.files.push(report);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_language(
        &self,
        path: &Path,
        document: &Document,
        adapter: &dyn DocumentAdapter,
        output_dir: &Path,
        language: &str,
        position: Position,
        translators: &mut HashMap<String, BatchTranslator>,
    ) -> Result<LanguageResult, TranslationError> {
        let language_name = language_utils::display_name(language);
        let output = FileManager::output_path_for(path, output_dir, &language_name, adapter.output_extension());

        if output.exists() && !self.settings.output.overwrite {
            info!(
                "File {} for language {} ({}) already exists. Skipping...",
                output.display(),
                language_name,
                language
            );
            self.emit(JobEvent::LanguageSkipped {
                path: path.to_path_buf(),
                language: language.to_string(),
                output: output.clone(),
            });
            return Ok(LanguageResult::Skipped { output });
        }

        self.emit(JobEvent::LanguageStarted {
            path: path.to_path_buf(),
            language: language.to_string(),
        });

        let translator = translators
            .entry(language.to_string())
            .or_insert_with(|| self.new_translator(language));

        let strip_labels = self.settings.batch.strip_speaker_labels && document.format.carries_speaker_labels();
        let (texts, stats) = self
            .translate_texts(translator, &document.texts(), strip_labels, position)
            .await?;

        if let Err(e) = translator.persist_cache() {
            warn!("Failed to persist cache for '{}': {}", language, e);
        }

        let translated = document.with_texts(&texts);
        let bytes = adapter.serialize(&translated, self.settings.output.encoding);
        if let Err(e) = FileManager::write_atomic(&output, &bytes) {
            let message = format!("{:#}", e);
            error!("Failed to write {}: {}", output.display(), message);
            self.emit(JobEvent::LanguageFailed {
                path: path.to_path_buf(),
                language: language.to_string(),
                error: message.clone(),
            });
            return Ok(LanguageResult::Failed { error: message });
        }

        if stats.degraded > 0 {
            warn!(
                "{} segment(s) of {} kept their source text for '{}'",
                stats.degraded,
                path.display(),
                language
            );
        }
        info!("Wrote {}", output.display());
        self.emit(JobEvent::LanguageCompleted {
            path: path.to_path_buf(),
            language: language.to_string(),
            output: output.clone(),
            stats,
        });

        Ok(LanguageResult::Completed { output, stats })
    }

    /// Translate all texts of a document in `batch_size` chunks
    async fn translate_texts(
        &self,
        translator: &mut BatchTranslator,
        texts: &[String],
        strip_labels: bool,
        position: Position,
    ) -> Result<(Vec<String>, BatchStats), TranslationError> {
        let mut translated = Vec::with_capacity(texts.len());
        let mut stats = BatchStats::default();

        for chunk in texts.chunks(self.settings.batch_size.max(1)) {
            self.cancel.check()?;
            let outcome = translator.translate_batch_with(chunk, strip_labels).await?;
            // A result that arrives after cancellation is dropped
            self.cancel.check()?;

            translated.extend(outcome.texts);
            stats.merge(&outcome.stats);

            debug!("Processed {}/{} | {}", translated.len(), texts.len(), translator.target_language());
            self.emit(JobEvent::Progress(ProgressEvent {
                file_index: position.file_index,
                file_total: position.file_total,
                language_index: position.language_index,
                language_total: position.language_total,
                segments_done: translated.len(),
                segments_total: texts.len(),
            }));
        }

        Ok((translated, stats))
    }

    /// Apply the configured post action, honoring `relocate_on_failure`
    fn apply_post_action(&self, path: &Path, output_dir: &Path, failed_languages: usize) -> Option<PathBuf> {
        let action = self.settings.output.post_action;
        if action == PostAction::Leave {
            return None;
        }

        if failed_languages > 0 && !self.settings.output.relocate_on_failure {
            info!(
                "Leaving {} in place: {} language(s) failed",
                path.display(),
                failed_languages
            );
            return None;
        }

        match FileManager::apply_post_action(action, path, output_dir) {
            Ok(destination) => {
                self.emit(JobEvent::PostActionApplied {
                    path: path.to_path_buf(),
                    action,
                    destination: destination.clone(),
                });
                destination
            }
            Err(e) => {
                warn!("Post action '{}' failed for {}: {:#}", action, path.display(), e);
                None
            }
        }
    }

    fn new_translator(&self, language: &str) -> BatchTranslator {
        let cache = match &self.settings.cache_dir {
            Some(dir) => CacheStore::open(dir, language),
            None => CacheStore::in_memory(language),
        };

        BatchTranslator::new(self.provider.clone(), cache, language, self.settings.batch.clone())
            .with_cancellation(self.cancel.clone())
    }

    fn emit(&self, event: JobEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver only means nobody is listening
            let _ = sender.send(event);
        }
    }
}
