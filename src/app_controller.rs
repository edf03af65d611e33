use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::unbounded_channel;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::job::{Job, JobEvent, JobOrchestrator, JobOutcome, JobState, OrchestratorSettings};
use crate::language_utils;
use crate::providers::{self, Provider};
use crate::watch::{WatchEvent, WatchService};

// @module: Application controller for file and folder translation

/// Main application controller
///
/// Wires configuration, provider and orchestrator together. The orchestrator
/// always runs on its own task; the controller only renders events and turns
/// Ctrl-C into a cancellation request.
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Provider shared by every job
    provider: Arc<dyn Provider>,
}

impl Controller {
    // @method: Create a controller using the provider selected in `config`
    pub fn with_config(config: Config) -> Result<Self> {
        let provider = providers::from_config(&config.translation)?;
        Ok(Self { config, provider })
    }

    /// Create a controller around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self { config, provider }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send a test request before starting work
    ///
    /// A failure is only reported; every batch retries on its own.
    pub async fn check_provider(&self) -> bool {
        match self.provider.test_connection().await {
            Ok(()) => {
                info!("{} is reachable", self.provider.name());
                true
            }
            Err(e) => {
                warn!(
                    "{} connection test failed: {}. Continuing, requests will be retried.",
                    self.provider.name(),
                    e
                );
                false
            }
        }
    }

    /// Expand the given files and folders into the list of files to translate
    ///
    /// Folders contribute every matching file directly inside them.
    pub fn collect_inputs(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut inputs = Vec::new();

        for path in paths {
            if path.is_dir() {
                let files = FileManager::find_supported_files(path, &self.config.watch.extensions)?;
                if files.is_empty() {
                    warn!("No subtitle files found in {}", path.display());
                }
                inputs.extend(files);
            } else if path.is_file() {
                inputs.push(path.clone());
            } else {
                return Err(anyhow!("Input path does not exist: {}", path.display()));
            }
        }

        if inputs.is_empty() {
            return Err(anyhow!("No valid subtitle files were found"));
        }

        Ok(inputs)
    }

    /// Translate files and folders into every configured target language
    pub async fn run_files(&self, paths: &[PathBuf]) -> Result<JobOutcome> {
        let start_time = Instant::now();
        let inputs = self.collect_inputs(paths)?;
        let settings = OrchestratorSettings::from_config(&self.config)?;
        self.check_provider().await;

        info!(
            "{}: {} file(s) -> {}",
            self.provider.name(),
            inputs.len(),
            self.config.target_languages.join(", ")
        );

        let (event_tx, mut event_rx) = unbounded_channel();
        let orchestrator = JobOrchestrator::new(self.provider.clone(), settings).with_events(event_tx);
        let cancel = orchestrator.cancellation_token();

        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing current request and stopping...");
                cancel.cancel();
            }
        });

        let mut job = Job::new(inputs.clone(), self.config.target_languages.clone());
        let task = tokio::spawn(async move { orchestrator.run(&mut job).await });

        let reporter = ProgressReporter::new(inputs.len());
        while let Some(event) = event_rx.recv().await {
            reporter.handle(&event);
        }

        let outcome = task.await.context("Translation task failed")?;
        ctrl_c.abort();
        reporter.finish();

        Self::log_summary(&outcome, start_time);

        if outcome.state == JobState::Failed {
            return Err(anyhow!(
                "Translation failed: {}",
                outcome.error.clone().unwrap_or_default()
            ));
        }

        Ok(outcome)
    }

    /// Watch directories until Ctrl-C, translating every new file
    pub async fn run_watch(&self, directories: &[PathBuf]) -> Result<()> {
        let directories: Vec<PathBuf> = if directories.is_empty() {
            self.config.watch.directories.clone()
        } else {
            directories.to_vec()
        };

        if directories.is_empty() {
            return Err(anyhow!("No directories to watch (pass some or set watch.directories)"));
        }
        for dir in &directories {
            if !dir.is_dir() {
                return Err(anyhow!("Watch directory does not exist: {}", dir.display()));
            }
        }

        let settings = OrchestratorSettings::from_config(&self.config)?;
        self.check_provider().await;
        let orchestrator = Arc::new(JobOrchestrator::new(self.provider.clone(), settings));

        let (event_tx, mut event_rx) = unbounded_channel();
        let handle = WatchService::new(
            orchestrator,
            self.config.target_languages.clone(),
            self.config.watch.clone(),
        )
        .with_events(event_tx)
        .spawn();

        for dir in &directories {
            handle.add_directory(dir.clone())?;
        }
        info!("Watching {} director(ies). Press Ctrl-C to stop.", directories.len());

        loop {
            tokio::select! {
                event = event_rx.recv() => match event {
                    Some(event) => Self::log_watch_event(&event),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupt received, stopping watch...");
                    break;
                }
            }
        }

        handle.shutdown().await
    }

    fn log_watch_event(event: &WatchEvent) {
        match event {
            WatchEvent::QueueDepth(depth) if *depth > 0 => info!("{} file(s) waiting", depth),
            WatchEvent::JobFinished { path, outcome } => {
                let failed: usize = outcome.files.iter().map(|f| f.failed_count()).sum();
                if failed > 0 {
                    warn!("{}: {} language(s) failed", file_name(path), failed);
                } else {
                    info!("{}: {} output(s) written", file_name(path), outcome.outputs().len());
                }
            }
            _ => {}
        }
    }

    fn log_summary(outcome: &JobOutcome, start_time: Instant) {
        let stats = outcome.total_stats();
        let failed: usize = outcome.files.iter().map(|f| f.failed_count()).sum();

        info!(
            "Job {} in {}: {} output(s), {} file(s) skipped, {} language(s) failed",
            outcome.state,
            Self::format_duration(start_time.elapsed()),
            outcome.outputs().len(),
            outcome.skipped_files.len(),
            failed
        );
        info!(
            "Segments: {} from cache, {} translated, {} kept in source language ({} provider calls)",
            stats.cache_hits, stats.new_entries, stats.degraded, stats.provider_calls
        );
        for (path, reason) in &outcome.skipped_files {
            warn!("Skipped {}: {}", file_name(path), reason);
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Files bar plus a segments bar for the current language
struct ProgressReporter {
    _multi: MultiProgress,
    files: ProgressBar,
    segments: ProgressBar,
}

impl ProgressReporter {
    fn new(file_total: usize) -> Self {
        let multi = MultiProgress::new();

        let files = multi.add(ProgressBar::new(file_total as u64));
        files.set_style(Self::style("files"));
        files.set_message("Processing files");

        let segments = multi.add(ProgressBar::new(0));
        segments.set_style(Self::style("segments"));

        Self {
            _multi: multi,
            files,
            segments,
        }
    }

    fn style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    fn handle(&self, event: &JobEvent) {
        match event {
            JobEvent::FileStarted { path, .. } => {
                self.files.set_message(format!("Processing: {}", file_name(path)));
            }
            JobEvent::LanguageStarted { language, .. } => {
                self.segments.set_position(0);
                self.segments.set_message(language_utils::display_name(language));
            }
            JobEvent::Progress(progress) => {
                self.segments.set_length(progress.segments_total as u64);
                self.segments.set_position(progress.segments_done as u64);
            }
            JobEvent::LanguageFailed { language, error, .. } => {
                error!("{} failed: {}", language_utils::display_name(language), error);
            }
            JobEvent::FileSkipped { .. } | JobEvent::FileFinished { .. } => self.files.inc(1),
            _ => {}
        }
    }

    fn finish(&self) {
        self.segments.finish_and_clear();
        self.files.finish_and_clear();
    }
}
