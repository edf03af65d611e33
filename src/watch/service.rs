/*!
 * Folder watch dispatcher.
 *
 * `WatchService` owns the `WatchQueue` and the `FolderWatcher` inside one
 * task. Filesystem notifications, periodic rescans and control commands all
 * arrive as channel messages; the task turns newly detected files into jobs
 * and hands them to the orchestrator, one at a time. It never translates
 * anything itself.
 */

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::queue::{Offer, WatchQueue};
use super::watcher::FolderWatcher;
use crate::app_config::WatchConfig;
use crate::job::{Job, JobOrchestrator, JobOutcome};

/// What the watch service reports
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// A directory is now watched
    DirectoryAdded(PathBuf),
    /// A directory is no longer watched
    DirectoryRemoved(PathBuf),
    /// A new file was found
    FileDetected { directory: PathBuf, path: PathBuf },
    /// Number of files waiting behind the running job
    QueueDepth(usize),
    /// A job was handed to the orchestrator
    JobStarted { job_id: Uuid, path: PathBuf },
    /// A job reached a terminal state
    JobFinished { path: PathBuf, outcome: JobOutcome },
}

/// Control messages for a running service
#[derive(Debug)]
enum WatchCommand {
    AddDirectory(PathBuf),
    RemoveDirectory(PathBuf),
    Shutdown,
}

/// Handle to a spawned watch service
pub struct WatchHandle {
    commands: UnboundedSender<WatchCommand>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Start watching `dir`
    pub fn add_directory(&self, dir: impl Into<PathBuf>) -> Result<()> {
        self.commands
            .send(WatchCommand::AddDirectory(dir.into()))
            .map_err(|_| anyhow!("Watch service has stopped"))
    }

    /// Stop watching `dir`; files already queued from it still run
    pub fn remove_directory(&self, dir: impl Into<PathBuf>) -> Result<()> {
        self.commands
            .send(WatchCommand::RemoveDirectory(dir.into()))
            .map_err(|_| anyhow!("Watch service has stopped"))
    }

    /// Cancel the running job, stop the service and wait for it
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.commands.send(WatchCommand::Shutdown);
        self.task
            .await
            .map_err(|e| anyhow!("Watch service task failed: {}", e))
    }
}

/// Feeds detected files to the orchestrator, one job at a time
pub struct WatchService {
    /// Runs the jobs
    orchestrator: Arc<JobOrchestrator>,

    /// Languages for every job
    target_languages: Vec<String>,

    /// Extensions, initial processing, rescan interval
    config: WatchConfig,

    /// Event sink
    events: Option<UnboundedSender<WatchEvent>>,
}

/// State owned by the dispatcher task
struct Dispatcher {
    service: WatchService,
    queue: WatchQueue,
    watcher: FolderWatcher,
    finished: UnboundedSender<(PathBuf, JobOutcome)>,
    running: Option<JoinHandle<()>>,
}

impl WatchService {
    /// Create a service; nothing runs until `spawn`
    pub fn new(orchestrator: Arc<JobOrchestrator>, target_languages: Vec<String>, config: WatchConfig) -> Self {
        Self {
            orchestrator,
            target_languages,
            config,
            events: None,
        }
    }

    /// Send events to `sender`
    pub fn with_events(mut self, sender: UnboundedSender<WatchEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Start the dispatcher task
    pub fn spawn(self) -> WatchHandle {
        let (commands, command_rx) = unbounded_channel();
        let task = tokio::spawn(self.run(command_rx));
        WatchHandle { commands, task }
    }

    async fn run(self, mut commands: UnboundedReceiver<WatchCommand>) {
        let (rescan_tx, mut rescan_rx) = unbounded_channel::<PathBuf>();
        let (finished_tx, mut finished_rx) = unbounded_channel::<(PathBuf, JobOutcome)>();

        let mut rescan_timer = (self.config.rescan_interval_secs > 0).then(|| {
            let mut timer = tokio::time::interval(Duration::from_secs(self.config.rescan_interval_secs));
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            timer
        });

        let mut dispatcher = Dispatcher {
            watcher: FolderWatcher::new(self.config.extensions.clone(), rescan_tx),
            service: self,
            queue: WatchQueue::new(),
            finished: finished_tx,
            running: None,
        };

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(WatchCommand::AddDirectory(dir)) => dispatcher.add_directory(dir),
                    Some(WatchCommand::RemoveDirectory(dir)) => dispatcher.remove_directory(&dir),
                    Some(WatchCommand::Shutdown) | None => break,
                },
                Some(dir) = rescan_rx.recv() => dispatcher.rescan(&dir),
                Some((path, outcome)) = finished_rx.recv() => dispatcher.job_finished(path, outcome),
                _ = tick(&mut rescan_timer) => {
                    for dir in dispatcher.queue.directories() {
                        dispatcher.rescan(&dir);
                    }
                }
            }
        }

        dispatcher.stop().await;
    }
}

async fn tick(timer: &mut Option<tokio::time::Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl Dispatcher {
    fn add_directory(&mut self, dir: PathBuf) {
        if !self.queue.add_directory(&dir) {
            debug!("Already watching {}", dir.display());
            return;
        }

        if let Err(e) = self.watcher.add_directory(&dir) {
            error!("{:#}", e);
            self.queue.remove_directory(&dir);
            return;
        }

        info!("Watching {}", dir.display());
        self.emit(WatchEvent::DirectoryAdded(dir.clone()));

        if self.service.config.process_existing {
            self.rescan(&dir);
        } else {
            match self.watcher.list(&dir) {
                Ok(files) => {
                    for path in files {
                        self.queue.mark_seen(&dir, &path);
                    }
                }
                Err(e) => warn!("Failed to list {}: {:#}", dir.display(), e),
            }
        }
    }

    fn remove_directory(&mut self, dir: &Path) {
        self.watcher.remove_directory(dir);
        if self.queue.remove_directory(dir) {
            info!("Stopped watching {}", dir.display());
            self.emit(WatchEvent::DirectoryRemoved(dir.to_path_buf()));
        }
    }

    /// List `dir` again and offer every file to the queue
    fn rescan(&mut self, dir: &Path) {
        if !self.queue.is_watching(dir) {
            return;
        }

        let files = match self.watcher.list(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list {}: {:#}", dir.display(), e);
                return;
            }
        };

        for path in files {
            match self.queue.offer(dir, &path) {
                Offer::AlreadySeen => {}
                Offer::Start(path) => {
                    info!("Detected {}", path.display());
                    self.emit(WatchEvent::FileDetected {
                        directory: dir.to_path_buf(),
                        path: path.clone(),
                    });
                    self.start_job(path);
                }
                Offer::Queued { depth } => {
                    info!("Detected {} (queued, {} waiting)", path.display(), depth);
                    self.emit(WatchEvent::FileDetected {
                        directory: dir.to_path_buf(),
                        path,
                    });
                    self.emit(WatchEvent::QueueDepth(depth));
                }
            }
        }
    }

    fn start_job(&mut self, path: PathBuf) {
        let mut job = Job::new(vec![path.clone()], self.service.target_languages.clone());
        self.emit(WatchEvent::JobStarted {
            job_id: job.id,
            path: path.clone(),
        });

        let orchestrator = self.service.orchestrator.clone();
        let finished = self.finished.clone();
        self.running = Some(tokio::spawn(async move {
            let outcome = orchestrator.run(&mut job).await;
            let _ = finished.send((path, outcome));
        }));
    }

    fn job_finished(&mut self, path: PathBuf, outcome: JobOutcome) {
        info!("Job for {} finished: {}", path.display(), outcome.state);
        self.running = None;
        self.emit(WatchEvent::JobFinished { path, outcome });

        if let Some(next) = self.queue.finish() {
            self.start_job(next);
        }
        self.emit(WatchEvent::QueueDepth(self.queue.depth()));
    }

    async fn stop(mut self) {
        if let Some(task) = self.running.take() {
            info!("Stopping watch: cancelling running job");
            self.service.orchestrator.cancel();
            if let Err(e) = task.await {
                error!("Running job task failed: {}", e);
            }
        }
        info!("Watch service stopped ({} file(s) left in queue)", self.queue.depth());
    }

    fn emit(&self, event: WatchEvent) {
        if let Some(sender) = &self.service.events {
            let _ = sender.send(event);
        }
    }
}
