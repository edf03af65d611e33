/*!
 * # polysub - multi-language subtitle translation
 *
 * A Rust library that translates subtitle and plain-text files into many
 * target languages while keeping requests to a rate-limited translation
 * provider to a minimum.
 *
 * ## Features
 *
 * - Reads SRT, ASS/SSA and plain text; always writes SRT
 * - Joins many lines into one provider request and splits the answer back,
 *   falling back to per-line requests when the answer cannot be split
 * - Persistent per-language cache keyed by SHA-256 of the normalized text
 * - Retries with exponential backoff; lines that keep failing can fall
 *   back to their source text instead of failing the whole language
 * - Cooperative cancellation and progress events
 * - Folder watching with a single-flight queue
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Document model and SRT / ASS / plain-text adapters
 * - `translation`: Translation engine:
 *   - `translation::batch`: Cache-aware batch translation
 *   - `translation::cache`: Per-language persistent cache
 *   - `translation::retry`: Backoff policy
 * - `job`: Jobs, events and the orchestrator that runs them
 * - `watch`: Folder watcher, queue and dispatcher
 * - `providers`: Translation provider clients (Google, LibreTranslate, mock)
 * - `file_utils`: File system operations
 * - `app_controller`: Command-line controller
 * - `language_utils`: Language codes and names
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod job;
pub mod language_utils;
pub mod providers;
pub mod translation;
pub mod watch;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{Document, DocumentAdapter, DocumentFormat, Segment};
pub use errors::{AppError, CacheError, DocumentError, ProviderError, TranslationError};
pub use job::{CancellationToken, Job, JobEvent, JobOrchestrator, JobOutcome, JobState, ProgressEvent};
pub use language_utils::{display_name, get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::Provider;
pub use translation::{BatchOutcome, BatchSettings, BatchStats, BatchTranslator, CacheStore, RetryPolicy};
pub use watch::{WatchEvent, WatchQueue, WatchService};
