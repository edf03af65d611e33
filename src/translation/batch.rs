/*!
 * Cache-aware batch translation.
 *
 * `BatchTranslator::translate_batch` turns an ordered list of texts into an
 * ordered list of translations of the same length:
 *
 * 1. blank texts pass through untouched;
 * 2. the rest are normalized and looked up in the language cache;
 * 3. misses are joined with a delimiter into as few provider calls as the
 *    request size limit allows, and the response is split back apart;
 * 4. when a response does not split into the expected number of parts,
 *    every item of that group is translated on its own;
 * 5. failing calls are retried with exponential backoff, keeping whatever
 *    was already translated;
 * 6. items that still fail fall back to their source text, or the batch
 *    fails, depending on `BatchSettings::degrade_on_failure`.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::cache::{content_hash, CacheStore};
use super::retry::{pause, RetryPolicy};
use crate::errors::{CacheError, ProviderError, TranslationError};
use crate::job::CancellationToken;
use crate::providers::Provider;

/// Separator placed between joined texts in one provider request
pub const DEFAULT_DELIMITER: &str = "\n\n\n";

// Leading "NAME:" / "DR. WHO:" or single-word "Anna:" prefix on the first line
static SPEAKER_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[\p{Lu}\d][\p{Lu}\d .'-]{0,31}|[^\s:,]{1,32}):\s+").expect("speaker label regex is valid")
});

/// Normalize a text before hashing and translation
///
/// Trims surrounding whitespace and, when `strip_speaker_labels` is set,
/// removes a leading speaker label such as `JOHN: `.
pub fn normalize_text(text: &str, strip_speaker_labels: bool) -> String {
    let text = text.trim();
    if strip_speaker_labels {
        SPEAKER_LABEL_REGEX.replace(text, "").trim().to_string()
    } else {
        text.to_string()
    }
}

/// Tunables for a batch translator
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Source language code or "auto"
    pub source_language: String,
    /// Separator used to join texts into one request
    pub delimiter: String,
    /// Upper bound for the length of one joined request
    pub max_chars_per_request: usize,
    /// Return source text for items that fail every attempt
    pub degrade_on_failure: bool,
    /// Strip speaker labels during normalization
    pub strip_speaker_labels: bool,
    /// Pause between consecutive provider calls
    pub request_delay: Duration,
    /// Backoff policy for failed attempts
    pub retry: RetryPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            source_language: "auto".to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            max_chars_per_request: 4500,
            degrade_on_failure: true,
            strip_speaker_labels: true,
            request_delay: Duration::ZERO,
            retry: RetryPolicy::default(),
        }
    }
}

/// Counters describing how a batch was resolved
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Blank texts passed through
    pub blanks: usize,
    /// Texts answered from the cache
    pub cache_hits: usize,
    /// Translations newly added to the cache
    pub new_entries: usize,
    /// Provider requests issued
    pub provider_calls: usize,
    /// Texts that fell back to their source text
    pub degraded: usize,
    /// Joined responses that did not split into the expected parts
    pub mismatches: usize,
}

impl BatchStats {
    /// Add another batch's counters to these
    pub fn merge(&mut self, other: &BatchStats) {
        self.blanks += other.blanks;
        self.cache_hits += other.cache_hits;
        self.new_entries += other.new_entries;
        self.provider_calls += other.provider_calls;
        self.degraded += other.degraded;
        self.mismatches += other.mismatches;
    }
}

/// Result of translating one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Translated texts, same length and order as the input
    pub texts: Vec<String>,
    /// How the batch was resolved
    pub stats: BatchStats,
}

/// A distinct cache miss and the input positions that share it
#[derive(Debug)]
struct PendingItem {
    normalized: String,
    hash: String,
    positions: Vec<usize>,
}

/// Why a dispatch round stopped early
enum DispatchError {
    Cancelled,
    Provider(ProviderError),
}

impl From<ProviderError> for DispatchError {
    fn from(error: ProviderError) -> Self {
        Self::Provider(error)
    }
}

/// Translates batches of texts into one target language
///
/// Owns the cache store of its language for as long as it lives.
pub struct BatchTranslator {
    /// Translation backend
    provider: Arc<dyn Provider>,

    /// Cache namespace for `target_language`
    cache: CacheStore,

    /// Target language code
    target_language: String,

    /// Tunables
    settings: BatchSettings,

    /// Optional cooperative cancellation
    cancel: Option<CancellationToken>,

    /// Provider calls made over the translator's lifetime
    calls_made: usize,
}

impl std::fmt::Debug for BatchTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchTranslator")
            .field("provider", &self.provider.name())
            .field("target_language", &self.target_language)
            .field("calls_made", &self.calls_made)
            .finish()
    }
}

impl BatchTranslator {
    /// Create a translator for `target_language`
    pub fn new(
        provider: Arc<dyn Provider>,
        cache: CacheStore,
        target_language: impl Into<String>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            provider,
            cache,
            target_language: target_language.into(),
            settings,
            cancel: None,
            calls_made: 0,
        }
    }

    /// Stop work at the next check once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Target language code
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Active settings
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// The language cache
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Mutable access to the language cache
    pub fn cache_mut(&mut self) -> &mut CacheStore {
        &mut self.cache
    }

    /// Write the language cache to disk
    pub fn persist_cache(&mut self) -> Result<(), CacheError> {
        self.cache.persist()
    }

    /// Translate `texts`, preserving length and order
    pub async fn translate_batch(&mut self, texts: &[String]) -> Result<BatchOutcome, TranslationError> {
        self.translate_batch_with(texts, self.settings.strip_speaker_labels).await
    }

    /// Translate `texts`, overriding speaker-label stripping for this batch
    ///
    /// Formats without speaker labels pass `false` so a leading "Subject:"
    /// or similar survives.
    pub async fn translate_batch_with(
        &mut self,
        texts: &[String],
        strip_speaker_labels: bool,
    ) -> Result<BatchOutcome, TranslationError> {
        let mut stats = BatchStats::default();
        let mut output: Vec<Option<String>> = vec![None; texts.len()];
        let mut pending: Vec<PendingItem> = Vec::new();
        let mut pending_by_hash: HashMap<String, usize> = HashMap::new();

        for (position, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                output[position] = Some(text.clone());
                stats.blanks += 1;
                continue;
            }

            let normalized = normalize_text(text, strip_speaker_labels);
            if normalized.is_empty() {
                output[position] = Some(text.clone());
                stats.blanks += 1;
                continue;
            }

            let hash = content_hash(&normalized);
            if let Some(&index) = pending_by_hash.get(&hash) {
                pending[index].positions.push(position);
                continue;
            }

            match self.cache.get(&hash) {
                Some(translation) => {
                    output[position] = Some(translation);
                    stats.cache_hits += 1;
                }
                None => {
                    pending_by_hash.insert(hash.clone(), pending.len());
                    pending.push(PendingItem {
                        normalized,
                        hash,
                        positions: vec![position],
                    });
                }
            }
        }

        debug!(
            "Batch of {} for '{}': {} blank, {} cached, {} to translate",
            texts.len(),
            self.target_language,
            stats.blanks,
            stats.cache_hits,
            pending.len()
        );

        let resolved = self.resolve(&pending, &mut stats).await?;

        for (item, translation) in pending.iter().zip(resolved) {
            for &position in &item.positions {
                output[position] = match &translation {
                    Some(text) => Some(text.clone()),
                    None => {
                        stats.degraded += 1;
                        Some(texts[position].clone())
                    }
                };
            }
        }

        let texts = output
            .into_iter()
            .zip(texts)
            .map(|(translated, source)| translated.unwrap_or_else(|| source.clone()))
            .collect();

        Ok(BatchOutcome { texts, stats })
    }

    /// Translate a single text with the same cache, retry and fallback rules
    pub async fn translate_one(&mut self, text: &str) -> Result<String, TranslationError> {
        let outcome = self.translate_batch(&[text.to_string()]).await?;
        Ok(outcome.texts.into_iter().next().unwrap_or_default())
    }

    /// Translate every pending item, retrying failed rounds
    ///
    /// Returns one entry per pending item; `None` marks a degraded item.
    async fn resolve(
        &mut self,
        pending: &[PendingItem],
        stats: &mut BatchStats,
    ) -> Result<Vec<Option<String>>, TranslationError> {
        let mut resolved: Vec<Option<String>> = vec![None; pending.len()];
        let retry = self.settings.retry.clone();
        let mut attempt = 1;

        loop {
            let unresolved: Vec<usize> = (0..pending.len()).filter(|&i| resolved[i].is_none()).collect();
            if unresolved.is_empty() {
                return Ok(resolved);
            }

            let error = match self.dispatch(pending, &unresolved, &mut resolved, stats).await {
                Ok(()) => return Ok(resolved),
                Err(DispatchError::Cancelled) => return Err(TranslationError::Cancelled),
                Err(DispatchError::Provider(error)) => error,
            };

            if !error.is_transient() || attempt >= retry.max_attempts {
                let remaining = resolved.iter().filter(|r| r.is_none()).count();
                if self.settings.degrade_on_failure {
                    warn!(
                        "Giving up on {} text(s) for '{}' after {} attempt(s): {}. Keeping source text.",
                        remaining, self.target_language, attempt, error
                    );
                    return Ok(resolved);
                }
                return Err(TranslationError::ProviderExhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = retry.delay_for(attempt);
            warn!(
                "Attempt {}/{} for '{}' failed: {}. Retrying in {:?}",
                attempt, retry.max_attempts, self.target_language, error, delay
            );
            pause(delay, self.cancel.as_ref()).await?;
            attempt += 1;
        }
    }

    /// One round over the unresolved items
    async fn dispatch(
        &mut self,
        pending: &[PendingItem],
        unresolved: &[usize],
        resolved: &mut [Option<String>],
        stats: &mut BatchStats,
    ) -> Result<(), DispatchError> {
        for group in self.plan_groups(pending, unresolved) {
            if group.len() == 1 {
                let index = group[0];
                let translation = self.call_provider(&pending[index].normalized, stats).await?;
                self.store(&pending[index], translation, &mut resolved[index], stats);
                continue;
            }

            let joined = group
                .iter()
                .map(|&i| pending[i].normalized.as_str())
                .collect::<Vec<_>>()
                .join(&self.settings.delimiter);
            let response = self.call_provider(&joined, stats).await?;
            let parts = split_response(&response, &self.settings.delimiter);

            // An empty part for a non-empty input is as unusable as a missing one
            if parts.len() == group.len() && parts.iter().all(|part| !part.is_empty()) {
                for (&index, part) in group.iter().zip(parts) {
                    self.store(&pending[index], part, &mut resolved[index], stats);
                }
                continue;
            }

            stats.mismatches += 1;
            warn!(
                "Response for '{}' split into {} usable part(s), expected {}; translating individually",
                self.target_language,
                parts.iter().filter(|part| !part.is_empty()).count(),
                group.len()
            );
            for &index in &group {
                let translation = self.call_provider(&pending[index].normalized, stats).await?;
                self.store(&pending[index], translation, &mut resolved[index], stats);
            }
        }

        Ok(())
    }

    /// Group unresolved items into joined requests
    ///
    /// Items containing the delimiter, or longer than the request limit on
    /// their own, always travel alone.
    fn plan_groups(&self, pending: &[PendingItem], unresolved: &[usize]) -> Vec<Vec<usize>> {
        let delimiter = &self.settings.delimiter;
        let limit = self.settings.max_chars_per_request;

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_len = 0;

        for &index in unresolved {
            let text = &pending[index].normalized;
            let len = text.chars().count();

            if text.contains(delimiter.as_str()) || len >= limit {
                groups.push(vec![index]);
                continue;
            }

            let added = if current.is_empty() { len } else { len + delimiter.chars().count() };
            if !current.is_empty() && current_len + added > limit {
                groups.push(std::mem::take(&mut current));
                current_len = 0;
                current.push(index);
                current_len += len;
            } else {
                current.push(index);
                current_len += added;
            }
        }

        if !current.is_empty() {
            groups.push(current);
        }

        groups
    }

    /// Issue one provider request, honoring cancellation and the request delay
    async fn call_provider(&mut self, text: &str, stats: &mut BatchStats) -> Result<String, DispatchError> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(DispatchError::Cancelled);
        }

        if self.calls_made > 0 && !self.settings.request_delay.is_zero() {
            pause(self.settings.request_delay, self.cancel.as_ref())
                .await
                .map_err(|_| DispatchError::Cancelled)?;
        }

        self.calls_made += 1;
        stats.provider_calls += 1;
        debug!(
            "{} request #{} -> '{}' ({} chars)",
            self.provider.name(),
            self.calls_made,
            self.target_language,
            text.chars().count()
        );

        let call = self
            .provider
            .translate(text, &self.settings.source_language, &self.target_language);

        let result = match &self.cancel {
            Some(token) => tokio::select! {
                result = call => result,
                _ = token.cancelled() => return Err(DispatchError::Cancelled),
            },
            None => call.await,
        };

        Ok(result?)
    }

    /// Record a translation; empty answers are used once but never cached
    fn store(&mut self, item: &PendingItem, translation: String, slot: &mut Option<String>, stats: &mut BatchStats) {
        if translation.is_empty() {
            warn!("Empty translation for '{}'; not caching it", self.target_language);
        } else {
            self.cache.insert(item.hash.clone(), translation.clone());
            stats.new_entries += 1;
        }
        *slot = Some(translation);
    }
}

/// Split a joined response back into trimmed parts
fn split_response(response: &str, delimiter: &str) -> Vec<String> {
    response
        .trim()
        .split(delimiter)
        .map(|part| part.trim().to_string())
        .collect()
}
