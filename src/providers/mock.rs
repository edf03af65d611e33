/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds, tagging each line with the target language
 * - `MockProvider::merging()` - Collapses joined batches so they cannot be split
 * - `MockProvider::failing()` - Always fails with a transient error
 * - `MockProvider::fail_first(n)` - Fails n times, then works
 *
 * Exact responses can be scripted with `with_response`, and every call is
 * recorded so tests can assert on how often the provider was hit.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Text sent to the provider
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Succeeds but joins paragraphs, losing batch delimiters
    Merging,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Fails the first N requests, then works
    FailFirst { failures: usize },
    /// Always fails with a transient error
    Failing,
    /// Always fails with a non-retryable error
    Rejecting,
    /// Simulates slow response (for cancellation testing)
    Slow { delay_ms: u64 },
}

/// Callback run at the start of every call with its 1-based number
pub type CallHook = Arc<dyn Fn(usize) + Send + Sync>;

/// Mock provider for testing translation behavior
#[derive(Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every call made, shared between clones
    calls: Arc<Mutex<Vec<MockCall>>>,
    /// Scripted responses keyed by (target language, exact text)
    responses: Arc<HashMap<(String, String), String>>,
    /// Optional hook run before each call
    hook: Option<CallHook>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("behavior", &self.behavior)
            .field("request_count", &self.request_count.load(Ordering::SeqCst))
            .finish()
    }
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(HashMap::new()),
            hook: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a provider that does not preserve batch delimiters
    pub fn merging() -> Self {
        Self::new(MockBehavior::Merging)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a provider that fails `failures` times before working
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a provider that rejects every request
    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    /// Create a provider that waits before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Script the exact answer for `text` translated to `target_language`
    pub fn with_response(mut self, target_language: &str, text: &str, translation: &str) -> Self {
        Arc::make_mut(&mut self.responses).insert(
            (target_language.to_string(), text.to_string()),
            translation.to_string(),
        );
        self
    }

    /// Run `hook` at the start of every call
    pub fn with_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every call made so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Default translation: every non-empty line tagged with the target language
    pub fn tag_lines(text: &str, target_language: &str) -> String {
        text.split('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    line.to_string()
                } else {
                    format!("[{}] {}", target_language, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn answer(&self, text: &str, target_language: &str) -> String {
        self.responses
            .get(&(target_language.to_string(), text.to_string()))
            .cloned()
            .unwrap_or_else(|| Self::tag_lines(text, target_language))
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        });

        if let Some(hook) = &self.hook {
            hook(count + 1);
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.answer(text, target_language)),

            MockBehavior::Merging => {
                let merged = self.answer(text, target_language);
                Ok(merged
                    .split('\n')
                    .filter(|line| !line.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" "))
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::Http {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(self.answer(text, target_language))
                }
            }

            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    Err(ProviderError::Transient(format!("Simulated failure #{}", count + 1)))
                } else {
                    Ok(self.answer(text, target_language))
                }
            }

            MockBehavior::Failing => Err(ProviderError::Transient("Simulated provider failure".to_string())),

            MockBehavior::Rejecting => Err(ProviderError::Rejected("Simulated rejection".to_string())),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.answer(text, target_language))
            }
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
