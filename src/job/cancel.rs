use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::errors::TranslationError;

/// Cooperative cancellation flag shared between a job and its controller
///
/// Cloning yields a handle to the same flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation has been requested
    pub fn check(&self) -> Result<(), TranslationError> {
        if self.is_cancelled() {
            Err(TranslationError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve when cancellation is requested
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel() is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
