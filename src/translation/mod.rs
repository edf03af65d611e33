/*!
 * Translation engine.
 *
 * This module turns ordered texts into ordered translations while keeping
 * provider traffic low. It is split into several submodules:
 *
 * - `batch`: cache-aware batching, mismatch recovery and degraded fallback
 * - `cache`: persistent per-language cache stores
 * - `retry`: exponential backoff shared by every provider-calling path
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOutcome, BatchSettings, BatchStats, BatchTranslator};
pub use self::cache::{content_hash, CacheStats, CacheStore};
pub use self::retry::RetryPolicy;

// Submodules
pub mod batch;
pub mod cache;
pub mod retry;
