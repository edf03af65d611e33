/*!
 * Error types for the polysub application.
 *
 * Errors are handled at the narrowest scope that can absorb them:
 * provider errors inside a batch, translation errors per language,
 * document errors per file, and `AppError` for the job as a whole.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Temporary failure (timeout, connection reset, 5xx)
    #[error("Transient provider failure: {0}")]
    Transient(String),

    /// The provider asked us to slow down
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Unexpected HTTP status from the provider
    #[error("Provider responded with status {status_code}: {message}")]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Body or reason phrase
        message: String,
    },

    /// The response body could not be understood
    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    /// The provider refused the request outright (bad language, bad key)
    #[error("Request rejected by provider: {0}")]
    Rejected(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) | Self::RateLimited(_) | Self::Parse(_) => true,
            Self::Http { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::Rejected(_) => false,
        }
    }
}

/// Errors raised while reading or detecting a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// No adapter handles this file
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The file is malformed
    #[error("Failed to parse {path} at line {line}: {message}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number where parsing stopped
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The file could not be read
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Errors from loading or persisting a cache store
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed
    #[error("Cache I/O error for '{language}': {source}")]
    Io {
        /// Cache namespace
        language: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The cache could not be encoded
    #[error("Cache serialization error for '{language}': {source}")]
    Serialize {
        /// Cache namespace
        language: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that end the translation of a batch
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Cancellation was requested; not a failure
    #[error("Translation cancelled")]
    Cancelled,

    /// Every retry failed and degraded output is disabled
    #[error("Provider failed after {attempts} attempts: {last_error}")]
    ProviderExhausted {
        /// Attempts made
        attempts: u32,
        /// Last error seen
        last_error: ProviderError,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from document handling
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
