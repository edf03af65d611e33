/*!
 * Tests for error types and their classification
 */

use std::path::PathBuf;

use polysub::errors::{AppError, DocumentError, ProviderError, TranslationError};

/// Test which provider errors are worth retrying
#[test]
fn test_is_transient_withEachVariant_shouldClassifyCorrectly() {
    assert!(ProviderError::Transient("timeout".to_string()).is_transient());
    assert!(ProviderError::RateLimited("slow down".to_string()).is_transient());
    assert!(ProviderError::Parse("bad json".to_string()).is_transient());
    assert!(ProviderError::Http { status_code: 503, message: String::new() }.is_transient());
    assert!(ProviderError::Http { status_code: 429, message: String::new() }.is_transient());

    assert!(!ProviderError::Http { status_code: 400, message: String::new() }.is_transient());
    assert!(!ProviderError::Rejected("bad language".to_string()).is_transient());
}

/// Test error messages
#[test]
fn test_display_withProviderErrors_shouldDescribeCause() {
    let http = ProviderError::Http {
        status_code: 500,
        message: "boom".to_string(),
    };
    assert_eq!(http.to_string(), "Provider responded with status 500: boom");

    let exhausted = TranslationError::ProviderExhausted {
        attempts: 3,
        last_error: ProviderError::Transient("timeout".to_string()),
    };
    assert!(exhausted.to_string().contains("after 3 attempts"));
    assert_eq!(TranslationError::Cancelled.to_string(), "Translation cancelled");
}

/// Test conversions into the application error
#[test]
fn test_app_error_from_shouldWrapSourceErrors() {
    let error: AppError = DocumentError::UnsupportedFormat(PathBuf::from("video.mkv")).into();
    assert!(matches!(error, AppError::Document(_)));
    assert!(error.to_string().contains("video.mkv"));

    let error: AppError = TranslationError::Cancelled.into();
    assert!(matches!(error, AppError::Translation(TranslationError::Cancelled)));

    let error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, AppError::File(_)));

    let error: AppError = anyhow::anyhow!("something odd").into();
    assert_eq!(error.to_string(), "Unknown error: something odd");
}
