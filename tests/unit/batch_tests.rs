/*!
 * Tests for the cache-aware batch translator
 */

use anyhow::Result;
use std::sync::Arc;

use polysub::errors::TranslationError;
use polysub::providers::mock::MockProvider;
use polysub::translation::{BatchSettings, BatchTranslator, CacheStore};
use crate::common;

/// Test the worked example: one blank and two misses in a single call
#[tokio::test]
async fn test_translate_batch_withBlankBetweenTexts_shouldMakeOneCallAndKeepBlank() -> Result<()> {
    let provider = MockProvider::working().with_response("fr", "Hello\n\n\nWorld", "Bonjour\n\n\nMonde");
    let mut translator = common::french_translator(&provider);

    let outcome = translator
        .translate_batch(&common::strings(&["Hello", "", "World"]))
        .await?;

    assert_eq!(outcome.texts, vec!["Bonjour", "", "Monde"]);
    assert_eq!(outcome.stats.provider_calls, 1);
    assert_eq!(outcome.stats.new_entries, 2);
    assert_eq!(outcome.stats.cache_hits, 0);
    assert_eq!(outcome.stats.blanks, 1);
    Ok(())
}

/// Test that a second run of the same batch never reaches the provider
#[tokio::test]
async fn test_translate_batch_calledTwice_shouldAnswerFromCache() -> Result<()> {
    let provider = MockProvider::working().with_response("fr", "Hello\n\n\nWorld", "Bonjour\n\n\nMonde");
    let mut translator = common::french_translator(&provider);
    let texts = common::strings(&["Hello", "", "World"]);

    let first = translator.translate_batch(&texts).await?;
    let second = translator.translate_batch(&texts).await?;

    assert_eq!(first.texts, second.texts);
    assert_eq!(second.stats.cache_hits, 2);
    assert_eq!(second.stats.provider_calls, 0);
    assert_eq!(second.stats.new_entries, 0);
    assert_eq!(provider.call_count(), 1);
    Ok(())
}

/// Test that output length and order match the input, blanks included
#[tokio::test]
async fn test_translate_batch_withMixedInput_shouldPreserveLengthAndOrder() -> Result<()> {
    let provider = MockProvider::working();
    let mut translator = common::french_translator(&provider);
    let texts = common::strings(&["  ", "one", "", "two", "three", "\n"]);

    let outcome = translator.translate_batch(&texts).await?;

    assert_eq!(outcome.texts.len(), texts.len());
    assert_eq!(outcome.texts[0], "  ");
    assert_eq!(outcome.texts[1], "[fr] one");
    assert_eq!(outcome.texts[2], "");
    assert_eq!(outcome.texts[3], "[fr] two");
    assert_eq!(outcome.texts[4], "[fr] three");
    assert_eq!(outcome.texts[5], "\n");
    assert_eq!(outcome.stats.blanks, 3);
    Ok(())
}

/// Test the fallback when a joined answer cannot be split back
#[tokio::test]
async fn test_translate_batch_withMergedResponse_shouldFallBackToSingleCalls() -> Result<()> {
    let provider = MockProvider::merging();
    let mut translator = common::french_translator(&provider);

    let outcome = translator.translate_batch(&common::strings(&["Hello", "World"])).await?;

    assert_eq!(outcome.texts, vec!["[fr] Hello", "[fr] World"]);
    assert_eq!(outcome.stats.mismatches, 1);
    assert_eq!(outcome.stats.provider_calls, 3);
    assert_eq!(provider.call_count(), 3);

    let calls = provider.calls();
    assert_eq!(calls[1].text, "Hello");
    assert_eq!(calls[2].text, "World");
    Ok(())
}

/// Test that transient failures are retried without losing progress
#[tokio::test]
async fn test_translate_batch_withTransientFailures_shouldRetryAndSucceed() -> Result<()> {
    let provider = MockProvider::fail_first(2);
    let mut translator = common::french_translator(&provider);

    let outcome = translator.translate_batch(&common::strings(&["Hello", "World"])).await?;

    assert_eq!(outcome.texts, vec!["[fr] Hello", "[fr] World"]);
    assert_eq!(outcome.stats.degraded, 0);
    assert_eq!(provider.call_count(), 3);
    Ok(())
}

/// Test that exhausted retries keep the source text when degrading is on
#[tokio::test]
async fn test_translate_batch_withFailingProvider_shouldDegradeToSourceText() -> Result<()> {
    let provider = MockProvider::failing();
    let mut translator = common::french_translator(&provider);

    let outcome = translator
        .translate_batch(&common::strings(&["Hello", "", "World"]))
        .await?;

    assert_eq!(outcome.texts, vec!["Hello", "", "World"]);
    assert_eq!(outcome.stats.degraded, 2);
    assert_eq!(provider.call_count(), 3);

    // Degraded texts are never cached
    assert!(translator.cache_mut().is_empty());
    Ok(())
}

/// Test that exhausted retries fail the batch when degrading is off
#[tokio::test]
async fn test_translate_batch_withFailingProviderAndNoDegrade_shouldReturnExhausted() {
    let provider = MockProvider::failing();
    let settings = BatchSettings {
        degrade_on_failure: false,
        ..common::fast_batch_settings()
    };
    let mut translator = BatchTranslator::new(
        Arc::new(provider.clone()),
        CacheStore::in_memory("fr"),
        "fr",
        settings,
    );

    let result = translator.translate_batch(&common::strings(&["Hello"])).await;

    assert!(matches!(
        result,
        Err(TranslationError::ProviderExhausted { attempts: 3, .. })
    ));
}

/// Test that speaker labels are stripped before hashing and translation
#[tokio::test]
async fn test_translate_batch_withSpeakerLabels_shouldShareCacheEntry() -> Result<()> {
    let provider = MockProvider::working();
    let mut translator = common::french_translator(&provider);

    let outcome = translator
        .translate_batch(&common::strings(&["JOHN: Hello", "MARY: Hello"]))
        .await?;

    assert_eq!(outcome.texts, vec!["[fr] Hello", "[fr] Hello"]);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(provider.calls()[0].text, "Hello");
    Ok(())
}

/// Test that every request carries the configured languages
#[tokio::test]
async fn test_translate_batch_shouldSendSourceAndTargetLanguage() -> Result<()> {
    let provider = MockProvider::working();
    let settings = BatchSettings {
        source_language: "en".to_string(),
        ..common::fast_batch_settings()
    };
    let mut translator = BatchTranslator::new(
        Arc::new(provider.clone()),
        CacheStore::in_memory("de"),
        "de",
        settings,
    );

    translator.translate_batch(&common::strings(&["Hello"])).await?;

    let call = &provider.calls()[0];
    assert_eq!(call.source_language, "en");
    assert_eq!(call.target_language, "de");
    Ok(())
}

/// Test single-text translation from synchronous code
#[test]
fn test_translate_one_withRepeatedText_shouldCallProviderOnce() {
    let provider = MockProvider::working();
    let mut translator = common::french_translator(&provider);

    let first = tokio_test::block_on(translator.translate_one("Good night"));
    let second = tokio_test::block_on(translator.translate_one("Good night"));

    tokio_test::assert_ok!(&first);
    assert_eq!(first.ok(), second.ok());
    assert_eq!(provider.call_count(), 1);
}
