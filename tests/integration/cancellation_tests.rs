/*!
 * Integration tests for cooperative cancellation
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use polysub::job::{CancellationToken, Job, JobState, LanguageResult};
use polysub::providers::mock::MockProvider;
use crate::common;

/// Test that a cancel during a provider call ends the job without more calls
#[tokio::test]
async fn test_cancel_duringProviderCall_shouldStopWithoutFurtherCalls() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let movie = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let token = CancellationToken::new();
    let hook_token = token.clone();
    let provider = MockProvider::slow(5_000).with_hook(move |_| hook_token.cancel());
    let orchestrator =
        common::orchestrator(&provider, common::fast_orchestrator_settings(None)).with_cancellation(token);
    let mut job = Job::new(vec![movie], common::strings(&["fr", "de"]));

    let outcome = tokio::time::timeout(Duration::from_secs(2), orchestrator.run(&mut job)).await?;

    assert_eq!(outcome.state, JobState::Cancelled);
    assert_eq!(job.state, JobState::Cancelled);
    assert_eq!(provider.call_count(), 1);
    assert!(!temp_dir.path().join("movie").join("movie_French.srt").exists());
    Ok(())
}

/// Test that languages finished before the cancel keep their outputs
#[tokio::test]
async fn test_cancel_duringSecondLanguage_shouldKeepFirstOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let movie = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    // French needs two batches; the third call is the first German one
    let token = CancellationToken::new();
    let hook_token = token.clone();
    let provider = MockProvider::working().with_hook(move |call| {
        if call == 3 {
            hook_token.cancel();
        }
    });
    let orchestrator =
        common::orchestrator(&provider, common::fast_orchestrator_settings(None)).with_cancellation(token);
    let mut job = Job::new(vec![movie], common::strings(&["fr", "de"]));

    let outcome = orchestrator.run(&mut job).await;

    assert_eq!(outcome.state, JobState::Cancelled);
    assert_eq!(provider.call_count(), 3);
    assert!(temp_dir.path().join("movie").join("movie_French.srt").exists());
    assert!(!temp_dir.path().join("movie").join("movie_German.srt").exists());

    let report = &outcome.files[0];
    assert_eq!(report.languages.len(), 1);
    assert!(matches!(report.languages[0].1, LanguageResult::Completed { .. }));
    Ok(())
}

/// Test cancelling a job that runs on another task
#[tokio::test]
async fn test_cancel_fromOtherTask_shouldEndRunPromptly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let movie = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let provider = MockProvider::slow(10_000);
    let orchestrator = Arc::new(common::orchestrator(&provider, common::fast_orchestrator_settings(None)));
    let runner = orchestrator.clone();
    let task = tokio::spawn(async move {
        let mut job = Job::new(vec![movie], common::strings(&["fr"]));
        runner.run(&mut job).await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    orchestrator.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(2), task).await??;
    assert_eq!(outcome.state, JobState::Cancelled);
    Ok(())
}

/// Test that a cancel during retry backoff ends the wait early
#[tokio::test]
async fn test_cancel_duringBackoff_shouldNotWaitForDelay() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let movie = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let token = CancellationToken::new();
    let hook_token = token.clone();
    let provider = MockProvider::failing().with_hook(move |_| hook_token.cancel());
    let mut settings = common::fast_orchestrator_settings(None);
    settings.batch.retry = polysub::translation::RetryPolicy::new(
        3,
        Duration::from_secs(30),
        Duration::from_secs(60),
    );
    let orchestrator = common::orchestrator(&provider, settings).with_cancellation(token);
    let mut job = Job::new(vec![movie], common::strings(&["fr"]));

    let outcome = tokio::time::timeout(Duration::from_secs(2), orchestrator.run(&mut job)).await?;

    assert_eq!(outcome.state, JobState::Cancelled);
    assert_eq!(provider.call_count(), 1);
    Ok(())
}
