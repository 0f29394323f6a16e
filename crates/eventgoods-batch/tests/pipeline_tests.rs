//! End-to-end tests for the batch pipeline: audit brackets, dry runs, and
//! the two-tier failure model.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::TimeZone;
use eventgoods_batch::{
    BatchRunner, FnStep, Period, RetryError, RetryPolicy, RunInstant, StepError, StepProvider,
    default_offset,
};

fn fixed_instant() -> RunInstant {
    RunInstant::new(
        default_offset()
            .with_ymd_and_hms(2026, 8, 28, 9, 30, 0)
            .unwrap(),
    )
}

fn counting_step(name: &str, counter: Arc<AtomicUsize>) -> Box<dyn StepProvider> {
    Box::new(FnStep::new(name, move |_| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }))
}

fn failing_step(name: &str, detail: &str) -> Box<dyn StepProvider> {
    let detail = detail.to_string();
    Box::new(FnStep::new(name, move |_| {
        let detail = detail.clone();
        Box::pin(async move { Err(StepError::new(detail)) })
    }))
}

fn audit_content(log_root: &std::path::Path) -> String {
    let run = fixed_instant();
    fs::read_to_string(log_root.join(run.log_bucket()).join(run.log_filename())).unwrap()
}

#[tokio::test]
async fn dry_run_writes_markers_and_skips_scrape_steps() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let log_root = dir.path().join("log");

    let scraped = Arc::new(AtomicUsize::new(0));
    let cleaned = Arc::new(AtomicUsize::new(0));

    let mut runner = BatchRunner::new(&data_dir, &log_root);
    runner.register_scrape_step(counting_step("seven_eleven", scraped.clone()));
    runner.register_scrape_step(counting_step("cu", scraped.clone()));
    runner.register_post_step(counting_step("clean_and_merge", cleaned.clone()));

    let run = fixed_instant();
    let outcomes = runner
        .run(Period::new(2026, 9).unwrap(), true, run)
        .await
        .unwrap();

    // Scrape steps untouched, post-processing still validated.
    assert_eq!(scraped.load(Ordering::SeqCst), 0);
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].step, "clean_and_merge");

    let content = audit_content(&log_root);
    assert!(content.contains("=== BATCH START ==="));
    assert!(content.contains("Target: 2026-9 | Execute At: 2026-08-28 09:30:00"));
    assert!(content.contains("Dry run enabled"));
    assert!(content.contains("=== BATCH COMPLETE ==="));

    // The working directory was prepared even though nothing scraped.
    assert!(data_dir.is_dir());
}

#[tokio::test]
async fn partial_step_failure_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let log_root = dir.path().join("log");

    let survivors = Arc::new(AtomicUsize::new(0));

    let mut runner = BatchRunner::new(dir.path().join("data"), &log_root);
    runner.register_scrape_step(failing_step("gs25", "http 503"));
    runner.register_scrape_step(counting_step("emart24", survivors.clone()));
    runner.register_post_step(counting_step("clean_and_merge", survivors.clone()));

    let outcomes = runner
        .run(Period::new(2026, 9).unwrap(), false, fixed_instant())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(!outcomes[0].is_success());
    assert!(outcomes[1].is_success());
    assert!(outcomes[2].is_success());
    assert_eq!(survivors.load(Ordering::SeqCst), 2);

    let content = audit_content(&log_root);
    assert!(content.contains("gs25 failed: http 503"));
    assert!(content.contains("Finished: emart24"));
    assert!(content.contains("=== BATCH COMPLETE ==="));
}

#[tokio::test(start_paused = true)]
async fn retry_policy_retries_pipeline_faults_only() {
    let dir = tempfile::tempdir().unwrap();

    // A runner whose data dir collides with an existing file: environment
    // preparation fails, which is a pipeline fault and must be retried.
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, b"occupied").unwrap();
    let runner = BatchRunner::new(&blocked, dir.path().join("log"));

    let policy = RetryPolicy::new(2, Duration::from_secs(5));
    let result = policy
        .run(|| runner.run(Period::new(2026, 9).unwrap(), false, fixed_instant()))
        .await;

    match result {
        Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
        Ok(_) => panic!("expected exhaustion"),
    }
}

#[tokio::test]
async fn step_failures_never_reach_the_retry_policy() {
    let dir = tempfile::tempdir().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let mut runner = BatchRunner::new(dir.path().join("data"), dir.path().join("log"));
    runner.register_scrape_step(Box::new(FnStep::new("flaky", move |_| {
        let counted = counted.clone();
        Box::pin(async move {
            counted.fetch_add(1, Ordering::SeqCst);
            Err(StepError::new("always fails"))
        })
    })));

    let policy = RetryPolicy::default();
    let outcomes = policy
        .run(|| runner.run(Period::new(2026, 9).unwrap(), false, fixed_instant()))
        .await
        .unwrap();

    // The absorbed step failure completes the pipeline on the first attempt.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].is_success());
}
