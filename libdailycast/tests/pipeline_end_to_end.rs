//! End-to-end pipeline runs against mock sources and destinations
//!
//! These tests verify:
//! - Partial failures across fetch and publish
//! - Deterministic outcome ordering regardless of completion order
//! - Fetch-only failures never reaching a destination
//! - Running from a real content folder

use anyhow::Result;
use libdailycast::destinations::mock::MockDestination;
use libdailycast::pipeline::Pipeline;
use libdailycast::report::{FetchOutcome, OverallStatus};
use libdailycast::source::{DirectorySource, MockSource};
use libdailycast::types::{DestinationKey, PostStatus};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use DestinationKey::{Facebook, LinkedIn, Twitter};

#[tokio::test]
async fn test_partial_failure_across_fetch_and_publish() {
    // LinkedIn has no content; Twitter rejects the post
    let source = MockSource::new()
        .with_content(Facebook, "Good evening!")
        .with_content(Twitter, "Good evening!");
    let facebook = MockDestination::success(Facebook);
    let twitter = MockDestination::post_failure(Twitter, "Duplicate status");
    let linkedin = MockDestination::success(LinkedIn);
    let linkedin_handle = linkedin.clone();

    let pipeline = Pipeline::new(Box::new(source))
        .with_destination(Box::new(facebook))
        .with_destination(Box::new(twitter))
        .with_destination(Box::new(linkedin));

    let report = pipeline.run(&[Facebook, Twitter, LinkedIn]).await;

    assert_eq!(report.overall_status, OverallStatus::PartialFailure);
    assert_eq!(report.post_outcomes.len(), 2);

    assert_eq!(report.post_outcomes[0].destination_key, Facebook);
    assert_eq!(report.post_outcomes[0].status, PostStatus::Success);
    assert!(report.post_outcomes[0].external_id.is_some());

    assert_eq!(report.post_outcomes[1].destination_key, Twitter);
    assert_eq!(report.post_outcomes[1].status, PostStatus::Failure);
    assert!(report.post_outcomes[1].detail.contains("Duplicate status"));

    assert!(report.outcome_for(LinkedIn).is_none());
    assert_eq!(report.fetch_failures.len(), 1);
    assert_eq!(report.fetch_failures[0].destination_key, LinkedIn);
    assert_eq!(linkedin_handle.deliver_call_count(), 0);
}

#[tokio::test]
async fn test_outcome_order_follows_request_order_not_completion_order() {
    let completions = Arc::new(Mutex::new(Vec::new()));
    let source = MockSource::new()
        .with_content(Facebook, "hi")
        .with_content(Twitter, "hi")
        .with_content(LinkedIn, "hi");

    // Facebook is slowest, so it finishes last
    let pipeline = Pipeline::new(Box::new(source))
        .with_destination(Box::new(
            MockDestination::with_delay(Facebook, Duration::from_millis(120))
                .sharing_completion_log(completions.clone()),
        ))
        .with_destination(Box::new(
            MockDestination::with_delay(Twitter, Duration::from_millis(60))
                .sharing_completion_log(completions.clone()),
        ))
        .with_destination(Box::new(
            MockDestination::with_delay(LinkedIn, Duration::from_millis(10))
                .sharing_completion_log(completions.clone()),
        ));

    let report = pipeline.run(&[Facebook, Twitter, LinkedIn]).await;

    let order: Vec<_> = report.post_outcomes.iter().map(|o| o.destination_key).collect();
    assert_eq!(order, vec![Facebook, Twitter, LinkedIn]);
    assert_eq!(*completions.lock().unwrap(), vec![LinkedIn, Twitter, Facebook]);
    assert_eq!(report.overall_status, OverallStatus::Success);
}

#[tokio::test]
async fn test_publishes_run_concurrently() {
    let source = MockSource::new()
        .with_content(Facebook, "hi")
        .with_content(Twitter, "hi")
        .with_content(LinkedIn, "hi");
    let pipeline = Pipeline::new(Box::new(source))
        .with_destination(Box::new(MockDestination::with_delay(Facebook, Duration::from_millis(200))))
        .with_destination(Box::new(MockDestination::with_delay(Twitter, Duration::from_millis(200))))
        .with_destination(Box::new(MockDestination::with_delay(LinkedIn, Duration::from_millis(200))));

    let start = std::time::Instant::now();
    let report = pipeline.run(&[Facebook, Twitter, LinkedIn]).await;

    assert!(report.is_success());
    assert!(
        start.elapsed() < Duration::from_millis(550),
        "publishes should overlap, took {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_all_fetches_failing_never_reaches_destinations() {
    let source = MockSource::new()
        .with_transport_error(Facebook, "disk unplugged")
        .with_transport_error(Twitter, "disk unplugged");
    let facebook = MockDestination::success(Facebook);
    let twitter = MockDestination::success(Twitter);
    let facebook_handle = facebook.clone();
    let twitter_handle = twitter.clone();

    let pipeline = Pipeline::new(Box::new(source))
        .with_destination(Box::new(facebook))
        .with_destination(Box::new(twitter));

    let report = pipeline.run(&[Facebook, Twitter]).await;

    assert_eq!(report.overall_status, OverallStatus::TotalFailure);
    assert!(report.post_outcomes.is_empty());
    assert!(matches!(report.fetch_outcome, FetchOutcome::Failure { .. }));
    assert_eq!(report.fetch_failures.len(), 2);
    assert_eq!(facebook_handle.deliver_call_count(), 0);
    assert_eq!(twitter_handle.deliver_call_count(), 0);
}

#[tokio::test]
async fn test_one_failing_destination_does_not_affect_another() {
    let source = MockSource::new()
        .with_content(Facebook, "hello")
        .with_content(Twitter, "hello");
    let pipeline = Pipeline::new(Box::new(source))
        .with_destination(Box::new(MockDestination::success(Facebook)))
        .with_destination(Box::new(MockDestination::post_failure(Twitter, "boom")));

    let report = pipeline.run(&[Facebook, Twitter]).await;

    assert_eq!(report.overall_status, OverallStatus::PartialFailure);
    assert!(report.outcome_for(Facebook).unwrap().is_success());
    assert!(!report.outcome_for(Twitter).unwrap().is_success());
}

#[tokio::test]
async fn test_every_post_failing_is_total_failure() {
    let source = MockSource::new()
        .with_content(Facebook, "hello")
        .with_content(Twitter, "hello");
    let pipeline = Pipeline::new(Box::new(source))
        .with_destination(Box::new(MockDestination::post_failure(Facebook, "down")))
        .with_destination(Box::new(MockDestination::post_failure(Twitter, "down")));

    let report = pipeline.run(&[Facebook, Twitter]).await;

    assert_eq!(report.overall_status, OverallStatus::TotalFailure);
    assert_eq!(report.post_outcomes.len(), 2);
    assert!(matches!(report.fetch_outcome, FetchOutcome::Success { .. }));
}

#[tokio::test]
async fn test_over_limit_content_is_rejected_without_delivery() {
    let source = MockSource::new().with_content(Facebook, &"x".repeat(50));
    let facebook = MockDestination::with_limit(Facebook, 10);
    let handle = facebook.clone();
    let pipeline = Pipeline::new(Box::new(source)).with_destination(Box::new(facebook));

    let report = pipeline.run(&[Facebook]).await;

    let outcome = report.outcome_for(Facebook).unwrap();
    assert!(!outcome.is_success());
    assert!(outcome.detail.contains("character limit"));
    assert_eq!(handle.deliver_call_count(), 0);
}

#[tokio::test]
async fn test_truncating_destination_delivers_shortened_body() {
    let source = MockSource::new().with_content(Twitter, &"word ".repeat(100));
    let twitter = MockDestination::truncating(Twitter, 40, "...");
    let handle = twitter.clone();
    let pipeline = Pipeline::new(Box::new(source)).with_destination(Box::new(twitter));

    let report = pipeline.run(&[Twitter]).await;

    assert!(report.is_success());
    let bodies = handle.published_bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].chars().count() <= 40);
    assert!(bodies[0].ends_with("..."));
}

#[tokio::test]
async fn test_run_from_content_folder() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("facebook_content.txt"), "Facebook post\n")?;
    std::fs::write(dir.path().join("twitter_content.txt"), "Tweet\n")?;

    let mut mapping = BTreeMap::new();
    mapping.insert(Facebook, "facebook_content.txt".to_string());
    mapping.insert(Twitter, "twitter_content.txt".to_string());
    mapping.insert(LinkedIn, "linkedin_content.txt".to_string());

    let facebook = MockDestination::success(Facebook);
    let twitter = MockDestination::success(Twitter);
    let facebook_handle = facebook.clone();
    let twitter_handle = twitter.clone();

    let pipeline = Pipeline::new(Box::new(DirectorySource::new(dir.path(), mapping)))
        .with_destination(Box::new(facebook))
        .with_destination(Box::new(twitter))
        .with_destination(Box::new(MockDestination::success(LinkedIn)));

    let report = pipeline.run(&[Facebook, Twitter, LinkedIn]).await;

    assert_eq!(report.overall_status, OverallStatus::PartialFailure);
    assert_eq!(facebook_handle.published_bodies(), vec!["Facebook post".to_string()]);
    assert_eq!(twitter_handle.published_bodies(), vec!["Tweet".to_string()]);
    assert_eq!(report.fetch_failures[0].destination_key, LinkedIn);
    assert!(report.fetch_failures[0].reason.contains("does not exist"));

    Ok(())
}

#[tokio::test]
async fn test_report_serializes_to_json_record() -> Result<()> {
    let source = MockSource::new().with_content(Facebook, "hello");
    let pipeline =
        Pipeline::new(Box::new(source)).with_destination(Box::new(MockDestination::success(Facebook)));

    let report = pipeline.run(&[Facebook, Twitter]).await;
    let json = serde_json::to_value(&report)?;

    assert_eq!(json["overall_status"], "partial_failure");
    assert_eq!(json["fetch_outcome"]["status"], "success");
    assert_eq!(json["post_outcomes"][0]["destination_key"], "facebook");
    assert_eq!(json["post_outcomes"][0]["status"], "success");
    assert_eq!(json["fetch_failures"][0]["destination_key"], "twitter");
    assert!(json["run_id"].is_string());

    Ok(())
}
