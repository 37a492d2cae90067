//! Run reports
//!
//! A [`RunReport`] is the single structured outcome of one pipeline run.
//! Its JSON form is the record format callers may log or persist.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{FetchError, Result};
use crate::types::{ContentItem, DestinationKey, PostOutcome};

/// Summary of a fetched item (bodies are not retained past the run)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedItem {
    pub destination_key: DestinationKey,
    pub source_ref: String,
    pub characters: usize,
}

impl From<&ContentItem> for FetchedItem {
    fn from(item: &ContentItem) -> Self {
        Self {
            destination_key: item.destination_key,
            source_ref: item.source_ref.clone(),
            characters: item.body.chars().count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// At least one key produced a usable item
    Success { items: Vec<FetchedItem> },
    /// No key produced a usable item
    Failure { reason: String },
}

/// A per-key fetch failure, recorded rather than propagated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub destination_key: DestinationKey,
    pub reason: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(error: &FetchError) -> Self {
        Self {
            destination_key: error.key(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    PartialFailure,
    TotalFailure,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::Success => write!(f, "success"),
            OverallStatus::PartialFailure => write!(f, "partial_failure"),
            OverallStatus::TotalFailure => write!(f, "total_failure"),
        }
    }
}

/// Aggregate fetch and post results into the overall status
///
/// - `Success`: every requested key fetched and every post succeeded
/// - `TotalFailure`: nothing usable was fetched, or every attempted post failed
/// - `PartialFailure`: anything in between
pub fn coordinate(
    fetch_outcome: &FetchOutcome,
    fetch_failures: &[FetchFailure],
    post_outcomes: &[PostOutcome],
) -> OverallStatus {
    let fetched_any = match fetch_outcome {
        FetchOutcome::Success { items } => !items.is_empty(),
        FetchOutcome::Failure { .. } => false,
    };

    if !fetched_any || post_outcomes.iter().all(|outcome| !outcome.is_success()) {
        return OverallStatus::TotalFailure;
    }

    if fetch_failures.is_empty() && post_outcomes.iter().all(PostOutcome::is_success) {
        OverallStatus::Success
    } else {
        OverallStatus::PartialFailure
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: DateTime<FixedOffset>,
    pub fetch_outcome: FetchOutcome,
    pub fetch_failures: Vec<FetchFailure>,
    /// One outcome per fetched key, in the requested destination order
    pub post_outcomes: Vec<PostOutcome>,
    pub overall_status: OverallStatus,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.overall_status == OverallStatus::Success
    }

    pub fn succeeded(&self) -> usize {
        self.post_outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.post_outcomes.len() - self.succeeded()
    }

    pub fn outcome_for(&self, key: DestinationKey) -> Option<&PostOutcome> {
        self.post_outcomes.iter().find(|o| o.destination_key == key)
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} posted, {} failed, {} not fetched",
            self.overall_status,
            self.succeeded(),
            self.failed(),
            self.fetch_failures.len()
        )
    }

    /// Append the report to `path` as a single JSON line
    ///
    /// The file is created if missing and never truncated.
    pub async fn append_json_line(&self, path: &Path) -> Result<()> {
        let mut line = serde_json::to_string(self).map_err(std::io::Error::from)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Emit the report through tracing at a level matching its status
    pub fn log(&self) {
        for failure in &self.fetch_failures {
            warn!(
                run_id = %self.run_id,
                destination = %failure.destination_key,
                reason = %failure.reason,
                "Content not fetched"
            );
        }

        for outcome in &self.post_outcomes {
            if outcome.is_success() {
                info!(
                    run_id = %self.run_id,
                    destination = %outcome.destination_key,
                    external_id = outcome.external_id.as_deref().unwrap_or(""),
                    "Post succeeded"
                );
            } else {
                warn!(
                    run_id = %self.run_id,
                    destination = %outcome.destination_key,
                    detail = %outcome.detail,
                    "Post failed"
                );
            }
        }

        let summary = self.summary();
        match self.overall_status {
            OverallStatus::Success => info!(run_id = %self.run_id, "{}", summary),
            OverallStatus::PartialFailure => warn!(run_id = %self.run_id, "{}", summary),
            OverallStatus::TotalFailure => error!(run_id = %self.run_id, "{}", summary),
        }
    }
}
