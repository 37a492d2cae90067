//! Content distribution pipeline
//!
//! One run fetches content for each requested destination, fans it out to
//! the matching destinations and aggregates everything into a
//! [`RunReport`]. Fetch and publish failures are captured into the report;
//! nothing inside a run is retried and nothing propagates as an error.

use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::destinations::{create_destinations, Destination};
use crate::error::{FetchError, Result};
use crate::report::{coordinate, FetchFailure, FetchOutcome, FetchedItem, RunReport};
use crate::source::{ContentSource, DirectorySource};
use crate::types::{ContentItem, DestinationKey, PostOutcome};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

pub struct Pipeline {
    source: Box<dyn ContentSource>,
    destinations: BTreeMap<DestinationKey, Box<dyn Destination>>,
    max_concurrency: usize,
    timezone: Tz,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(source: Box<dyn ContentSource>) -> Self {
        Self {
            source,
            destinations: BTreeMap::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timezone: Tz::UTC,
            clock: Arc::new(SystemClock),
        }
    }

    /// Build the pipeline described by a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the content folder cannot be resolved or a
    /// destination's credentials are missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let schedule = config.schedule.to_schedule()?;
        let mut pipeline = Self::new(Box::new(DirectorySource::from_config(config)?))
            .with_max_concurrency(config.pipeline.max_concurrency)
            .with_timezone(schedule.timezone());

        for destination in create_destinations(config)? {
            pipeline = pipeline.with_destination(destination);
        }

        Ok(pipeline)
    }

    /// Register a destination under its own key, replacing any previous one
    pub fn with_destination(mut self, destination: Box<dyn Destination>) -> Self {
        self.destinations.insert(destination.key(), destination);
        self
    }

    /// Bound the number of concurrent fetches and publishes
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Timezone used for report timestamps
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Execute one run over `keys`
    ///
    /// The order of `keys` is the order of `post_outcomes` in the report,
    /// regardless of which publish finishes first. Repeated keys are
    /// ignored after their first occurrence.
    pub async fn run(&self, keys: &[DestinationKey]) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = self.timestamp();
        let keys = dedup_preserving_order(keys);

        info!(run_id = %run_id, destinations = ?keys, "Pipeline run starting");

        let (items, fetch_errors) = self.fetch_all(&keys).await;
        let fetch_failures: Vec<FetchFailure> = fetch_errors.iter().map(FetchFailure::from).collect();

        let (fetch_outcome, post_outcomes) = if items.is_empty() {
            let reason = if keys.is_empty() {
                "No destinations requested".to_string()
            } else {
                format!("All {} content fetches failed", keys.len())
            };
            (FetchOutcome::Failure { reason }, Vec::new())
        } else {
            let outcome = FetchOutcome::Success {
                items: items.iter().map(FetchedItem::from).collect(),
            };
            (outcome, self.distribute(&items).await)
        };

        let overall_status = coordinate(&fetch_outcome, &fetch_failures, &post_outcomes);

        let report = RunReport {
            run_id,
            started_at,
            finished_at: self.timestamp(),
            fetch_outcome,
            fetch_failures,
            post_outcomes,
            overall_status,
        };

        info!(run_id = %run_id, status = %report.overall_status, "Pipeline run finished");
        report
    }

    /// Fetch every key, keeping successful items in key order
    async fn fetch_all(&self, keys: &[DestinationKey]) -> (Vec<ContentItem>, Vec<FetchError>) {
        let fetches: Vec<_> = keys.iter().map(|key| self.fetch_one(*key)).collect();
        let results: Vec<_> = stream::iter(fetches)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut items = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(item) => items.push(item),
                Err(e) => errors.push(e),
            }
        }
        (items, errors)
    }

    async fn fetch_one(&self, key: DestinationKey) -> std::result::Result<ContentItem, FetchError> {
        debug!(destination = %key, source = self.source.name(), "Fetching content");
        self.source.fetch(key).await
    }

    /// Publish each item to its destination; outcomes keep the item order
    async fn distribute(&self, items: &[ContentItem]) -> Vec<PostOutcome> {
        // Futures are built up front so the stream owns them
        let publishes: Vec<_> = items.iter().map(|item| self.publish_item(item)).collect();
        stream::iter(publishes)
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    async fn publish_item(&self, item: &ContentItem) -> PostOutcome {
        match self.destinations.get(&item.destination_key) {
            Some(destination) => {
                debug!(destination = destination.name(), "Publishing");
                destination.publish(item).await
            }
            None => PostOutcome::failure(
                item.destination_key,
                format!("No destination registered for {}", item.destination_key),
            ),
        }
    }

    fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.clock.now().with_timezone(&self.timezone).fixed_offset()
    }
}

fn dedup_preserving_order(keys: &[DestinationKey]) -> Vec<DestinationKey> {
    let mut unique = Vec::with_capacity(keys.len());
    for key in keys {
        if !unique.contains(key) {
            unique.push(*key);
        }
    }
    unique
}
