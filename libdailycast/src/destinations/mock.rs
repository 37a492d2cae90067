//! Mock destination implementation for testing
//!
//! This module provides a configurable mock destination that can simulate
//! successes, failures, delays and platform limits. It's designed for use in
//! integration tests to verify pipeline behavior without real credentials or
//! network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::destinations::format::truncate_with_marker;
use crate::destinations::{Destination, PublishResult};
use crate::error::PublishError;
use crate::types::DestinationKey;

/// Configuration for mock destination behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub key: DestinationKey,

    /// Error returned by every delivery; `None` means deliveries succeed
    pub post_error: Option<PublishError>,

    /// Delay before completing a delivery (simulates network latency)
    pub delay: Duration,

    /// Character limit for validation
    pub character_limit: Option<usize>,

    /// When set, bodies are truncated to the limit with this marker
    pub truncate_marker: Option<String>,

    /// Number of times deliver has been called
    pub deliver_call_count: Arc<Mutex<usize>>,

    /// Bodies that have been delivered (for verification)
    pub published: Arc<Mutex<Vec<String>>>,

    /// Order in which deliveries completed, shared across mocks
    pub completion_log: Arc<Mutex<Vec<DestinationKey>>>,
}

impl MockConfig {
    pub fn new(key: DestinationKey) -> Self {
        Self {
            key,
            post_error: None,
            delay: Duration::from_millis(0),
            character_limit: None,
            truncate_marker: None,
            deliver_call_count: Arc::new(Mutex::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
            completion_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock destination for testing
///
/// Clones share counters, so a test can keep one handle and move the other
/// into a pipeline.
#[derive(Debug, Clone)]
pub struct MockDestination {
    config: MockConfig,
}

impl MockDestination {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock destination that always succeeds
    pub fn success(key: DestinationKey) -> Self {
        Self::new(MockConfig::new(key))
    }

    /// Create a mock destination whose deliveries fail with a posting error
    pub fn post_failure(key: DestinationKey, error: &str) -> Self {
        Self::failing_with(key, PublishError::Posting(error.to_string()))
    }

    /// Create a mock destination whose deliveries fail with `error`
    pub fn failing_with(key: DestinationKey, error: PublishError) -> Self {
        Self::new(MockConfig {
            post_error: Some(error),
            ..MockConfig::new(key)
        })
    }

    /// Create a mock destination with a delay
    pub fn with_delay(key: DestinationKey, delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..MockConfig::new(key)
        })
    }

    /// Create a mock destination that rejects bodies over `limit`
    pub fn with_limit(key: DestinationKey, limit: usize) -> Self {
        Self::new(MockConfig {
            character_limit: Some(limit),
            ..MockConfig::new(key)
        })
    }

    /// Create a mock destination that truncates bodies over `limit`
    pub fn truncating(key: DestinationKey, limit: usize, marker: &str) -> Self {
        Self::new(MockConfig {
            character_limit: Some(limit),
            truncate_marker: Some(marker.to_string()),
            ..MockConfig::new(key)
        })
    }

    /// Record completions into a log shared with other mocks
    pub fn sharing_completion_log(mut self, log: Arc<Mutex<Vec<DestinationKey>>>) -> Self {
        self.config.completion_log = log;
        self
    }

    /// Get the number of times deliver was called
    pub fn deliver_call_count(&self) -> usize {
        self.config
            .deliver_call_count
            .lock()
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Get all bodies that were delivered
    pub fn published_bodies(&self) -> Vec<String> {
        self.config
            .published
            .lock()
            .map(|bodies| bodies.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Destination for MockDestination {
    fn key(&self) -> DestinationKey {
        self.config.key
    }

    fn character_limit(&self) -> Option<usize> {
        self.config.character_limit
    }

    fn prepare(&self, body: &str) -> String {
        match (&self.config.truncate_marker, self.config.character_limit) {
            (Some(marker), Some(limit)) => truncate_with_marker(body, limit, marker),
            _ => body.to_string(),
        }
    }

    async fn deliver(&self, body: &str) -> PublishResult<String> {
        if let Ok(mut count) = self.config.deliver_call_count.lock() {
            *count += 1;
        }

        // Simulate delay
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if let Ok(mut log) = self.config.completion_log.lock() {
            log.push(self.config.key);
        }

        if let Some(error) = &self.config.post_error {
            return Err(error.clone());
        }

        if let Ok(mut published) = self.config.published.lock() {
            published.push(body.to_string());
        }

        Ok(format!("{}:mock-{}", self.config.key, uuid::Uuid::new_v4()))
    }
}
