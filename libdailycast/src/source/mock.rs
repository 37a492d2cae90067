//! In-memory content source for testing
//!
//! Bodies and failures are configured per key. Clones share their call
//! counters, so a test can hand one clone to the pipeline and inspect the
//! other afterwards.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::FetchError;
use crate::source::ContentSource;
use crate::types::{ContentItem, DestinationKey};

#[derive(Debug, Clone, Default)]
pub struct MockSource {
    bodies: BTreeMap<DestinationKey, String>,
    failures: BTreeMap<DestinationKey, FetchError>,
    delay: Duration,
    fetch_calls: Arc<Mutex<Vec<DestinationKey>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `key`
    pub fn with_content(mut self, key: DestinationKey, body: &str) -> Self {
        self.bodies.insert(key, body.to_string());
        self
    }

    /// Fail fetches of `key` with a transport error
    pub fn with_transport_error(mut self, key: DestinationKey, detail: &str) -> Self {
        self.failures.insert(
            key,
            FetchError::Transport {
                key,
                detail: detail.to_string(),
            },
        );
        self
    }

    /// Delay every fetch (simulates network latency)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches issued for `key`
    pub fn fetch_count(&self, key: DestinationKey) -> usize {
        self.fetch_calls
            .lock()
            .map(|calls| calls.iter().filter(|k| **k == key).count())
            .unwrap_or(0)
    }

    /// Total fetches issued across all keys
    pub fn total_fetches(&self) -> usize {
        self.fetch_calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn fetch(&self, key: DestinationKey) -> Result<ContentItem, FetchError> {
        if let Ok(mut calls) = self.fetch_calls.lock() {
            calls.push(key);
        }

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if let Some(error) = self.failures.get(&key) {
            return Err(error.clone());
        }

        match self.bodies.get(&key) {
            Some(body) => Ok(ContentItem::new(key, body.clone(), format!("mock://{}", key))),
            None => Err(FetchError::NotFound {
                key,
                detail: "no mock content configured".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
