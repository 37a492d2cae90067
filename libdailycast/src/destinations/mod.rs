//! Destination abstraction and implementations
//!
//! This module provides a unified trait for every publishing target. Each
//! implementation handles its own platform-specific formatting, validation
//! and delivery, and owns whatever authenticated client it needs for the
//! lifetime of the process.
//!
//! # Examples
//!
//! ```no_run
//! use libdailycast::destinations::{twitter::TwitterClient, Destination};
//! use libdailycast::types::{ContentItem, DestinationKey};
//! use std::time::Duration;
//!
//! # async fn example() -> libdailycast::error::Result<()> {
//! let twitter = TwitterClient::new("user-access-token".to_string(), Duration::from_secs(30))?;
//!
//! let item = ContentItem::new(DestinationKey::Twitter, "Hello from dailycast!", "inline");
//! let outcome = twitter.publish(&item).await;
//! println!("{}: {}", outcome.destination_key, outcome.detail);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::types::{ContentItem, DestinationKey, PostOutcome};

pub mod facebook;
pub mod format;
mod http;
pub mod linkedin;
pub mod twitter;

// Mock destination is available for all builds (not just tests) to support integration tests
pub mod mock;

pub type PublishResult<T> = std::result::Result<T, PublishError>;

/// Destination trait for unified publishing
///
/// Implementors provide [`deliver`](Destination::deliver) and optionally
/// override the transform and validation hooks. Callers use
/// [`publish`](Destination::publish), which never returns an error: every
/// failure becomes a `PostOutcome` with `Failure` status.
#[async_trait]
pub trait Destination: Send + Sync {
    /// The key this destination serves
    fn key(&self) -> DestinationKey;

    /// Human-readable name used in logs
    fn name(&self) -> &str {
        self.key().as_str()
    }

    /// Maximum number of characters allowed in a post, if any
    fn character_limit(&self) -> Option<usize> {
        None
    }

    /// Platform-specific transformation of the shared body
    ///
    /// Must be deterministic and idempotent: preparing an already prepared
    /// body returns it unchanged.
    fn prepare(&self, body: &str) -> String {
        body.to_string()
    }

    /// Validate a prepared body before sending it
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Validation` if the body is empty or exceeds
    /// [`character_limit`](Destination::character_limit)
    fn validate(&self, body: &str) -> PublishResult<()> {
        if body.trim().is_empty() {
            return Err(PublishError::Validation("Content cannot be empty".to_string()));
        }

        if let Some(limit) = self.character_limit() {
            let length = body.chars().count();
            if length > limit {
                return Err(PublishError::Validation(format!(
                    "Content exceeds {}'s {} character limit (current: {} characters)",
                    self.name(),
                    limit,
                    length
                )));
            }
        }

        Ok(())
    }

    /// Send a prepared body, returning the destination's id for the post
    async fn deliver(&self, body: &str) -> PublishResult<String>;

    /// Transform, validate and deliver `item`
    async fn publish(&self, item: &ContentItem) -> PostOutcome {
        let key = self.key();

        if item.destination_key != key {
            return PostOutcome::failure(
                key,
                format!(
                    "Content for {} was routed to {}",
                    item.destination_key,
                    self.name()
                ),
            );
        }

        let body = self.prepare(&item.body);

        if let Err(e) = self.validate(&body) {
            warn!(destination = self.name(), error = %e, "Content rejected before sending");
            return PostOutcome::failure(key, e.to_string());
        }

        match self.deliver(&body).await {
            Ok(external_id) => {
                info!(destination = self.name(), external_id = %external_id, "Published");
                PostOutcome::success(key, external_id)
            }
            Err(e) => {
                warn!(destination = self.name(), error = %e, "Failed to publish");
                PostOutcome::failure(key, e.to_string())
            }
        }
    }
}

/// Create destination clients for every destination in the configured order
///
/// # Errors
///
/// Returns an error if a destination's section is missing or its credentials
/// cannot be resolved.
pub fn create_destinations(config: &Config) -> Result<Vec<Box<dyn Destination>>> {
    use crate::error::ConfigError;

    let timeout = config.http.timeout()?;
    let mut destinations: Vec<Box<dyn Destination>> = Vec::new();

    for key in config.destination_order()? {
        let missing = || ConfigError::MissingField(format!("[{}] section", key));
        let destination: Box<dyn Destination> = match key {
            DestinationKey::Facebook => {
                let section = config.facebook.as_ref().ok_or_else(missing)?;
                Box::new(facebook::FacebookPage::from_config(section, timeout)?)
            }
            DestinationKey::Twitter => {
                let section = config.twitter.as_ref().ok_or_else(missing)?;
                Box::new(twitter::TwitterClient::from_config(section, timeout)?)
            }
            DestinationKey::LinkedIn => {
                let section = config.linkedin.as_ref().ok_or_else(missing)?;
                Box::new(linkedin::LinkedInClient::from_config(section, timeout)?)
            }
        };
        destinations.push(destination);
    }

    Ok(destinations)
}
