//! Twitter/X destination
//!
//! Creates posts through the v2 API with an OAuth 2.0 user access token. Bodies
//! longer than 280 characters are shortened rather than rejected.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::{resolve_secret, TwitterConfig};
use crate::destinations::format::{truncate_with_marker, ELLIPSIS};
use crate::destinations::http::{build_client, json_body, map_transport_error, normalize_base};
use crate::destinations::{Destination, PublishResult};
use crate::error::{PublishError, Result};
use crate::types::DestinationKey;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

pub const CHARACTER_LIMIT: usize = 280;

pub struct TwitterClient {
    client: Client,
    api_base: String,
    bearer_token: SecretString,
}

impl TwitterClient {
    pub fn new(bearer_token: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_base: DEFAULT_API_BASE.to_string(),
            bearer_token: SecretString::from(bearer_token),
        })
    }

    /// Create a client from the `[twitter]` section
    ///
    /// The token is taken from `bearer_token`, then `bearer_token_file`, then
    /// the `DAILYCAST_TWITTER_TOKEN` environment variable.
    pub fn from_config(config: &TwitterConfig, timeout: Duration) -> Result<Self> {
        let token = resolve_secret(
            config.bearer_token.as_deref(),
            config.bearer_token_file.as_deref(),
            "DAILYCAST_TWITTER_TOKEN",
            "twitter.bearer_token",
        )?;

        Ok(Self::new(token, timeout)?.with_api_base(config.api_base.as_deref()))
    }

    pub fn with_api_base(mut self, api_base: Option<&str>) -> Self {
        self.api_base = normalize_base(api_base, DEFAULT_API_BASE);
        self
    }
}

#[async_trait]
impl Destination for TwitterClient {
    fn key(&self) -> DestinationKey {
        DestinationKey::Twitter
    }

    fn name(&self) -> &str {
        "Twitter"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(CHARACTER_LIMIT)
    }

    fn prepare(&self, body: &str) -> String {
        truncate_with_marker(body.trim(), CHARACTER_LIMIT, ELLIPSIS)
    }

    async fn deliver(&self, body: &str) -> PublishResult<String> {
        let url = format!("{}/2/tweets", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer_token.expose_secret())
            .json(&serde_json::json!({ "text": body }))
            .send()
            .await
            .map_err(|e| map_transport_error("Twitter", "publish", e))?;

        let json = json_body("Twitter", response).await?;

        json.pointer("/data/id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                PublishError::Posting(format!("Twitter response did not include a tweet id: {}", json))
            })
    }
}
