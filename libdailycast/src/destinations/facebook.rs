//! Facebook Page destination
//!
//! Publishes to a page feed through the Graph API using a page access token.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::{resolve_secret, FacebookConfig};
use crate::destinations::http::{build_client, json_body, map_transport_error, normalize_base};
use crate::destinations::{Destination, PublishResult};
use crate::error::{PublishError, Result};
use crate::types::DestinationKey;

pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// Graph API post length limit
pub const CHARACTER_LIMIT: usize = 63_206;

pub struct FacebookPage {
    client: Client,
    api_base: String,
    page_id: String,
    access_token: SecretString,
}

impl FacebookPage {
    pub fn new(page_id: String, access_token: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_base: DEFAULT_API_BASE.to_string(),
            page_id,
            access_token: SecretString::from(access_token),
        })
    }

    /// Create a page client from the `[facebook]` section
    ///
    /// The token is taken from `access_token`, then `access_token_file`, then
    /// the `DAILYCAST_FACEBOOK_TOKEN` environment variable.
    pub fn from_config(config: &FacebookConfig, timeout: Duration) -> Result<Self> {
        let token = resolve_secret(
            config.access_token.as_deref(),
            config.access_token_file.as_deref(),
            "DAILYCAST_FACEBOOK_TOKEN",
            "facebook.access_token",
        )?;

        Ok(Self::new(config.page_id.clone(), token, timeout)?
            .with_api_base(config.api_base.as_deref()))
    }

    /// Point the client at a different Graph API root (tests, API versions)
    pub fn with_api_base(mut self, api_base: Option<&str>) -> Self {
        self.api_base = normalize_base(api_base, DEFAULT_API_BASE);
        self
    }
}

#[async_trait]
impl Destination for FacebookPage {
    fn key(&self) -> DestinationKey {
        DestinationKey::Facebook
    }

    fn name(&self) -> &str {
        "Facebook"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(CHARACTER_LIMIT)
    }

    async fn deliver(&self, body: &str) -> PublishResult<String> {
        let url = format!("{}/{}/feed", self.api_base, self.page_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&serde_json::json!({ "message": body }))
            .send()
            .await
            .map_err(|e| map_transport_error("Facebook", "publish", e))?;

        let json = json_body("Facebook", response).await?;

        json.get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                PublishError::Posting(format!("Facebook response did not include a post id: {}", json))
            })
    }
}
