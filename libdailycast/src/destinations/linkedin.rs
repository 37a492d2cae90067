//! LinkedIn destination (UGC posts API)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::{resolve_secret, LinkedInConfig};
use crate::destinations::http::{build_client, map_status_error, map_transport_error, normalize_base};
use crate::destinations::{Destination, PublishResult};
use crate::error::{PublishError, Result};
use crate::types::DestinationKey;

pub const DEFAULT_API_BASE: &str = "https://api.linkedin.com";

pub const CHARACTER_LIMIT: usize = 3_000;

pub struct LinkedInClient {
    client: Client,
    api_base: String,
    person_id: String,
    access_token: SecretString,
}

impl LinkedInClient {
    pub fn new(person_id: String, access_token: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_base: DEFAULT_API_BASE.to_string(),
            person_id,
            access_token: SecretString::from(access_token),
        })
    }

    /// Create a client from the `[linkedin]` section
    ///
    /// The token is taken from `access_token`, then `access_token_file`, then
    /// the `DAILYCAST_LINKEDIN_TOKEN` environment variable.
    pub fn from_config(config: &LinkedInConfig, timeout: Duration) -> Result<Self> {
        let token = resolve_secret(
            config.access_token.as_deref(),
            config.access_token_file.as_deref(),
            "DAILYCAST_LINKEDIN_TOKEN",
            "linkedin.access_token",
        )?;

        Ok(Self::new(config.person_id.clone(), token, timeout)?
            .with_api_base(config.api_base.as_deref()))
    }

    pub fn with_api_base(mut self, api_base: Option<&str>) -> Self {
        self.api_base = normalize_base(api_base, DEFAULT_API_BASE);
        self
    }

    fn share_payload(&self, body: &str) -> serde_json::Value {
        serde_json::json!({
            "author": format!("urn:li:person:{}", self.person_id),
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": body },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        })
    }
}

#[async_trait]
impl Destination for LinkedInClient {
    fn key(&self) -> DestinationKey {
        DestinationKey::LinkedIn
    }

    fn name(&self) -> &str {
        "LinkedIn"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(CHARACTER_LIMIT)
    }

    async fn deliver(&self, body: &str) -> PublishResult<String> {
        let url = format!("{}/v2/ugcPosts", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&self.share_payload(body))
            .send()
            .await
            .map_err(|e| map_transport_error("LinkedIn", "publish", e))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let text = response.text().await.unwrap_or_default();
            return Err(if status.is_success() {
                PublishError::Posting(format!("LinkedIn returned {} instead of 201 Created", status))
            } else {
                map_status_error("LinkedIn", status, &text)
            });
        }

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(id) = header_id {
            return Ok(id);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| map_transport_error("LinkedIn", "response", e))?;
        json.get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| PublishError::Posting("LinkedIn response did not include a post id".to_string()))
    }
}
