//! Core types for Dailycast

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{DailycastError, Result};

/// Identifier of a publishing target
///
/// Each key routes one fetched [`ContentItem`] to the matching destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKey {
    Facebook,
    Twitter,
    LinkedIn,
}

impl DestinationKey {
    /// All known keys, in their default publishing order
    pub const ALL: [DestinationKey; 3] = [
        DestinationKey::Facebook,
        DestinationKey::Twitter,
        DestinationKey::LinkedIn,
    ];

    /// Canonical lowercase name (used in config files and reports)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::LinkedIn => "linkedin",
        }
    }
}

impl FromStr for DestinationKey {
    type Err = DailycastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "facebook" | "fb" => Ok(Self::Facebook),
            "twitter" | "tw" | "x" => Ok(Self::Twitter),
            "linkedin" | "li" => Ok(Self::LinkedIn),
            other => Err(DailycastError::InvalidInput(format!(
                "Unknown destination '{}'. Valid options: facebook, twitter, linkedin",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single fetched payload destined for one publishing target
///
/// Items are immutable once fetched; destinations only ever see a shared
/// reference and derive their own platform-specific body from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub destination_key: DestinationKey,
    pub body: String,
    /// Where the body came from (file path, object id, ...)
    pub source_ref: String,
}

impl ContentItem {
    pub fn new(
        destination_key: DestinationKey,
        body: impl Into<String>,
        source_ref: impl Into<String>,
    ) -> Self {
        Self {
            destination_key,
            body: body.into(),
            source_ref: source_ref.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Success,
    Failure,
}

/// Result of publishing to a single destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub destination_key: DestinationKey,
    pub status: PostStatus,
    pub detail: String,
    /// The destination's own identifier for the created post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl PostOutcome {
    pub fn success(destination_key: DestinationKey, external_id: String) -> Self {
        Self {
            destination_key,
            status: PostStatus::Success,
            detail: format!("Posted to {} ({})", destination_key, external_id),
            external_id: Some(external_id),
        }
    }

    pub fn failure(destination_key: DestinationKey, detail: impl Into<String>) -> Self {
        Self {
            destination_key,
            status: PostStatus::Failure,
            detail: detail.into(),
            external_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PostStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_key_from_str() {
        assert_eq!("facebook".parse::<DestinationKey>().unwrap(), DestinationKey::Facebook);
        assert_eq!("fb".parse::<DestinationKey>().unwrap(), DestinationKey::Facebook);
        assert_eq!("TW".parse::<DestinationKey>().unwrap(), DestinationKey::Twitter);
        assert_eq!("x".parse::<DestinationKey>().unwrap(), DestinationKey::Twitter);
        assert_eq!(" LinkedIn ".parse::<DestinationKey>().unwrap(), DestinationKey::LinkedIn);
        assert_eq!("li".parse::<DestinationKey>().unwrap(), DestinationKey::LinkedIn);
    }

    #[test]
    fn test_destination_key_from_str_invalid() {
        let result = "myspace".parse::<DestinationKey>();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown destination 'myspace'"));
    }

    #[test]
    fn test_destination_key_serde_uses_canonical_name() {
        let json = serde_json::to_string(&DestinationKey::LinkedIn).unwrap();
        assert_eq!(json, "\"linkedin\"");

        let key: DestinationKey = serde_json::from_str("\"twitter\"").unwrap();
        assert_eq!(key, DestinationKey::Twitter);
    }

    #[test]
    fn test_destination_key_display_matches_as_str() {
        for key in DestinationKey::ALL {
            assert_eq!(key.to_string(), key.as_str());
        }
    }

    #[test]
    fn test_post_outcome_constructors() {
        let ok = PostOutcome::success(DestinationKey::Facebook, "123_456".to_string());
        assert!(ok.is_success());
        assert_eq!(ok.external_id.as_deref(), Some("123_456"));

        let failed = PostOutcome::failure(DestinationKey::Twitter, "Rate limit exceeded");
        assert!(!failed.is_success());
        assert_eq!(failed.status, PostStatus::Failure);
        assert!(failed.external_id.is_none());
        assert_eq!(failed.detail, "Rate limit exceeded");
    }

    #[test]
    fn test_post_outcome_serializes_without_missing_external_id() {
        let failed = PostOutcome::failure(DestinationKey::LinkedIn, "boom");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert!(json.get("external_id").is_none());
    }
}
