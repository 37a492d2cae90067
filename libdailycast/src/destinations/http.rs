//! Shared HTTP plumbing for destination adapters

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use crate::error::{ConfigError, PublishError, Result};

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("dailycast/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::Invalid(format!("Failed to build HTTP client: {}", e)).into())
}

/// Map a transport-level failure (connect, timeout, decode) to a PublishError
pub(crate) fn map_transport_error(platform: &str, context: &str, error: reqwest::Error) -> PublishError {
    if error.is_timeout() {
        PublishError::Network(format!("{} {} timed out: {}", platform, context, error))
    } else if error.is_decode() {
        PublishError::Posting(format!(
            "{} {} returned an unreadable response: {}",
            platform, context, error
        ))
    } else {
        PublishError::Network(format!("{} {} failed: {}", platform, context, error))
    }
}

/// Map a non-success HTTP status to a PublishError
pub(crate) fn map_status_error(platform: &str, status: StatusCode, body: &str) -> PublishError {
    let body = body.trim();
    let detail = if body.is_empty() {
        format!("{} returned {}", platform, status)
    } else {
        format!("{} returned {}: {}", platform, status, body)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PublishError::Authentication(format!(
            "{}. Check that the access token is valid and has posting permission.",
            detail
        )),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PublishError::Validation(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => PublishError::RateLimit(detail),
        _ => PublishError::Posting(detail),
    }
}

/// Turn a response into its JSON body, mapping error statuses
pub(crate) async fn json_body(
    platform: &str,
    response: Response,
) -> std::result::Result<serde_json::Value, PublishError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(map_status_error(platform, status, &body));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| map_transport_error(platform, "response", e))
}

/// Trim a configured API base so paths can be appended with `/`
pub(crate) fn normalize_base(base: Option<&str>, default: &str) -> String {
    base.unwrap_or(default).trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses_map_to_authentication() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = map_status_error("Twitter", status, "{\"title\":\"Unauthorized\"}");
            assert!(matches!(err, PublishError::Authentication(_)));
            assert!(err.to_string().contains("Twitter returned"));
        }
    }

    #[test]
    fn test_client_errors_map_to_validation() {
        let err = map_status_error("LinkedIn", StatusCode::UNPROCESSABLE_ENTITY, "");
        assert!(matches!(err, PublishError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Content validation failed: LinkedIn returned 422 Unprocessable Entity"
        );
    }

    #[test]
    fn test_too_many_requests_maps_to_rate_limit() {
        let err = map_status_error("Facebook", StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(err, PublishError::RateLimit(_)));
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn test_server_errors_map_to_posting() {
        let err = map_status_error("Facebook", StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, PublishError::Posting(_)));
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(
            normalize_base(Some("http://127.0.0.1:8080/"), "https://example.com"),
            "http://127.0.0.1:8080"
        );
        assert_eq!(normalize_base(None, "https://api.x.com"), "https://api.x.com");
    }
}
