//! Error types for Dailycast

use thiserror::Error;

use crate::types::DestinationKey;

pub type Result<T> = std::result::Result<T, DailycastError>;

#[derive(Error, Debug)]
pub enum DailycastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A run was requested while another one was still executing
    #[error("A pipeline run is already in progress")]
    Busy,

    /// The scheduler has shut down and accepts no further runs
    #[error("Cancellation requested")]
    CancelRequested,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DailycastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DailycastError::Config(_) => 2,
            DailycastError::InvalidInput(_) => 2,
            DailycastError::CancelRequested => 0,
            DailycastError::Busy | DailycastError::Io(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid schedule time '{0}': expected HH:MM (24-hour)")]
    InvalidTime(String),

    #[error("Unknown timezone '{0}': expected an IANA name such as Asia/Kolkata")]
    UnknownTimezone(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure to retrieve content for one destination key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No content found for {key}: {detail}")]
    NotFound { key: DestinationKey, detail: String },

    #[error("Content for {key} is empty ({source_ref})")]
    Empty { key: DestinationKey, source_ref: String },

    #[error("Transport error fetching {key}: {detail}")]
    Transport { key: DestinationKey, detail: String },
}

impl FetchError {
    pub fn key(&self) -> DestinationKey {
        match self {
            FetchError::NotFound { key, .. }
            | FetchError::Empty { key, .. }
            | FetchError::Transport { key, .. } => *key,
        }
    }
}

/// Failure to deliver to a destination
///
/// These never cross the pipeline boundary; they end up as the `detail`
/// of a failed [`PostOutcome`](crate::types::PostOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}
