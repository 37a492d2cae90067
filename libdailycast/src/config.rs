//! Configuration management for Dailycast
//!
//! Configuration is a single TOML file. It is loaded and validated once at
//! startup; any problem here is fatal and surfaces as a [`ConfigError`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::scheduler::Schedule;
use crate::types::DestinationKey;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub content: ContentConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub facebook: Option<FacebookConfig>,
    pub twitter: Option<TwitterConfig>,
    pub linkedin: Option<LinkedInConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local time of day, "HH:MM"
    pub time: String,
    /// IANA timezone name
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Seconds between wake-ups while waiting for the next fire time
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Folder holding one content file per destination
    pub folder: String,
    /// Destination name -> file name inside `folder`
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Destinations to publish to, in reporting order
    #[serde(default = "default_destinations")]
    pub destinations: Vec<String>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            destinations: default_destinations(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout for destination calls (e.g. "30s", "1m")
    #[serde(default = "default_http_timeout")]
    pub timeout: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.timeout).map_err(|e| {
            ConfigError::Invalid(format!("http.timeout '{}': {}", self.timeout, e)).into()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebookConfig {
    pub page_id: String,
    pub access_token: Option<String>,
    pub access_token_file: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub bearer_token: Option<String>,
    pub bearer_token_file: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    pub person_id: String,
    pub access_token: Option<String>,
    pub access_token_file: Option<String>,
    pub api_base: Option<String>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_poll_interval() -> u64 {
    1
}

fn default_destinations() -> Vec<String> {
    DestinationKey::ALL.iter().map(|k| k.to_string()).collect()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_http_timeout() -> String {
    "30s".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path(None)?;
        Self::load_from_path(&config_path)
    }

    /// Load and validate configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked before scheduling begins
    pub fn validate(&self) -> Result<()> {
        self.schedule.to_schedule()?;
        self.http.timeout()?;
        self.content_mapping()?;

        if self.pipeline.max_concurrency == 0 {
            return Err(
                ConfigError::Invalid("pipeline.max_concurrency must be at least 1".to_string())
                    .into(),
            );
        }

        let order = self.destination_order()?;
        if order.is_empty() {
            return Err(ConfigError::MissingField("pipeline.destinations".to_string()).into());
        }

        for key in order {
            let configured = match key {
                DestinationKey::Facebook => self.facebook.is_some(),
                DestinationKey::Twitter => self.twitter.is_some(),
                DestinationKey::LinkedIn => self.linkedin.is_some(),
            };
            if !configured {
                return Err(ConfigError::MissingField(format!("[{}] section", key)).into());
            }
        }

        Ok(())
    }

    /// Destinations in their configured order, duplicates removed
    pub fn destination_order(&self) -> Result<Vec<DestinationKey>> {
        let mut order = Vec::with_capacity(self.pipeline.destinations.len());
        for name in &self.pipeline.destinations {
            let key: DestinationKey = name.parse().map_err(|_| {
                ConfigError::Invalid(format!("pipeline.destinations: unknown destination '{}'", name))
            })?;
            if !order.contains(&key) {
                order.push(key);
            }
        }
        Ok(order)
    }

    /// Content mapping keyed by destination
    pub fn content_mapping(&self) -> Result<BTreeMap<DestinationKey, String>> {
        let mut mapping = BTreeMap::new();
        for (name, file) in &self.content.mapping {
            let key: DestinationKey = name.parse().map_err(|_| {
                ConfigError::Invalid(format!("content.mapping: unknown destination '{}'", name))
            })?;
            mapping.insert(key, file.clone());
        }
        Ok(mapping)
    }

    /// Content folder with `~` and environment variables expanded
    pub fn content_folder(&self) -> Result<PathBuf> {
        expand_path(&self.content.folder)
    }
}

impl ScheduleConfig {
    /// Validate the raw values into a typed [`Schedule`]
    pub fn to_schedule(&self) -> std::result::Result<Schedule, ConfigError> {
        Schedule::parse(&self.time, &self.timezone)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }
}

/// Resolve the configuration file path following XDG Base Directory conventions
///
/// An explicit path wins, then `DAILYCAST_CONFIG`, then
/// `$XDG_CONFIG_HOME/dailycast/config.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return expand_path(&path.to_string_lossy());
    }

    if let Ok(path) = std::env::var("DAILYCAST_CONFIG") {
        return expand_path(&path);
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("dailycast").join("config.toml"))
}

pub(crate) fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to expand path '{}': {}", path, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Resolve a credential from its inline value, then its file, then an env var
pub(crate) fn resolve_secret(
    inline: Option<&str>,
    file: Option<&str>,
    env_var: &str,
    field: &str,
) -> Result<String> {
    if let Some(value) = inline.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }

    if let Some(file) = file {
        let path = expand_path(file)?;
        let value = std::fs::read_to_string(&path).map_err(ConfigError::ReadError)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::Invalid(format!("{} file {} is empty", field, path.display()))
                .into());
        }
        return Ok(value.to_string());
    }

    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingField(format!("{} (or {})", field, env_var)).into()),
    }
}
