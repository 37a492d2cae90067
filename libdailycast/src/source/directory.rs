//! Content folder source
//!
//! Reads one text file per destination from a content folder, following a
//! `destination -> file name` mapping.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::source::ContentSource;
use crate::types::{ContentItem, DestinationKey};

pub struct DirectorySource {
    folder: PathBuf,
    mapping: BTreeMap<DestinationKey, String>,
}

impl DirectorySource {
    pub fn new(folder: impl Into<PathBuf>, mapping: BTreeMap<DestinationKey, String>) -> Self {
        Self {
            folder: folder.into(),
            mapping,
        }
    }

    /// Build the source from the `[content]` section
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.content_folder()?, config.content_mapping()?))
    }

    fn path_for(&self, key: DestinationKey) -> Option<PathBuf> {
        self.mapping.get(&key).map(|file| self.folder.join(file))
    }
}

#[async_trait]
impl ContentSource for DirectorySource {
    async fn fetch(&self, key: DestinationKey) -> std::result::Result<ContentItem, FetchError> {
        let path = self.path_for(key).ok_or_else(|| FetchError::NotFound {
            key,
            detail: "no content file mapped".to_string(),
        })?;
        let source_ref = path.display().to_string();

        debug!(destination = %key, path = %source_ref, "Reading content file");

        let body = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                key,
                detail: format!("{} does not exist", source_ref),
            },
            _ => FetchError::Transport {
                key,
                detail: format!("{}: {}", source_ref, e),
            },
        })?;

        let body = body.trim_end();
        if body.trim().is_empty() {
            return Err(FetchError::Empty { key, source_ref });
        }

        Ok(ContentItem::new(key, body, source_ref))
    }

    fn name(&self) -> &str {
        "directory"
    }
}
