//! Content sources
//!
//! A [`ContentSource`] retrieves the content item mapped to a destination
//! key. The pipeline calls it once per requested key per run and treats any
//! error as that key's absence, never as a reason to abort the run.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{ContentItem, DestinationKey};

pub mod directory;
// Available for all builds (not just tests) so integration tests can use it
pub mod mock;

pub use directory::DirectorySource;
pub use mock::MockSource;

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the content item for `key`
    ///
    /// Must return the same logical item for the same key within one run.
    ///
    /// # Errors
    ///
    /// - `FetchError::NotFound` if no content is mapped to the key
    /// - `FetchError::Empty` if the mapped content has no text
    /// - `FetchError::Transport` for I/O or authentication failures
    async fn fetch(&self, key: DestinationKey) -> Result<ContentItem, FetchError>;

    /// Short identifier used in logs
    fn name(&self) -> &str;
}
