//! Dailycast - scheduled daily content distribution
//!
//! This library loads per-destination content from a source, publishes it
//! to several destinations concurrently and aggregates the results into a
//! single run report. A daily scheduler drives the pipeline at a fixed
//! local time.

pub mod clock;
pub mod config;
pub mod destinations;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use destinations::Destination;
pub use error::{DailycastError, Result};
pub use pipeline::Pipeline;
pub use report::{OverallStatus, RunReport};
pub use scheduler::{Schedule, Scheduler, Shutdown};
pub use source::ContentSource;
pub use types::{ContentItem, DestinationKey, PostOutcome, PostStatus};
