//! Scheduler event bus
//!
//! The scheduler announces its transitions on a `tokio::sync::broadcast`
//! channel. Emitting never blocks: with no subscribers the event is dropped,
//! and a lagging subscriber only misses old events.
//!
//! # Example
//!
//! ```
//! use libdailycast::scheduler::events::{EventBus, SchedulerEvent, Trigger};
//!
//! # async fn example() {
//! let bus = EventBus::new(16);
//! let mut receiver = bus.subscribe();
//!
//! bus.emit(SchedulerEvent::RunStarted { trigger: Trigger::Manual });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::report::RunReport;

pub type EventReceiver = broadcast::Receiver<SchedulerEvent>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SchedulerEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: SchedulerEvent) {
        // send() only fails when nobody is listening
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// What caused a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Scheduled,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// Waiting for the next scheduled fire time
    Waiting { next_fire: DateTime<FixedOffset> },

    RunStarted { trigger: Trigger },

    RunCompleted {
        trigger: Trigger,
        report: Box<RunReport>,
    },

    /// A scheduled fire was skipped because it had already passed
    Missed { fire_time: DateTime<FixedOffset> },

    Stopped,
}
