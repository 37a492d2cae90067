//! Daily scheduler
//!
//! The [`Scheduler`] owns wall-clock triggering. It waits cooperatively for
//! the configured local time, runs the pipeline, reports, and repeats. An
//! operator can also trigger a single immediate run with
//! [`Scheduler::run_once`].
//!
//! Only one pipeline run is ever active per scheduler. A manual run requested
//! while another run is active is rejected with `DailycastError::Busy`; a
//! scheduled fire that finds a manual run active waits for it to finish.
//!
//! # Example
//!
//! ```no_run
//! use libdailycast::config::Config;
//! use libdailycast::scheduler::{Scheduler, Shutdown};
//!
//! # async fn example() -> libdailycast::Result<()> {
//! let config = Config::load()?;
//! let scheduler = Scheduler::from_config(&config)?;
//!
//! let shutdown = Shutdown::new();
//! scheduler.run(&shutdown).await;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

pub mod events;
mod schedule;

pub use schedule::Schedule;

use self::events::{EventBus, EventReceiver, SchedulerEvent, Trigger};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{DailycastError, Result};
use crate::pipeline::Pipeline;
use crate::report::RunReport;
use crate::types::DestinationKey;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cooperative cancellation flag
///
/// Checked between scheduled cycles and while waiting; never interrupts a
/// pipeline run that is already executing.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }

    /// The underlying flag, for signal handlers
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.requested.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Waiting { next_fire: DateTime<Tz> },
    Running,
    Stopped,
}

#[derive(Debug, Default)]
struct Status {
    running: bool,
    stopped: bool,
    next_fire: Option<DateTime<Tz>>,
}

pub struct Scheduler {
    schedule: Schedule,
    pipeline: Pipeline,
    destinations: Vec<DestinationKey>,
    poll_interval: Duration,
    clock: Arc<dyn Clock>,
    run_lock: tokio::sync::Mutex<()>,
    status: Mutex<Status>,
    events: EventBus,
}

impl Scheduler {
    /// Create a scheduler publishing to `destinations`, in that order
    pub fn new(schedule: Schedule, pipeline: Pipeline, destinations: Vec<DestinationKey>) -> Self {
        Self {
            schedule,
            pipeline,
            destinations,
            poll_interval: DEFAULT_POLL_INTERVAL,
            clock: Arc::new(SystemClock),
            run_lock: tokio::sync::Mutex::new(()),
            status: Mutex::new(Status::default()),
            events: EventBus::default(),
        }
    }

    /// Build the scheduler and its pipeline from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let schedule = config.schedule.to_schedule()?;
        let pipeline = Pipeline::from_config(config)?;
        Ok(Self::new(schedule, pipeline, config.destination_order()?)
            .with_poll_interval(config.schedule.poll_interval()))
    }

    /// Upper bound on a single sleep while waiting for the fire time
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn destinations(&self) -> &[DestinationKey] {
        &self.destinations
    }

    pub fn state(&self) -> SchedulerState {
        let status = self.lock_status();
        if status.running {
            SchedulerState::Running
        } else if status.stopped {
            SchedulerState::Stopped
        } else {
            match status.next_fire {
                Some(next_fire) => SchedulerState::Waiting { next_fire },
                None => SchedulerState::Idle,
            }
        }
    }

    /// The recurring schedule's next fire time, if the loop is running
    pub fn next_fire(&self) -> Option<DateTime<Tz>> {
        self.lock_status().next_fire
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Run the pipeline immediately, outside the recurring schedule
    ///
    /// Does not change the recurring schedule's next fire time.
    ///
    /// # Errors
    ///
    /// Returns `DailycastError::Busy` if another run is in progress, or
    /// `DailycastError::CancelRequested` once the recurring loop has stopped.
    pub async fn run_once(&self) -> Result<RunReport> {
        let stopped = self.lock_status().stopped;
        if stopped {
            warn!("Manual run rejected: scheduler has shut down");
            return Err(DailycastError::CancelRequested);
        }

        let _guard = self.run_lock.try_lock().map_err(|_| {
            warn!("Manual run rejected: a pipeline run is already in progress");
            DailycastError::Busy
        })?;

        Ok(self.execute(Trigger::Manual).await)
    }

    /// Run the recurring schedule until `shutdown` is requested
    ///
    /// A failed run never stops the loop; the next day's fire is scheduled
    /// regardless of the report's status.
    pub async fn run(&self, shutdown: &Shutdown) {
        info!(schedule = %self.schedule, destinations = ?self.destinations, "Scheduler started");

        let mut next_fire = self.schedule.next_fire_after(self.clock.now());

        while !shutdown.is_requested() {
            self.update_status(|status| status.next_fire = Some(next_fire));
            self.events.emit(SchedulerEvent::Waiting {
                next_fire: next_fire.fixed_offset(),
            });
            info!(next_fire = %next_fire, "Waiting for next scheduled run");

            if !self.wait_until(next_fire, shutdown).await {
                break;
            }

            {
                let _guard = self.run_lock.lock().await;
                if shutdown.is_requested() {
                    break;
                }
                self.execute(Trigger::Scheduled).await;
            }

            next_fire = self.skip_missed(self.schedule.following(&next_fire));
        }

        self.update_status(|status| {
            status.stopped = true;
            status.next_fire = None;
        });
        self.events.emit(SchedulerEvent::Stopped);
        info!("Scheduler stopped");
    }

    /// Execute one run; the caller must hold `run_lock`
    async fn execute(&self, trigger: Trigger) -> RunReport {
        self.update_status(|status| status.running = true);
        self.events.emit(SchedulerEvent::RunStarted { trigger });
        info!(?trigger, "Starting pipeline run");

        let report = self.pipeline.run(&self.destinations).await;
        report.log();

        self.update_status(|status| status.running = false);
        self.events.emit(SchedulerEvent::RunCompleted {
            trigger,
            report: Box::new(report.clone()),
        });

        report
    }

    /// Sleep until `target`, returning false if shutdown was requested first
    async fn wait_until(&self, target: DateTime<Tz>, shutdown: &Shutdown) -> bool {
        let target = target.with_timezone(&Utc);
        loop {
            if shutdown.is_requested() {
                return false;
            }

            let now = self.clock.now();
            if now >= target {
                return true;
            }

            let remaining = (target - now).to_std().unwrap_or(Duration::ZERO);
            sleep(remaining.min(self.poll_interval)).await;
        }
    }

    /// Move past fire times that elapsed while a run was executing
    fn skip_missed(&self, mut next_fire: DateTime<Tz>) -> DateTime<Tz> {
        let now = self.clock.now();
        while next_fire.with_timezone(&Utc) <= now {
            warn!(fire_time = %next_fire, "Skipping scheduled run that has already passed");
            self.events.emit(SchedulerEvent::Missed {
                fire_time: next_fire.fixed_offset(),
            });
            next_fire = self.schedule.following(&next_fire);
        }
        next_fire
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update_status(&self, f: impl FnOnce(&mut Status)) {
        f(&mut self.lock_status());
    }
}
