//! Periodic due-task check.
//!
//! [`DueWatcher`] runs on the tokio runtime, wakes once per interval, reads
//! the task snapshot current at that moment and raises at most one
//! [`DueNotice`] per tick. The first check happens one full interval after
//! the watcher is spawned.
//!
//! The watcher stops when [`DueWatcher::stop`] is awaited, when the
//! `DueWatcher` value is dropped, or when the notice receiver goes away.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::due::DueNotice;
use crate::store::TaskSnapshot;

pub const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(60);
/// Upper bound on the check period: one day.
pub const MAX_REMINDER_INTERVAL: Duration = Duration::from_secs(86_400);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Debug)]
pub struct DueWatcher {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl DueWatcher {
    /// Spawns the watcher on the current tokio runtime.
    pub fn spawn(
        tasks: watch::Receiver<TaskSnapshot>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        notices: mpsc::UnboundedSender<DueNotice>,
    ) -> Self {
        let interval = if interval.is_zero() {
            warn!("zero reminder interval; using default");
            DEFAULT_REMINDER_INTERVAL
        } else if interval > MAX_REMINDER_INTERVAL {
            warn!(
                interval_secs = interval.as_secs(),
                max_secs = MAX_REMINDER_INTERVAL.as_secs(),
                "reminder interval too long; clamping"
            );
            MAX_REMINDER_INTERVAL
        } else {
            interval
        };
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        info!(interval_secs = interval.as_secs_f64(), "starting due watcher");
        let handle = tokio::spawn(watch_loop(tasks, clock, interval, notices, shutdown_rx));
        Self {
            shutdown: shutdown_tx,
            handle,
        }
    }

    /// Signals the loop to exit and waits for it.
    pub async fn stop(self) {
        let Self { shutdown, handle } = self;
        let _ = shutdown.send(());
        if let Err(err) = handle.await {
            warn!(error = %err, "due watcher task ended abnormally");
        }
    }
}

async fn watch_loop(
    tasks: watch::Receiver<TaskSnapshot>,
    clock: Arc<dyn Clock>,
    period: Duration,
    notices: mpsc::UnboundedSender<DueNotice>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let start = match Instant::now().checked_add(period) {
        Some(start) => start,
        None => {
            warn!(
                interval_secs = period.as_secs(),
                "first due check is out of range; checking after the default interval"
            );
            Instant::now() + DEFAULT_REMINDER_INTERVAL
        }
    };
    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("due watcher shutting down");
                break;
            }
            _ = ticker.tick() => {
                let snapshot = tasks.borrow().clone();
                let now = clock.now();
                let Some(notice) = DueNotice::evaluate(&snapshot, now) else {
                    debug!(total = snapshot.len(), "no tasks due");
                    continue;
                };

                info!(count = notice.count, "tasks due");
                if notices.send(notice).is_err() {
                    debug!("notice receiver closed; stopping due watcher");
                    break;
                }
            }
        }
    }
}
