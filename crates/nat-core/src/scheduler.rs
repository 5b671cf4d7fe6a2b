//! Fixed-cadence idle evaluation across all trackers.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock::Clock;
use crate::threshold::IdleThreshold;
use crate::tracker::{SessionSink, SessionTracker};

/// Default time between idle checks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Cooperative stop signal, checked once per tick.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Periodically asks every tracker whether its input has gone idle.
pub struct IdleScheduler<S> {
    trackers: Vec<Arc<SessionTracker<S>>>,
    clock: Arc<dyn Clock>,
    threshold: IdleThreshold,
    period: Duration,
}

impl<S: SessionSink + 'static> IdleScheduler<S> {
    pub fn new(
        trackers: Vec<Arc<SessionTracker<S>>>,
        clock: Arc<dyn Clock>,
        threshold: IdleThreshold,
        period: Duration,
    ) -> Self {
        Self {
            trackers,
            clock,
            threshold,
            period,
        }
    }

    /// Runs one idle evaluation and returns how many sessions were persisted.
    ///
    /// The threshold is re-read on every call. Append failures are logged and
    /// left for the next tick.
    pub fn tick(&self) -> usize {
        let now = self.clock.now();
        let threshold = self.threshold.get();
        let mut persisted = 0;
        for tracker in &self.trackers {
            match tracker.check_idle(now, threshold) {
                Ok(Some(_)) => persisted += 1,
                Ok(None) => {}
                Err(err) => tracing::warn!(
                    input_type = %tracker.input_type(),
                    error = %err,
                    "failed to persist idle session, retrying next tick"
                ),
            }
        }
        persisted
    }

    /// Ticks every `period` until `cancel` is raised. Does not flush.
    pub fn run(&self, cancel: &CancellationFlag) {
        while !cancel.is_cancelled() {
            thread::sleep(self.period);
            if cancel.is_cancelled() {
                break;
            }
            self.tick();
        }
        tracing::debug!("idle scheduler stopped");
    }

    /// Moves the scheduler onto its own thread.
    pub fn spawn(self) -> io::Result<SchedulerHandle> {
        let cancel = CancellationFlag::default();
        let flag = cancel.clone();
        let thread = thread::Builder::new()
            .name("idle-scheduler".to_string())
            .spawn(move || self.run(&flag))?;
        Ok(SchedulerHandle {
            cancel,
            thread: Some(thread),
        })
    }
}

/// Owns a running scheduler thread; stops it on drop.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: CancellationFlag,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Raises the stop signal and waits for the current tick to finish.
    pub fn stop(mut self) -> thread::Result<()> {
        self.cancel.cancel();
        self.thread.take().map_or(Ok(()), JoinHandle::join)
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
