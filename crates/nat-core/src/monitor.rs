//! The running tracker: one session tracker per input type, the idle
//! scheduler driving them, and the shutdown sequence tying them together.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::input_type::InputType;
use crate::scheduler::{IdleScheduler, SchedulerHandle};
use crate::threshold::IdleThreshold;
use crate::tracker::{SessionSink, SessionTracker};

/// Owns every piece of tracking state for one process.
///
/// Producers call [`record`](Self::record); the caller stops them before
/// calling [`shutdown`](Self::shutdown).
pub struct ActivityMonitor<S: SessionSink> {
    mouse: Arc<SessionTracker<S>>,
    keyboard: Arc<SessionTracker<S>>,
    clock: Arc<dyn Clock>,
    threshold: IdleThreshold,
    scheduler: Option<SchedulerHandle>,
}

impl<S: SessionSink + 'static> ActivityMonitor<S> {
    pub fn new(sink: Arc<S>, clock: Arc<dyn Clock>, threshold: IdleThreshold) -> Self {
        Self {
            mouse: Arc::new(SessionTracker::new(InputType::Mouse, Arc::clone(&sink))),
            keyboard: Arc::new(SessionTracker::new(InputType::Keyboard, sink)),
            clock,
            threshold,
            scheduler: None,
        }
    }

    pub const fn tracker(&self, input_type: InputType) -> &Arc<SessionTracker<S>> {
        match input_type {
            InputType::Mouse => &self.mouse,
            InputType::Keyboard => &self.keyboard,
        }
    }

    /// Handle for changing the idle threshold while running.
    pub const fn threshold(&self) -> &IdleThreshold {
        &self.threshold
    }

    /// Records one input event at the current clock time.
    pub fn record(&self, input_type: InputType) {
        self.tracker(input_type).on_event(self.clock.now());
    }

    /// A scheduler over both trackers, sharing this monitor's clock and threshold.
    pub fn idle_scheduler(&self, period: Duration) -> IdleScheduler<S> {
        IdleScheduler::new(
            vec![Arc::clone(&self.mouse), Arc::clone(&self.keyboard)],
            Arc::clone(&self.clock),
            self.threshold.clone(),
            period,
        )
    }

    /// Starts background idle checks. Does nothing if already started.
    pub fn start(&mut self, period: Duration) -> io::Result<()> {
        if self.scheduler.is_none() {
            self.scheduler = Some(self.idle_scheduler(period).spawn()?);
            tracing::info!(
                period_ms = period.as_millis(),
                idle_threshold = self.threshold.get(),
                "activity monitor started"
            );
        }
        Ok(())
    }

    /// Flushes both trackers, then stops the idle scheduler.
    ///
    /// Both trackers are flushed even if the first fails; the first error is
    /// returned. On success, returns how many sessions were persisted.
    pub fn shutdown(mut self) -> Result<usize, S::Error> {
        let mut flushed = 0;
        let mut first_err = None;
        for tracker in [&self.mouse, &self.keyboard] {
            match tracker.flush() {
                Ok(Some(_)) => flushed += 1,
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        input_type = %tracker.input_type(),
                        error = %err,
                        "failed to flush open session"
                    );
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }

        if let Some(handle) = self.scheduler.take() {
            if handle.stop().is_err() {
                tracing::warn!("idle scheduler thread panicked");
            }
        }
        tracing::info!(flushed, "activity monitor stopped");

        first_err.map_or(Ok(flushed), Err)
    }
}
