//! Per-input state machine that turns raw events into closed sessions.
//!
//! A tracker is either idle (no open session) or active. `on_event` opens or
//! extends the open session; `check_idle` closes it once the gap since the
//! last event reaches the idle threshold; `flush` closes it unconditionally.
//! Closed sessions are handed to a [`SessionSink`], which decides whether to
//! keep them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;

use crate::input_type::InputType;
use crate::types::{Session, duration_secs};

/// Destination for closed sessions.
///
/// Implementations must make each `append` a single atomic insert; two
/// trackers call it concurrently.
pub trait SessionSink: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persists a closed session.
    ///
    /// Returns `Ok(None)` when the session is shorter than
    /// [`MIN_SESSION_DURATION_SECS`](crate::MIN_SESSION_DURATION_SECS) and was
    /// dropped.
    fn append(
        &self,
        input_type: InputType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Session>, Self::Error>;
}

/// In-memory state of the session currently being tracked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenSessionState {
    pub session_start: Option<NaiveDateTime>,
    pub last_event_time: Option<NaiveDateTime>,
}

impl OpenSessionState {
    const fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.session_start, self.last_event_time) {
            (Some(start), Some(last)) => Some((start, last)),
            _ => None,
        }
    }
}

/// Tracks sessions for a single input type.
///
/// All state transitions run under one lock so an event arriving while an
/// idle check is closing the session is never lost.
#[derive(Debug)]
pub struct SessionTracker<S> {
    input_type: InputType,
    sink: Arc<S>,
    state: Mutex<OpenSessionState>,
}

impl<S: SessionSink> SessionTracker<S> {
    pub fn new(input_type: InputType, sink: Arc<S>) -> Self {
        Self {
            input_type,
            sink,
            state: Mutex::new(OpenSessionState::default()),
        }
    }

    pub const fn input_type(&self) -> InputType {
        self.input_type
    }

    /// Snapshot of the open session, if any.
    pub fn state(&self) -> OpenSessionState {
        *self.lock()
    }

    pub fn is_active(&self) -> bool {
        self.lock().session_start.is_some()
    }

    /// Records activity at `now`, opening a session if none is open.
    ///
    /// A timestamp earlier than the last recorded event never moves the
    /// session end backwards.
    pub fn on_event(&self, now: NaiveDateTime) {
        let mut state = self.lock();
        match state.span() {
            Some((_, last)) => {
                if now > last {
                    state.last_event_time = Some(now);
                }
            }
            None => {
                state.session_start = Some(now);
                state.last_event_time = Some(now);
                tracing::debug!(input_type = %self.input_type, start = %now, "session opened");
            }
        }
    }

    /// Closes the open session if the input has been idle for at least
    /// `idle_threshold_secs` as of `now`.
    ///
    /// A negative gap (clock moved backwards) counts as activity. When the
    /// sink fails the session stays open and the next check retries it.
    pub fn check_idle(
        &self,
        now: NaiveDateTime,
        idle_threshold_secs: f64,
    ) -> Result<Option<Session>, S::Error> {
        let mut state = self.lock();
        let Some((start, last)) = state.span() else {
            return Ok(None);
        };
        if duration_secs(last, now) < idle_threshold_secs {
            return Ok(None);
        }
        self.close(&mut state, start, last)
    }

    /// Closes any open session at its last event time, regardless of idleness.
    pub fn flush(&self) -> Result<Option<Session>, S::Error> {
        let mut state = self.lock();
        let Some((start, last)) = state.span() else {
            return Ok(None);
        };
        self.close(&mut state, start, last)
    }

    fn close(
        &self,
        state: &mut OpenSessionState,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Session>, S::Error> {
        let persisted = self.sink.append(self.input_type, start, end)?;
        *state = OpenSessionState::default();
        match &persisted {
            Some(session) => tracing::debug!(
                input_type = %self.input_type,
                id = session.id,
                duration = session.duration,
                "session closed"
            ),
            None => tracing::debug!(
                input_type = %self.input_type,
                %start,
                %end,
                "session too short, discarded"
            ),
        }
        Ok(persisted)
    }

    fn lock(&self) -> MutexGuard<'_, OpenSessionState> {
        // The state is two plain fields; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSink, MemoryStore, ts};

    fn tracker(store: &Arc<MemoryStore>) -> SessionTracker<MemoryStore> {
        SessionTracker::new(InputType::Mouse, Arc::clone(store))
    }

    #[test]
    fn first_event_opens_session() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        assert!(!tracker.is_active());

        tracker.on_event(ts(0.0));
        assert_eq!(
            tracker.state(),
            OpenSessionState {
                session_start: Some(ts(0.0)),
                last_event_time: Some(ts(0.0)),
            }
        );
    }

    #[test]
    fn later_events_only_extend_session() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        tracker.on_event(ts(0.0));
        tracker.on_event(ts(1.0));
        tracker.on_event(ts(2.5));

        let state = tracker.state();
        assert_eq!(state.session_start, Some(ts(0.0)));
        assert_eq!(state.last_event_time, Some(ts(2.5)));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn idle_gap_closes_session_at_last_event() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        for t in [0.0, 1.0, 2.0] {
            tracker.on_event(ts(t));
        }

        assert!(tracker.check_idle(ts(4.0), 3.0).unwrap().is_none());
        let closed = tracker.check_idle(ts(10.0), 3.0).unwrap().expect("closed");

        assert_eq!(closed.start_time, ts(0.0));
        assert_eq!(closed.end_time, ts(2.0));
        assert!((closed.duration - 2.0).abs() < 1e-9);
        assert!(!tracker.is_active());
        assert_eq!(store.sessions(), vec![closed]);
    }

    #[test]
    fn gap_equal_to_threshold_is_idle() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        tracker.on_event(ts(0.0));
        tracker.on_event(ts(1.0));

        assert!(tracker.check_idle(ts(4.0), 3.0).unwrap().is_some());
    }

    #[test]
    fn repeated_idle_checks_do_not_append_again() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        tracker.on_event(ts(0.0));
        tracker.on_event(ts(2.0));

        tracker.check_idle(ts(10.0), 3.0).unwrap();
        tracker.check_idle(ts(11.0), 3.0).unwrap();
        tracker.check_idle(ts(20.0), 3.0).unwrap();

        assert_eq!(store.append_calls(), 1);
    }

    #[test]
    fn short_burst_is_discarded_by_store() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        tracker.on_event(ts(0.0));
        tracker.on_event(ts(0.2));

        assert!(tracker.check_idle(ts(5.0), 3.0).unwrap().is_none());
        assert!(!tracker.is_active());
        assert_eq!(store.append_calls(), 1);
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn flush_on_empty_tracker_persists_nothing() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);

        assert!(tracker.flush().unwrap().is_none());
        assert_eq!(store.append_calls(), 0);
    }

    #[test]
    fn flush_closes_active_session_before_threshold() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        tracker.on_event(ts(0.0));
        tracker.on_event(ts(1.5));

        let closed = tracker.flush().unwrap().expect("flushed");
        assert_eq!(closed.end_time, ts(1.5));
        assert!(!tracker.is_active());
    }

    #[test]
    fn backwards_clock_never_counts_as_idle() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        tracker.on_event(ts(10.0));
        tracker.on_event(ts(12.0));

        assert!(tracker.check_idle(ts(0.0), 0.5).unwrap().is_none());
        assert!(tracker.is_active());
    }

    #[test]
    fn backwards_event_does_not_shrink_session() {
        let store = Arc::new(MemoryStore::default());
        let tracker = tracker(&store);
        tracker.on_event(ts(10.0));
        tracker.on_event(ts(12.0));
        tracker.on_event(ts(5.0));

        let closed = tracker.flush().unwrap().expect("flushed");
        assert_eq!(closed.start_time, ts(10.0));
        assert_eq!(closed.end_time, ts(12.0));
    }

    #[test]
    fn failed_append_keeps_session_open_for_retry() {
        let sink = Arc::new(FailingSink::default());
        let tracker = SessionTracker::new(InputType::Keyboard, Arc::clone(&sink));
        tracker.on_event(ts(0.0));
        tracker.on_event(ts(2.0));

        assert!(tracker.check_idle(ts(10.0), 3.0).is_err());
        assert!(tracker.is_active());
        assert_eq!(tracker.state().last_event_time, Some(ts(2.0)));
    }

    #[test]
    fn concurrent_events_and_idle_checks_lose_nothing() {
        let store = Arc::new(MemoryStore::default());
        let tracker = Arc::new(tracker(&store));

        let producer = {
            let tracker = Arc::clone(&tracker);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    tracker.on_event(ts(f64::from(i)));
                }
            })
        };
        for _ in 0..1000 {
            tracker.check_idle(ts(0.0), 3.0).unwrap();
        }
        producer.join().unwrap();

        // Event times only move forward, so nothing is ever idle at t=0.
        assert_eq!(store.append_calls(), 0);
        let closed = tracker.flush().unwrap().expect("flushed");
        assert_eq!(closed.start_time, ts(0.0));
        assert_eq!(closed.end_time, ts(999.0));
    }
}
