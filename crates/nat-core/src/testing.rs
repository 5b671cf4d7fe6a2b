//! Test fixtures shared across the crate's unit tests.

use std::convert::Infallible;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use thiserror::Error;

use crate::aggregate::SessionSource;
use crate::input_type::InputType;
use crate::tracker::SessionSink;
use crate::types::{MIN_SESSION_DURATION_SECS, Scope, Session, Summary, duration_secs};

/// `secs` seconds after 2025-01-15 09:00:00.
#[allow(clippy::cast_possible_truncation)]
pub fn ts(secs: f64) -> NaiveDateTime {
    day(15).and_hms_opt(9, 0, 0).unwrap() + TimeDelta::milliseconds((secs * 1000.0).round() as i64)
}

/// A date in January 2025.
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

/// Vec-backed store applying the same minimum-duration policy as SQLite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<Session>>,
    appends: AtomicUsize,
}

impl MemoryStore {
    pub fn with_sessions<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (InputType, NaiveDateTime, NaiveDateTime)>,
    {
        let store = Self::default();
        for (input_type, start, end) in rows {
            store.append(input_type, start, end).unwrap();
        }
        store.appends.store(0, Ordering::SeqCst);
        store
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    fn matching(&self, scope: &Scope, input_type: Option<InputType>) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions()
            .into_iter()
            .filter(|s| scope.contains(s.date()))
            .filter(|s| input_type.is_none_or(|t| s.input_type == t))
            .collect();
        sessions.sort_by_key(|s| (s.start_time, s.id));
        sessions
    }
}

impl SessionSink for MemoryStore {
    type Error = Infallible;

    fn append(
        &self,
        input_type: InputType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<Session>, Self::Error> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        let duration = duration_secs(start, end);
        if duration < MIN_SESSION_DURATION_SECS {
            return Ok(None);
        }
        let mut sessions = self.sessions.lock().unwrap();
        let session = Session {
            id: i64::try_from(sessions.len()).unwrap() + 1,
            input_type,
            start_time: start,
            end_time: end,
            duration,
        };
        sessions.push(session.clone());
        Ok(Some(session))
    }
}

impl SessionSource for MemoryStore {
    type Error = Infallible;

    fn sessions_for(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Vec<Session>, Self::Error> {
        Ok(self.matching(scope, input_type))
    }

    fn summary_for(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Summary, Self::Error> {
        Ok(Summary::from_durations(
            self.matching(scope, input_type).iter().map(|s| s.duration),
        ))
    }

    fn distinct_dates(&self) -> Result<Vec<NaiveDate>, Self::Error> {
        let mut dates: Vec<NaiveDate> = self.sessions().iter().map(Session::date).collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }
}

#[derive(Debug, Error)]
#[error("sink unavailable")]
pub struct SinkDown;

/// A sink whose every append fails.
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SessionSink for FailingSink {
    type Error = SinkDown;

    fn append(
        &self,
        _input_type: InputType,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<Option<Session>, Self::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkDown)
    }
}
