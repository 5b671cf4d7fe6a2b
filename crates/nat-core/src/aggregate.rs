//! Per-type and merged usage statistics over stored sessions.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::input_type::InputType;
use crate::merge::merge_intervals;
use crate::types::{Interval, Scope, Session, Summary};

/// Read side of session storage.
pub trait SessionSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sessions whose start date falls in `scope`, ordered by start time.
    fn sessions_for(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Vec<Session>, Self::Error>;

    /// Sum, count and mean of raw session durations in `scope`.
    fn summary_for(&self, scope: &Scope, input_type: Option<InputType>)
    -> Result<Summary, Self::Error>;

    /// Dates with at least one session, newest first.
    fn distinct_dates(&self) -> Result<Vec<NaiveDate>, Self::Error>;
}

/// Answers usage queries, merging mouse and keyboard time where needed.
#[derive(Debug, Clone, Copy)]
pub struct AggregationService<'a, S> {
    source: &'a S,
}

impl<'a, S: SessionSource> AggregationService<'a, S> {
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn sessions(
        &self,
        scope: &Scope,
        input_type: Option<InputType>,
    ) -> Result<Vec<Session>, S::Error> {
        self.source.sessions_for(scope, input_type)
    }

    /// Raw summary for one input type, or for every session when `None`.
    ///
    /// Sessions of different types may overlap, so the untyped total can
    /// exceed wall-clock time; use [`Self::merged_summary`] for that.
    pub fn summary(&self, scope: &Scope, input_type: Option<InputType>) -> Result<Summary, S::Error> {
        self.source.summary_for(scope, input_type)
    }

    /// Summary for a single input type. Sessions of one type never overlap.
    pub fn summary_by_type(&self, input_type: InputType, scope: &Scope) -> Result<Summary, S::Error> {
        self.source.summary_for(scope, Some(input_type))
    }

    /// Summary over the union of all sessions in `scope`.
    ///
    /// `total_duration` is real active time and `session_count` is the number
    /// of merged intervals, not stored rows.
    pub fn merged_summary(&self, scope: &Scope) -> Result<Summary, S::Error> {
        let sessions = self.source.sessions_for(scope, None)?;
        let merged = merge_sessions(sessions);
        Ok(Summary::from_durations(
            merged.iter().map(Interval::duration_secs),
        ))
    }

    /// Merged active seconds per calendar date in `scope`.
    ///
    /// Each session counts toward its start date only, even when it runs past
    /// midnight. Dates without sessions are absent.
    pub fn daily_merged_totals(&self, scope: &Scope) -> Result<BTreeMap<NaiveDate, f64>, S::Error> {
        let mut by_date: BTreeMap<NaiveDate, Vec<Session>> = BTreeMap::new();
        for session in self.source.sessions_for(scope, None)? {
            by_date.entry(session.date()).or_default().push(session);
        }
        Ok(by_date
            .into_iter()
            .map(|(date, sessions)| {
                let total = merge_sessions(sessions)
                    .iter()
                    .map(Interval::duration_secs)
                    .sum();
                (date, total)
            })
            .collect())
    }

    pub fn available_dates(&self) -> Result<Vec<NaiveDate>, S::Error> {
        self.source.distinct_dates()
    }
}

fn merge_sessions(mut sessions: Vec<Session>) -> Vec<Interval> {
    sessions.sort_by_key(|s| s.start_time);
    let intervals: Vec<Interval> = sessions.iter().map(Session::interval).collect();
    merge_intervals(&intervals)
}
