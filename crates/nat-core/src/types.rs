//! Core type definitions with validation.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input_type::InputType;

/// Sessions shorter than this many seconds are discarded, never stored.
pub const MIN_SESSION_DURATION_SECS: f64 = 0.5;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided string does not name an input type.
    #[error("unknown input type: {value}")]
    UnknownInputType { value: String },

    /// A date range whose start falls after its end.
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Seconds elapsed between two timestamps, at millisecond precision.
///
/// Negative when `end` precedes `start`.
#[allow(clippy::cast_precision_loss)]
pub fn duration_secs(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}

/// A persisted, immutable span of activity for one input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier assigned by the store.
    pub id: i64,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// `end_time - start_time` in seconds.
    pub duration: f64,
}

impl Session {
    /// The `[start, end]` span covered by this session.
    pub const fn interval(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Calendar date the session is bucketed under (its start date).
    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }
}

/// A `[start, end]` timestamp pair used during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration_secs(&self) -> f64 {
        duration_secs(self.start, self.end)
    }
}

/// Aggregate statistics over sessions or merged intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_duration: f64,
    pub session_count: u64,
    pub avg_duration: f64,
}

impl Summary {
    /// Builds a summary from individual durations in seconds.
    ///
    /// An empty input yields all-zero fields.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (total_duration, session_count) = durations
            .into_iter()
            .fold((0.0, 0_u64), |(total, count), d| (total + d, count + 1));
        let avg_duration = if session_count == 0 {
            0.0
        } else {
            total_duration / session_count as f64
        };
        Self {
            total_duration,
            session_count,
            avg_duration,
        }
    }
}

/// A calendar date or inclusive date range used to filter sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Day(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
}

impl Scope {
    /// Creates an inclusive range, rejecting `start > end`.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidRange { start, end });
        }
        Ok(Self::Range { start, end })
    }

    /// The Monday-to-Sunday week containing `date`, clipped to the
    /// representable calendar at either end.
    pub fn week_of(date: NaiveDate) -> Self {
        let start = date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
            .unwrap_or(NaiveDate::MIN);
        let end = start
            .checked_add_days(Days::new(6))
            .unwrap_or(NaiveDate::MAX);
        Self::Range { start, end }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date
            .checked_sub_days(Days::new(u64::from(date.day0())))
            .unwrap_or(NaiveDate::MIN);
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self::Range { start, end }
    }

    /// First and last date covered, inclusive.
    pub const fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            Self::Day(date) => (date, date),
            Self::Range { start, end } => (start, end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (start, end) = self.bounds();
        start <= date && date <= end
    }
}

/// Formats seconds for display as `Hh Mm Ss`, omitting leading zero units.
///
/// Rounds to whole seconds; negative input renders as `0s`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
