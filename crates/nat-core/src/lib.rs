//! Session segmentation and aggregation for the activity tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Tracking: turning mouse and keyboard events into idle-bounded sessions
//! - Scheduling: evaluating idleness on a fixed cadence
//! - Aggregation: per-type and merged usage summaries over stored sessions
//!
//! Storage lives behind the [`SessionSink`] and [`SessionSource`] traits.

mod aggregate;
pub mod clock;
mod input_type;
mod merge;
mod monitor;
pub mod scheduler;
mod threshold;
mod tracker;
pub mod types;

#[cfg(test)]
mod testing;

pub use aggregate::{AggregationService, SessionSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use input_type::InputType;
pub use merge::merge_intervals;
pub use monitor::ActivityMonitor;
pub use scheduler::{CancellationFlag, DEFAULT_TICK_INTERVAL, IdleScheduler, SchedulerHandle};
pub use threshold::{DEFAULT_IDLE_THRESHOLD_SECS, IdleThreshold, MIN_IDLE_THRESHOLD_SECS};
pub use tracker::{OpenSessionState, SessionSink, SessionTracker};
pub use types::{
    Interval, MIN_SESSION_DURATION_SECS, Scope, Session, Summary, ValidationError,
    duration_secs, format_duration,
};
