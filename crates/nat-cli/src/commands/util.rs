//! Shared utilities for CLI commands.

use chrono::{Local, NaiveDate};
use nat_core::Scope;

/// Today's date on the local clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Human-readable description of a scope, e.g. `2025-01-13 to 2025-01-19`.
pub fn describe_scope(scope: &Scope) -> String {
    match *scope {
        Scope::Day(date) => date.to_string(),
        Scope::Range { start, end } => format!("{start} to {end}"),
    }
}

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value / max;
    let filled = if ratio < 0.05 && value > 0.0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn describe_day_and_range() {
        assert_eq!(describe_scope(&Scope::Day(day(15))), "2025-01-15");
        assert_eq!(
            describe_scope(&Scope::week_of(day(15))),
            "2025-01-13 to 2025-01-19"
        );
    }

    #[test]
    fn progress_bar_scales_to_max() {
        assert_eq!(progress_bar(0.0, 0.0), "░░░░░░░░░░");
        assert_eq!(progress_bar(0.0, 100.0), "░░░░░░░░░░");
        assert_eq!(progress_bar(1.0, 100.0), "█░░░░░░░░░");
        assert_eq!(progress_bar(50.0, 100.0), "█████░░░░░");
        assert_eq!(progress_bar(100.0, 100.0), "██████████");
        assert_eq!(progress_bar(250.0, 100.0), "██████████");
    }
}
