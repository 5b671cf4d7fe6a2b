//! Daily command: cumulative active time per day.

use std::collections::BTreeMap;
use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use nat_core::{AggregationService, Scope, format_duration};
use nat_db::SessionStore;

use super::util::{describe_scope, progress_bar};

/// Formats one line per day in `scope`, including days without activity.
pub fn format_daily(scope: &Scope, totals: &BTreeMap<NaiveDate, f64>) -> String {
    let mut output = String::new();

    writeln!(output, "DAILY ACTIVITY: {}", describe_scope(scope)).unwrap();
    writeln!(output).unwrap();

    let max = totals.values().copied().fold(0.0, f64::max);
    let (start, end) = scope.bounds();
    let mut total = 0.0;
    for date in start.iter_days().take_while(|d| *d <= end) {
        let seconds = totals.get(&date).copied().unwrap_or_default();
        total += seconds;
        writeln!(
            output,
            "{}  {:<3}  {}  {:>11}",
            date,
            date.format("%a"),
            progress_bar(seconds, max),
            format_duration(seconds)
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Total: {}", format_duration(total)).unwrap();

    output
}

/// Formats totals as a JSON object keyed by date. Days without activity
/// are omitted.
pub fn format_daily_json(totals: &BTreeMap<NaiveDate, f64>) -> Result<String> {
    Ok(serde_json::to_string_pretty(totals)?)
}

/// Runs the daily command.
pub fn run(store: &SessionStore, scope: &Scope, json: bool) -> Result<()> {
    let totals = AggregationService::new(store).daily_merged_totals(scope)?;
    if json {
        println!("{}", format_daily_json(&totals)?);
    } else {
        print!("{}", format_daily(scope, &totals));
    }
    Ok(())
}
