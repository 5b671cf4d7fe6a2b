//! Summary command: per-type and cumulative usage over a scope.
//!
//! Cumulative figures merge overlapping mouse and keyboard sessions, so they
//! report real time at the machine rather than the sum of both columns.

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use nat_core::{AggregationService, InputType, Scope, SessionSource, Summary, format_duration};
use nat_db::SessionStore;
use serde::Serialize;

use super::util::describe_scope;

/// Summaries for one scope.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mouse: Summary,
    pub keyboard: Summary,
    pub cumulative: Summary,
}

/// Computes per-type and merged summaries for `scope`.
pub fn build_report<S: SessionSource>(source: &S, scope: &Scope) -> Result<SummaryReport, S::Error> {
    let service = AggregationService::new(source);
    let (start, end) = scope.bounds();
    Ok(SummaryReport {
        start,
        end,
        mouse: service.summary_by_type(InputType::Mouse, scope)?,
        keyboard: service.summary_by_type(InputType::Keyboard, scope)?,
        cumulative: service.merged_summary(scope)?,
    })
}

/// Formats a report for human-readable output.
pub fn format_summary(scope: &Scope, report: &SummaryReport) -> String {
    let mut output = String::new();

    writeln!(output, "ACTIVITY: {}", describe_scope(scope)).unwrap();
    writeln!(output).unwrap();

    if report.cumulative.session_count == 0 {
        writeln!(output, "No activity recorded.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: Run 'nat dates' to list days with recorded activity."
        )
        .unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<10}  {:>10}  {:>8}  {:>10}",
        "Type", "Total", "Sessions", "Average"
    )
    .unwrap();
    writeln!(output, "──────────  ──────────  ────────  ──────────").unwrap();
    for (label, summary) in [
        ("Mouse", &report.mouse),
        ("Keyboard", &report.keyboard),
        ("Cumulative", &report.cumulative),
    ] {
        writeln!(
            output,
            "{:<10}  {:>10}  {:>8}  {:>10}",
            label,
            format_duration(summary.total_duration),
            summary.session_count,
            format_duration(summary.avg_duration)
        )
        .unwrap();
    }

    output
}

/// Formats a report as JSON.
pub fn format_summary_json(report: &SummaryReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Runs the summary command.
pub fn run(store: &SessionStore, scope: &Scope, json: bool) -> Result<()> {
    let report = build_report(store, scope)?;
    if json {
        println!("{}", format_summary_json(&report)?);
    } else {
        print!("{}", format_summary(scope, &report));
    }
    Ok(())
}
