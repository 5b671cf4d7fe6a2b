//! Sessions command: list recorded sessions in a scope.

use std::fmt::Write;

use anyhow::Result;
use nat_core::{InputType, Scope, Session, Summary, format_duration};
use nat_db::SessionStore;

use super::util::describe_scope;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats sessions as a table followed by a total line.
pub fn format_sessions(scope: &Scope, input_type: Option<InputType>, sessions: &[Session]) -> String {
    let mut output = String::new();

    match input_type {
        Some(kind) => writeln!(output, "SESSIONS ({kind}): {}", describe_scope(scope)).unwrap(),
        None => writeln!(output, "SESSIONS: {}", describe_scope(scope)).unwrap(),
    }
    writeln!(output).unwrap();

    if sessions.is_empty() {
        writeln!(output, "No sessions recorded.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:>5}  {:<8}  {:<19}  {:<19}  {:>10}",
        "ID", "Type", "Start", "End", "Duration"
    )
    .unwrap();
    for session in sessions {
        writeln!(
            output,
            "{:>5}  {:<8}  {:<19}  {:<19}  {:>10}",
            session.id,
            session.input_type,
            session.start_time.format(TIME_FORMAT),
            session.end_time.format(TIME_FORMAT),
            format_duration(session.duration)
        )
        .unwrap();
    }

    let summary = Summary::from_durations(sessions.iter().map(|s| s.duration));
    writeln!(output).unwrap();
    writeln!(
        output,
        "{} sessions, {} total",
        summary.session_count,
        format_duration(summary.total_duration)
    )
    .unwrap();

    output
}

/// Formats sessions as a JSON array.
pub fn format_sessions_json(sessions: &[Session]) -> Result<String> {
    Ok(serde_json::to_string_pretty(sessions)?)
}

/// Runs the sessions command.
pub fn run(
    store: &SessionStore,
    scope: &Scope,
    input_type: Option<InputType>,
    json: bool,
) -> Result<()> {
    let sessions = store.list_sessions(scope, input_type)?;
    if json {
        println!("{}", format_sessions_json(&sessions)?);
    } else {
        print!("{}", format_sessions(scope, input_type, &sessions));
    }
    Ok(())
}
