//! Run command: track activity from input events read on stdin.
//!
//! Each line names one event (`mouse`, `keyboard`, or the shorthands `m` and
//! `k`) or adjusts the idle threshold (`threshold <seconds>`). Blank lines and
//! lines starting with `#` are ignored. Tracking stops at end of input or on
//! Ctrl-C, and any open sessions are saved before exit.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use nat_core::{
    ActivityMonitor, CancellationFlag, IdleThreshold, InputType, SessionSink, SystemClock,
};
use nat_db::SessionStore;

use crate::Config;

/// How often the input loop checks for Ctrl-C while stdin is quiet.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One parsed line of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    Event(InputType),
    Threshold(f64),
}

/// Parses one input line. Returns `None` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<InputCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let word = parts.next().unwrap_or_default().to_ascii_lowercase();
    let command = match word.as_str() {
        "m" | "mouse" => InputCommand::Event(InputType::Mouse),
        "k" | "keyboard" => InputCommand::Event(InputType::Keyboard),
        "threshold" => {
            let Some(value) = parts.next() else {
                bail!("threshold needs a value in seconds");
            };
            let secs: f64 = value
                .parse()
                .with_context(|| format!("invalid threshold: {value}"))?;
            if !secs.is_finite() {
                bail!("invalid threshold: {value}");
            }
            InputCommand::Threshold(secs)
        }
        _ => bail!("unrecognized input: {line}"),
    };

    if let Some(extra) = parts.next() {
        bail!("unexpected trailing input: {extra}");
    }
    Ok(Some(command))
}

/// Applies input lines to `monitor` until the channel closes or `stop` is set.
///
/// Unparseable lines are logged and skipped. Returns the number of input
/// events recorded.
pub fn pump<S: SessionSink + 'static>(
    lines: &Receiver<io::Result<String>>,
    monitor: &ActivityMonitor<S>,
    stop: &CancellationFlag,
) -> Result<u64> {
    let mut events = 0;
    while !stop.is_cancelled() {
        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line.context("failed to read input")?,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match parse_line(&line) {
            Ok(Some(InputCommand::Event(input_type))) => {
                monitor.record(input_type);
                events += 1;
            }
            Ok(Some(InputCommand::Threshold(secs))) => {
                let applied = monitor.threshold().set(secs);
                tracing::info!(requested = secs, applied, "idle threshold changed");
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "skipping input line"),
        }
    }
    Ok(events)
}

/// Takes an exclusive lock beside the database so only one tracker writes to it.
fn acquire_lock(database_path: &Path) -> Result<File> {
    let lock_path = database_path.with_extension("lock");
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    file.try_lock_exclusive().with_context(|| {
        format!(
            "another tracker is already running against {}",
            database_path.display()
        )
    })?;
    Ok(file)
}

/// Forwards stdin lines to a channel from a background thread.
fn spawn_stdin_reader() -> Result<Receiver<io::Result<String>>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(rx)
}

/// Runs the tracker until end of input or Ctrl-C.
pub fn run(store: SessionStore, config: &Config) -> Result<()> {
    let _lock = acquire_lock(&config.database_path)?;

    let stop = CancellationFlag::default();
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || handler_flag.cancel())
        .context("failed to install Ctrl-C handler")?;

    let mut monitor = ActivityMonitor::new(
        Arc::new(store),
        Arc::new(SystemClock),
        IdleThreshold::new(config.idle_threshold_seconds),
    );
    monitor
        .start(config.tick_interval())
        .context("failed to start idle scheduler")?;

    let lines = spawn_stdin_reader()?;
    let pumped = pump(&lines, &monitor, &stop);
    if stop.is_cancelled() {
        tracing::info!("interrupted, saving open sessions");
    }

    // Flush even when reading failed, then report whichever error came first.
    let flushed = monitor.shutdown().context("failed to save open sessions");
    let events = pumped?;
    let flushed = flushed?;
    tracing::info!(events, flushed, "tracking stopped");
    Ok(())
}
