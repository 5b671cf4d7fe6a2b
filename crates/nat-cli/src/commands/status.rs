//! Status command for showing where data lives and the latest activity.

use std::io::Write;

use anyhow::Result;
use nat_db::SessionStore;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, store: &SessionStore, config: &Config) -> Result<()> {
    let dates = store.list_dates()?;
    let last_end = store.last_session_end()?;

    writeln!(writer, "Activity tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(
        writer,
        "Idle threshold: {}s",
        config.idle_threshold_seconds
    )?;

    let Some(last_end) = last_end else {
        writeln!(writer, "No sessions recorded.")?;
        return Ok(());
    };

    writeln!(writer, "Days recorded: {}", dates.len())?;
    writeln!(
        writer,
        "Last session ended: {}",
        last_end.format("%Y-%m-%d %H:%M:%S")
    )?;

    Ok(())
}
