//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use nat_core::{InputType, Scope, ValidationError};

/// Mouse and keyboard activity tracker.
///
/// Groups input events into active-use sessions separated by idle gaps and
/// reports how much time was spent at the machine.
#[derive(Debug, Parser)]
#[command(name = "nat", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track activity from input events read on stdin.
    ///
    /// Each line is `mouse`, `keyboard` or `threshold <seconds>`.
    /// Stops on end of input or Ctrl-C, saving any open session.
    Run,

    /// List recorded sessions.
    Sessions {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Only show sessions of this input type (mouse or keyboard).
        #[arg(long = "type")]
        input_type: Option<InputType>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show mouse, keyboard and cumulative usage totals.
    Summary {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show cumulative active time per day.
    Daily {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List dates that have recorded activity, newest first.
    Dates {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show database location and most recent activity.
    Status,
}

/// Date scope shared by the query commands. Defaults to today.
#[derive(Debug, Clone, Default, Args)]
pub struct ScopeArgs {
    /// A single day (YYYY-MM-DD).
    #[arg(long, conflicts_with_all = ["from", "to", "week", "month"])]
    pub date: Option<NaiveDate>,

    /// First day of an inclusive range (YYYY-MM-DD).
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day of an inclusive range (YYYY-MM-DD).
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// The Monday-to-Sunday week containing this day.
    #[arg(long, conflicts_with_all = ["from", "to", "month"])]
    pub week: Option<NaiveDate>,

    /// The calendar month containing this day.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: Option<NaiveDate>,
}

impl ScopeArgs {
    /// Resolves the flags into a scope, falling back to `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<Scope, ValidationError> {
        if let (Some(start), Some(end)) = (self.from, self.to) {
            return Scope::range(start, end);
        }
        if let Some(date) = self.week {
            return Ok(Scope::week_of(date));
        }
        if let Some(date) = self.month {
            return Ok(Scope::month_of(date));
        }
        Ok(Scope::Day(self.date.unwrap_or(today)))
    }
}
