//! CLI subcommand implementations.

pub mod daily;
pub mod dates;
pub mod run;
pub mod sessions;
pub mod status;
pub mod summary;
pub mod util;
