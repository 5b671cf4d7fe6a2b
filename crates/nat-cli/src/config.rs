//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use nat_core::{DEFAULT_IDLE_THRESHOLD_SECS, DEFAULT_TICK_INTERVAL, MIN_IDLE_THRESHOLD_SECS};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Seconds without input before a session is closed.
    /// Values below 0.5 are raised to 0.5.
    pub idle_threshold_seconds: f64,

    /// Milliseconds between idle checks.
    pub tick_interval_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("idle_threshold_seconds", &self.idle_threshold_seconds)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("data.db"),
            idle_threshold_seconds: DEFAULT_IDLE_THRESHOLD_SECS,
            tick_interval_ms: u64::try_from(DEFAULT_TICK_INTERVAL.as_millis()).unwrap_or(500),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (NAT_*)
        figment = figment.merge(Env::prefixed("NAT_"));

        let mut config: Self = figment.extract()?;
        config.idle_threshold_seconds = config.idle_threshold_seconds.max(MIN_IDLE_THRESHOLD_SECS);
        Ok(config)
    }

    /// Time between idle checks, never zero.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Returns the platform-specific config directory for nat.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("nat"))
}

/// Returns the platform-specific data directory for nat.
///
/// On Linux: `~/.local/share/nat`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("nat"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_nat() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "nat");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("data.db"));
        assert!((config.idle_threshold_seconds - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_config_file_overrides_defaults_and_clamps_threshold() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/nat-test.db\"\nidle_threshold_seconds = 0.1\ntick_interval_ms = 0\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/nat-test.db"));
        assert!((config.idle_threshold_seconds - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }
}
