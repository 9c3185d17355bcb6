//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/oneview/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/oneview/` (~/.config/oneview/)
//! - Data: `$XDG_DATA_HOME/oneview/` (~/.local/share/oneview/)
//! - State/Logs: `$XDG_STATE_HOME/oneview/` (~/.local/state/oneview/)

use crate::analytics::filters::DateRange;
use crate::error::{Error, Result};
use crate::state::GoalPeriod;
use crate::types::OrgType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Organization profile
    #[serde(default)]
    pub organization: OrganizationConfig,

    /// Filter defaults
    #[serde(default)]
    pub filters: FilterDefaults,

    /// Leaderboard goal settings
    #[serde(default)]
    pub goals: GoalsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Organization profile used to gate agency-only metrics.
#[derive(Debug, Deserialize, Clone)]
pub struct OrganizationConfig {
    /// Display name
    #[serde(default = "default_org_name")]
    pub name: String,

    /// Staffing agency or internal talent acquisition
    #[serde(default)]
    pub org_type: OrgType,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: default_org_name(),
            org_type: OrgType::default(),
        }
    }
}

fn default_org_name() -> String {
    "OneView Ops".to_string()
}

/// Defaults applied when no persisted filters exist.
#[derive(Debug, Deserialize)]
pub struct FilterDefaults {
    /// Date range label (e.g. "Last 30 days")
    #[serde(default = "default_date_range_label")]
    pub default_date_range: String,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            default_date_range: default_date_range_label(),
        }
    }
}

impl FilterDefaults {
    /// The configured default range, falling back to Last 30 days.
    pub fn date_range(&self) -> DateRange {
        DateRange::from_label(&self.default_date_range).unwrap_or_default()
    }
}

fn default_date_range_label() -> String {
    DateRange::default().label().to_string()
}

/// Goal tracking configuration
#[derive(Debug, Deserialize, Default)]
pub struct GoalsConfig {
    /// Period used when initializing default targets
    #[serde(default)]
    pub period: GoalPeriod,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if DateRange::from_label(&self.filters.default_date_range).is_none() {
            return Err(Error::Config(format!(
                "filters.default_date_range must be one of {}",
                DateRange::ALL
                    .iter()
                    .map(|r| format!("{:?}", r.label()))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        if self.logging.max_files == 0 {
            return Err(Error::Config(
                "logging.max_files must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/oneview/config.toml` (~/.config/oneview/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("oneview").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/oneview/` (~/.local/share/oneview/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("oneview")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/oneview/` (~/.local/state/oneview/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("oneview")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/oneview/oneview.db` (~/.local/share/oneview/oneview.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("oneview.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/oneview/oneview.log` (~/.local/state/oneview/oneview.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("oneview.log")
    }
}
