//! Configuration management
//!
//! Sections with serde defaults, loaded from an optional user config at
//! `~/.config/duebell/config.toml`. A missing file yields the defaults;
//! a malformed file is an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigResult;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Load from the default user config path, falling back to defaults
    /// when no file exists.
    pub fn load() -> ConfigResult<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Default user config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("duebell").join("config.toml"))
}

/// OS notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Acts as the permission gate: when false the OS channel is
    /// silently skipped.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Auto-close timeout for non-critical notifications
    #[serde(default = "default_notification_timeout")]
    pub timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: default_notification_timeout(),
        }
    }
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Playback volume, 0.0 to 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
        }
    }
}

/// Live alarm timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// How long after the due instant an event may still arm
    #[serde(default = "default_arm_window")]
    pub arm_window_secs: u64,
    /// Interval between repeated alarm tones
    #[serde(default = "default_repeat_interval")]
    pub repeat_interval_secs: u64,
    /// Armed alarms self-expire after this long
    #[serde(default = "default_expiry")]
    pub expiry_secs: u64,
}

impl AlarmConfig {
    pub fn arm_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.arm_window_secs as i64)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_secs(self.repeat_interval_secs)
    }

    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            arm_window_secs: default_arm_window(),
            repeat_interval_secs: default_repeat_interval(),
            expiry_secs: default_expiry(),
        }
    }
}

/// Logging settings, consumed by `logging::init_logging`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level filter, overridden by DUEBELL_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_output: bool,
    /// Log directory; platform data dir when unset
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            file_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_notification_timeout() -> u64 {
    5
}

fn default_volume() -> f32 {
    0.5
}

fn default_arm_window() -> u64 {
    60
}

fn default_repeat_interval() -> u64 {
    10
}

fn default_expiry() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}
