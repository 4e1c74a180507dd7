//! TOML configuration for the receiver.
//!
//! Loaded from `--config` or `<platform config dir>/receiver.toml`.  A
//! missing file means "all defaults"; a partial file overrides only the
//! fields it names.
//!
//! ```toml
//! [receiver]
//! log_level = "info"
//!
//! [network]
//! bind_address = "0.0.0.0"
//! tcp_port = 24900
//! udp_port = 24901
//!
//! [replay]
//! motion_tick_ms = 8
//! step_threshold = 12
//! max_substeps = 4
//! stick_deadzone = 250
//!
//! [keyboard]
//! repeat_delay_ms = 200
//! repeat_rate_hz = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use padlink_core::paths::platform_config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::keyboard_emitter::RepeatTiming;
use crate::application::replay_input::ReplaySettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level receiver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReceiverConfig {
    #[serde(default)]
    pub receiver: GeneralConfig,
    #[serde(default)]
    pub network: ListenConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where the listener binds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,
}

/// Motion coalescing and stick handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplayConfig {
    /// Motion flush period in milliseconds.
    #[serde(default = "default_motion_tick_ms")]
    pub motion_tick_ms: u64,
    #[serde(default = "default_step_threshold")]
    pub step_threshold: i32,
    #[serde(default = "default_max_substeps")]
    pub max_substeps: usize,
    /// On the `[-1000, 1000]` axis scale.
    #[serde(default = "default_stick_deadzone")]
    pub stick_deadzone: i32,
}

/// Auto-repeat timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyboardConfig {
    #[serde(default = "default_repeat_delay_ms")]
    pub repeat_delay_ms: u64,
    #[serde(default = "default_repeat_rate_hz")]
    pub repeat_rate_hz: u32,
}

impl ReplayConfig {
    pub fn motion_tick(&self) -> Duration {
        Duration::from_millis(self.motion_tick_ms.max(1))
    }

    pub fn settings(&self) -> ReplaySettings {
        ReplaySettings {
            step_threshold: self.step_threshold,
            max_substeps: self.max_substeps,
            stick_deadzone: self.stick_deadzone,
        }
    }
}

impl KeyboardConfig {
    pub fn timing(&self) -> RepeatTiming {
        RepeatTiming::new(self.repeat_delay_ms, self.repeat_rate_hz)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_tcp_port() -> u16 {
    24900
}
fn default_udp_port() -> u16 {
    24901
}
fn default_motion_tick_ms() -> u64 {
    8
}
fn default_step_threshold() -> i32 {
    12
}
fn default_max_substeps() -> usize {
    4
}
fn default_stick_deadzone() -> i32 {
    250
}
fn default_repeat_delay_ms() -> u64 {
    200
}
fn default_repeat_rate_hz() -> u32 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            tcp_port: default_tcp_port(),
            udp_port: default_udp_port(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            motion_tick_ms: default_motion_tick_ms(),
            step_threshold: default_step_threshold(),
            max_substeps: default_max_substeps(),
            stick_deadzone: default_stick_deadzone(),
        }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            repeat_delay_ms: default_repeat_delay_ms(),
            repeat_rate_hz: default_repeat_rate_hz(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves `receiver.toml` inside the platform config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("receiver.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `explicit`, or the platform default path.  A missing file yields
/// `ReceiverConfig::default()`.
///
/// # Errors
///
/// [`ConfigError::Io`] for read failures other than "not found",
/// [`ConfigError::Parse`] for malformed TOML.
pub fn load_config(explicit: Option<&Path>) -> Result<ReceiverConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ReceiverConfig::default()),
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
