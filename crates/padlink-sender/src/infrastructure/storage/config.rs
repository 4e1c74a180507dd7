//! TOML configuration for the sender.
//!
//! Read from an explicit path (`--config`) or from the platform config dir:
//! - Windows:  `%APPDATA%\Padlink\sender.toml`
//! - Linux:    `~/.config/padlink/sender.toml`
//! - macOS:    `~/Library/Application Support/Padlink/sender.toml`
//!
//! ```toml
//! [sender]
//! log_level = "debug"
//!
//! [pump]
//! tick_ms = 3
//!
//! [network]
//! receiver_host = "192.168.1.20"
//! tcp_port = 24900
//! udp_port = 24901
//! ```
//!
//! Every field has a `#[serde(default = "...")]` so a partial file, or no
//! file at all, still yields a usable configuration.

use std::path::{Path, PathBuf};

use padlink_core::paths::platform_config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level sender configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SenderConfig {
    #[serde(default)]
    pub sender: GeneralConfig,
    #[serde(default)]
    pub pump: PumpConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Coalescing pump tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpConfig {
    /// Flush period in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Where the receiver listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Hostname or IP of the receiver.
    #[serde(default = "default_receiver_host")]
    pub receiver_host: String,
    /// Reliable (ordered) channel port.
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,
    /// Unreliable (datagram) channel port.
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_tick_ms() -> u64 {
    3
}
fn default_receiver_host() -> String {
    "127.0.0.1".to_string()
}
fn default_tcp_port() -> u16 {
    24900
}
fn default_udp_port() -> u16 {
    24901
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            receiver_host: default_receiver_host(),
            tcp_port: default_tcp_port(),
            udp_port: default_udp_port(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves `sender.toml` inside the platform config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("sender.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration from `explicit`, or from [`config_file_path`]
/// when no path is given.  A missing file yields `SenderConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(explicit: Option<&Path>) -> Result<SenderConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    load_config_from(&path)
}

/// Loads the configuration from exactly `path`.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from(path: &Path) -> Result<SenderConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SenderConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
