//! Per-platform locations shared by the sender and receiver binaries.
//!
//! - Windows:  `%APPDATA%\Padlink`
//! - Linux:    `$XDG_CONFIG_HOME/padlink` or `~/.config/padlink`
//! - macOS:    `~/Library/Application Support/Padlink`

use std::path::PathBuf;

/// Directory holding `sender.toml` and `receiver.toml`, or `None` when the
/// platform base directory cannot be determined.
pub fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Padlink"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("padlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Padlink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
