// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations of the files and directories that the various
//! utilities read from, or write into. None of these functions check whether
//! the path returned actually exists.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/toolbelt/config.toml`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("toolbelt").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to user's music library.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn music_dir() -> Result<PathBuf> {
    dirs::audio_dir()
        .map_or_else(|| home_dir().map(|home| home.join("Music")), Ok)
}

/// Determine default absolute path to user's downloads directory.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn downloads_dir() -> Result<PathBuf> {
    dirs::download_dir()
        .map_or_else(|| home_dir().map(|home| home.join("Downloads")), Ok)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
