// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Every utility works out of the box without a configuration file. The
//! optional file at `$XDG_CONFIG_HOME/toolbelt/config.toml` only overrides
//! defaults for things that are inherently personal, e.g., where the music
//! library lives, which load-shedding zone the user is in, or which GTK theme
//! counts as the dark one.
//!
//! # General Layout
//!
//! ```toml
//! [music]
//! library = "~/Music"
//! downloads = "~/Downloads"
//! bucket_size = 255
//! downloader = "youtube-dl"
//!
//! [loadshed]
//! zone = 3
//! lead_minutes = 10
//!
//! [desktop]
//! dark_theme = "Adwaita-dark"
//! light_theme = "Adwaita"
//!
//! [repos]
//! root = "~/src"
//! depth = 2
//!
//! [shortcut]
//! icon = "firefox"
//! ```

use crate::path;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Full configuration layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Music download and distribution settings.
    pub music: MusicSettings,

    /// Load-shedding shutdown scheduler settings.
    pub loadshed: LoadshedSettings,

    /// Desktop toggle settings.
    pub desktop: DesktopSettings,

    /// Repository status summary settings.
    pub repos: ReposSettings,

    /// Shortcut conversion settings.
    pub shortcut: ShortcutSettings,
}

impl Config {
    /// Load configuration from target path.
    ///
    /// A missing file is not an error, defaults are used instead.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file exists but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file content is invalid.
    /// - Return [`ConfigError::ShellExpansion`] if path expansion fails.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no configuration at {:?}, using defaults", path.display());
            return "".parse();
        }

        debug!("load configuration from {:?}", path.display());
        read_to_string(path)
            .map_err(|err| ConfigError::Read {
                source: err,
                path: path.to_path_buf(),
            })?
            .parse()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        config.music.library = expand_path(&config.music.library)?;
        config.music.downloads = expand_path(&config.music.downloads)?;
        config.repos.root = expand_path(&config.repos.root)?;

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Music download and distribution settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MusicSettings {
    /// Reference copy of the music library.
    pub library: PathBuf,

    /// Directory that downloads land in.
    pub downloads: PathBuf,

    /// Number of songs per distribution bucket.
    pub bucket_size: usize,

    /// Downloader binary, e.g., youtube-dl or yt-dlp.
    pub downloader: String,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            library: path::music_dir().unwrap_or_else(|_| PathBuf::from("~/Music")),
            downloads: path::downloads_dir().unwrap_or_else(|_| PathBuf::from("~/Downloads")),
            bucket_size: 255,
            downloader: "youtube-dl".into(),
        }
    }
}

/// Load-shedding shutdown scheduler settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadshedSettings {
    /// City of Cape Town load-shedding zone.
    pub zone: u32,

    /// Minutes before a power cut at which to shut down.
    pub lead_minutes: i64,

    /// Minutes between the shutdown notice and the actual shutdown.
    pub grace_minutes: i64,

    /// Base URL of load-shedding API.
    pub api_url: String,

    /// Notification body shown before shutting down.
    pub notice: String,
}

impl Default for LoadshedSettings {
    fn default() -> Self {
        Self {
            zone: 3,
            lead_minutes: 10,
            grace_minutes: 5,
            api_url: "https://ewn.co.za/assets/loadshedding/api".into(),
            notice: "Shutting down in 5min".into(),
        }
    }
}

/// Desktop toggle settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DesktopSettings {
    /// GTK theme used in dark mode.
    pub dark_theme: String,

    /// GTK theme used in light mode.
    pub light_theme: String,

    /// Latency passed to PulseAudio loopback module.
    pub loopback_latency_msec: u32,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            dark_theme: "Adwaita-dark".into(),
            light_theme: "Adwaita".into(),
            loopback_latency_msec: 1,
        }
    }
}

/// Repository status summary settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReposSettings {
    /// Directory to scan for repositories.
    pub root: PathBuf,

    /// Maximum directory depth to scan.
    pub depth: usize,
}

impl Default for ReposSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            depth: 2,
        }
    }
}

/// Shortcut conversion settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShortcutSettings {
    /// Icon name written into `.desktop` files.
    pub icon: String,
}

impl Default for ShortcutSettings {
    fn default() -> Self {
        Self {
            icon: "firefox".into(),
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("BLAH", "/home/blah")])]
    fn deserialize_config() -> anyhow::Result<()> {
        let result: Config = r#"
            [music]
            library = "$BLAH/Music"
            downloads = "$BLAH/Downloads"
            bucket_size = 100
            downloader = "yt-dlp"

            [loadshed]
            zone = 7

            [repos]
            root = "$BLAH/src"
            depth = 3
        "#
        .parse()?;

        assert_eq!(result.music.library, PathBuf::from("/home/blah/Music"));
        assert_eq!(result.music.downloads, PathBuf::from("/home/blah/Downloads"));
        assert_eq!(result.music.bucket_size, 100);
        assert_eq!(result.music.downloader, "yt-dlp");
        assert_eq!(result.loadshed.zone, 7);
        assert_eq!(result.loadshed.lead_minutes, 10);
        assert_eq!(result.repos.root, PathBuf::from("/home/blah/src"));
        assert_eq!(result.repos.depth, 3);
        assert_eq!(result.desktop, DesktopSettings::default());
        assert_eq!(result.shortcut.icon, "firefox");

        Ok(())
    }

    #[sealed_test]
    fn missing_file_gives_defaults() -> anyhow::Result<()> {
        let result = Config::load("does-not-exist.toml")?;
        assert_eq!(result.music.bucket_size, 255);
        assert_eq!(result.loadshed.zone, 3);
        assert_eq!(result.repos.root, PathBuf::from("."));

        Ok(())
    }

    #[test]
    fn serialize_round_trips() -> anyhow::Result<()> {
        let mut config = Config::default();
        config.music.library = PathBuf::from("/music");
        config.music.downloads = PathBuf::from("/downloads");
        config.desktop.dark_theme = "Yaru-dark".into();

        let result: Config = config.to_string().parse()?;
        assert_eq!(result, config);

        Ok(())
    }

    #[test]
    fn reject_unknown_types() {
        let result = "[music]\nbucket_size = \"lots\"".parse::<Config>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }
}
