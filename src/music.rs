// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Music library helpers.
//!
//! Two workflows live here. The first downloads songs listed in a plain text
//! file of URLs through youtube-dl (or any compatible fork), then trims
//! leading and trailing silence off every MP3 with sox. The second spreads
//! songs over numbered sub-directories on a USB stick for car stereos that
//! refuse to read more than a fixed number of files per directory.
//!
//! # See Also
//!
//! 1. [`download`]
//! 2. [`distribute`]

pub mod distribute;
pub mod download;

use glob::{glob_with, MatchOptions, Pattern};
use std::path::{Path, PathBuf};

/// List MP3 files directly inside target directory.
///
/// Result is sorted by file name, case-insensitively.
///
/// # Errors
///
/// - Return [`glob::PatternError`] if directory path cannot be used as a
///   glob pattern.
pub fn list_mp3s(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, glob::PatternError> {
    let escaped = Pattern::escape(dir.as_ref().to_string_lossy().as_ref());
    let pattern = format!("{escaped}/*.mp3");
    let opts = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut songs = glob_with(&pattern, opts)?
        .filter_map(std::result::Result::ok)
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    songs.sort_by_key(|path| file_name_key(path));

    Ok(songs)
}

/// Case-insensitive sort key of a path's file name.
pub(crate) fn file_name_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::fs::{create_dir, write};

    #[sealed_test]
    fn list_only_mp3_files() -> anyhow::Result<()> {
        let dir = std::env::current_dir()?.join("songs [2024]");
        create_dir(&dir)?;
        write(dir.join("b.mp3"), "")?;
        write(dir.join("A.mp3"), "")?;
        write(dir.join("c.ogg"), "")?;
        write(dir.join(".hidden.mp3"), "")?;
        create_dir(dir.join("d.mp3"))?;

        let result = list_mp3s(&dir)?
            .iter()
            .map(|path| file_name_key(path))
            .collect::<Vec<_>>();
        assert_eq!(result, vec!["a.mp3", "b.mp3"]);

        Ok(())
    }
}
