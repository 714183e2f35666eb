// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Conversion between Windows `.url` and freedesktop `.desktop` shortcuts.

use std::{
    fs::{read_dir, read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

/// Direction of conversion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[default]
    UrlToDesktop,
    DesktopToUrl,
}

impl Direction {
    /// Extension of files converted from.
    pub fn source_ext(self) -> &'static str {
        match self {
            Self::UrlToDesktop => "url",
            Self::DesktopToUrl => "desktop",
        }
    }

    /// Extension of files converted to.
    pub fn target_ext(self) -> &'static str {
        match self {
            Self::UrlToDesktop => "desktop",
            Self::DesktopToUrl => "url",
        }
    }
}

/// Convert shortcuts inside a directory.
///
/// Given file names are resolved against `dir`. With no file names, every
/// file in `dir` with the source extension is converted. Files that are
/// missing, have the wrong extension, or hold no URL are skipped with a
/// warning. Converted shortcuts keep the file stem of their source, and
/// `.desktop` shortcuts get the given icon.
///
/// Return paths of written shortcuts.
///
/// # Errors
///
/// - Return [`ConvertError::Io`] if `dir` cannot be listed, or a shortcut
///   cannot be read or written.
#[instrument(skip(files, dir), level = "debug")]
pub fn convert(
    files: &[PathBuf],
    direction: Direction,
    dir: impl AsRef<Path> + std::fmt::Debug,
    icon: &str,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let sources = if files.is_empty() {
        let mut found = Vec::new();
        for entry in read_dir(dir).map_err(|err| io_error(err, dir))? {
            let path = entry.map_err(|err| io_error(err, dir))?.path();
            if path.is_file() && has_ext(&path, direction.source_ext()) {
                found.push(path);
            }
        }
        found.sort();
        found
    } else {
        files.iter().map(|file| dir.join(file)).collect()
    };

    let mut written = Vec::new();
    for source in sources {
        if !source.is_file() {
            warn!("ignoring {:?} which was not found", source.display());
            continue;
        }

        if !has_ext(&source, direction.source_ext()) {
            warn!(
                "ignoring {:?} which does not have .{} extension",
                source.display(),
                direction.source_ext()
            );
            continue;
        }

        let content = read_to_string(&source).map_err(|err| io_error(err, &source))?;
        let Some(url) = extract_url(&content) else {
            warn!("ignoring {:?} which does not contain url", source.display());
            continue;
        };

        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = source.with_extension(direction.target_ext());
        let shortcut = match direction {
            Direction::UrlToDesktop => desktop_entry(&stem, url, icon),
            Direction::DesktopToUrl => internet_shortcut(url),
        };

        debug!("write {:?}", target.display());
        write(&target, shortcut).map_err(|err| io_error(err, &target))?;
        written.push(target);
    }

    Ok(written)
}

/// Extract URL from shortcut content.
///
/// The URL is everything after the first `=` on the first line that contains
/// `URL=`. An empty URL counts as none.
pub fn extract_url(content: &str) -> Option<&str> {
    content
        .lines()
        .find(|line| line.contains("URL="))
        .and_then(|line| line.trim().split_once('='))
        .map(|(_, url)| url)
        .filter(|url| !url.is_empty())
}

fn desktop_entry(name: &str, url: &str, icon: &str) -> String {
    format!("[Desktop Entry]\nEncoding=UTF-8\nName={name}\nType=Link\nURL={url}\nIcon={icon}\n")
}

fn internet_shortcut(url: &str) -> String {
    format!("[{{000214A0-0000-0000-C000-000000000046}}]\nProp3=19,11\n[InternetShortcut]\nIDList=\nURL={url}\n")
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|found| found == ext)
}

fn io_error(source: std::io::Error, path: &Path) -> ConvertError {
    ConvertError::Io {
        source,
        path: path.to_path_buf(),
    }
}

/// Shortcut conversion error types.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("failed to access {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[test_case("[InternetShortcut]\nURL=https://a.io/?q=1\n", Some("https://a.io/?q=1"); "keeps later equals")]
    #[test_case("Name=x\nURL=\n", None; "empty url")]
    #[test_case("[Desktop Entry]\nName=x\n", None; "no url")]
    #[test]
    fn extract_url_from_content(content: &str, expect: Option<&str>) {
        pretty_assertions::assert_eq!(extract_url(content), expect);
    }

    #[sealed_test]
    fn convert_all_url_files() -> anyhow::Result<()> {
        let dir = std::env::current_dir()?;
        write(
            dir.join("Rust Docs.url"),
            indoc! {"
                [InternetShortcut]
                URL=https://doc.rust-lang.org/std/?search=vec
            "},
        )?;
        write(dir.join("empty.url"), "[InternetShortcut]\n")?;
        write(dir.join("other.desktop"), "URL=https://example.com\n")?;

        let written = convert(&[], Direction::UrlToDesktop, &dir, "firefox")?;

        assert_eq!(written, vec![dir.join("Rust Docs.desktop")]);
        assert_eq!(
            read_to_string(dir.join("Rust Docs.desktop"))?,
            indoc! {"
                [Desktop Entry]
                Encoding=UTF-8
                Name=Rust Docs
                Type=Link
                URL=https://doc.rust-lang.org/std/?search=vec
                Icon=firefox
            "}
        );
        assert!(!dir.join("empty.desktop").exists());

        Ok(())
    }

    #[sealed_test]
    fn convert_given_desktop_files() -> anyhow::Result<()> {
        let dir = std::env::current_dir()?;
        write(
            dir.join("site.desktop"),
            "[Desktop Entry]\nName=site\nType=Link\nURL=https://example.com\n",
        )?;
        write(dir.join("site.url"), "stale")?;

        let files = vec![
            PathBuf::from("site.desktop"),
            PathBuf::from("missing.desktop"),
            PathBuf::from("site.url"),
        ];
        let written = convert(&files, Direction::DesktopToUrl, &dir, "firefox")?;

        assert_eq!(written, vec![dir.join("site.url")]);
        assert_eq!(
            read_to_string(dir.join("site.url"))?,
            indoc! {"
                [{000214A0-0000-0000-C000-000000000046}]
                Prop3=19,11
                [InternetShortcut]
                IDList=
                URL=https://example.com
            "}
        );

        Ok(())
    }
}
