// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Song downloading and silence trimming.
//!
//! Songs are listed by URL in a __song list__, one per line. Many more sites
//! than YouTube are supported, e.g., SoundCloud and Bandcamp. Anything that
//! is not a URL is treated as a YouTube search query. The song list is
//! cleared once everything downloads successfully.
//!
//! # See Also
//!
//! - [youtube-dl supported sites](https://rg3.github.io/youtube-dl/supportedsites.html)
//! - [sox manual](http://sox.sourceforge.net/sox.html)

use crate::{music::list_mp3s, syscall::Syscall};

use indicatif::{ProgressBar, ProgressStyle};
use std::{
    ffi::{OsStr, OsString},
    fs::{remove_file, write},
    path::{Path, PathBuf},
};
use tracing::{error, info, instrument, warn};

/// Scratch file sox writes into while trimming.
const SCRATCH: &str = "_tmpsoxout.mp3";

/// Download options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Downloader binary.
    pub downloader: String,

    /// File containing URLs to download, relative to working directory.
    pub song_list: PathBuf,

    /// Download every song of any playlist a URL points to.
    pub playlist: bool,

    /// Keep going if a download fails.
    pub force: bool,

    /// Suppress download progress output.
    pub quiet: bool,

    /// Download songs at all.
    pub download: bool,

    /// Clear song list after successful download.
    pub clear: bool,

    /// Trim silence from songs afterwards.
    pub trim: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            downloader: "youtube-dl".into(),
            song_list: PathBuf::from("song-list.txt"),
            playlist: false,
            force: false,
            quiet: false,
            download: true,
            clear: true,
            trim: true,
        }
    }
}

/// Song downloader.
#[derive(Debug)]
pub struct Downloader<S: Syscall> {
    syscall: S,
    workdir: PathBuf,
    opts: DownloadOptions,
}

impl<S: Syscall> Downloader<S> {
    /// Construct new downloader operating in target working directory.
    pub fn new(syscall: S, workdir: impl Into<PathBuf>, opts: DownloadOptions) -> Self {
        Self {
            syscall,
            workdir: workdir.into(),
            opts,
        }
    }

    /// Download, clear song list, and trim, as options dictate.
    ///
    /// # Errors
    ///
    /// - Return [`DownloadError::MissingSongList`] if song list is needed but
    ///   does not exist.
    /// - Return [`DownloadError::Download`] if downloader fails.
    /// - Return [`DownloadError::Io`] if song list cannot be cleared.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> Result<()> {
        let song_list = self.workdir.join(&self.opts.song_list);
        if self.opts.download {
            if !song_list.is_file() {
                return Err(DownloadError::MissingSongList(song_list));
            }

            self.download(&song_list)?;

            if self.opts.clear {
                write(&song_list, "").map_err(|err| DownloadError::Io {
                    source: err,
                    path: song_list.clone(),
                })?;
                if !self.opts.quiet {
                    info!("download list cleared");
                }
            }
        }

        if self.opts.trim {
            self.trim_silence()?;
        }

        Ok(())
    }

    /// Assemble downloader arguments.
    pub fn download_args(&self, song_list: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--extract-audio".into(),
            "--audio-format".into(),
            "mp3".into(),
            "--audio-quality".into(),
            "0".into(),
            "--geo-bypass".into(),
        ];

        if self.opts.quiet {
            args.extend(["-q".into(), "--console-title".into()]);
        }

        if self.opts.force {
            args.push("--ignore-errors".into());
        }

        if self.opts.playlist {
            args.push("--yes-playlist".into());
        } else {
            args.push("--no-playlist".into());
        }

        let template = self.workdir.join("%(title)s.%(ext)s");
        args.extend([
            "--default-search".into(),
            "ytsearch".into(),
            "-a".into(),
            song_list.as_os_str().to_os_string(),
            "--output".into(),
            template.into_os_string(),
        ]);

        args
    }

    fn download(&self, song_list: &Path) -> Result<()> {
        info!("download songs listed in {:?}", song_list.display());
        self.syscall
            .interactive(&self.opts.downloader, self.download_args(song_list))
            .map_err(DownloadError::Download)
    }

    /// Trim leading and trailing silence from every MP3 in working directory.
    ///
    /// Failing to trim one song is reported, but does not stop the rest from
    /// being trimmed. Returns number of songs trimmed successfully.
    ///
    /// # Errors
    ///
    /// - Return [`DownloadError::Glob`] if working directory cannot be listed.
    /// - Return [`DownloadError::Io`] if scratch file cannot be removed.
    #[instrument(skip(self), level = "debug")]
    pub fn trim_silence(&self) -> Result<usize> {
        let scratch = self.workdir.join(SCRATCH);
        let songs = list_mp3s(&self.workdir)?
            .into_iter()
            .filter(|song| song != &scratch)
            .collect::<Vec<_>>();

        let bar = ProgressBar::new(songs.len() as u64);
        if self.opts.quiet {
            bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        }
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<40}  [{wide_bar:.yellow/blue}] {pos}/{len}",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);

        let mut trimmed = 0;
        for song in &songs {
            let name = song
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            bar.set_message(name.clone());

            match self.trim_one(song, &scratch) {
                Ok(()) => {
                    trimmed += 1;
                    if !self.opts.quiet {
                        bar.suspend(|| info!("silence trimmed from {name}"));
                    }
                }
                Err(err) => bar.suspend(|| error!("could not trim silence from {name}: {err}")),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        if scratch.exists() {
            remove_file(&scratch).map_err(|err| DownloadError::Io {
                source: err,
                path: scratch.clone(),
            })?;
            if !self.opts.quiet {
                info!("temporary file deleted");
            }
        }

        if trimmed < songs.len() {
            warn!("trimmed {trimmed} of {} songs", songs.len());
        }

        Ok(trimmed)
    }

    fn trim_one(&self, song: &Path, scratch: &Path) -> Result<(), crate::syscall::SyscallError> {
        // Silence is only trimmed off the front, so reverse to trim the end.
        self.syscall.non_interactive(
            "sox",
            [
                song.as_os_str(),
                scratch.as_os_str(),
                OsStr::new("reverse"),
                OsStr::new("silence"),
                OsStr::new("1"),
                OsStr::new("0.1"),
                OsStr::new("0.1%"),
                OsStr::new("reverse"),
            ],
        )?;
        self.syscall.non_interactive(
            "sox",
            [
                scratch.as_os_str(),
                song.as_os_str(),
                OsStr::new("silence"),
                OsStr::new("1"),
                OsStr::new("0.1"),
                OsStr::new("0.1%"),
            ],
        )?;

        Ok(())
    }
}

/// Song download error types.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Song list to download from does not exist.
    #[error("could not find song list {:?}", .0.display())]
    MissingSongList(PathBuf),

    /// Downloader exited unsuccessfully.
    #[error("could not download from list")]
    Download(#[source] crate::syscall::SyscallError),

    /// Working directory cannot be listed.
    #[error(transparent)]
    Glob(#[from] glob::PatternError),

    /// Progress bar template is invalid.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// File cannot be written or removed.
    #[error("failed to access {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = DownloadError> = std::result::Result<T, E>;
