// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Song distribution over fixed-size buckets.
//!
//! Some car sound systems only read a fixed number of files per directory.
//! Songs copied onto a USB stick for such a system are therefore split
//! alphabetically into __buckets__ named `1x255`, `2x255`, and so on, each
//! holding at most 255 songs (the bucket size is configurable).
//!
//! # Distribution
//!
//! New songs are dropped loose into the root of the stick. Distribution first
//! moves every loose song into the first bucket, then walks the buckets in
//! order. A bucket that overflows pushes its trailing songs into the next
//! bucket, and a bucket that underflows pulls the leading songs of the next
//! bucket into itself. Buckets are assumed to already be sorted, so only
//! songs on a bucket boundary ever move.
//!
//! # Library Synchronization
//!
//! While walking the buckets, every song is checked against the reference
//! music library. Songs missing from the library were probably renamed or
//! deleted there, so the user is asked whether to remove them. Songs whose
//! content differs were probably edited, e.g., retagged, so the user is asked
//! whether to update them from the library.

use crate::{
    music::{file_name_key, list_mp3s},
    prompt::Prompter,
};

use mkdirp::mkdirp;
use std::{
    fs::{copy, read, read_dir, remove_file, rename},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Outcome of a distribution run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    /// Songs moved, with the bucket they finally ended up in.
    ///
    /// Kept in order of first move. A song moved several times is listed
    /// once.
    pub moved: Vec<(String, String)>,

    /// Songs removed because they are missing from the library.
    pub removed: Vec<String>,

    /// Songs updated from their library copy.
    pub updated: Vec<String>,
}

impl Report {
    fn record_move(&mut self, song: &str, bucket: &str) {
        match self.moved.iter_mut().find(|(name, _)| name == song) {
            Some((_, destination)) => *destination = bucket.to_string(),
            None => self.moved.push((song.to_string(), bucket.to_string())),
        }
    }
}

/// Distribute songs over buckets.
#[derive(Debug)]
pub struct Distributor<P: Prompter> {
    prompter: P,
    root: PathBuf,
    library: PathBuf,
    bucket_size: usize,
    compare: bool,
}

impl<P: Prompter> Distributor<P> {
    /// Construct new distributor.
    ///
    /// Buckets live directly inside `root`. Songs are checked against the
    /// `library`, comparing content only if `compare` is set.
    pub fn new(
        prompter: P,
        root: impl Into<PathBuf>,
        library: impl Into<PathBuf>,
        bucket_size: usize,
        compare: bool,
    ) -> Self {
        Self {
            prompter,
            root: root.into(),
            library: library.into(),
            bucket_size: bucket_size.max(1),
            compare,
        }
    }

    /// Name of bucket at given one-based index.
    pub fn bucket_name(&self, index: usize) -> String {
        format!("{index}x{}", self.bucket_size)
    }

    fn bucket_path(&self, index: usize) -> PathBuf {
        self.root.join(self.bucket_name(index))
    }

    /// Distribute loose songs and rebalance buckets.
    ///
    /// Aborts on the first I/O failure, leaving whatever was already moved
    /// where it is.
    ///
    /// # Errors
    ///
    /// - Return [`DistributeError::Io`] if a song cannot be listed, moved,
    ///   compared, copied, or removed.
    /// - Return [`DistributeError::Prompt`] if the user cannot be asked.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> Result<Report> {
        let mut report = Report::default();

        let loose = list_mp3s(&self.root)?;
        if !loose.is_empty() {
            info!("move {} loose songs into {}", loose.len(), self.bucket_name(1));
        }
        for song in loose {
            let name = file_name(&song);
            self.move_song(&name, &self.root, 1, &mut report)?;
        }

        let mut index = 1;
        while self.bucket_path(index).is_dir() {
            let bucket = self.bucket_path(index);
            debug!("check bucket {:?}", bucket.display());

            for song in list_songs(&bucket)? {
                self.check_synced(&song, &bucket, &mut report)?;
            }

            let songs = list_songs(&bucket)?;
            let next = self.bucket_path(index + 1);
            if songs.len() > self.bucket_size {
                for song in &songs[self.bucket_size..] {
                    self.move_song(song, &bucket, index + 1, &mut report)?;
                }
            } else if songs.len() < self.bucket_size && next.is_dir() {
                let wanted = self.bucket_size - songs.len();
                for song in list_songs(&next)?.iter().take(wanted) {
                    self.move_song(song, &next, index, &mut report)?;
                }
            }

            index += 1;
        }

        for (song, bucket) in &report.moved {
            println!("Moved \"{song}\" into {bucket}");
        }

        Ok(report)
    }

    fn move_song(
        &self,
        song: &str,
        from: &Path,
        to: usize,
        report: &mut Report,
    ) -> Result<()> {
        let bucket = self.bucket_path(to);
        mkdirp(&bucket).map_err(|err| io_error(err, &bucket))?;

        let source = from.join(song);
        let target = bucket.join(song);
        debug!("move {:?} to {:?}", source.display(), target.display());
        rename(&source, &target).map_err(|err| io_error(err, &source))?;
        report.record_move(song, &self.bucket_name(to));

        Ok(())
    }

    fn check_synced(&self, song: &str, bucket: &Path, report: &mut Report) -> Result<()> {
        let local = bucket.join(song);
        let reference = self.library.join(song);

        if !reference.is_file() {
            warn!("no file named {song:?} exists in {:?}", self.library.display());
            if self.prompter.confirm("Remove file?")? {
                remove_file(&local).map_err(|err| io_error(err, &local))?;
                info!("file removed");
                report.removed.push(song.to_string());
            }
        } else if self.compare && !same_content(&reference, &local)? {
            warn!("file {song:?} differs from that in {:?}", self.library.display());
            if self.prompter.confirm("Update file?")? {
                copy(&reference, &local).map_err(|err| io_error(err, &local))?;
                info!("file updated");
                report.updated.push(song.to_string());
            }
        }

        Ok(())
    }
}

/// List names of all files in directory, sorted case-insensitively.
fn list_songs(dir: &Path) -> Result<Vec<String>> {
    let mut songs = Vec::new();
    for entry in read_dir(dir).map_err(|err| io_error(err, dir))? {
        let entry = entry.map_err(|err| io_error(err, dir))?;
        if entry.path().is_file() {
            songs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    songs.sort_by_key(|song| file_name_key(Path::new(song)));

    Ok(songs)
}

fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let len_a = a.metadata().map_err(|err| io_error(err, a))?.len();
    let len_b = b.metadata().map_err(|err| io_error(err, b))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    Ok(read(a).map_err(|err| io_error(err, a))? == read(b).map_err(|err| io_error(err, b))?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn io_error(source: std::io::Error, path: &Path) -> DistributeError {
    DistributeError::Io {
        source,
        path: path.to_path_buf(),
    }
}

/// Song distribution error types.
#[derive(Debug, thiserror::Error)]
pub enum DistributeError {
    /// Song or bucket cannot be accessed.
    #[error("failed to access {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Root directory cannot be listed.
    #[error(transparent)]
    Glob(#[from] glob::PatternError),

    /// User cannot be asked about a song.
    #[error(transparent)]
    Prompt(#[from] crate::prompt::PromptError),
}

/// Friendly result alias :3
type Result<T, E = DistributeError> = std::result::Result<T, E>;
