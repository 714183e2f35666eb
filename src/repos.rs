// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git repository status summary.
//!
//! Walk a directory tree looking for git working trees, and report the state
//! of each one on a single line: current branch, commits ahead of or behind
//! upstream, pending changes, and stashes. Upstream remotes can optionally be
//! fetched beforehand so ahead/behind counts are current.

use crate::term::{Color, Style};

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    Branch, Config, ErrorCode, FetchOptions, RemoteCallbacks, Repository, Status, StatusOptions,
};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::{Path, PathBuf},
    time,
};
use tracing::{debug, info, instrument, warn};

const STAGED: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const MODIFIED: Status = Status::WT_MODIFIED
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);

/// Snapshot of a single repository.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub path: PathBuf,

    /// Checked out branch, or `(detached)`.
    pub branch: String,

    /// Commits ahead of and behind upstream, if the branch tracks one.
    pub upstream: Option<(usize, usize)>,

    pub staged: usize,
    pub modified: usize,
    pub untracked: usize,
    pub conflicted: usize,
    pub stashes: usize,
}

impl RepoStatus {
    /// Check if there is nothing to commit and nothing to push or pull.
    ///
    /// Stashes are not considered.
    pub fn is_clean(&self) -> bool {
        let in_sync = matches!(self.upstream, None | Some((0, 0)));
        in_sync && self.staged + self.modified + self.untracked + self.conflicted == 0
    }

    /// Render compact status markers, e.g. `↑2 +1 ?3`.
    pub fn markers(&self, style: &Style) -> String {
        let (ahead, behind) = self.upstream.unwrap_or_default();
        let markers = [
            ("\u{2191}", ahead, Color::Cyan),
            ("\u{2193}", behind, Color::Cyan),
            ("!", self.conflicted, Color::Red),
            ("+", self.staged, Color::Green),
            ("~", self.modified, Color::Yellow),
            ("?", self.untracked, Color::Magenta),
            ("$", self.stashes, Color::Blue),
        ]
        .into_iter()
        .filter(|(_, count, _)| *count > 0)
        .map(|(symbol, count, color)| style.color(&format!("{symbol}{count}"), color))
        .collect::<Vec<_>>();

        if markers.is_empty() {
            style.dim("clean")
        } else {
            markers.join(" ")
        }
    }
}

/// Find git working trees below a directory.
///
/// Root itself counts as depth zero. Hidden and ignored directories are
/// searched too, but nothing inside a `.git` directory is.
///
/// # Errors
///
/// - Return [`ReposError::Walk`] if the directory tree cannot be read.
#[instrument(skip(root), level = "debug")]
pub fn scan(root: impl AsRef<Path>, depth: usize) -> Result<Vec<PathBuf>> {
    debug!("scan {:?} for repositories", root.as_ref().display());
    let walker = WalkBuilder::new(root.as_ref())
        .standard_filters(false)
        .max_depth(Some(depth))
        .filter_entry(|entry| entry.file_name() != ".git")
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_some_and(|kind| kind.is_dir()) && entry.path().join(".git").exists()
        {
            found.push(entry.into_path());
        }
    }

    Ok(found)
}

/// Summarize state of repository at path.
///
/// # Errors
///
/// - Return [`ReposError::Git2`] if the repository cannot be inspected.
#[instrument(skip(path), level = "debug")]
pub fn summarize(path: impl AsRef<Path>) -> Result<RepoStatus> {
    let mut repo = Repository::open(path.as_ref())?;
    let mut status = RepoStatus {
        path: path.as_ref().to_path_buf(),
        branch: branch_name(&repo)?,
        upstream: ahead_behind(&repo)?,
        ..Default::default()
    };

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    for entry in repo.statuses(Some(&mut opts))?.iter() {
        let flags = entry.status();
        if flags.is_conflicted() {
            status.conflicted += 1;
            continue;
        }
        if flags.intersects(STAGED) {
            status.staged += 1;
        }
        if flags.intersects(MODIFIED) {
            status.modified += 1;
        }
        if flags.is_wt_new() {
            status.untracked += 1;
        }
    }

    repo.stash_foreach(|_, _, _| {
        status.stashes += 1;
        true
    })?;

    Ok(status)
}

fn branch_name(repo: &Repository) -> Result<String> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().unwrap_or("(unnamed)").to_string()),
        Ok(_) => Ok("(detached)".to_string()),
        // INVARIANT: Fresh repositories have a HEAD that points to nothing yet.
        Err(err) if err.code() == ErrorCode::UnbornBranch => {
            let head = repo.find_reference("HEAD")?;
            let target = head.symbolic_target().unwrap_or("(unborn)");
            Ok(target.trim_start_matches("refs/heads/").to_string())
        }
        Err(err) => Err(err.into()),
    }
}

fn ahead_behind(repo: &Repository) -> Result<Option<(usize, usize)>> {
    let Ok(head) = repo.head() else {
        return Ok(None);
    };
    if !head.is_branch() {
        return Ok(None);
    }

    let local = Branch::wrap(head);
    let upstream = match local.upstream() {
        Ok(upstream) => upstream,
        Err(err) if err.code() == ErrorCode::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    match (local.get().target(), upstream.get().target()) {
        (Some(local), Some(upstream)) => Ok(Some(repo.graph_ahead_behind(local, upstream)?)),
        _ => Ok(None),
    }
}

/// Fetch upstream remote of checked out branch.
///
/// Transfer progress is shown through the given progress bar. If credentials
/// are required, the user is prompted with the bar suspended. Repositories
/// without an upstream are left alone.
///
/// # Errors
///
/// - Return [`ReposError::Git2`] if the fetch fails.
/// - Return [`ReposError::IndicatifStyleTemplate`] if the bar cannot be styled.
#[instrument(skip(path, bar), level = "debug")]
pub fn fetch(path: impl AsRef<Path>, bar: ProgressBar) -> Result<()> {
    let repo = Repository::open(path.as_ref())?;
    let Some(remote) = upstream_remote(&repo)? else {
        debug!("no upstream for {:?}, skip fetch", path.as_ref().display());
        return Ok(());
    };

    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);
    bar.set_message(format!("{} ({remote})", path.as_ref().display()));
    bar.enable_steady_tick(time::Duration::from_millis(100));

    let prompter = IndicatifPrompter::new(bar);
    let authenticator = GitAuthenticator::default().set_prompter(prompter.clone());
    let config = Config::open_default()?;

    let mut throttle = time::Instant::now();
    let mut rc = RemoteCallbacks::new();
    rc.credentials(authenticator.credentials(&config));
    rc.transfer_progress(|progress| {
        if throttle.elapsed() > time::Duration::from_millis(10) {
            throttle = time::Instant::now();
            prompter.bar.set_length(progress.total_objects() as u64);
            prompter.bar.set_position(progress.received_objects() as u64);
        }
        true
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(rc);
    let result = repo
        .find_remote(&remote)
        .and_then(|mut origin| origin.fetch::<&str>(&[], Some(&mut fo), None));
    prompter.bar.finish_and_clear();
    result?;

    info!("fetched {remote} for {:?}", path.as_ref().display());
    Ok(())
}

fn upstream_remote(repo: &Repository) -> Result<Option<String>> {
    let Ok(head) = repo.head() else {
        return Ok(None);
    };
    let Some(name) = head.name().filter(|_| head.is_branch()) else {
        return Ok(None);
    };

    match repo.branch_upstream_remote(name) {
        Ok(remote) => Ok(remote.as_str().map(ToString::to_string)),
        Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Settings for a status summary run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReposOptions {
    pub root: PathBuf,
    pub depth: usize,

    /// Fetch upstream remotes first.
    pub fetch: bool,

    /// Only keep repositories that are not clean.
    pub dirty: bool,
}

/// Scan, optionally fetch, and summarize repositories.
///
/// Failing to fetch a single repository is reported and does not stop the
/// others from being summarized.
///
/// # Errors
///
/// - Return [`ReposError::Walk`] if the directory tree cannot be read.
/// - Return [`ReposError::Git2`] if a repository cannot be inspected.
#[instrument(skip(opts), level = "debug")]
pub fn run(opts: &ReposOptions) -> Result<Vec<RepoStatus>> {
    let mut statuses = Vec::new();
    for path in scan(&opts.root, opts.depth)? {
        if opts.fetch {
            if let Err(error) = fetch(&path, ProgressBar::no_length()) {
                warn!("failed to fetch {:?}: {error}", path.display());
            }
        }

        let status = summarize(&path)?;
        if opts.dirty && status.is_clean() {
            continue;
        }
        statuses.push(status);
    }

    Ok(statuses)
}

/// Render statuses as aligned lines, with paths shown relative to root.
pub fn render(statuses: &[RepoStatus], root: impl AsRef<Path>, style: &Style) -> Vec<String> {
    let rows = statuses
        .iter()
        .map(|status| {
            let path = status
                .path
                .strip_prefix(root.as_ref())
                .ok()
                .filter(|path| !path.as_os_str().is_empty())
                .unwrap_or(status.path.as_path());
            (path.display().to_string(), status)
        })
        .collect::<Vec<_>>();

    let path_width = rows.iter().map(|(path, _)| path.chars().count()).max().unwrap_or(0);
    let branch_width = rows
        .iter()
        .map(|(_, status)| status.branch.chars().count())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|(path, status)| {
            // INVARIANT: Pad before styling, escapes have no display width.
            let path = format!("{path:<path_width$}");
            let branch = format!("{:<branch_width$}", status.branch);
            format!(
                "{}  {}  {}",
                style.bold(&path),
                style.color(&branch, Color::Blue),
                status.markers(style)
            )
        })
        .collect()
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar
            .suspend(|| Password::new("password").without_confirmation().prompt().ok())
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar
            .suspend(|| Password::new("passphrase").without_confirmation().prompt().ok())
    }
}

/// Repository summary error types.
#[derive(Debug, thiserror::Error)]
pub enum ReposError {
    /// Directory tree cannot be walked.
    #[error(transparent)]
    Walk(#[from] ignore::Error),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
type Result<T, E = ReposError> = std::result::Result<T, E>;
