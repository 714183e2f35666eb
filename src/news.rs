// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Terminal news feed.
//!
//! Recent headlines are pulled from the Wikipedia "Portal:Current events"
//! pages, one page per day, and rendered as wrapped bullet lists grouped by
//! category with hyperlinks to related articles and sources. All days are
//! fetched concurrently, but printed in order, newest first.

pub mod wiki;

use crate::term::{self, Style};
use wiki::WikiNews;

use chrono::{Days, Local, NaiveDate};
use reqwest::Client;
use std::{
    io::{self, Write},
    process::{Command, Stdio},
};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("toolbelt/", env!("CARGO_PKG_VERSION"));
const FETCHING: &str = "fetching...";

/// Layout of rendered news.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Maximum line width.
    pub width: usize,

    /// Indent width of each nested list level.
    pub indent: usize,

    /// Leave out blank lines between bullets.
    pub compact: bool,

    /// Prefix category headings with an icon.
    pub icons: bool,

    pub style: Style,
}

impl Layout {
    /// Day heading.
    pub fn heading(&self, text: &str) -> String {
        self.style
            .rgb(&self.style.bold(&self.style.underline(text)), (255, 255, 90))
    }

    /// Blank line between bullets, unless compact.
    pub fn newline(&self) -> &'static str {
        if self.compact {
            ""
        } else {
            "\n"
        }
    }

    /// Wrap line as bullet of given list level. Level zero is no bullet.
    pub fn wrap(&self, line: &str, level: usize) -> String {
        if level == 0 {
            return term::wrap(line, self.width, "", "");
        }

        let depth = self.indent * (level - 1);
        let initial = format!("{}\u{2022} ", " ".repeat(depth));
        let subsequent = " ".repeat(depth + 2);
        term::wrap(line, self.width, &initial, &subsequent)
    }
}

/// Settings for the news feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsOptions {
    /// Number of days including today. Defaults to 2, or 5 with `less`.
    pub days: Option<u64>,

    /// Maximum output width. Defaults to 80% of the terminal, at most 120.
    pub width: Option<usize>,

    pub indent: usize,
    pub compact: bool,

    /// Force styling on or off. Defaults to on for terminals.
    pub ansi: Option<bool>,

    /// Page output through `less`.
    pub less: bool,

    pub icons: bool,
}

impl Default for NewsOptions {
    fn default() -> Self {
        Self {
            days: None,
            width: None,
            indent: 3,
            compact: false,
            ansi: None,
            less: false,
            icons: true,
        }
    }
}

impl NewsOptions {
    /// Resolve layout, filling in defaults from the terminal.
    pub fn layout(&self) -> Layout {
        let width = self
            .width
            .unwrap_or_else(|| (term::terminal_columns() * 4 / 5).min(120));
        let style = match self.ansi {
            Some(enabled) => Style::new(enabled),
            None => Style::auto(),
        };

        Layout {
            width,
            indent: self.indent,
            compact: self.compact,
            icons: self.icons,
            style,
        }
    }

    /// Resolve number of days to show.
    pub fn day_count(&self) -> u64 {
        self.days.unwrap_or(if self.less { 5 } else { 2 })
    }
}

/// Fetch and print news.
///
/// # Errors
///
/// - Return [`NewsError::Fetch`] if news of any day cannot be retrieved.
/// - Return [`NewsError::Pager`] if `less` cannot be started.
/// - Return [`NewsError::Write`] if output cannot be written, unless the
///   reader went away early.
#[instrument(skip(opts), level = "debug")]
pub async fn run(opts: &NewsOptions) -> Result<()> {
    let layout = opts.layout();
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(NewsError::Client)?;

    let today = Local::now().date_naive();
    let days = (0..opts.day_count())
        .map(|offset| today - Days::new(offset))
        .collect::<Vec<_>>();
    let tasks = days
        .iter()
        .map(|day| tokio::spawn(fetch_day(client.clone(), *day, layout)))
        .collect::<Vec<_>>();

    let result = if opts.less {
        debug!("page news through less");
        let mut pager = Command::new("less")
            .arg("-cRK")
            .stdin(Stdio::piped())
            .spawn()
            .map_err(NewsError::Pager)?;
        let result = match pager.stdin.take() {
            Some(mut stdin) => print_days(&mut stdin, &days, tasks, &layout, false).await,
            None => Ok(()),
        };
        pager.wait().map_err(NewsError::Pager)?;
        result
    } else {
        let loading = layout.style.enabled();
        print_days(&mut io::stdout(), &days, tasks, &layout, loading).await
    };

    match result {
        Err(NewsError::Write(err)) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}

async fn print_days(
    out: &mut impl Write,
    days: &[NaiveDate],
    tasks: Vec<JoinHandle<Result<String>>>,
    layout: &Layout,
    loading: bool,
) -> Result<()> {
    for (day, task) in days.iter().zip(tasks) {
        writeln!(out, "{}\n", layout.heading(&day.format("%A, %-d %B %Y").to_string()))?;
        if loading {
            write!(out, "{}", layout.style.dim(&layout.style.italic(FETCHING)))?;
            out.flush()?;
        }

        let news = task.await??;
        if loading {
            write!(out, "{}", layout.style.backspace(FETCHING.len()))?;
        }
        writeln!(out, "{news}")?;
    }

    out.flush()?;
    Ok(())
}

async fn fetch_day(client: Client, day: NaiveDate, layout: Layout) -> Result<String> {
    let news = WikiNews::fetch(&client, day)
        .await
        .map_err(|source| NewsError::Fetch {
            day: day.format("%-d %B %Y").to_string(),
            source,
        })?;
    let lines = news.format(&layout)?;

    Ok(format!("{}\n", lines.join("\n").trim()))
}

/// News feed error types.
#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("failed to construct http client")]
    Client(#[source] reqwest::Error),

    #[error("unable to retrieve news for {day}")]
    Fetch {
        day: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Markup(#[from] regex::Error),

    #[error("failed to run less")]
    Pager(#[source] io::Error),

    #[error(transparent)]
    Write(#[from] io::Error),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Friendly result alias :3
type Result<T, E = NewsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn layout() -> Layout {
        Layout {
            width: 20,
            indent: 3,
            compact: false,
            icons: true,
            style: Style::new(false),
        }
    }

    #[test]
    fn wrap_bullets_by_level() {
        let layout = layout();
        assert_eq!(layout.wrap("plain text", 0), "plain text");
        assert_eq!(layout.wrap("one two three four five", 1), "\u{2022} one two three four\n  five");
        assert_eq!(layout.wrap("one two three", 2), "   \u{2022} one two three");
    }

    #[test]
    fn newline_unless_compact() {
        let mut layout = layout();
        assert_eq!(layout.newline(), "\n");
        layout.compact = true;
        assert_eq!(layout.newline(), "");
    }

    #[test]
    fn heading_styles() {
        let mut layout = layout();
        assert_eq!(layout.heading("Monday"), "Monday");
        layout.style = Style::new(true);
        assert_eq!(
            layout.heading("Monday"),
            "\x1b[38;2;255;255;90m\x1b[1m\x1b[4mMonday\x1b[24m\x1b[22m\x1b[39m"
        );
    }

    #[sealed_test(env = [("COLUMNS", "100")])]
    fn options_default_from_terminal() {
        let opts = NewsOptions::default();
        let layout = opts.layout();
        assert_eq!(layout.width, 80);
        assert_eq!(opts.day_count(), 2);

        let opts = NewsOptions {
            width: Some(50),
            ansi: Some(true),
            less: true,
            ..Default::default()
        };
        assert_eq!(opts.layout().width, 50);
        assert!(opts.layout().style.enabled());
        assert_eq!(opts.day_count(), 5);
    }

    #[tokio::test]
    async fn print_days_in_order() -> anyhow::Result<()> {
        let days = vec![
            NaiveDate::from_ymd_opt(2024, 3, 7).ok_or(anyhow::anyhow!("bad date"))?,
            NaiveDate::from_ymd_opt(2024, 3, 6).ok_or(anyhow::anyhow!("bad date"))?,
        ];
        let tasks = vec![
            tokio::spawn(async { Ok::<_, NewsError>("\u{2022} today\n".to_string()) }),
            tokio::spawn(async { Ok::<_, NewsError>("\u{2022} yesterday\n".to_string()) }),
        ];
        let mut out = Vec::new();
        print_days(&mut out, &days, tasks, &layout(), false).await?;

        assert_eq!(
            String::from_utf8(out)?,
            "Thursday, 7 March 2024\n\n\u{2022} today\n\nWednesday, 6 March 2024\n\n\u{2022} yesterday\n\n"
        );

        Ok(())
    }
}
