// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Cross-platform HTML redirect shortcuts.

use crate::markup::unescape;

use regex::Regex;
use reqwest::{Client, Url};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("toolbelt/", env!("CARGO_PKG_VERSION"));
const MAX_NAME_LEN: usize = 250;
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static TITLE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?i)<\W*title\W*(.*)\W*</title"));

/// Settings for creating a shortcut.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShortcutOptions {
    /// Target URL. Read from clipboard if absent.
    pub url: Option<String>,

    /// Shortcut name. Taken from page title if absent.
    pub name: Option<String>,

    /// Trim site names off titles of known sites.
    pub trim: bool,

    /// Only keep a conservative set of characters in the name.
    pub strict: bool,
}

/// Shortcut that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub url: String,
    pub site: String,
    pub name: String,
    pub path: PathBuf,
}

/// Create HTML shortcut inside target directory.
///
/// # Errors
///
/// - Return [`HtmlError::Clipboard`] if no URL was given and the clipboard
///   cannot be read.
/// - Return [`HtmlError::InvalidUrl`] if URL has no scheme or host.
/// - Return one of the fetch errors if no name was given and the page title
///   cannot be obtained.
/// - Return [`HtmlError::Io`] if shortcut cannot be written.
#[instrument(skip(opts, dir), level = "debug")]
pub async fn make_shortcut(opts: &ShortcutOptions, dir: impl AsRef<Path>) -> Result<Shortcut> {
    let url = match &opts.url {
        Some(url) => url.clone(),
        None => {
            warn!("getting url from clipboard (use --url to specify url)");
            arboard::Clipboard::new()?.get_text()?.trim().to_string()
        }
    };
    let site = site_of(&url)?;

    let title = match &opts.name {
        Some(name) => name.clone(),
        None => {
            warn!("getting name from url (use --name to specify name)");
            let title = fetch_title(&url).await?;
            if opts.trim {
                trim_known_site(&site, &title)?
            } else {
                title
            }
        }
    };

    let name = sanitize(&title, opts.strict);
    let path = dir.as_ref().join(format!("{name}.html"));
    debug!("write shortcut to {:?}", path.display());
    std::fs::write(&path, redirect_page(&url)).map_err(|source| HtmlError::Io {
        source,
        path: path.clone(),
    })?;

    Ok(Shortcut {
        url,
        site,
        name,
        path,
    })
}

/// Extract site of URL, i.e., its host with port if any.
///
/// # Errors
///
/// - Return [`HtmlError::InvalidUrl`] if URL cannot be parsed or has no host.
pub fn site_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|_| HtmlError::InvalidUrl(url.into()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| HtmlError::InvalidUrl(url.into()))?;

    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

async fn fetch_title(url: &str) -> Result<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| fetch_error(err, url))?;

    let body = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|err| fetch_error(err, url))?
        .text()
        .await
        .map_err(|err| fetch_error(err, url))?;

    extract_title(&body)?.ok_or_else(|| HtmlError::NoTitle(url.into()))
}

fn fetch_error(err: reqwest::Error, url: &str) -> HtmlError {
    let url = url.to_string();
    if let Some(status) = err.status() {
        HtmlError::BadStatus {
            url,
            status: status.as_u16(),
        }
    } else if err.is_timeout() {
        HtmlError::Timeout(url)
    } else if err.is_connect() {
        HtmlError::Connect(url)
    } else if err.is_redirect() {
        HtmlError::Redirects(url)
    } else {
        HtmlError::NoTitle(url)
    }
}

/// Extract unescaped title out of HTML page.
///
/// # Errors
///
/// - Return [`HtmlError::Pattern`] if title pattern fails to compile.
pub fn extract_title(html: &str) -> Result<Option<String>> {
    let title = TITLE.as_ref().map_err(|err| HtmlError::Pattern(err.clone()))?;
    Ok(title
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|title| unescape(title.as_str())))
}

/// Trim name of known site off page title.
///
/// Titles of unknown sites are returned as is.
///
/// # Errors
///
/// - Return [`HtmlError::Pattern`] if trimming pattern fails to compile.
pub fn trim_known_site(site: &str, title: &str) -> Result<String> {
    let (pattern, replacement) = match site {
        "www.youtube.com" | "youtu.be" => (" - YouTube$", ""),
        "stackoverflow.com" => ("([a-z]+ - )?(.*?)( - Stack Overflow$)", "$2"),
        "www.reddit.com" => (" : .*?$", ""),
        _ => return Ok(title.to_string()),
    };

    warn!("trimming name from known site (use --notrim to avoid)");
    let regex = Regex::new(pattern)?;
    Ok(regex.replace_all(title, replacement).into_owned())
}

/// Sanitize shortcut name for use as a file name.
///
/// By default only characters that NTFS or ext4 reject are removed. In strict
/// mode only ASCII letters, digits, and `-.() _` survive. Either way runs of
/// spaces are collapsed, surrounding space trimmed, and the name truncated to
/// 250 characters.
pub fn sanitize(name: &str, strict: bool) -> String {
    let kept = name.chars().filter(|ch| {
        if strict {
            ch.is_ascii_alphanumeric() || "-.() _".contains(*ch)
        } else {
            !ILLEGAL_CHARS.contains(ch) && !ch.is_control()
        }
    });

    let mut collapsed = String::with_capacity(name.len());
    for ch in kept {
        if ch == ' ' && collapsed.ends_with(' ') {
            continue;
        }
        collapsed.push(ch);
    }

    collapsed.trim().chars().take(MAX_NAME_LEN).collect()
}

/// HTML page redirecting to URL.
pub fn redirect_page(url: &str) -> String {
    format!(r#"<html><head><meta http-equiv="refresh" content="0;url={url}"/></head></html>"#)
}

/// HTML shortcut error types.
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("cannot read url from clipboard")]
    Clipboard(#[from] arboard::Error),

    #[error("invalid url: {0:?}")]
    InvalidUrl(String),

    #[error("request to {url:?} returned bad status code {status}")]
    BadStatus { url: String, status: u16 },

    #[error("request to {0:?} timed out")]
    Timeout(String),

    #[error("connection error accessing {0:?}")]
    Connect(String),

    #[error("too many redirects accessing {0:?}")]
    Redirects(String),

    #[error("cannot extract title from {0:?}")]
    NoTitle(String),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error("failed to write shortcut {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = HtmlError> = std::result::Result<T, E>;
