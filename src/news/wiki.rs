// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Wikipedia "Portal:Current events" markup.
//!
//! Each day of current events is a wiki page made of bullet lists grouped
//! under bold category headings. Only the subset of wiki markup that those
//! pages actually use is handled: templates, wiki links, external links, bold,
//! and italics.
//!
//! # Hidden Links
//!
//! Link targets are long and would wreck line wrapping, so every link is
//! reduced to its display text before wrapping. The display text is fenced in
//! unit separators with its spaces made non-breaking, and the target is queued
//! up. Once the line is wrapped, every fenced text is turned into a terminal
//! hyperlink to the next queued target.

use super::Layout;

use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument};

pub const WIKI_URL: &str = "https://en.wikipedia.org/wiki/";
pub const API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Delimiter fencing display text of hidden links.
const DELIM: char = '\x1F';
const NBSP: char = '\u{a0}';

/// Characters left alone when escaping page names, same as a URL path.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Headline categories and their icons.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("Arts and culture", "🎨"),
    ("Armed conflicts and attacks", "⚔️ "),
    ("Business and economy", "📈"),
    ("Disasters and accidents", "🌊"),
    ("Health and environment", "🌱"),
    ("International relations", "🌐"),
    ("Law and crime", "⚖️ "),
    ("Politics and elections", "🗳 "),
    ("Science and technology", "🧬"),
    ("Sports", "🏀"),
];

const HYPERLINK: &str = r"\[(?P<url>[^ \[]+)( (?P<htxt>.+?))?\]";
const WIKILINK: &str = r"\[\[(?P<dest>[^\[]+?)(\| *(?P<wtxt>.+?))?\]\](?P<suffix>[a-zA-Z]*)";

/// URL of raw current events page for a day.
pub fn news_url(day: NaiveDate) -> String {
    format!(
        "{WIKI_URL}Portal:Current_events/{}?action=raw",
        day.format("%Y_%B_%-d")
    )
}

/// Escape text for use in a URL.
pub fn quote(text: &str) -> String {
    utf8_percent_encode(text, PATH_SAFE).to_string()
}

/// Derive lookup key of a category name.
///
/// Contributors misspell category names every now and then, so the key only
/// keeps the first three letters, the word count, and whether "and" appears.
pub fn cat_key(name: &str) -> String {
    let lower = name.to_lowercase();
    let words = lower.split_whitespace().collect::<Vec<_>>();
    let prefix = words
        .first()
        .map(|word| word.chars().take(3).collect::<String>())
        .unwrap_or_default();

    format!("{prefix}{}{}", words.len(), words.contains(&"and"))
}

/// Look up icon of a category heading.
pub fn category_icon(heading: &str) -> Option<&'static str> {
    let key = cat_key(heading);
    CATEGORIES
        .iter()
        .find(|(name, _)| cat_key(name) == key)
        .map(|(_, icon)| *icon)
}

#[derive(Debug, Deserialize)]
struct ExpandResponse {
    expandtemplates: Expanded,
}

#[derive(Debug, Deserialize)]
struct Expanded {
    wikitext: String,
}

/// News of a single day.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WikiNews {
    lines: Vec<String>,
    expansions: HashMap<String, String>,
}

impl WikiNews {
    /// Construct news from raw page markup.
    ///
    /// The first three lines and the last line of a page are boilerplate.
    pub fn new(raw: &str) -> Self {
        let lines = raw.split('\n').collect::<Vec<_>>();
        let content = lines
            .get(3..lines.len().saturating_sub(1))
            .unwrap_or_default();

        Self {
            lines: content.iter().map(ToString::to_string).collect(),
            expansions: HashMap::new(),
        }
    }

    /// Fetch raw news of a day, expanding every template inside.
    ///
    /// # Errors
    ///
    /// - Return [`reqwest::Error`] if page cannot be fetched.
    #[instrument(skip(client), level = "debug")]
    pub async fn fetch(client: &Client, day: NaiveDate) -> Result<Self, reqwest::Error> {
        let raw = client
            .get(news_url(day))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mut news = Self::new(&raw);
        for template in news.templates() {
            let expanded = expand_template(client, &template).await;
            news.expansions.insert(template, expanded);
        }

        Ok(news)
    }

    /// Distinct templates used in news, e.g., `{{flagicon|ZA}}`.
    pub fn templates(&self) -> Vec<String> {
        let mut found = Vec::new();
        for line in &self.lines {
            let mut rest = line.as_str();
            while let Some(start) = rest.find("{{") {
                let Some(len) = rest[start..].find("}}") else {
                    break;
                };
                let template = &rest[start..start + len + 2];
                if !found.iter().any(|seen| seen == template) {
                    found.push(template.to_string());
                }
                rest = &rest[start + len + 2..];
            }
        }

        found
    }

    /// Use given expansion for a template.
    pub fn with_expansion(mut self, template: impl Into<String>, expansion: impl Into<String>) -> Self {
        self.expansions.insert(template.into(), expansion.into());
        self
    }

    /// Render news lines for display.
    ///
    /// # Errors
    ///
    /// - Return [`regex::Error`] if a markup pattern fails to compile.
    pub fn format(&self, layout: &Layout) -> Result<Vec<String>, regex::Error> {
        if self.lines.len() == 1 && self.lines[0] == "*" {
            return Ok(vec![layout.style.italic("(no news)")]);
        }

        let markup = Markup::new()?;
        let mut formatted = Vec::new();
        for (index, line) in self.lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let line = markup.template.replace_all(line, |caps: &Captures<'_>| {
                let template = &caps[0];
                self.expansions
                    .get(template)
                    .cloned()
                    .unwrap_or_else(|| template.to_string())
            });

            let mut urls = VecDeque::new();
            let line = markup
                .link
                .replace_all(&line, |caps: &Captures<'_>| markup.hide_link(caps, &mut urls));

            let level = self.list_level(index);
            let body = line.get(level..).unwrap_or_default().trim_matches(' ');
            let line = layout.wrap(body, level);

            let heading = markup
                .heading
                .captures(&line)
                .map(|caps| format_heading(&caps["txt"], layout));
            let line = heading.unwrap_or(line);
            let line = markup
                .bold
                .replace_all(&line, |caps: &Captures<'_>| layout.style.bold(&caps["txt"]));
            let line = markup
                .ital
                .replace_all(&line, |caps: &Captures<'_>| layout.style.italic(&caps["txt"]));

            let mut line = line.into_owned();
            let nested = 0 < self.list_level(index.wrapping_sub(1))
                && self.list_level(index.wrapping_sub(1)) < level
                && level < self.list_level(index + 1);
            if level > 0 && !nested {
                line.insert_str(0, layout.newline());
            }

            let line = markup.hidden.replace_all(&line, |caps: &Captures<'_>| {
                let url = urls.pop_front().unwrap_or_default();
                layout.style.link(&url, &caps["txt"])
            });

            formatted.push(line.into_owned());
        }

        Ok(formatted)
    }

    /// Bullet depth of line, zero if out of range or not a list item.
    fn list_level(&self, index: usize) -> usize {
        self.lines
            .get(index)
            .map(|line| line.chars().take_while(|ch| *ch == '*').count())
            .unwrap_or(0)
    }
}

fn format_heading(text: &str, layout: &Layout) -> String {
    let mut chars = text.chars();
    let heading = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    };

    let icon = match category_icon(&heading) {
        Some(icon) if layout.icons => format!("{icon} "),
        _ => String::new(),
    };

    format!(
        "\n{icon}{}",
        layout.style.bold(&layout.style.rgb(&heading, (255, 255, 170)))
    )
}

struct Markup {
    bold: Regex,
    bracket: Regex,
    heading: Regex,
    hidden: Regex,
    ital: Regex,
    link: Regex,
    template: Regex,
}

impl Markup {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bold: Regex::new(r"(?s)'''(?P<txt>.+?)'''")?,
            bracket: Regex::new(r"(?s)\((?P<txt>.+?)\)")?,
            heading: Regex::new(r"^'''(?P<txt>.+)'''$")?,
            hidden: Regex::new(&format!("(?s){DELIM}(?P<txt>.+?){DELIM}"))?,
            ital: Regex::new(r"(?s)''(?P<txt>.+?)''")?,
            link: Regex::new(&format!("(?P<wiki>{WIKILINK})|(?P<hyper>{HYPERLINK})"))?,
            template: Regex::new(r"\{\{(?P<txt>.+?)\}\}")?,
        })
    }

    /// Replace link by fenced display text, queueing up its target.
    fn hide_link(&self, caps: &Captures<'_>, urls: &mut VecDeque<String>) -> String {
        let (url, text) = if caps.name("wiki").is_some() {
            let dest = caps.name("dest").map_or("", |dest| dest.as_str());
            let text = caps.name("wtxt").map_or(dest, |text| text.as_str());
            let suffix = caps.name("suffix").map_or("", |suffix| suffix.as_str());
            let url = format!("{WIKI_URL}{}", quote(&dest.replace(' ', "_")));
            (url, format!("{text}{suffix}"))
        } else {
            let url = caps.name("url").map_or("", |url| url.as_str());
            let text = caps.name("htxt").map_or(url, |text| text.as_str());
            let text = self.bracket.replace_all(text, "$txt");
            let text = self.ital.replace_all(&text, "$txt");
            (url.to_string(), format!("(''{text}'')"))
        };

        urls.push_back(url);
        format!("{DELIM}{}{DELIM}", text.replace(' ', &NBSP.to_string()))
    }
}

/// Expand template through the MediaWiki API, stripped of HTML.
///
/// Falls back to the template itself on any failure.
pub async fn expand_template(client: &Client, template: &str) -> String {
    let url = format!(
        "{API_URL}?action=expandtemplates&prop=wikitext&format=json&text={}",
        quote(template)
    );

    let response = match client.get(&url).send().await {
        Ok(response) => response.json::<ExpandResponse>().await,
        Err(err) => Err(err),
    };

    match response {
        Ok(response) => crate::markup::strip_tags(&response.expandtemplates.wikitext),
        Err(err) => {
            debug!("cannot expand template {template:?}: {err}");
            template.to_string()
        }
    }
}
