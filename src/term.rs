// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Terminal output styling.
//!
//! Small set of ANSI escape helpers. Every helper is a no-op when styling is
//! disabled, so the same rendering code produces both decorated terminal
//! output and plain text fit for pipes.

use std::io::IsTerminal;
use terminal_size::Width;

/// Eight basic terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

/// ANSI styler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    enabled: bool,
}

impl Style {
    /// Construct new styler.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Construct styler that is only enabled when stdout is a terminal.
    pub fn auto() -> Self {
        Self::new(stdout_is_tty())
    }

    /// Check if styling is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn wrap(&self, text: &str, open: &str, close: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        format!("\x1b[{open}m{text}\x1b[{close}m")
    }

    pub fn bold(&self, text: &str) -> String {
        self.wrap(text, "1", "22")
    }

    pub fn dim(&self, text: &str) -> String {
        self.wrap(text, "2", "22")
    }

    pub fn italic(&self, text: &str) -> String {
        self.wrap(text, "3", "23")
    }

    pub fn underline(&self, text: &str) -> String {
        self.wrap(text, "4", "24")
    }

    /// Bright foreground color.
    pub fn color(&self, text: &str, color: Color) -> String {
        self.wrap(text, &format!("9{}", color as u8), "39")
    }

    /// 24-bit foreground color.
    pub fn rgb(&self, text: &str, (r, g, b): (u8, u8, u8)) -> String {
        self.wrap(text, &format!("38;2;{r};{g};{b}"), "39")
    }

    /// OSC 8 hyperlink.
    pub fn link(&self, url: &str, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
    }

    /// Blank out the last `width` characters of the current line.
    pub fn backspace(&self, width: usize) -> String {
        if !self.enabled {
            return String::new();
        }

        format!("\r{}\r", " ".repeat(width))
    }
}

/// Check if stdout is attached to a terminal.
pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Determine width of terminal in columns.
///
/// A positive `$COLUMNS` wins. Otherwise the stdout terminal is asked for its
/// size, falling back to 120 if stdout is not a terminal.
pub fn terminal_columns() -> usize {
    let queried = terminal_size::terminal_size().map(|(Width(width), _)| usize::from(width));
    pick_columns(std::env::var("COLUMNS").ok().as_deref(), queried)
}

fn pick_columns(env: Option<&str>, queried: Option<usize>) -> usize {
    env.and_then(|columns| columns.trim().parse().ok())
        .filter(|columns: &usize| *columns > 0)
        .or(queried.filter(|columns| *columns > 0))
        .unwrap_or(120)
}

/// Word wrap text to fit given width.
///
/// Splits only on ASCII whitespace, so non-breaking spaces keep their words
/// glued together. Words longer than the width are never broken, they simply
/// overflow onto their own line.
pub fn wrap(text: &str, width: usize, initial_indent: &str, subsequent_indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::from(initial_indent);
    let mut line_len = initial_indent.chars().count();
    let mut indent_len = line_len;

    for word in text.split_ascii_whitespace() {
        let word_len = word.chars().count();
        let fresh = line_len == indent_len;
        if !fresh && line_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut line));
            line.push_str(subsequent_indent);
            line_len = subsequent_indent.chars().count();
            indent_len = line_len;
        }

        if line_len != indent_len {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += word_len;
    }

    if line_len != indent_len {
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test]
    fn disabled_style_is_plain() {
        let style = Style::new(false);
        assert_eq!(style.bold("x"), "x");
        assert_eq!(style.color("x", Color::Red), "x");
        assert_eq!(style.link("https://a.b", "x"), "x");
        assert_eq!(style.backspace(4), "");
    }

    #[test]
    fn enabled_style_wraps_escapes() {
        let style = Style::new(true);
        assert_eq!(style.bold("x"), "\x1b[1mx\x1b[22m");
        assert_eq!(style.color("x", Color::Green), "\x1b[92mx\x1b[39m");
        assert_eq!(style.rgb("x", (1, 2, 3)), "\x1b[38;2;1;2;3mx\x1b[39m");
    }

    #[test_case(Some("80"), Some(200), 80; "environment wins")]
    #[test_case(None, Some(200), 200; "terminal size")]
    #[test_case(Some("0"), Some(200), 200; "zero environment ignored")]
    #[test_case(Some("wide"), None, 120; "garbage environment")]
    #[test_case(None, None, 120; "no terminal")]
    #[test]
    fn pick_terminal_columns(env: Option<&str>, queried: Option<usize>, expect: usize) {
        pretty_assertions::assert_eq!(pick_columns(env, queried), expect);
    }

    #[test]
    fn wrap_with_indents() {
        let result = wrap(
            "the quick brown fox jumps over the lazy dog",
            17,
            "\u{2022} ",
            "  ",
        );
        let expect = indoc! {"
            \u{2022} the quick brown
              fox jumps over
              the lazy dog"};
        assert_eq!(result, expect);
    }

    #[test]
    fn wrap_never_breaks_long_words() {
        let result = wrap("a supercalifragilistic b", 5, "", "");
        assert_eq!(result, "a\nsupercalifragilistic\nb");
    }

    #[test]
    fn wrap_keeps_non_breaking_spaces() {
        let result = wrap("aa bb\u{a0}cc dd", 6, "", "");
        assert_eq!(result, "aa\nbb\u{a0}cc\ndd");
    }
}
