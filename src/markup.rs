// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! HTML text extraction helpers.

/// Decode HTML character references.
///
/// Covers the whole HTML5 named reference set plus decimal and hexadecimal
/// numeric references. Unknown references are left untouched.
pub fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Remove HTML tags from text, then decode character references.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for ch in text.chars() {
        match (in_tag, ch) {
            (false, '<') => in_tag = true,
            (true, '>') => in_tag = false,
            (false, _) => out.push(ch),
            (true, _) => {}
        }
    }

    unescape(&out)
}
