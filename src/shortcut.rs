// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Internet shortcut management.
//!
//! Browsers and desktops disagree on how a saved link should look on disk.
//! Windows uses `.url` files, freedesktop environments use `.desktop` files,
//! and neither opens the other. A tiny HTML page with a meta-refresh redirect
//! opens everywhere, so that is the preferred format for new shortcuts.
//!
//! # See Also
//!
//! 1. [`html`]
//! 2. [`convert`]

pub mod convert;
pub mod html;
