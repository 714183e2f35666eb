// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Grab bag of small command-line utilities.
//!
//! Every module here is an independent tool that the `toolbelt` binary
//! exposes as a subcommand. Most tools drive some other program to do the
//! heavy lifting, e.g., qpdf for PDF editing or youtube-dl for downloads. The
//! remaining tools talk to web services directly, or work purely on local
//! files.
//!
//! # Tools
//!
//! - [`pdf`]: splice, rotate, and replace text in PDF documents.
//! - [`music`]: download songs, and spread them over a USB stick.
//! - [`shortcut`]: create and convert web shortcut files.
//! - [`pwned`]: check passwords against known data breaches.
//! - [`ergo`]: work out what logical premises prove.
//! - [`news`]: read current events in the terminal.
//! - [`loadshed`]: schedule shutdowns ahead of power cuts.
//! - [`desktop`]: toggle dark mode and audio loopback.
//! - [`repos`]: summarize the state of many git repositories.

pub mod config;
pub mod desktop;
pub mod ergo;
pub mod loadshed;
pub mod markup;
pub mod music;
pub mod news;
pub mod path;
pub mod pdf;
pub mod prompt;
pub mod pwned;
pub mod repos;
pub mod shortcut;
pub mod syscall;
pub mod term;
