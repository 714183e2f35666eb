// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! PDF editing through qpdf.
//!
//! Most of this module is a deliberately small front-end to qpdf, exposing
//! the handful of operations that actually get used day to day: splicing
//! page ranges from several documents together, and rotating pages. Text
//! replacement is the one operation qpdf cannot do by itself.
//!
//! # Text Replacement
//!
//! qpdf can rewrite a document into __QDF__ form, where every content stream
//! is uncompressed and laid out as plain text. Replacement then becomes a
//! byte-level regex substitution over that file. Because substitution breaks
//! stream length fields, `fix-qdf` repairs the document before qpdf packs it
//! back up into a compressed PDF.
//!
//! Text inside content streams is rarely contiguous. Kerning splits words
//! into fragments like `(W)-12(ater)`. Unless verbatim matching is asked for,
//! the search pattern tolerates such fragments between any two characters.
//!
//! # See Also
//!
//! - [qpdf manual](https://qpdf.readthedocs.io/en/stable/cli.html)

use crate::syscall::Syscall;

use regex::bytes::{NoExpand, RegexBuilder};
use std::{
    ffi::OsString,
    fs::{read, remove_file, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Fragment allowed between characters of a non-verbatim search pattern.
const QDF_GAP: &str = r"(\)-?[0-9]*\()?";

/// Options for text replacement.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// Text to substitute for each match.
    pub replacement: String,

    /// Match find text verbatim instead of tolerating QDF fragments.
    pub verbatim: bool,

    /// Match case-insensitively.
    pub ignore_case: bool,
}

/// Front-end to qpdf.
#[derive(Debug)]
pub struct Qpdf<S: Syscall> {
    syscall: S,
}

impl<S: Syscall> Qpdf<S> {
    /// Construct new qpdf front-end.
    pub fn new(syscall: S) -> Self {
        Self { syscall }
    }

    /// Collect pages from any number of documents into a single document.
    ///
    /// Each input file may be followed by a page range like `1-6,8`. Global
    /// document data such as bookmarks or form fields is taken from
    /// `metadata` if given, else from an empty document.
    ///
    /// # Errors
    ///
    /// - Return [`PdfError::Syscall`] if qpdf fails.
    #[instrument(skip(self, inputs, output, metadata), level = "debug")]
    pub fn splice(
        &self,
        inputs: impl IntoIterator<Item = impl Into<OsString>>,
        output: impl AsRef<Path>,
        metadata: Option<&Path>,
    ) -> Result<()> {
        let mut args: Vec<OsString> = vec![match metadata {
            Some(path) => path.as_os_str().to_os_string(),
            None => "--empty".into(),
        }];
        args.push("--pages".into());
        args.extend(inputs.into_iter().map(Into::into));
        args.push("--".into());
        args.push(output.as_ref().as_os_str().to_os_string());

        self.syscall.interactive("qpdf", args)?;
        info!("wrote spliced document to {:?}", output.as_ref().display());

        Ok(())
    }

    /// Rotate pages of document.
    ///
    /// An angle prefixed by `+` or `-` is added to, or subtracted from the
    /// current rotation. Otherwise it is absolute. Pages use qpdf range
    /// syntax, where `1-z` means all pages.
    ///
    /// # Errors
    ///
    /// - Return [`PdfError::Syscall`] if qpdf fails.
    #[instrument(skip(self, input, output), level = "debug")]
    pub fn rotate(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        angle: &str,
        pages: &str,
    ) -> Result<()> {
        self.syscall.interactive(
            "qpdf",
            [
                input.as_ref().as_os_str().to_os_string(),
                output.as_ref().as_os_str().to_os_string(),
                format!("--rotate={angle}:{pages}").into(),
            ],
        )?;
        info!("wrote rotated document to {:?}", output.as_ref().display());

        Ok(())
    }

    /// Find and replace text in document, e.g., to remove a watermark.
    ///
    /// Returns number of replacements made.
    ///
    /// # Errors
    ///
    /// - Return [`PdfError::Pattern`] if search pattern cannot be built.
    /// - Return [`PdfError::Syscall`] if qpdf or fix-qdf fail.
    /// - Return [`PdfError::Io`] if temporary files cannot be handled.
    #[instrument(skip(self, input, output, opts), level = "debug")]
    pub fn replace(
        &self,
        find: &str,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        opts: &ReplaceOptions,
    ) -> Result<usize> {
        let regex = RegexBuilder::new(&search_pattern(find, opts.verbatim))
            .case_insensitive(opts.ignore_case)
            .build()?;

        let (expanded, repaired) = scratch_paths(output.as_ref());
        let result = self.replace_via_qdf(
            &regex,
            input.as_ref(),
            output.as_ref(),
            &expanded,
            &repaired,
            &opts.replacement,
        );

        // INVARIANT: Scratch files never outlive the operation.
        for path in [&expanded, &repaired] {
            if path.exists() {
                debug!("remove scratch file {:?}", path.display());
                if let Err(err) = remove_file(path) {
                    warn!("cannot remove scratch file {:?}: {err}", path.display());
                }
            }
        }

        let count = result?;
        info!("SUCCESS: {count} replacements made.");

        Ok(count)
    }

    fn replace_via_qdf(
        &self,
        regex: &regex::bytes::Regex,
        input: &Path,
        output: &Path,
        expanded: &Path,
        repaired: &Path,
        replacement: &str,
    ) -> Result<usize> {
        self.syscall.interactive(
            "qpdf",
            [
                OsString::from("--qdf"),
                "--object-streams=disable".into(),
                input.as_os_str().to_os_string(),
                expanded.as_os_str().to_os_string(),
            ],
        )?;

        let content = read(expanded).map_err(|err| PdfError::Io {
            source: err,
            path: expanded.to_path_buf(),
        })?;
        let count = regex.find_iter(&content).count();
        let content = regex.replace_all(&content, NoExpand(replacement.as_bytes()));
        write(expanded, content.as_ref()).map_err(|err| PdfError::Io {
            source: err,
            path: expanded.to_path_buf(),
        })?;

        // INVARIANT: Repair stream lengths broken by substitution.
        let fixed = self.syscall.capture("fix-qdf", [expanded.as_os_str()])?;
        write(repaired, fixed).map_err(|err| PdfError::Io {
            source: err,
            path: repaired.to_path_buf(),
        })?;

        self.syscall.interactive(
            "qpdf",
            [
                OsString::from("--stream-data=compress"),
                repaired.as_os_str().to_os_string(),
                output.as_os_str().to_os_string(),
            ],
        )?;

        Ok(count)
    }
}

/// Build regex source for find text.
fn search_pattern(find: &str, verbatim: bool) -> String {
    if verbatim {
        return regex::escape(find);
    }

    find.chars()
        .filter(|ch| *ch != ' ')
        .map(|ch| regex::escape(ch.encode_utf8(&mut [0; 4])))
        .collect::<Vec<_>>()
        .join(QDF_GAP)
}

fn scratch_paths(output: &Path) -> (PathBuf, PathBuf) {
    let dir = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());

    (
        dir.join(format!(".{stem}.qdf-expanded.pdf")),
        dir.join(format!(".{stem}.qdf-repaired.pdf")),
    )
}

/// PDF editing error types.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// Search pattern cannot be compiled.
    #[error(transparent)]
    Pattern(#[from] regex::Error),

    /// External tool failed.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),

    /// Scratch file cannot be read or written.
    #[error("failed to access {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = PdfError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::fake::{Recorder, Reply};
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn splice_with_metadata() -> anyhow::Result<()> {
        let qpdf = Qpdf::new(Recorder::new());
        qpdf.splice(
            ["a.pdf", "2,7-10", "b.pdf"],
            "out.pdf",
            Some(Path::new("a.pdf")),
        )?;

        let expect = vec![vec![
            "qpdf", "a.pdf", "--pages", "a.pdf", "2,7-10", "b.pdf", "--", "out.pdf",
        ]];
        assert_eq!(qpdf.syscall.calls(), expect);

        Ok(())
    }

    #[test]
    fn splice_defaults_to_empty_metadata() -> anyhow::Result<()> {
        let qpdf = Qpdf::new(Recorder::new());
        qpdf.splice(["a.pdf", "2-5"], "out.pdf", None)?;

        let expect = vec![vec!["qpdf", "--empty", "--pages", "a.pdf", "2-5", "--", "out.pdf"]];
        assert_eq!(qpdf.syscall.calls(), expect);

        Ok(())
    }

    #[test]
    fn rotate_page_range() -> anyhow::Result<()> {
        let qpdf = Qpdf::new(Recorder::new());
        qpdf.rotate("in.pdf", "out.pdf", "-90", "1,3,5-9")?;

        let expect = vec![vec!["qpdf", "in.pdf", "out.pdf", "--rotate=-90:1,3,5-9"]];
        assert_eq!(qpdf.syscall.calls(), expect);

        Ok(())
    }

    #[test]
    fn failed_qpdf_is_reported() {
        let qpdf = Qpdf::new(Recorder::with_replies([Reply::Fail("exit status: 2".into())]));
        let result = qpdf.rotate("in.pdf", "out.pdf", "+90", "1-z");
        assert!(matches!(result, Err(PdfError::Syscall(_))));
    }

    #[test]
    fn search_pattern_tolerates_qdf_fragments() -> anyhow::Result<()> {
        let regex = regex::bytes::Regex::new(&search_pattern("Draft copy", false))?;
        assert!(regex.is_match(b"[(Dr)-12(aft)3(cop)(y)] TJ"));
        assert!(regex.is_match(b"(Draftcopy)"));
        assert!(!regex.is_match(b"(Draught copy)"));

        let verbatim = regex::bytes::Regex::new(&search_pattern("a.b (c)", true))?;
        assert!(verbatim.is_match(b"a.b (c)"));
        assert!(!verbatim.is_match(b"axb (c)"));

        Ok(())
    }

    #[sealed_test]
    fn replace_rewrites_expanded_document() -> anyhow::Result<()> {
        // Simulate qpdf producing the expanded document, then fix-qdf echoing
        // back whatever bytes it was given.
        let (expanded, repaired) = scratch_paths(Path::new("out.pdf"));
        write(&expanded, b"BT (WATER)-5(MARK) Tj (watermark) Tj ET")?;

        let qpdf = Qpdf::new(Recorder::with_replies([
            Reply::Ok(String::new()),
            Reply::Bytes(b"fixed".to_vec()),
            Reply::Ok(String::new()),
        ]));
        let opts = ReplaceOptions {
            replacement: String::new(),
            verbatim: false,
            ignore_case: true,
        };
        let count = qpdf.replace("watermark", "in.pdf", "out.pdf", &opts)?;
        assert_eq!(count, 2);

        let calls = qpdf.syscall.calls();
        let expanded = expanded.display().to_string();
        let repaired = repaired.display().to_string();
        assert_eq!(
            calls,
            vec![
                vec![
                    "qpdf".to_string(),
                    "--qdf".into(),
                    "--object-streams=disable".into(),
                    "in.pdf".into(),
                    expanded.clone(),
                ],
                vec!["fix-qdf".to_string(), expanded.clone()],
                vec![
                    "qpdf".to_string(),
                    "--stream-data=compress".into(),
                    repaired.clone(),
                    "out.pdf".into(),
                ],
            ]
        );

        // Scratch files are gone once done.
        assert!(!Path::new(&expanded).exists());
        assert!(!Path::new(&repaired).exists());

        Ok(())
    }

    #[sealed_test]
    fn replace_keeps_tool_failure_over_cleanup_failure() -> anyhow::Result<()> {
        // Scratch path taken by a directory cannot be removed as a file.
        let (expanded, _) = scratch_paths(Path::new("out.pdf"));
        std::fs::create_dir(&expanded)?;

        let qpdf = Qpdf::new(Recorder::with_replies([Reply::Fail("exit status: 2".into())]));
        let result = qpdf.replace("x", "in.pdf", "out.pdf", &ReplaceOptions::default());
        assert!(matches!(result, Err(PdfError::Syscall(_))));

        Ok(())
    }
}
