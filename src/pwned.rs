// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Breached password lookup.
//!
//! Passwords are checked against the "Have I Been Pwned" range API. Only the
//! first five characters of the SHA-1 hash of a password ever leave the
//! machine. The API answers with every known hash suffix sharing that prefix,
//! and the full hash is matched locally.

use crate::prompt::Prompter;

use reqwest::Client;
use sha1::{Digest, Sha1};
use tracing::{debug, instrument};

/// Default endpoint of the range API.
pub const API_URL: &str = "https://api.pwnedpasswords.com/range";

const PREFIX_LEN: usize = 5;

/// Check passwords entered by the user.
#[derive(Debug)]
pub struct Checker<P: Prompter> {
    prompter: P,
    client: Client,
    api_url: String,
    reveal: bool,
    repeat: bool,
}

impl<P: Prompter> Checker<P> {
    /// Construct new checker.
    ///
    /// Entered passwords are echoed if `reveal` is set. Passwords are asked
    /// for until an empty entry if `repeat` is set, otherwise just once.
    pub fn new(prompter: P, reveal: bool, repeat: bool) -> Self {
        Self {
            prompter,
            client: Client::new(),
            api_url: API_URL.into(),
            reveal,
            repeat,
        }
    }

    /// Use a different range API endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Prompt for passwords and print whether each was found in a breach.
    ///
    /// # Errors
    ///
    /// - Return [`PwnedError::Prompt`] if the user cannot be prompted.
    /// - Return [`PwnedError::Connect`] if the range API cannot be reached.
    pub async fn run(&self) -> Result<()> {
        loop {
            let Some(password) = self.prompter.secret("Enter password:", self.reveal)? else {
                break;
            };
            if password.is_empty() {
                break;
            }

            let subject = subject(&password, self.reveal);
            let hash = hash_password(&password);
            let occurrences = self.lookup(&hash).await?;
            println!("{}", report(&subject, &hash, occurrences));

            if !self.repeat {
                break;
            }
        }

        Ok(())
    }

    /// Count how often a hash appears in known breaches.
    ///
    /// # Errors
    ///
    /// - Return [`PwnedError::Connect`] if the range API cannot be reached.
    #[instrument(skip(self), level = "debug")]
    pub async fn lookup(&self, hash: &str) -> Result<Option<u64>> {
        let prefix = hash.get(..PREFIX_LEN).unwrap_or(hash);
        let url = format!("{}/{prefix}", self.api_url.trim_end_matches('/'));
        debug!("query {url:?}");

        let body = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(PwnedError::Connect)?
            .text()
            .await
            .map_err(PwnedError::Connect)?;

        Ok(find_occurrences(&body, hash))
    }
}

/// Uppercase hexadecimal SHA-1 hash of a password.
pub fn hash_password(password: &str) -> String {
    let hash = Sha1::digest(password.as_bytes());
    format!("{hash:X}")
}

/// Find occurrence count of hash in a range API response.
///
/// Each response line reads `SUFFIX:COUNT`, where the suffix is the hash
/// without its five character prefix.
pub fn find_occurrences(body: &str, hash: &str) -> Option<u64> {
    let suffix = hash.get(PREFIX_LEN..)?;
    body.lines()
        .filter_map(|line| line.trim().split_once(':'))
        .find(|(found, _)| found.eq_ignore_ascii_case(suffix))
        .and_then(|(_, count)| count.trim().parse().ok())
}

/// Name password in a report, quoting it verbatim if it may be revealed.
pub fn subject(password: &str, reveal: bool) -> String {
    if reveal {
        format!("\"{password}\"")
    } else {
        "Given password".into()
    }
}

/// Render lookup result for display.
pub fn report(subject: &str, hash: &str, occurrences: Option<u64>) -> String {
    match occurrences {
        Some(count) => format!(
            "{subject} was found\nHash {hash}\t{} occurrence{}",
            thousands(count),
            if count == 1 { "" } else { "s" }
        ),
        None => format!("{subject} was not found"),
    }
}

/// Format number with comma thousands separators.
pub fn thousands(number: u64) -> String {
    let digits = number.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            result.push(',');
        }
        result.push(digit);
    }

    result
}

/// Breached password lookup error types.
#[derive(Debug, thiserror::Error)]
pub enum PwnedError {
    #[error("cannot connect to api")]
    Connect(#[source] reqwest::Error),

    #[error(transparent)]
    Prompt(#[from] crate::prompt::PromptError),
}

/// Friendly result alias :3
type Result<T, E = PwnedError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::fake::Scripted;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    const PASSWORD_HASH: &str = "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8";

    #[test]
    fn hash_password_uppercase_hex() {
        assert_eq!(hash_password("password"), PASSWORD_HASH);
    }

    #[test]
    fn find_occurrences_in_range() {
        let body = indoc! {"
            1E4C9B93F3F0682250B6CF8331B7EE68FD7:3\r
            1E4C9B93F3F0682250B6CF8331B7EE68FD8:10434004\r
            1E4C9B93F3F0682250B6CF8331B7EE68FD9:1\r
        "};
        assert_eq!(find_occurrences(body, PASSWORD_HASH), Some(10_434_004));
        assert_eq!(find_occurrences("ABC:1\r\n", PASSWORD_HASH), None);
    }

    #[test_case(0, "0"; "zero")]
    #[test_case(999, "999"; "below thousand")]
    #[test_case(1000, "1,000"; "thousand")]
    #[test_case(10_434_004, "10,434,004"; "millions")]
    #[test]
    fn thousands_separators(number: u64, expect: &str) {
        pretty_assertions::assert_eq!(thousands(number), expect);
    }

    #[test]
    fn report_lookup_results() {
        assert_eq!(
            report("\"hunter2\"", "ABC", Some(1)),
            "\"hunter2\" was found\nHash ABC\t1 occurrence"
        );
        assert_eq!(
            report("Given password", "ABC", Some(2000)),
            "Given password was found\nHash ABC\t2,000 occurrences"
        );
        assert_eq!(report("Given password", "ABC", None), "Given password was not found");
    }

    #[test_case(r#"pa"ss\w0rd"#, true, r#""pa"ss\w0rd""#; "revealed verbatim")]
    #[test_case("hunter2", false, "Given password"; "hidden")]
    #[test]
    fn subject_of_report(password: &str, reveal: bool, expect: &str) {
        pretty_assertions::assert_eq!(subject(password, reveal), expect);
    }

    #[test]
    fn run_stops_on_empty_entry() -> anyhow::Result<()> {
        let checker = Checker::new(Scripted::entering([Some("")]), false, true)
            .with_api_url("http://127.0.0.1:9");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(checker.run())?;
        assert_eq!(*checker.prompter.asked.borrow(), vec!["Enter password:"]);

        Ok(())
    }

    #[test]
    fn run_reports_unreachable_api() -> anyhow::Result<()> {
        let checker = Checker::new(Scripted::entering([Some("password")]), false, false)
            .with_api_url("http://127.0.0.1:9");
        let runtime = tokio::runtime::Runtime::new()?;
        let result = runtime.block_on(checker.run());
        assert!(matches!(result, Err(PwnedError::Connect(_))));

        Ok(())
    }
}
