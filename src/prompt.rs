// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive user prompts.

use inquire::{Confirm, InquireError, Password, Text};
use tracing::debug;

/// Ask the user things.
pub trait Prompter {
    /// Ask a yes/no question, defaulting to no.
    ///
    /// # Errors
    ///
    /// - Return [`PromptError`] if the terminal cannot be used for prompting.
    fn confirm(&self, message: &str) -> Result<bool>;

    /// Ask for a secret, optionally echoing it back as it is typed.
    ///
    /// Return `None` when the user backs out with EOF or an interrupt.
    ///
    /// # Errors
    ///
    /// - Return [`PromptError`] if the terminal cannot be used for prompting.
    fn secret(&self, message: &str, reveal: bool) -> Result<Option<String>>;
}

/// Prompt through the terminal with inquire.
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        match Confirm::new(message).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                debug!("prompt {message:?} abandoned, treating as no");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn secret(&self, message: &str, reveal: bool) -> Result<Option<String>> {
        let answer = if reveal {
            Text::new(message).prompt()
        } else {
            Password::new(message).without_confirmation().prompt()
        };

        match answer {
            Ok(answer) => Ok(Some(answer)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Prompting error types.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error(transparent)]
    Inquire(#[from] InquireError),
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
