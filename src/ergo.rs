// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Propositional logic aid for the card game Ergo.
//!
//! Given the premises currently on the table, determine which of the four
//! atomic propositions they prove, disprove, or leave open. Implication is
//! semantic: every valuation of the atomics that satisfies all premises is
//! checked, rather than searching for a deduction.

pub mod parse;

pub use parse::{Atomic, ParseError, Prop, SyntaxError};

use crate::term::{Color, Style};

use tracing::{debug, instrument};

/// Relationship between premises and an atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implied {
    /// Premises are contradictory, so anything follows.
    Vacuous,

    /// Atomic is true in every model of the premises.
    Proven,

    /// Atomic is false in every model of the premises.
    Disproven,

    /// Atomic is true in some models and false in others.
    Unproven,
}

impl Implied {
    fn observe(self, truth: bool) -> Self {
        match (self, truth) {
            (Self::Vacuous | Self::Proven, true) => Self::Proven,
            (Self::Vacuous | Self::Disproven, false) => Self::Disproven,
            _ => Self::Unproven,
        }
    }

    /// Colored symbol of relationship.
    pub fn symbol(self, style: &Style) -> String {
        match self {
            Self::Vacuous => style.color("~", Color::Magenta),
            Self::Proven => style.color("\u{2713}", Color::Green),
            Self::Disproven => style.color("\u{2717}", Color::Red),
            Self::Unproven => style.color("?", Color::Yellow),
        }
    }
}

/// Parse premises given as command-line arguments.
///
/// # Errors
///
/// - Return [`ErgoError::Syntax`] naming the offending argument, counted from
///   one, if any premise fails to parse.
#[instrument(skip(premises), level = "debug")]
pub fn compile<S: AsRef<str>>(premises: &[S]) -> Result<Vec<Prop>> {
    premises
        .iter()
        .enumerate()
        .map(|(index, premise)| {
            parse::parse(premise.as_ref()).map_err(|error| ErgoError::Syntax {
                arg: index + 1,
                error,
            })
        })
        .collect()
}

/// Determine what premises imply about each atomic.
///
/// Result is indexed by [`Atomic::index`].
pub fn implied_atomics(premises: &[Prop]) -> [Implied; 4] {
    let mut implied = [Implied::Vacuous; 4];
    for bits in 0u8..16 {
        // INVARIANT: Atomic `a` is the most significant bit.
        let valuation = [bits & 8 != 0, bits & 4 != 0, bits & 2 != 0, bits & 1 != 0];
        if premises.iter().all(|premise| premise.evaluate(&valuation)) {
            debug!("premises hold under {valuation:?}");
            for (flag, truth) in implied.iter_mut().zip(valuation) {
                *flag = flag.observe(truth);
            }
        }
    }

    implied
}

/// Output layout for [`summary`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// List the fully parenthesized premises first.
    pub print_compiled: bool,

    /// Spell out results in words instead of symbols.
    pub plain_text: bool,
}

/// Render summary of what premises imply.
pub fn summary(premises: &[Prop], opts: SummaryOptions, style: &Style) -> String {
    let implied = implied_atomics(premises);
    let mut lines = Vec::new();

    if opts.print_compiled {
        lines.push("Compiled premises:".to_string());
        for (index, premise) in premises.iter().enumerate() {
            lines.push(format!(" {}. {}", index + 1, premise.compiled()));
        }
    }

    if opts.plain_text {
        let list = |wanted: &[Implied]| {
            let atomics = Atomic::ALL
                .iter()
                .filter(|atomic| wanted.contains(&implied[atomic.index()]))
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            if atomics.is_empty() {
                "(none)".to_string()
            } else {
                atomics.join(", ")
            }
        };

        let mut proven = list(&[Implied::Proven, Implied::Vacuous]);
        if implied[0] == Implied::Vacuous {
            proven.push_str(", vacuously");
        }
        lines.push(format!("Proven: {proven}"));
        lines.push(format!("Disproven: {}", list(&[Implied::Disproven])));
    } else {
        if opts.print_compiled {
            lines.push("Implications:".to_string());
        }
        let symbols = Atomic::ALL
            .iter()
            .map(|atomic| format!("{atomic} [{}]", implied[atomic.index()].symbol(style)))
            .collect::<Vec<_>>();
        lines.push(format!(" {}", symbols.join("\t")));
    }

    lines.join("\n")
}

/// Ergo error types.
#[derive(Debug, thiserror::Error)]
pub enum ErgoError {
    #[error("arg={arg} {error}")]
    Syntax { arg: usize, error: ParseError },
}

/// Friendly result alias :3
type Result<T, E = ErgoError> = std::result::Result<T, E>;
