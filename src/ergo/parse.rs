// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Premise parsing.
//!
//! Premises are scanned into tokens, then folded into a [`Prop`] tree with
//! the shunting-yard algorithm. Operators in increasing precedence are `=>`,
//! `v`, `^`, and `~`. Binary operators associate to the left, while prefix
//! `~` binds tightest and may be stacked.

use std::fmt;

/// Atomic proposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atomic {
    A,
    B,
    C,
    D,
}

impl Atomic {
    /// Every atomic, in order.
    pub const ALL: [Atomic; 4] = [Atomic::A, Atomic::B, Atomic::C, Atomic::D];

    fn from_char(ch: char) -> Option<Self> {
        match ch {
            'a' => Some(Self::A),
            'b' => Some(Self::B),
            'c' => Some(Self::C),
            'd' => Some(Self::D),
            _ => None,
        }
    }

    /// Position of atomic in [`Atomic::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Atomic {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
        };
        fmt.write_str(symbol)
    }
}

/// Logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Implies,
    Or,
    And,
    Not,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Self::Implies => 0,
            Self::Or => 1,
            Self::And => 2,
            Self::Not => 3,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Implies => "=>",
            Self::Or => "v",
            Self::And => "^",
            Self::Not => "~",
        };
        fmt.write_str(symbol)
    }
}

/// Proposition tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    Atom(Atomic),
    Not(Box<Prop>),
    And(Box<Prop>, Box<Prop>),
    Or(Box<Prop>, Box<Prop>),
    Implies(Box<Prop>, Box<Prop>),
}

impl Prop {
    /// Evaluate truth of proposition under a valuation of the atomics.
    ///
    /// Valuation is indexed by [`Atomic::index`].
    pub fn evaluate(&self, valuation: &[bool; 4]) -> bool {
        match self {
            Self::Atom(atomic) => valuation[atomic.index()],
            Self::Not(inner) => !inner.evaluate(valuation),
            Self::And(left, right) => left.evaluate(valuation) && right.evaluate(valuation),
            Self::Or(left, right) => left.evaluate(valuation) || right.evaluate(valuation),
            Self::Implies(left, right) => !left.evaluate(valuation) || right.evaluate(valuation),
        }
    }

    /// Fully parenthesized form, without the outermost parentheses.
    pub fn compiled(&self) -> String {
        let full = self.to_string();
        match self {
            Self::And(..) | Self::Or(..) | Self::Implies(..) => full[1..full.len() - 1].to_string(),
            _ => full,
        }
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atomic) => write!(fmt, "{atomic}"),
            Self::Not(inner) => write!(fmt, "~{inner}"),
            Self::And(left, right) => write!(fmt, "({left} ^ {right})"),
            Self::Or(left, right) => write!(fmt, "({left} v {right})"),
            Self::Implies(left, right) => write!(fmt, "({left} => {right})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Atom(Atomic),
    Open,
    Close,
    Op(Operator),
}

impl fmt::Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atomic) => write!(fmt, "{atomic}"),
            Self::Open => fmt.write_str("("),
            Self::Close => fmt.write_str(")"),
            Self::Op(op) => write!(fmt, "{op}"),
        }
    }
}

/// Parse premise into proposition tree.
///
/// Atomics are case-insensitive and whitespace is ignored.
///
/// # Errors
///
/// - Return [`ParseError`] pointing at the character position where the
///   premise stops making sense.
pub fn parse(premise: &str) -> Result<Prop> {
    Parser::default().parse(&scan(premise)?)
}

/// Split premise into positioned tokens.
fn scan(premise: &str) -> Result<Vec<(usize, Token)>> {
    let chars = premise.to_lowercase().chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        match token_at(&chars, pos) {
            Some((_, None)) => pos += 1,
            Some((len, Some(token))) => {
                tokens.push((pos, token));
                pos += len;
            }
            None => {
                let end = (pos + 1..chars.len())
                    .find(|next| token_at(&chars, *next).is_some())
                    .unwrap_or(chars.len());
                let text = chars[pos..end].iter().collect();
                return Err(ParseError::new(pos, SyntaxError::InvalidToken(text)));
            }
        }
    }

    if tokens.is_empty() {
        return Err(ParseError::new(0, SyntaxError::Empty));
    }

    Ok(tokens)
}

/// Match token at position, yielding its length. Whitespace yields no token.
fn token_at(chars: &[char], pos: usize) -> Option<(usize, Option<Token>)> {
    let ch = chars[pos];
    let token = match ch {
        _ if ch.is_whitespace() => return Some((1, None)),
        '=' if chars.get(pos + 1) == Some(&'>') => return Some((2, Some(Token::Op(Operator::Implies)))),
        'v' => Token::Op(Operator::Or),
        '^' => Token::Op(Operator::And),
        '~' => Token::Op(Operator::Not),
        '(' => Token::Open,
        ')' => Token::Close,
        _ => Token::Atom(Atomic::from_char(ch)?),
    };

    Some((1, Some(token)))
}

#[derive(Debug, Default)]
struct Parser {
    output: Vec<Prop>,
    stack: Vec<(usize, Token)>,
}

impl Parser {
    fn parse(mut self, tokens: &[(usize, Token)]) -> Result<Prop> {
        let mut last: Option<(usize, Token)> = None;

        for &(pos, token) in tokens {
            match token {
                Token::Atom(atomic) => {
                    not_after_operand(pos, token, last)?;
                    self.output.push(Prop::Atom(atomic));
                }
                Token::Open => {
                    not_after_operand(pos, token, last)?;
                    self.stack.push((pos, token));
                }
                Token::Close => {
                    if let Some((_, Token::Open)) = last {
                        return Err(ParseError::new(pos, SyntaxError::EmptyParentheses));
                    }
                    not_after_operator(last)?;
                    loop {
                        match self.stack.pop() {
                            Some((_, Token::Open)) => break,
                            Some((op_pos, Token::Op(op))) => self.apply(op_pos, op)?,
                            _ => return Err(ParseError::new(pos, SyntaxError::UnpairedClose)),
                        }
                    }
                }
                Token::Op(Operator::Not) => {
                    not_after_operand(pos, token, last)?;
                    self.stack.push((pos, token));
                }
                Token::Op(op) => {
                    if matches!(last, None | Some((_, Token::Open))) {
                        return Err(ParseError::new(pos, SyntaxError::MissingOperand(op)));
                    }
                    not_after_operator(last)?;
                    while let Some(&(top_pos, Token::Op(top))) = self.stack.last() {
                        if top.precedence() < op.precedence() {
                            break;
                        }
                        self.stack.pop();
                        self.apply(top_pos, top)?;
                    }
                    self.stack.push((pos, token));
                }
            }

            last = Some((pos, token));
        }

        not_after_operator(last)?;
        while let Some((pos, token)) = self.stack.pop() {
            match token {
                Token::Op(op) => self.apply(pos, op)?,
                _ => return Err(ParseError::new(pos, SyntaxError::UnpairedOpen)),
            }
        }

        // INVARIANT: Operand checks above leave exactly one tree behind.
        self.output
            .pop()
            .ok_or_else(|| ParseError::new(0, SyntaxError::Empty))
    }

    fn apply(&mut self, pos: usize, op: Operator) -> Result<()> {
        let missing = || ParseError::new(pos, SyntaxError::MissingOperand(op));
        let right = Box::new(self.output.pop().ok_or_else(missing)?);
        let prop = match op {
            Operator::Not => Prop::Not(right),
            _ => {
                let left = Box::new(self.output.pop().ok_or_else(missing)?);
                match op {
                    Operator::And => Prop::And(left, right),
                    Operator::Or => Prop::Or(left, right),
                    _ => Prop::Implies(left, right),
                }
            }
        };
        self.output.push(prop);

        Ok(())
    }
}

/// Token must not directly follow an atomic or closing parenthesis.
fn not_after_operand(pos: usize, token: Token, last: Option<(usize, Token)>) -> Result<()> {
    match last {
        Some((_, last @ (Token::Atom(_) | Token::Close))) => Err(ParseError::new(
            pos,
            SyntaxError::MissingOperator {
                left: last.to_string(),
                right: token.to_string(),
            },
        )),
        _ => Ok(()),
    }
}

/// Token must not directly follow an operator.
fn not_after_operator(last: Option<(usize, Token)>) -> Result<()> {
    match last {
        Some((pos, Token::Op(op))) => Err(ParseError::new(pos, SyntaxError::MissingOperand(op))),
        _ => Ok(()),
    }
}

/// Premise syntax error at a character position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pos={pos}: syntax error: {kind}")]
pub struct ParseError {
    pub pos: usize,
    pub kind: SyntaxError,
}

impl ParseError {
    fn new(pos: usize, kind: SyntaxError) -> Self {
        Self { pos, kind }
    }
}

/// Kinds of premise syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("empty expression")]
    Empty,

    #[error("invalid token '{0}'")]
    InvalidToken(String),

    #[error("missing operator between '{left}' and '{right}'")]
    MissingOperator { left: String, right: String },

    #[error("missing operand for '{0}'")]
    MissingOperand(Operator),

    #[error("empty parentheses")]
    EmptyParentheses,

    #[error("unpaired closing parenthesis")]
    UnpairedClose,

    #[error("unpaired opening parenthesis")]
    UnpairedOpen,
}

/// Friendly result alias :3
type Result<T, E = ParseError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("a", "a"; "atomic")]
    #[test_case("A ^ b", "a ^ b"; "uppercase atomic")]
    #[test_case("a=>b v c ^ d", "a => (b v (c ^ d))"; "precedence")]
    #[test_case("a ^ b ^ c", "(a ^ b) ^ c"; "left associative")]
    #[test_case("a => b => c", "(a => b) => c"; "left associative implication")]
    #[test_case("~~a", "~~a"; "stacked negation")]
    #[test_case("~(a v b) ^ ~c", "~(a v b) ^ ~c"; "negated group")]
    #[test_case("((a))", "a"; "nested parentheses")]
    #[test]
    fn parse_valid_premise(premise: &str, expect: &str) -> anyhow::Result<()> {
        pretty_assertions::assert_eq!(parse(premise)?.compiled(), expect);
        Ok(())
    }

    #[test_case("", 0, SyntaxError::Empty; "empty")]
    #[test_case("   ", 0, SyntaxError::Empty; "only whitespace")]
    #[test_case("a ^ xyz b", 4, SyntaxError::InvalidToken("xyz".into()); "invalid token")]
    #[test_case("a = b", 2, SyntaxError::InvalidToken("=".into()); "lone equals")]
    #[test_case(
        "a b",
        2,
        SyntaxError::MissingOperator { left: "a".into(), right: "b".into() };
        "adjacent atomics"
    )]
    #[test_case(
        "(a)(b)",
        3,
        SyntaxError::MissingOperator { left: ")".into(), right: "(".into() };
        "adjacent groups"
    )]
    #[test_case("a ~", 2, SyntaxError::MissingOperator { left: "a".into(), right: "~".into() }; "postfix not")]
    #[test_case("a ^", 2, SyntaxError::MissingOperand(Operator::And); "trailing operator")]
    #[test_case("^ a", 0, SyntaxError::MissingOperand(Operator::And); "leading operator")]
    #[test_case("(v a)", 1, SyntaxError::MissingOperand(Operator::Or); "operator after open")]
    #[test_case("(a =>)", 3, SyntaxError::MissingOperand(Operator::Implies); "operator before close")]
    #[test_case("a ^ ()", 5, SyntaxError::EmptyParentheses; "empty parentheses")]
    #[test_case("a)", 1, SyntaxError::UnpairedClose; "unpaired close")]
    #[test_case("(a ^ (b", 5, SyntaxError::UnpairedOpen; "unpaired open")]
    #[test]
    fn parse_invalid_premise(premise: &str, pos: usize, kind: SyntaxError) {
        pretty_assertions::assert_eq!(parse(premise), Err(ParseError { pos, kind }));
    }

    #[test]
    fn evaluate_implication() -> anyhow::Result<()> {
        let prop = parse("a => b")?;
        assert!(prop.evaluate(&[false, false, false, false]));
        assert!(!prop.evaluate(&[true, false, false, false]));
        assert!(prop.evaluate(&[true, true, false, false]));
        Ok(())
    }
}
