//! Diagnostics for every stage of the pipeline.
//!
//! All three stages (tokenizer, parser, optimizer) report through the same
//! [`Error`] type, so downstream tooling can match on stable codes without
//! caring where in the pipeline a diagnostic originated.

use crate::lex::Token;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
#[cfg(feature = "serde")]
use serde::Serialize;

/// What went wrong.
///
/// `S01xx` codes are lexical, `S02xx` syntactic or semantic,
/// `S03xx` regex-related and `S04xx` signature-related.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// String literal without a closing quote (S0101).
    UnterminatedString,
    /// Number that does not fit into a finite double (S0102).
    NumberOutOfRange(String),
    /// Escape sequence that is not in the JSON escape table (S0103).
    IllegalEscape(char),
    /// `\u` escape without four hex digits or outside the scalar range (S0104).
    InvalidUnicodeEscape,
    /// Backtick-quoted name without a closing backtick (S0105).
    UnterminatedQuotedName,
    /// Comment without a closing `*/` (S0106).
    UnterminatedComment,
    /// Token that no grammar rule accepts at this point (S0201).
    Unexpected(String),
    /// A specific token was required, but another one was found (S0202).
    Expected {
        /// the token the grammar called for
        expected: &'static str,
        /// the token that was actually there
        found: String,
    },
    /// A specific token was required, but the input ended (S0203).
    ExpectedBeforeEnd(&'static str),
    /// Operator character with no entry in the symbol table (S0204).
    UnknownOperator(String),
    /// Token kind with no symbol-table mapping (S0205).
    ///
    /// Unreachable from this crate's own tokenizer; kept so the code space
    /// stays compatible with other front ends.
    UnknownToken(String),
    /// Raw node shape the optimizer does not know (S0206).
    UnknownShape(String),
    /// The input ended where an expression was required (S0207).
    UnexpectedEnd,
    /// Lambda parameter at the given 1-based position is not a variable (S0208).
    LambdaArgument {
        /// source text of the offending parameter
        token: String,
        /// 1-based parameter position
        index: usize,
    },
    /// Predicate applied to a step that already has a grouping (S0209).
    PredicateAfterGroup,
    /// Second grouping applied to the same step (S0210).
    DuplicateGroup,
    /// Symbol used as a prefix operator that cannot start an expression (S0211).
    NotPrefix(String),
    /// Left side of `:=` or `::` is not a valid binding target (S0212).
    InvalidBindTarget(String),
    /// Number, boolean or null used as a path step (S0213).
    InvalidStep(String),
    /// Right side of `@` or `#` is not a variable (S0214).
    BindTargetNotVariable(&'static str),
    /// Focus/index binding after predicates on the same step (S0215).
    BindAfterStages,
    /// Focus/index binding after an order-by clause (S0216).
    BindAfterSort,
    /// Regular expression with an empty pattern (S0301).
    EmptyRegex,
    /// Regular expression without a terminating `/` (S0302).
    UnterminatedRegex,
    /// Unrecognized type symbol in a lambda signature (S0401).
    SignatureSymbol(char),
    /// Malformed group or sub-signature in a lambda signature (S0402).
    SignatureGroup,
}

impl ErrorKind {
    /// Stable code of this diagnostic, e.g. `"S0202"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnterminatedString => "S0101",
            Self::NumberOutOfRange(_) => "S0102",
            Self::IllegalEscape(_) => "S0103",
            Self::InvalidUnicodeEscape => "S0104",
            Self::UnterminatedQuotedName => "S0105",
            Self::UnterminatedComment => "S0106",
            Self::Unexpected(_) => "S0201",
            Self::Expected { .. } => "S0202",
            Self::ExpectedBeforeEnd(_) => "S0203",
            Self::UnknownOperator(_) => "S0204",
            Self::UnknownToken(_) => "S0205",
            Self::UnknownShape(_) => "S0206",
            Self::UnexpectedEnd => "S0207",
            Self::LambdaArgument { .. } => "S0208",
            Self::PredicateAfterGroup => "S0209",
            Self::DuplicateGroup => "S0210",
            Self::NotPrefix(_) => "S0211",
            Self::InvalidBindTarget(_) => "S0212",
            Self::InvalidStep(_) => "S0213",
            Self::BindTargetNotVariable(_) => "S0214",
            Self::BindAfterStages => "S0215",
            Self::BindAfterSort => "S0216",
            Self::EmptyRegex => "S0301",
            Self::UnterminatedRegex => "S0302",
            Self::SignatureSymbol(_) => "S0401",
            Self::SignatureGroup => "S0402",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnterminatedString => {
                write!(f, "string literal must be terminated by a matching quote")
            }
            Self::NumberOutOfRange(n) => write!(f, "number out of range: {n}"),
            Self::IllegalEscape(c) => write!(f, "unsupported escape sequence: \\{c}"),
            Self::InvalidUnicodeEscape => {
                write!(f, "the escape sequence \\u must be followed by 4 hex digits")
            }
            Self::UnterminatedQuotedName => {
                write!(f, "quoted property name must be terminated with a backquote")
            }
            Self::UnterminatedComment => write!(f, "comment has no closing tag"),
            Self::Unexpected(t) => write!(f, "syntax error: {t}"),
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, got {found}")
            }
            Self::ExpectedBeforeEnd(t) => {
                write!(f, "expected {t} before end of expression")
            }
            Self::UnknownOperator(t) => write!(f, "unknown operator: {t}"),
            Self::UnknownToken(t) => write!(f, "unknown token kind: {t}"),
            Self::UnknownShape(t) => write!(f, "unknown expression type: {t}"),
            Self::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Self::LambdaArgument { index, .. } => write!(
                f,
                "parameter {index} of a lambda definition must be a variable name"
            ),
            Self::PredicateAfterGroup => write!(
                f,
                "a predicate cannot follow a grouping expression in a step"
            ),
            Self::DuplicateGroup => {
                write!(f, "each step can only have one grouping expression")
            }
            Self::NotPrefix(t) => {
                write!(f, "the symbol {t} cannot be used as a unary operator")
            }
            Self::InvalidBindTarget(t) => {
                write!(f, "{t} is not a valid binding target")
            }
            Self::InvalidStep(v) => write!(
                f,
                "the literal value {v} cannot be used as a step within a path expression"
            ),
            Self::BindTargetNotVariable(op) => {
                write!(f, "the right side of {op} must be a variable name")
            }
            Self::BindAfterStages => write!(
                f,
                "a context variable binding must precede any predicates on a step"
            ),
            Self::BindAfterSort => write!(
                f,
                "a context variable binding must precede the order-by clause on a step"
            ),
            Self::EmptyRegex => write!(f, "empty regular expressions are not allowed"),
            Self::UnterminatedRegex => {
                write!(f, "no terminating / in regular expression")
            }
            Self::SignatureSymbol(c) => write!(
                f,
                "type parameter {c} is not recognized in a function signature"
            ),
            Self::SignatureGroup => write!(
                f,
                "choice groups may not contain parameterized types"
            ),
        }
    }
}

/// A diagnostic: what went wrong and where.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    /// what went wrong
    pub kind: ErrorKind,
    /// byte offset just past the offending token
    pub position: usize,
    /// tokens left unconsumed when this diagnostic was recorded
    ///
    /// Only filled in recovering mode; lets editor tooling keep
    /// highlighting past the failure point.
    pub remaining: Option<Vec<Token>>,
}

impl Error {
    /// Create a diagnostic without a token tail.
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            remaining: None,
        }
    }

    /// Stable code of this diagnostic, e.g. `"S0202"`.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} @ {}: {}", self.code(), self.position, self.kind)
    }
}
