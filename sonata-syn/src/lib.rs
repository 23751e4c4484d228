//! JSON query and transformation language syntax.
//!
//! This crate turns sonata source text into a canonical abstract syntax tree:
//!
//! 1. [`lex`] scans tokens on demand, steered by the parser's knowledge of
//!    whether an operand or an operator comes next (this is what tells a `/`
//!    apart from the start of a regex literal),
//! 2. [`parse`] runs a top-down operator-precedence parser over a symbol
//!    table that is built once per invocation,
//! 3. a post-parse pass rewrites the raw operator tree into the
//!    path-oriented [`ast`] consumed by an evaluator.
//!
//! Parsing is deterministic and purely functional from the outside: no state
//! is shared between invocations, so expressions can be parsed from multiple
//! threads without synchronization.
#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod ast;
pub mod error;
pub mod lex;
mod optimize;
pub mod ops;
mod parse;
pub mod signature;

pub use ast::Expr;
pub use error::{Error, ErrorKind};
pub use parse::{parse, parse_recover};
