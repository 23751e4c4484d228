//! Binary operators that survive into the canonical tree.
//!
//! Path-forming operators (`.`, `[`, `{`, `^`, `@`, `#`) and the mutation
//! operators are absorbed into path steps during optimization; the operators
//! here are the ones an evaluator still sees as plain binary nodes.

use core::fmt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Binary arithmetical operators (`+`, `-`, `*`, `/`, `%`)
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MathOp {
    /// Addition operator (`+`)
    Add,
    /// Subtraction operator (`-`)
    Sub,
    /// Multiplication operator (`*`)
    Mul,
    /// Division operator (`/`)
    Div,
    /// Remainder operator (`%`)
    Rem,
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add => "+".fmt(f),
            Self::Sub => "-".fmt(f),
            Self::Mul => "*".fmt(f),
            Self::Div => "/".fmt(f),
            Self::Rem => "%".fmt(f),
        }
    }
}

/// Binary comparative operators (`<`, `<=`, `>`, `>=`, `=`, `!=`)
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrdOp {
    /// Less-than operation (`<`).
    Lt,
    /// Less-than or equal-to operation (`<=`).
    Le,
    /// Greater-than operation (`>`).
    Gt,
    /// Greater-than or equal-to operation (`>=`).
    Ge,
    /// Equal-to operation (`=`).
    Eq,
    /// Not equal-to operation (`!=`).
    Ne,
}

impl fmt::Display for OrdOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Lt => "<".fmt(f),
            Self::Le => "<=".fmt(f),
            Self::Gt => ">".fmt(f),
            Self::Ge => ">=".fmt(f),
            Self::Eq => "=".fmt(f),
            Self::Ne => "!=".fmt(f),
        }
    }
}

/// Binary operators (`+`, …, `<`, …, `&`, `and`, `or`, `in`, `..`, `~=`, `||`)
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// Arithmetical operator (`+`, `-`, `*`, `/`, `%`)
    Math(MathOp),
    /// Comparative operator (`<`, `<=`, `>`, `>=`, `=`, `!=`)
    Ord(OrdOp),
    /// String concatenation operator (`&`)
    Concat,
    /// Boolean conjunction (`and`)
    And,
    /// Boolean disjunction (`or`)
    Or,
    /// Array membership operator (`in`)
    In,
    /// Range operator (`..`), only valid inside array constructors
    Range,
    /// Regex match operator (`~=`)
    Match,
    /// Chain operator (`||`), yields the right side if the left is absent
    Chain,
}

impl BinaryOp {
    /// Operator for the given source spelling, if it survives optimization.
    pub(crate) fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "+" => Self::Math(MathOp::Add),
            "-" => Self::Math(MathOp::Sub),
            "*" => Self::Math(MathOp::Mul),
            "/" => Self::Math(MathOp::Div),
            "%" => Self::Math(MathOp::Rem),
            "<" => Self::Ord(OrdOp::Lt),
            "<=" => Self::Ord(OrdOp::Le),
            ">" => Self::Ord(OrdOp::Gt),
            ">=" => Self::Ord(OrdOp::Ge),
            "=" => Self::Ord(OrdOp::Eq),
            "!=" => Self::Ord(OrdOp::Ne),
            "&" => Self::Concat,
            "and" => Self::And,
            "or" => Self::Or,
            "in" => Self::In,
            ".." => Self::Range,
            "~=" => Self::Match,
            "||" => Self::Chain,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Math(op) => op.fmt(f),
            Self::Ord(op) => op.fmt(f),
            Self::Concat => "&".fmt(f),
            Self::And => "and".fmt(f),
            Self::Or => "or".fmt(f),
            Self::In => "in".fmt(f),
            Self::Range => "..".fmt(f),
            Self::Match => "~=".fmt(f),
            Self::Chain => "||".fmt(f),
        }
    }
}
