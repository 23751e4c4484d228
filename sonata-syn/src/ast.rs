//! Canonical abstract syntax tree.
//!
//! This is the shape an evaluator consumes. The raw operator tree produced
//! by the parser never leaves this crate; the optimizer rewrites it so that
//! chained field access becomes an ordered list of [`Step`]s, with
//! predicates, grouping, sorting and variable bindings attached to the step
//! they apply to. After optimization no node contains the raw `.`, `[`,
//! `{` or `^` operators.

use crate::error::Error;
use crate::ops::BinaryOp;
use crate::signature::Signature;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
#[cfg(feature = "serde")]
use serde::Serialize;

/// A canonical expression: kind plus common annotations.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// what this node is
    pub kind: ExprKind,
    /// byte offset just past the token this node was built from
    pub position: usize,
    /// an empty predicate (`[]`) asked to keep singleton arrays here
    pub keep_array: bool,
    /// array constructor used as a path step; its result must not be
    /// flattened into the surrounding sequence
    pub cons_array: bool,
}

impl Expr {
    /// Expression without annotations.
    pub fn new(kind: ExprKind, position: usize) -> Self {
        Self {
            kind,
            position,
            keep_array: false,
            cons_array: false,
        }
    }
}

/// The different kinds of canonical expressions.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Location path: an ordered sequence of steps
    Path(Path),
    /// Field name
    Name(String),
    /// Variable reference (`$x`, or `` `#tagged` `` names)
    Variable(String),
    /// Number literal
    Number(f64),
    /// String literal
    Str(String),
    /// Boolean literal
    Bool(bool),
    /// Null literal
    Null,
    /// Regular expression literal; pattern and flags are kept as written,
    /// compiling them is the evaluator's concern
    Regex {
        /// the text between the `/` delimiters
        pattern: String,
        /// trailing flags; `g` is always present
        flags: String,
    },
    /// Single-level wildcard (`*`)
    Wildcard,
    /// Multi-level descendant wildcard (`**`)
    Descendant,
    /// Documentation comment (`/** … */`), preserved for tooling
    Comment(String),
    /// Parenthesized expression sequence; its value is the last expression's
    Block(Vec<Expr>),
    /// Array constructor
    Array(Vec<Expr>),
    /// Object constructor: `key: value` pairs
    Object(Vec<(Expr, Expr)>),
    /// Residual binary operation (arithmetic, comparison, …)
    Binary {
        /// the operator
        op: BinaryOp,
        /// left operand
        lhs: Box<Expr>,
        /// right operand
        rhs: Box<Expr>,
    },
    /// Negation of a non-literal expression
    /// (negated number literals are folded at optimization time)
    Neg(Box<Expr>),
    /// Function invocation, or partial application if any argument is `?`
    Function(Call),
    /// Lambda definition
    Lambda(Lambda),
    /// Conditional (`cond ? then : else`)
    Condition {
        /// decides the branch
        condition: Box<Expr>,
        /// taken when the condition holds
        then: Box<Expr>,
        /// taken otherwise, absent for one-armed conditionals
        otherwise: Option<Box<Expr>>,
    },
    /// Object transformer (`|pattern|update[,delete]|`)
    Transform {
        /// selects the objects to transform
        pattern: Box<Expr>,
        /// object merged into each match
        update: Box<Expr>,
        /// fields removed from each match
        delete: Option<Box<Expr>>,
    },
    /// Switch block (`?{ … }?`)
    Switch(Vec<Clause>),
    /// Variable binding (`:=`) or association binding (`::`)
    Bind {
        /// the variable being bound
        lhs: Box<Expr>,
        /// the bound value; a deferred thunk for association bindings
        rhs: Box<Expr>,
    },
    /// Chained application (`lhs ~> rhs`) where the right side is a function
    Apply {
        /// value piped into the function
        lhs: Box<Expr>,
        /// the function applied to it
        rhs: Box<Expr>,
    },
    /// In-place mutation produced by `~>`, `<~` or `~X`
    Change(Change),
    /// Sort specification; only ever appears as a step inside a path
    Sort(Vec<SortTerm>),
    /// `?` placeholder argument inside a partial application
    PartialArg,
    /// Placeholder for a construct that failed to parse (recovering mode);
    /// carries the diagnostic so traversal can continue
    Error(Box<Error>),
}

/// Function (or partial-application) invocation.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    /// what is being invoked
    pub procedure: Box<Expr>,
    /// argument expressions; `?` placeholders for partial application
    pub arguments: Vec<Expr>,
    /// true if any argument was a `?` placeholder
    pub partial: bool,
    /// invocation created by the association-ref operator (`#'`)
    pub backtick: bool,
    /// name of the next call in a `.`-chain of calls, used by the
    /// evaluator to override thenables
    pub next_function: Option<String>,
}

impl Call {
    pub(crate) fn new(procedure: Expr, arguments: Vec<Expr>, partial: bool) -> Self {
        Self {
            procedure: Box::new(procedure),
            arguments,
            partial,
            backtick: false,
            next_function: None,
        }
    }
}

/// Lambda definition.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    /// parameter list; each entry is a variable unless the lambda was
    /// declared through a qualified library name
    pub arguments: Vec<Expr>,
    /// optional type signature
    pub signature: Option<Signature>,
    /// the lambda body
    pub body: Box<Expr>,
    /// deferred, non-evaluating wrapper inserted by tail-call marking;
    /// the evaluator unwraps these on a trampoline instead of recursing
    pub thunk: bool,
}

impl Lambda {
    /// A thunk: zero-parameter, non-evaluating wrapper around `body`.
    pub(crate) fn thunk(body: Expr) -> Self {
        Self {
            arguments: Vec::new(),
            signature: None,
            body: Box::new(body),
            thunk: true,
        }
    }
}

/// Location path: ordered steps, evaluated left to right.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    /// the steps
    pub steps: Vec<Step>,
    /// some step carried an empty predicate (`[]`), so singleton results
    /// must stay wrapped in arrays
    pub keep_singleton_array: bool,
    /// the final step is a mutation block produced by `~>`, `<~` or `~X`
    pub change: bool,
}

impl Path {
    pub(crate) fn one(step: Step) -> Self {
        Self {
            steps: alloc::vec![step],
            keep_singleton_array: false,
            change: false,
        }
    }
}

/// One element of a [`Path`]: a base expression plus everything that was
/// attached to this position of the path.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// the base expression (name, variable, wildcard, call, …)
    pub expr: Expr,
    /// filter predicates, applied in order
    pub stages: Vec<Stage>,
    /// group-by specification
    pub group: Option<Grouping>,
    /// variable bound to the focus value (`@$x`)
    pub focus: Option<String>,
    /// variable bound to the position index (`#$i`)
    pub index: Option<String>,
    /// step binds focus or index variables, so the evaluator must carry
    /// tuple frames through it
    pub tuple: bool,
    /// mutation target: intermediate objects on this path are created
    /// when absent
    pub create_missing: bool,
    /// mutation target of a deletion (`~X`)
    pub deletion: bool,
    /// flattened description of the parent path, precomputed for the
    /// evaluator's write-path materialization
    pub parent: Option<Vec<PathSeg>>,
}

impl Step {
    /// Step around a base expression, with nothing attached yet.
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            stages: Vec::new(),
            group: None,
            focus: None,
            index: None,
            tuple: false,
            create_missing: false,
            deletion: false,
            parent: None,
        }
    }
}

/// A filter stage attached to a step (`step[predicate]`).
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    /// the predicate expression
    pub expr: Expr,
    /// position of the opening `[`
    pub position: usize,
}

/// Group-by specification attached to a step (`step{key: value, …}`).
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Grouping {
    /// `key: value` expression pairs
    pub pairs: Vec<(Expr, Expr)>,
    /// position of the opening `{`
    pub position: usize,
}

/// One term of an order-by clause (`^(>a, b)`).
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SortTerm {
    /// `>` prefix: sort descending
    pub descending: bool,
    /// the sort key
    pub expression: Expr,
}

/// One entry of a switch block.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    /// Bare expression evaluated for its value
    Value(Expr),
    /// `condition => then` case
    Case {
        /// guard expression
        condition: Expr,
        /// result when the guard matches
        then: Expr,
        /// a trailing `,` marked this case as falling through to the next
        fallthrough: bool,
    },
}

/// Which mutation operator produced a [`Change`].
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeOp {
    /// `value ~> path` — apply a value into a path
    Apply,
    /// `path <~ value` — assign a value at a path
    Assign,
    /// `path ~X` — delete at a path
    Delete,
}

/// In-place mutation, restructured out of its surrounding path.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    /// the operator this mutation came from
    pub op: ChangeOp,
    /// what is being written to or deleted
    pub target: Box<ChangeTarget>,
    /// the written value; absent for deletions
    pub value: Option<Box<Expr>>,
}

/// Target of a [`Change`].
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeTarget {
    /// the final step popped off the surrounding path
    Step(Step),
    /// a bare expression, when the operand was not a path
    Expr(Expr),
}

/// One segment of a flattened parent-path description.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum PathSeg {
    /// field name; the root variable `$$` becomes `input`
    Key(String),
    /// literal numeric index taken from a filter stage
    Index(f64),
}
