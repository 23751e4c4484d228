//! Post-parse rewrite of the raw operator tree into the canonical AST.
//!
//! One recursive pass, dispatched on the raw node kind. Chained field
//! access is flattened into ordered path steps, predicates/grouping/sorting
//! and context-variable bindings are attached to the step they apply to,
//! mutation operators are restructured into change blocks, and lambda
//! bodies are tail-call marked. After this pass no node contains the raw
//! `.`, `[`, `{` or `^` operators.
//!
//! Unlike the parse stage, most errors raised here are hard errors even in
//! recovering mode; only the unknown-shape codes recover.

use crate::ast::{
    Call, Change, ChangeOp, ChangeTarget, Clause, Expr, ExprKind, Grouping, Lambda, Path,
    PathSeg, SortTerm, Stage, Step,
};
use crate::error::{Error, ErrorKind};
use crate::ops::BinaryOp;
use crate::parse::{Node, NodeKind, RawClause};
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

pub(crate) fn optimize(node: Node, recover: bool, errors: &mut Vec<Error>) -> Result<Expr, Error> {
    Optimizer { recover, errors }.expr(node)
}

struct Optimizer<'e> {
    recover: bool,
    errors: &'e mut Vec<Error>,
}

/// Wrap a non-path expression into a one-step path.
fn into_path(expr: Expr) -> Path {
    match expr {
        Expr {
            kind: ExprKind::Path(path),
            ..
        } => path,
        expr => Path::one(Step::new(expr)),
    }
}

fn last_step(path: &mut Path, position: usize) -> Result<&mut Step, Error> {
    path.steps
        .last_mut()
        .ok_or_else(|| Error::new(ErrorKind::UnknownShape("path".to_string()), position))
}

fn value_text(kind: &ExprKind) -> String {
    match kind {
        ExprKind::Number(n) => alloc::format!("{n}"),
        ExprKind::Bool(b) => alloc::format!("{b}"),
        ExprKind::Null => "null".to_string(),
        _ => String::new(),
    }
}

/// Flattened description of a mutation's parent path: step names plus
/// literal string/number filter values, `input` for the root variable.
fn flatten_path(path: &Path) -> Vec<PathSeg> {
    let mut segs = Vec::new();
    for step in &path.steps {
        match &step.expr.kind {
            ExprKind::Variable(v) if v == "$" => segs.push(PathSeg::Key("input".to_string())),
            ExprKind::Variable(v) | ExprKind::Name(v) => segs.push(PathSeg::Key(v.clone())),
            _ => (),
        }
        if let Some(stage) = step.stages.first() {
            match &stage.expr.kind {
                ExprKind::Number(n) => segs.push(PathSeg::Index(*n)),
                ExprKind::Str(s) => segs.push(PathSeg::Key(s.clone())),
                _ => (),
            }
        }
    }
    segs
}

/// Mark tail positions of a lambda body: a direct call becomes a thunk the
/// evaluator can trampoline, conditionals are marked on both branches, and
/// a block only on its last expression.
fn tail_call(expr: Expr) -> Expr {
    let Expr {
        kind,
        position,
        keep_array,
        cons_array,
    } = expr;
    let kind = match kind {
        ExprKind::Function(call) if !call.partial => {
            let body = Expr {
                kind: ExprKind::Function(call),
                position,
                keep_array,
                cons_array,
            };
            return Expr::new(ExprKind::Lambda(Lambda::thunk(body)), position);
        }
        ExprKind::Condition {
            condition,
            then,
            otherwise,
        } => ExprKind::Condition {
            condition,
            then: Box::new(tail_call(*then)),
            otherwise: otherwise.map(|e| Box::new(tail_call(*e))),
        },
        ExprKind::Block(mut exprs) => {
            if let Some(tail) = exprs.pop() {
                exprs.push(tail_call(tail));
            }
            ExprKind::Block(exprs)
        }
        kind => kind,
    };
    Expr {
        kind,
        position,
        keep_array,
        cons_array,
    }
}

impl Optimizer<'_> {
    fn expr(&mut self, node: Node) -> Result<Expr, Error> {
        let keep = node.keep_array;
        let mut out = self.kind(node)?;
        if keep {
            out.keep_array = true;
        }
        Ok(out)
    }

    fn kind(&mut self, node: Node) -> Result<Expr, Error> {
        let Node {
            kind,
            position,
            keep_array,
        } = node;
        match kind {
            NodeKind::Binary { op, lhs, rhs } => self.binary(op, *lhs, *rhs, position, keep_array),
            NodeKind::Unary { op: "-", expression } => {
                let inner = self.expr(*expression)?;
                Ok(match inner.kind {
                    // fold negation of number literals
                    ExprKind::Number(n) => Expr {
                        kind: ExprKind::Number(-n),
                        ..inner
                    },
                    _ => Expr::new(ExprKind::Neg(Box::new(inner)), position),
                })
            }
            NodeKind::Unary { op: "~X", expression } => self.delete(*expression, position),
            NodeKind::Unary { op: "#'", expression } => self.assoc_ref(*expression, position),
            NodeKind::Unary { op, .. } => {
                Err(Error::new(ErrorKind::UnknownShape(op.to_string()), position))
            }
            NodeKind::Array(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.expr(item))
                    .collect::<Result<_, _>>()?;
                Ok(Expr::new(ExprKind::Array(items), position))
            }
            NodeKind::Object(pairs) => {
                let pairs = self.pairs(pairs)?;
                Ok(Expr::new(ExprKind::Object(pairs), position))
            }
            NodeKind::Group { lhs, pairs } => self.group(*lhs, pairs, position),
            NodeKind::Sort { lhs, terms } => self.sort(*lhs, terms, position),
            NodeKind::Block(items) => {
                let mut exprs = Vec::new();
                let mut cons = false;
                for item in items {
                    let part = self.expr(item)?;
                    cons = cons || consarray(&part);
                    exprs.push(part);
                }
                let mut out = Expr::new(ExprKind::Block(exprs), position);
                out.cons_array = cons;
                Ok(out)
            }
            NodeKind::Switch(clauses) => {
                let mut out_clauses = Vec::new();
                let mut cons = false;
                for clause in clauses {
                    out_clauses.push(match clause {
                        RawClause::Value(value) => {
                            let value = self.expr(value)?;
                            cons = cons || consarray(&value);
                            Clause::Value(value)
                        }
                        RawClause::Case {
                            condition,
                            then,
                            fallthrough,
                        } => {
                            let condition = self.expr(condition)?;
                            let then = self.expr(then)?;
                            cons = cons || consarray(&condition) || consarray(&then);
                            Clause::Case {
                                condition,
                                then,
                                fallthrough,
                            }
                        }
                    });
                }
                let mut out = Expr::new(ExprKind::Switch(out_clauses), position);
                out.cons_array = cons;
                Ok(out)
            }
            NodeKind::Call {
                procedure,
                arguments,
                partial,
            } => {
                let arguments = arguments
                    .into_iter()
                    .map(|arg| self.expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                // a qualified library callee keeps its raw name
                let procedure = match *procedure {
                    Node {
                        kind: NodeKind::Name { value, lib: true },
                        position,
                        ..
                    } => Expr::new(ExprKind::Variable(value), position),
                    node => self.expr(node)?,
                };
                let call = Call::new(procedure, arguments, partial);
                Ok(Expr::new(ExprKind::Function(call), position))
            }
            NodeKind::Lambda {
                procedure,
                arguments,
                signature,
                body,
            } => {
                let lib_name = match &procedure.kind {
                    NodeKind::Name { value, lib: true } => Some(value.clone()),
                    _ => None,
                };
                let arguments = arguments
                    .into_iter()
                    .map(|arg| self.leaf(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let body = tail_call(self.expr(*body)?);
                let lambda = Lambda {
                    arguments,
                    signature,
                    body: Box::new(body),
                    thunk: false,
                };
                Ok(match lib_name {
                    // a lib-mode lambda defines the library name itself
                    Some(name) => Expr::new(
                        ExprKind::Bind {
                            lhs: Box::new(Expr::new(ExprKind::Variable(name), position)),
                            rhs: Box::new(Expr::new(ExprKind::Lambda(lambda), position)),
                        },
                        position,
                    ),
                    None => Expr::new(ExprKind::Lambda(lambda), position),
                })
            }
            NodeKind::Ternary {
                condition,
                then,
                otherwise,
            } => Ok(Expr::new(
                ExprKind::Condition {
                    condition: Box::new(self.expr(*condition)?),
                    then: Box::new(self.expr(*then)?),
                    otherwise: match otherwise {
                        Some(e) => Some(Box::new(self.expr(*e)?)),
                        None => None,
                    },
                },
                position,
            )),
            NodeKind::Transform {
                pattern,
                update,
                delete,
            } => Ok(Expr::new(
                ExprKind::Transform {
                    pattern: Box::new(self.expr(*pattern)?),
                    update: Box::new(self.expr(*update)?),
                    delete: match delete {
                        Some(e) => Some(Box::new(self.expr(*e)?)),
                        None => None,
                    },
                },
                position,
            )),
            NodeKind::Name { value, .. } => {
                let mut inner = Expr::new(ExprKind::Name(value), position);
                inner.keep_array = keep_array;
                let mut path = Path::one(Step::new(inner));
                path.keep_singleton_array = keep_array;
                Ok(Expr::new(ExprKind::Path(path), position))
            }
            NodeKind::Variable(v) => Ok(Expr::new(ExprKind::Variable(v), position)),
            NodeKind::Str(s) => Ok(Expr::new(ExprKind::Str(s), position)),
            NodeKind::Number(n) => Ok(Expr::new(ExprKind::Number(n), position)),
            NodeKind::Bool(b) => Ok(Expr::new(ExprKind::Bool(b), position)),
            NodeKind::Null => Ok(Expr::new(ExprKind::Null, position)),
            NodeKind::Regex { pattern, flags } => {
                Ok(Expr::new(ExprKind::Regex { pattern, flags }, position))
            }
            NodeKind::Comment(c) => Ok(Expr::new(ExprKind::Comment(c), position)),
            NodeKind::Wildcard => Ok(Expr::new(ExprKind::Wildcard, position)),
            NodeKind::Descendant => Ok(Expr::new(ExprKind::Descendant, position)),
            NodeKind::Operator(op) => match op {
                // `and`/`or`/`in` in operand position are plain field names
                "and" | "or" | "in" => self.kind(Node {
                    kind: NodeKind::Name {
                        value: op.to_string(),
                        lib: false,
                    },
                    position,
                    keep_array,
                }),
                "?" => Ok(Expr::new(ExprKind::PartialArg, position)),
                _ => Err(Error::new(ErrorKind::Unexpected(op.to_string()), position)),
            },
            NodeKind::End => {
                let err = Error::new(ErrorKind::UnexpectedEnd, position);
                if self.recover {
                    self.errors.push(err.clone());
                    Ok(Expr::new(ExprKind::Error(Box::new(err)), position))
                } else {
                    Err(err)
                }
            }
            NodeKind::Error { error, lhs } => match lhs {
                // optimize the partial left-hand side so traversal of what
                // did parse can continue
                Some(lhs) => self.expr(*lhs),
                None => Ok(Expr::new(ExprKind::Error(error), position)),
            },
        }
    }

    fn binary(
        &mut self,
        op: &'static str,
        lhs: Node,
        rhs: Node,
        position: usize,
        keep_array: bool,
    ) -> Result<Expr, Error> {
        match op {
            "." => self.path_merge(lhs, rhs),
            "[" => self.filter(lhs, rhs, position),
            ":=" => Ok(Expr::new(
                ExprKind::Bind {
                    lhs: Box::new(self.expr(lhs)?),
                    rhs: Box::new(self.expr(rhs)?),
                },
                position,
            )),
            "::" => self.assoc_bind(lhs, rhs, position),
            "@" | "#" => self.context(op, lhs, rhs, position, keep_array),
            "~>" => self.apply(lhs, rhs, position),
            "<~" => self.assign(lhs, rhs, position),
            op => match BinaryOp::from_id(op) {
                Some(op) => Ok(Expr::new(
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(self.expr(lhs)?),
                        rhs: Box::new(self.expr(rhs)?),
                    },
                    position,
                )),
                None => Err(Error::new(ErrorKind::UnknownShape(op.to_string()), position)),
            },
        }
    }

    /// `lhs . rhs`: merge both sides into one path.
    fn path_merge(&mut self, lhs: Node, rhs: Node) -> Result<Expr, Error> {
        let left = self.expr(lhs)?;
        let left_position = left.position;
        let mut path = into_path(left);
        let rest = self.expr(rhs)?;

        // next call in a chain of calls overrides a thenable
        if let ExprKind::Function(call) = &rest.kind {
            if let ExprKind::Path(p) = &call.procedure.kind {
                if let [step] = &p.steps[..] {
                    if let ExprKind::Name(name) = &step.expr.kind {
                        if let Some(ExprKind::Function(prev)) =
                            path.steps.last_mut().map(|s| &mut s.expr.kind)
                        {
                            prev.next_function = Some(name.clone());
                        }
                    }
                }
            }
        }

        path.steps.extend(into_path(rest).steps);

        // steps may not be numbers or the values true/false/null;
        // string literal steps become names
        for step in &mut path.steps {
            match &step.expr.kind {
                ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Null => {
                    return Err(Error::new(
                        ErrorKind::InvalidStep(value_text(&step.expr.kind)),
                        step.expr.position,
                    ));
                }
                ExprKind::Str(s) => step.expr.kind = ExprKind::Name(s.clone()),
                _ => (),
            }
        }
        path.keep_singleton_array = path.steps.iter().any(|s| s.expr.keep_array);
        // array constructors at either end of a path must not flatten
        if let Some(first) = path.steps.first_mut() {
            if matches!(first.expr.kind, ExprKind::Array(_)) {
                first.expr.cons_array = true;
            }
        }
        if let Some(last) = path.steps.last_mut() {
            if matches!(last.expr.kind, ExprKind::Array(_)) {
                last.expr.cons_array = true;
            }
        }
        Ok(Expr::new(ExprKind::Path(path), left_position))
    }

    /// `lhs[rhs]`: attach a filter stage to the last step.
    fn filter(&mut self, lhs: Node, rhs: Node, position: usize) -> Result<Expr, Error> {
        let left = self.expr(lhs)?;
        let left_position = left.position;
        let mut path = into_path(left);
        let step = last_step(&mut path, position)?;
        if step.group.is_some() {
            return Err(Error::new(ErrorKind::PredicateAfterGroup, position));
        }
        let expr = self.expr(rhs)?;
        step.stages.push(Stage { expr, position });
        Ok(Expr::new(ExprKind::Path(path), left_position))
    }

    /// `lhs{pairs}`: attach a group-by spec to the last step.
    fn group(&mut self, lhs: Node, pairs: Vec<(Node, Node)>, position: usize) -> Result<Expr, Error> {
        let left = self.expr(lhs)?;
        let left_position = left.position;
        let mut path = into_path(left);
        let step = last_step(&mut path, position)?;
        if step.group.is_some() {
            return Err(Error::new(ErrorKind::DuplicateGroup, position));
        }
        let pairs = self.pairs(pairs)?;
        step.group = Some(Grouping { pairs, position });
        Ok(Expr::new(ExprKind::Path(path), left_position))
    }

    fn pairs(&mut self, pairs: Vec<(Node, Node)>) -> Result<Vec<(Expr, Expr)>, Error> {
        pairs
            .into_iter()
            .map(|(k, v)| Ok((self.expr(k)?, self.expr(v)?)))
            .collect()
    }

    /// `lhs^(terms)`: append a sort step.
    fn sort(&mut self, lhs: Node, terms: Vec<(bool, Node)>, position: usize) -> Result<Expr, Error> {
        let left = self.expr(lhs)?;
        let left_position = left.position;
        let terms = terms
            .into_iter()
            .map(|(descending, e)| {
                Ok(SortTerm {
                    descending,
                    expression: self.expr(e)?,
                })
            })
            .collect::<Result<_, Error>>()?;
        let mut path = into_path(left);
        path.steps
            .push(Step::new(Expr::new(ExprKind::Sort(terms), position)));
        Ok(Expr::new(ExprKind::Path(path), left_position))
    }

    /// `lhs :: rhs`: bind under an association name; the right side is
    /// deferred in a thunk.
    fn assoc_bind(&mut self, lhs: Node, rhs: Node, position: usize) -> Result<Expr, Error> {
        let left = self.expr(lhs)?;
        let left_position = left.position;
        // coerce a one-step path or a bare string to a variable reference
        let coerced = match &left.kind {
            ExprKind::Path(p) if p.steps.len() == 1 => match &p.steps[0].expr.kind {
                ExprKind::Name(v) => Some(v.clone()),
                _ => None,
            },
            ExprKind::Str(s) => Some(s.clone()),
            _ => None,
        };
        let left = match coerced {
            Some(v) => Expr::new(ExprKind::Variable(v), left_position),
            None => left,
        };
        let thunk = Lambda::thunk(self.expr(rhs)?);
        Ok(Expr::new(
            ExprKind::Bind {
                lhs: Box::new(left),
                rhs: Box::new(Expr::new(ExprKind::Lambda(thunk), position)),
            },
            position,
        ))
    }

    /// `lhs@$x` / `lhs#$x`: bind a focus or index variable on the last step.
    fn context(
        &mut self,
        op: &'static str,
        lhs: Node,
        rhs: Node,
        position: usize,
        keep_array: bool,
    ) -> Result<Expr, Error> {
        let left = self.expr(lhs)?;
        let left_position = left.position;
        let mut path = into_path(left);
        let step = last_step(&mut path, position)?;
        // these operators bind to the most recent, not-yet-filtered position
        if !step.stages.is_empty() {
            return Err(Error::new(ErrorKind::BindAfterStages, position));
        }
        if matches!(step.expr.kind, ExprKind::Sort(_)) {
            return Err(Error::new(ErrorKind::BindAfterSort, position));
        }
        let var = match rhs.kind {
            NodeKind::Variable(v) => v,
            _ => return Err(Error::new(ErrorKind::BindTargetNotVariable(op), rhs.position)),
        };
        if keep_array {
            step.expr.keep_array = true;
        }
        if op == "@" {
            step.focus = Some(var);
        } else {
            step.index = Some(var);
        }
        step.tuple = true;
        Ok(Expr::new(ExprKind::Path(path), left_position))
    }

    /// `lhs ~> rhs`: chained application; when the right side is a path (or
    /// the payload root), it becomes an in-place change of that path.
    fn apply(&mut self, lhs: Node, rhs: Node, position: usize) -> Result<Expr, Error> {
        let left = self.expr(lhs)?;
        let right = self.expr(rhs)?;
        match right {
            Expr {
                kind: ExprKind::Path(path),
                ..
            } => self.change_into_path(path, ChangeOp::Apply, Some(left), position),
            right if matches!(&right.kind, ExprKind::Variable(v) if v == "$") => Ok(Expr::new(
                ExprKind::Change(Change {
                    op: ChangeOp::Apply,
                    target: Box::new(ChangeTarget::Expr(right)),
                    value: Some(Box::new(left)),
                }),
                position,
            )),
            right => Ok(Expr::new(
                ExprKind::Apply {
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
                position,
            )),
        }
    }

    /// `lhs <~ rhs`: assignment at a path.
    fn assign(&mut self, lhs: Node, rhs: Node, position: usize) -> Result<Expr, Error> {
        let target = self.expr(lhs)?;
        let value = self.expr(rhs)?;
        match target {
            Expr {
                kind: ExprKind::Path(path),
                ..
            } => self.change_into_path(path, ChangeOp::Assign, Some(value), position),
            target => Ok(Expr::new(
                ExprKind::Change(Change {
                    op: ChangeOp::Assign,
                    target: Box::new(ChangeTarget::Expr(target)),
                    value: Some(Box::new(value)),
                }),
                position,
            )),
        }
    }

    /// `lhs ~X`: deletion at a path.
    fn delete(&mut self, expression: Node, position: usize) -> Result<Expr, Error> {
        let target = self.expr(expression)?;
        match target {
            Expr {
                kind: ExprKind::Path(path),
                ..
            } => self.change_into_path(path, ChangeOp::Delete, None, position),
            target => Ok(Expr::new(
                ExprKind::Change(Change {
                    op: ChangeOp::Delete,
                    target: Box::new(ChangeTarget::Expr(target)),
                    value: None,
                }),
                position,
            )),
        }
    }

    /// Restructure `path <op> value` into
    /// `parent-steps . ( change(last-step) )`: the final step is popped (or
    /// replaced by an empty placeholder if it carries predicates), the
    /// remaining steps are marked for materialization, and the change is
    /// appended as a one-expression block step.
    fn change_into_path(
        &mut self,
        mut path: Path,
        op: ChangeOp,
        value: Option<Expr>,
        position: usize,
    ) -> Result<Expr, Error> {
        let placeholder = || Step::new(Expr::new(ExprKind::Variable(String::new()), 0));
        let has_stages = path.steps.last().map_or(false, |s| !s.stages.is_empty());
        let mut target = if has_stages {
            // the predicated step stays on the path
            placeholder()
        } else {
            path.steps.pop().unwrap_or_else(placeholder)
        };
        for step in &mut path.steps {
            if op == ChangeOp::Delete {
                step.deletion = true;
            } else {
                step.create_missing = true;
            }
        }
        if op != ChangeOp::Delete {
            target.parent = Some(flatten_path(&path));
        }
        let change = Expr::new(
            ExprKind::Change(Change {
                op,
                target: Box::new(ChangeTarget::Step(target)),
                value: value.map(Box::new),
            }),
            position,
        );
        let block = Expr::new(ExprKind::Block(alloc::vec![change]), position);
        path.steps.push(Step::new(block));
        path.change = true;
        Ok(Expr::new(ExprKind::Path(path), position))
    }

    /// `#'name`: retype the first step into a backtick-mode call.
    fn assoc_ref(&mut self, expression: Node, position: usize) -> Result<Expr, Error> {
        let inner = self.expr(expression)?;
        let mut path = into_path(inner);
        if let Some(first) = path.steps.first_mut() {
            let name = match &first.expr.kind {
                ExprKind::Name(v) | ExprKind::Str(v) | ExprKind::Variable(v) => Some(v.clone()),
                _ => None,
            };
            if let Some(name) = name {
                let procedure = Expr::new(ExprKind::Variable(name), first.expr.position);
                let mut call = Call::new(procedure, Vec::new(), false);
                call.backtick = true;
                // predicates live on the step, outside the new call
                first.expr = Expr::new(ExprKind::Function(call), position);
            }
        }
        Ok(Expr::new(ExprKind::Path(path), position))
    }

    /// Convert a raw lambda argument without path-wrapping it.
    fn leaf(&mut self, node: Node) -> Result<Expr, Error> {
        let position = node.position;
        Ok(match node.kind {
            NodeKind::Variable(v) => Expr::new(ExprKind::Variable(v), position),
            NodeKind::Name { value, .. } => Expr::new(ExprKind::Name(value), position),
            NodeKind::Str(s) => Expr::new(ExprKind::Str(s), position),
            kind => self.expr(Node {
                kind,
                position,
                keep_array: false,
            })?,
        })
    }
}

fn consarray(expr: &Expr) -> bool {
    expr.cons_array
        || matches!(&expr.kind, ExprKind::Path(p)
            if p.steps.first().map_or(false, |s| s.expr.cons_array))
}
