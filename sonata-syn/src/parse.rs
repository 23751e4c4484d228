//! Top-down operator-precedence parsing.
//!
//! A [`Symbols`] table maps every operator spelling to its binding power and
//! its prefix/infix behaviors, resolved to plain function pointers when the
//! table is built. The [`Parser`] owns the tokenizer, the current lookahead
//! (already paired with its behaviors) and the diagnostics collected in
//! recovering mode; [`Parser::expression`] is the classical Pratt loop over
//! that state.
//!
//! The raw [`Node`] tree built here still contains the path-forming
//! operators; it is handed to the optimizer before anything leaves the
//! crate.

use crate::ast::Expr;
use crate::error::{Error, ErrorKind};
use crate::lex::{binding_power, Lexer, Token, TokenKind};
use crate::optimize;
use crate::signature::{self, Signature};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Parse an expression; the first error aborts.
///
/// ```
/// let ast = sonata_syn::parse("Account.Order[0].Price").unwrap();
/// ```
pub fn parse(source: &str) -> Result<Expr, Error> {
    run(source, false).map(|(ast, _)| ast)
}

/// Parse an expression, collecting lexical and syntactic errors instead of
/// aborting on them. Failed constructs are replaced by error nodes so the
/// result is still traversable, e.g. for editor tooling.
///
/// Semantically invalid constructs (bad path steps, duplicate group-by, …)
/// still abort: there is no recovery at that stage.
pub fn parse_recover(source: &str) -> Result<(Expr, Vec<Error>), Error> {
    run(source, true)
}

fn run(source: &str, recover: bool) -> Result<(Expr, Vec<Error>), Error> {
    let mut parser = Parser::new(source, recover);
    parser.advance(None, false)?;
    let node = parser.expression(0)?;
    if parser.head.id != "(end)" {
        let at = parser.head.node.position;
        let err = Error::new(ErrorKind::Unexpected(text(&parser.head.node)), at);
        parser.handle_error(err)?;
    }
    let mut errors = parser.errors;
    let ast = optimize::optimize(node, recover, &mut errors)?;
    Ok((ast, errors))
}

/// Raw parse-tree node. Lives only between parsing and optimization.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub position: usize,
    /// an empty predicate (`[]`) was applied here
    pub keep_array: bool,
}

impl Node {
    pub fn new(kind: NodeKind, position: usize) -> Self {
        Self {
            kind,
            position,
            keep_array: false,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    End,
    Name { value: String, lib: bool },
    Variable(String),
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    Regex { pattern: String, flags: String },
    Comment(String),
    /// operator token in operand position (`and` as a field name, `?` as a
    /// partial-application placeholder)
    Operator(&'static str),
    Wildcard,
    Descendant,
    Unary { op: &'static str, expression: Box<Node> },
    Binary { op: &'static str, lhs: Box<Node>, rhs: Box<Node> },
    Array(Vec<Node>),
    Object(Vec<(Node, Node)>),
    Group { lhs: Box<Node>, pairs: Vec<(Node, Node)> },
    Sort { lhs: Box<Node>, terms: Vec<(bool, Node)> },
    Block(Vec<Node>),
    Switch(Vec<RawClause>),
    Call { procedure: Box<Node>, arguments: Vec<Node>, partial: bool },
    Lambda { procedure: Box<Node>, arguments: Vec<Node>, signature: Option<Signature>, body: Box<Node> },
    Ternary { condition: Box<Node>, then: Box<Node>, otherwise: Option<Box<Node>> },
    Transform { pattern: Box<Node>, update: Box<Node>, delete: Option<Box<Node>> },
    Error { error: Box<Error>, lhs: Option<Box<Node>> },
}

#[derive(Clone, Debug)]
pub(crate) enum RawClause {
    Value(Node),
    Case { condition: Node, then: Node, fallthrough: bool },
}

/// Source text of a token-shaped node, for error payloads.
pub(crate) fn text(node: &Node) -> String {
    match &node.kind {
        NodeKind::Name { value, .. } => value.clone(),
        NodeKind::Variable(v) => v.clone(),
        NodeKind::Str(s) => s.clone(),
        NodeKind::Number(n) => alloc::format!("{n}"),
        NodeKind::Bool(b) => alloc::format!("{b}"),
        NodeKind::Null => "null".to_string(),
        NodeKind::Operator(op) => (*op).to_string(),
        NodeKind::Regex { pattern, .. } => pattern.clone(),
        NodeKind::Comment(c) => c.clone(),
        NodeKind::End => "(end)".to_string(),
        _ => String::new(),
    }
}

fn to_token(node: &Node) -> Option<Token> {
    let kind = match &node.kind {
        NodeKind::Name { value, lib } => TokenKind::Name {
            value: value.clone(),
            lib: *lib,
        },
        NodeKind::Variable(v) => TokenKind::Variable(v.clone()),
        NodeKind::Str(s) => TokenKind::Str(s.clone()),
        NodeKind::Number(n) => TokenKind::Number(*n),
        NodeKind::Bool(b) => TokenKind::Bool(*b),
        NodeKind::Null => TokenKind::Null,
        NodeKind::Operator(op) => TokenKind::Operator(op),
        NodeKind::Regex { pattern, flags } => TokenKind::Regex {
            pattern: pattern.clone(),
            flags: flags.clone(),
        },
        NodeKind::Comment(c) => TokenKind::Comment(c.clone()),
        _ => return None,
    };
    Some(Token {
        kind,
        position: node.position,
    })
}

type Nud = fn(&mut Parser<'_>, Node) -> Result<Node, Error>;
type Led = fn(&mut Parser<'_>, Node, Node) -> Result<Node, Error>;

/// Behaviors of one operator spelling.
#[derive(Clone, Copy)]
struct Symbol {
    lbp: u8,
    nud: Option<Nud>,
    led: Option<Led>,
}

/// Operator registry: spelling → binding power and behaviors.
///
/// Built once per parse invocation and read-only afterwards. Registering a
/// spelling twice keeps the maximum binding power, so `and`, `or` and `in`
/// can be both infix operators and zero-power terminals (plain field names).
struct Symbols(BTreeMap<&'static str, Symbol>);

impl Symbols {
    fn register(&mut self, id: &'static str, bp: u8) -> &mut Symbol {
        let sym = self.0.entry(id).or_insert(Symbol {
            lbp: 0,
            nud: None,
            led: None,
        });
        if bp > sym.lbp {
            sym.lbp = bp;
        }
        sym
    }

    /// Stop character: parseable only where the grammar asks for it.
    fn symbol(&mut self, id: &'static str) {
        self.register(id, 0);
    }

    /// Token that stands for itself in operand position.
    fn terminal(&mut self, id: &'static str) {
        self.register(id, 0).nud = Some(nud_self);
    }

    /// Left-associative infix operator with the default binary behavior.
    fn infix(&mut self, id: &'static str) {
        self.infix_with(id, led_binary);
    }

    fn infix_with(&mut self, id: &'static str, led: Led) {
        self.register(id, binding_power(id)).led = Some(led);
    }

    /// Right-associative infix operator.
    fn infixr(&mut self, id: &'static str, bp: u8, led: Led) {
        self.register(id, bp).led = Some(led);
    }

    fn prefix(&mut self, id: &'static str, nud: Nud) {
        self.register(id, 0).nud = Some(nud);
    }

    /// Postfix operator.
    fn suffix(&mut self, id: &'static str, led: Led) {
        self.register(id, binding_power(id)).led = Some(led);
    }

    fn get(&self, id: &str) -> Option<Symbol> {
        self.0.get(id).copied()
    }

    fn new() -> Self {
        let mut s = Symbols(BTreeMap::new());
        s.terminal("(end)");
        s.terminal("(name)");
        s.terminal("(literal)");
        s.terminal("(regex)");
        s.symbol(":");
        s.symbol(";");
        s.symbol(",");
        s.symbol(")");
        s.symbol("]");
        s.symbol("}");
        s.symbol("..");
        s.infix("."); // field reference
        s.infix("+");
        s.infix("-");
        s.infix("*");
        s.infix("/");
        s.infix("%");
        s.infix("=");
        s.infix("<");
        s.infix(">");
        s.infix("!=");
        s.infix("<=");
        s.infix(">=");
        s.infix("&"); // string concatenation
        s.infix("and");
        s.infix("or");
        s.infix("in");
        // the keywords can also be used as terminals (field names)
        s.terminal("and");
        s.terminal("or");
        s.terminal("in");
        s.prefix("-", nud_unary); // numeric negation
        s.infix("~>"); // function application / path setup
        s.symbol("?{");
        s.symbol("}?");
        s.symbol("=>");
        s.infix("||");
        s.infix("<~"); // path setup
        s.suffix("~X", led_delete); // path deletion
        s.infix("~="); // match function
        s.infixr("(error)", 10, led_error);
        s.prefix("*", nud_wildcard); // field wildcard (single level)
        s.prefix("**", nud_descendant); // descendant wildcard (multi-level)
        s.infix_with("(", led_call); // function invocation
        s.prefix("(", nud_block); // block expression
        s.prefix("?{", nud_switch); // switch block
        s.prefix("#'", nud_unary); // association reference
        s.infixr("::", binding_power("::"), led_assoc); // association assign
        s.prefix("[", nud_array); // array constructor
        s.infix_with("[", led_filter); // predicate or array index
        s.infix_with("^", led_sort); // order-by
        s.prefix("{", nud_object); // object constructor
        s.infix_with("{", led_group); // object grouping
        s.infixr(":=", binding_power(":="), led_bind); // bind variable
        s.infix_with("@", led_focus); // focus variable bind
        s.infix_with("#", led_index); // index variable bind
        s.infix_with("?", led_ternary); // if/then/else ternary
        s.prefix("|", nud_transform); // object transformer
        s
    }
}

/// The current lookahead, paired with its resolved behaviors.
struct Head {
    id: &'static str,
    lbp: u8,
    nud: Option<Nud>,
    led: Option<Led>,
    node: Node,
}

impl Head {
    fn end(position: usize) -> Self {
        Head {
            id: "(end)",
            lbp: 0,
            nud: Some(nud_self),
            led: None,
            node: Node::new(NodeKind::End, position),
        }
    }
}

/// Parser context: tokenizer, lookahead and diagnostics.
pub(crate) struct Parser<'s> {
    lexer: Lexer<'s>,
    symbols: Symbols,
    head: Head,
    src_len: usize,
    recover: bool,
    errors: Vec<Error>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, recover: bool) -> Self {
        Self {
            lexer: Lexer::new(source),
            symbols: Symbols::new(),
            head: Head::end(0),
            src_len: source.len(),
            recover,
            errors: Vec::new(),
        }
    }

    fn head_for(&self, id: &'static str, node: Node) -> Head {
        match self.symbols.get(id) {
            Some(sym) => Head {
                id,
                lbp: sym.lbp,
                nud: sym.nud,
                led: sym.led,
                node,
            },
            None => Head {
                id,
                lbp: 0,
                nud: None,
                led: None,
                node,
            },
        }
    }

    /// Error choke point: abort in strict mode; in recovering mode, record
    /// the diagnostic with the drained token tail and substitute an error
    /// node as the lookahead so the expression loop can terminate.
    fn handle_error(&mut self, mut err: Error) -> Result<Node, Error> {
        if !self.recover {
            return Err(err);
        }
        err.remaining = Some(self.remaining_tokens());
        self.errors.push(err.clone());
        let position = err.position;
        let node = Node::new(
            NodeKind::Error {
                error: Box::new(err),
                lhs: None,
            },
            position,
        );
        self.head = self.head_for("(error)", node.clone());
        Ok(node)
    }

    fn remaining_tokens(&mut self) -> Vec<Token> {
        let mut remaining = Vec::new();
        if self.head.id != "(end)" {
            remaining.extend(to_token(&self.head.node));
        }
        // draining stops at a lexical error in the tail
        while let Ok(Some(token)) = self.lexer.next(true) {
            remaining.push(token);
        }
        remaining
    }

    /// Move to the next token. `expect` checks the current lookahead first;
    /// `infix` tells the tokenizer that an operator comes next, so that `/`
    /// is division rather than the start of a regex.
    fn advance(&mut self, expect: Option<&'static str>, infix: bool) -> Result<(), Error> {
        if let Some(id) = expect {
            if self.head.id != id {
                let at = self.head.node.position;
                let kind = if self.head.id == "(end)" {
                    ErrorKind::ExpectedBeforeEnd(id)
                } else {
                    ErrorKind::Expected {
                        expected: id,
                        found: text(&self.head.node),
                    }
                };
                self.handle_error(Error::new(kind, at))?;
                return Ok(());
            }
        }
        let token = match self.lexer.next(!infix) {
            Ok(token) => token,
            Err(err) => {
                self.handle_error(err)?;
                return Ok(());
            }
        };
        let token = match token {
            Some(token) => token,
            None => {
                self.head = Head::end(self.src_len);
                return Ok(());
            }
        };
        let position = token.position;
        let (id, kind) = match token.kind {
            TokenKind::Name { value, lib } => ("(name)", NodeKind::Name { value, lib }),
            TokenKind::Variable(v) => ("(name)", NodeKind::Variable(v)),
            TokenKind::Str(s) => ("(literal)", NodeKind::Str(s)),
            TokenKind::Number(n) => ("(literal)", NodeKind::Number(n)),
            TokenKind::Bool(b) => ("(literal)", NodeKind::Bool(b)),
            TokenKind::Null => ("(literal)", NodeKind::Null),
            TokenKind::Comment(c) => ("(literal)", NodeKind::Comment(c)),
            TokenKind::Regex { pattern, flags } => ("(regex)", NodeKind::Regex { pattern, flags }),
            TokenKind::Operator(op) => (op, NodeKind::Operator(op)),
        };
        let node = Node::new(kind, position);
        match self.symbols.get(id) {
            Some(sym) => {
                self.head = Head {
                    id,
                    lbp: sym.lbp,
                    nud: sym.nud,
                    led: sym.led,
                    node,
                }
            }
            None => {
                let err = Error::new(ErrorKind::UnknownOperator(id.to_string()), position);
                self.handle_error(err)?;
            }
        }
        Ok(())
    }

    fn take_head(&mut self) -> Head {
        core::mem::replace(&mut self.head, Head::end(self.src_len))
    }

    /// Pratt's algorithm: apply the prefix rule of the current token, then
    /// keep consuming infix operators that bind tighter than `rbp`.
    fn expression(&mut self, rbp: u8) -> Result<Node, Error> {
        let head = self.take_head();
        self.advance(None, true)?;
        let mut left = self.nud(head)?;
        while rbp < self.head.lbp {
            let head = self.take_head();
            self.advance(None, false)?;
            left = self.led(head, left)?;
        }
        Ok(left)
    }

    fn nud(&mut self, head: Head) -> Result<Node, Error> {
        match head.nud {
            Some(nud) => nud(self, head.node),
            None => {
                // symbol invoked as a unary operator
                let at = head.node.position;
                let mut err = Error::new(ErrorKind::NotPrefix(text(&head.node)), at);
                if !self.recover {
                    return Err(err);
                }
                err.remaining = Some(self.remaining_tokens());
                self.errors.push(err.clone());
                Ok(Node::new(
                    NodeKind::Error {
                        error: Box::new(err),
                        lhs: None,
                    },
                    at,
                ))
            }
        }
    }

    fn led(&mut self, head: Head, left: Node) -> Result<Node, Error> {
        match head.led {
            Some(led) => led(self, head.node, left),
            None => {
                let at = head.node.position;
                self.handle_error(Error::new(ErrorKind::Unexpected(text(&head.node)), at))
            }
        }
    }
}

fn op_of(node: &Node) -> &'static str {
    match node.kind {
        NodeKind::Operator(op) => op,
        // behaviors are only ever registered on operator spellings
        _ => unreachable!(),
    }
}

fn binary(op: &'static str, lhs: Node, rhs: Node, position: usize) -> Node {
    Node::new(
        NodeKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        position,
    )
}

fn nud_self(_: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    Ok(node)
}

/// Default prefix rule: `-` and `#'`.
fn nud_unary(p: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    let op = op_of(&node);
    let expression = p.expression(70)?;
    Ok(Node::new(
        NodeKind::Unary {
            op,
            expression: Box::new(expression),
        },
        node.position,
    ))
}

fn nud_wildcard(_: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    Ok(Node::new(NodeKind::Wildcard, node.position))
}

fn nud_descendant(_: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    Ok(Node::new(NodeKind::Descendant, node.position))
}

/// Array constructor, with `a..b` range items.
fn nud_array(p: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    let mut items = Vec::new();
    if p.head.id != "]" {
        loop {
            let mut item = p.expression(0)?;
            if p.head.id == ".." {
                // range operator
                let at = p.head.node.position;
                p.advance(Some(".."), false)?;
                let rhs = p.expression(0)?;
                item = binary("..", item, rhs, at);
            }
            items.push(item);
            if p.head.id != "," {
                break;
            }
            p.advance(Some(","), false)?;
        }
    }
    p.advance(Some("]"), true)?;
    Ok(Node::new(NodeKind::Array(items), node.position))
}

/// Comma-separated `key: value` pairs, shared by the object constructor
/// and the group-by form.
fn object_pairs(p: &mut Parser<'_>) -> Result<Vec<(Node, Node)>, Error> {
    let mut pairs = Vec::new();
    if p.head.id != "}" {
        loop {
            let key = p.expression(0)?;
            p.advance(Some(":"), false)?;
            let value = p.expression(0)?;
            pairs.push((key, value));
            if p.head.id != "," {
                break;
            }
            p.advance(Some(","), false)?;
        }
    }
    p.advance(Some("}"), true)?;
    Ok(pairs)
}

fn nud_object(p: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    let pairs = object_pairs(p)?;
    Ok(Node::new(NodeKind::Object(pairs), node.position))
}

fn led_group(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    let pairs = object_pairs(p)?;
    Ok(Node::new(
        NodeKind::Group {
            lhs: Box::new(left),
            pairs,
        },
        node.position,
    ))
}

/// Parenthesized block: `( expr ; expr ; … )`.
/// Doc comments count as expressions but need no `;` separator.
fn nud_block(p: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    let mut expressions = Vec::new();
    while p.head.id != ")" {
        let expr = p.expression(0)?;
        let comment = matches!(expr.kind, NodeKind::Comment(_));
        expressions.push(expr);
        if p.head.id != ";" && !comment {
            break;
        }
        if !comment {
            p.advance(Some(";"), false)?;
        }
    }
    p.advance(Some(")"), true)?;
    Ok(Node::new(NodeKind::Block(expressions), node.position))
}

/// Switch block: `?{ value; cond => then , cond => then ; }?`.
fn nud_switch(p: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    let mut clauses = Vec::new();
    while p.head.id != "}?" {
        let expr = p.expression(0)?;
        if p.head.id != ";" && p.head.id != "=>" {
            break;
        }
        if p.head.id == ";" {
            clauses.push(RawClause::Value(expr));
            p.advance(Some(";"), false)?;
        } else {
            p.advance(Some("=>"), false)?;
            let then = p.expression(0)?;
            // a `,` separator lets this case fall through to the next
            let fallthrough = p.head.id == ",";
            clauses.push(RawClause::Case {
                condition: expr,
                then,
                fallthrough,
            });
            if p.head.id != ";" && p.head.id != "," {
                break;
            }
            let sep = p.head.id;
            p.advance(Some(sep), false)?;
        }
    }
    p.advance(Some("}?"), true)?;
    Ok(Node::new(NodeKind::Switch(clauses), node.position))
}

/// Object transformer: `|pattern|update[,delete]|`.
fn nud_transform(p: &mut Parser<'_>, node: Node) -> Result<Node, Error> {
    let pattern = p.expression(0)?;
    p.advance(Some("|"), false)?;
    let update = p.expression(0)?;
    let delete = if p.head.id == "," {
        p.advance(Some(","), false)?;
        Some(Box::new(p.expression(0)?))
    } else {
        None
    };
    p.advance(Some("|"), false)?;
    Ok(Node::new(
        NodeKind::Transform {
            pattern: Box::new(pattern),
            update: Box::new(update),
            delete,
        },
        node.position,
    ))
}

fn led_binary(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    let op = op_of(&node);
    let rhs = p.expression(binding_power(op))?;
    Ok(binary(op, left, rhs, node.position))
}

fn led_bind(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    if !matches!(left.kind, NodeKind::Variable(_)) {
        let err = Error::new(ErrorKind::InvalidBindTarget(text(&left)), left.position);
        return p.handle_error(err);
    }
    // right associative
    let rhs = p.expression(binding_power(":=") - 1)?;
    Ok(binary(":=", left, rhs, node.position))
}

fn led_assoc(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    if !matches!(left.kind, NodeKind::Str(_) | NodeKind::Name { .. }) {
        let err = Error::new(ErrorKind::InvalidBindTarget(text(&left)), left.position);
        return p.handle_error(err);
    }
    let rhs = p.expression(binding_power("::") - 1)?;
    Ok(binary("::", left, rhs, node.position))
}

fn led_focus(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    led_context(p, node, left, "@")
}

fn led_index(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    led_context(p, node, left, "#")
}

/// `@` and `#` bind their right side as a context variable.
fn led_context(
    p: &mut Parser<'_>,
    node: Node,
    left: Node,
    op: &'static str,
) -> Result<Node, Error> {
    let rhs = p.expression(binding_power(op))?;
    if !matches!(rhs.kind, NodeKind::Variable(_)) {
        let err = Error::new(ErrorKind::BindTargetNotVariable(op), rhs.position);
        return p.handle_error(err);
    }
    Ok(binary(op, left, rhs, node.position))
}

fn led_ternary(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    let then = p.expression(0)?;
    let otherwise = if p.head.id == ":" {
        p.advance(Some(":"), false)?;
        Some(Box::new(p.expression(0)?))
    } else {
        None
    };
    Ok(Node::new(
        NodeKind::Ternary {
            condition: Box::new(left),
            then: Box::new(then),
            otherwise,
        },
        node.position,
    ))
}

fn led_sort(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    p.advance(Some("("), false)?;
    let mut terms = Vec::new();
    loop {
        let descending = match p.head.id {
            "<" => {
                p.advance(Some("<"), false)?;
                false
            }
            ">" => {
                p.advance(Some(">"), false)?;
                true
            }
            // unspecified defaults to ascending
            _ => false,
        };
        terms.push((descending, p.expression(0)?));
        if p.head.id != "," {
            break;
        }
        p.advance(Some(","), false)?;
    }
    p.advance(Some(")"), false)?;
    Ok(Node::new(
        NodeKind::Sort {
            lhs: Box::new(left),
            terms,
        },
        node.position,
    ))
}

/// Predicate or array index; an empty `[]` flags the innermost step to
/// keep singleton arrays instead.
fn led_filter(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    if p.head.id == "]" {
        let mut left = left;
        let mut step = &mut left;
        loop {
            match &mut step.kind {
                NodeKind::Binary { op: "[", lhs, .. } => step = &mut **lhs,
                _ => break,
            }
        }
        step.keep_array = true;
        p.advance(Some("]"), false)?;
        return Ok(left);
    }
    let rhs = p.expression(0)?;
    let filter = binary("[", left, rhs, node.position);
    p.advance(Some("]"), true)?;
    Ok(filter)
}

/// `~X` postfix: mark the preceding path for deletion.
fn led_delete(_: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    Ok(Node::new(
        NodeKind::Unary {
            op: "~X",
            expression: Box::new(left),
        },
        node.position,
    ))
}

fn led_error(_: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    match node.kind {
        NodeKind::Error { error, .. } => Ok(Node::new(
            NodeKind::Error {
                error,
                lhs: Some(Box::new(left)),
            },
            node.position,
        )),
        _ => unreachable!(),
    }
}

/// Function invocation; reinterpreted as a lambda definition when the
/// callee is `function`/`fun`/`λ`/`ƒ` or a qualified library name and a
/// `{` body follows.
fn led_call(p: &mut Parser<'_>, node: Node, left: Node) -> Result<Node, Error> {
    let mut arguments = Vec::new();
    let mut partial = false;
    if p.head.id != ")" {
        loop {
            if matches!(p.head.node.kind, NodeKind::Operator("?")) {
                // partial function application
                partial = true;
                arguments.push(p.head.node.clone());
                p.advance(Some("?"), false)?;
            } else {
                arguments.push(p.expression(0)?);
            }
            if p.head.id != "," {
                break;
            }
            p.advance(Some(","), false)?;
        }
    }
    p.advance(Some(")"), true)?;

    let (named_fn, lib) = match &left.kind {
        NodeKind::Name { value, lib } => (
            matches!(value.as_str(), "function" | "fun" | "\u{3bb}" | "\u{192}"),
            *lib,
        ),
        _ => (false, false),
    };
    // a `{` body or a `<` signature block turns the invocation into a
    // lambda definition
    if !(named_fn || lib) || (p.head.id != "{" && p.head.id != "<") {
        return Ok(Node::new(
            NodeKind::Call {
                procedure: Box::new(left),
                arguments,
                partial,
            },
            node.position,
        ));
    }

    // lambda definition: all plain-mode arguments must be variables
    if !lib {
        for (index, arg) in arguments.iter().enumerate() {
            if !matches!(arg.kind, NodeKind::Variable(_)) {
                let err = Error::new(
                    ErrorKind::LambdaArgument {
                        token: text(arg),
                        index: index + 1,
                    },
                    arg.position,
                );
                p.handle_error(err)?;
            }
        }
    }

    // optional `<signature>`, delegated to the signature parser
    let mut sig = None;
    if p.head.id == "<" {
        let sig_pos = p.head.node.position;
        let mut depth = 1;
        let mut sig_text = String::from("<");
        while depth > 0 && p.head.id != "{" && p.head.id != "(end)" {
            p.advance(None, false)?;
            match p.head.id {
                ">" => depth -= 1,
                "<" => depth += 1,
                _ => (),
            }
            sig_text.push_str(&text(&p.head.node));
        }
        p.advance(Some(">"), false)?;
        match signature::parse(&sig_text) {
            Ok(parsed) => sig = Some(parsed),
            Err((kind, offset)) => {
                // relocate the relative offset to an absolute position
                p.handle_error(Error::new(kind, sig_pos + offset))?;
            }
        }
    }

    p.advance(Some("{"), false)?;
    let mut expressions = Vec::new();
    while p.head.id != "}" {
        expressions.push(p.expression(0)?);
        if p.head.id != ";" {
            break;
        }
        p.advance(Some(";"), false)?;
    }
    p.advance(Some("}"), false)?;
    let body = Node::new(NodeKind::Block(expressions), node.position);
    Ok(Node::new(
        NodeKind::Lambda {
            procedure: Box::new(left),
            arguments,
            signature: sig,
            body: Box::new(body),
        },
        node.position,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::ops::{BinaryOp, MathOp};

    #[test]
    fn registry_keeps_max_binding_power() {
        let symbols = Symbols::new();
        // `and` is both an infix operator and a terminal
        let sym = symbols.get("and").unwrap();
        assert_eq!(sym.lbp, 30);
        assert!(sym.nud.is_some());
        assert!(sym.led.is_some());
    }

    #[test]
    fn multiplication_binds_tighter() {
        let ast = parse("1 + 2 * 3").unwrap();
        match ast.kind {
            ExprKind::Binary { op, lhs, rhs } => {
                assert_eq!(op, BinaryOp::Math(MathOp::Add));
                assert_eq!(lhs.kind, ExprKind::Number(1.0));
                assert!(matches!(
                    rhs.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Math(MathOp::Mul),
                        ..
                    }
                ));
            }
            kind => panic!("expected binary, got {kind:?}"),
        }
    }

    #[test]
    fn unknown_operator() {
        let err = parse("a ! b").unwrap_err();
        assert_eq!(err.code(), "S0204");
    }

    #[test]
    fn infix_used_as_prefix() {
        assert_eq!(parse("<= 2").unwrap_err().code(), "S0211");
        // `and` alone is a plain field name
        assert!(parse("and").is_ok());
    }

    #[test]
    fn trailing_token() {
        let err = parse("a b").unwrap_err();
        assert_eq!(err.code(), "S0201");
    }

    #[test]
    fn unexpected_end() {
        let err = parse("(a").unwrap_err();
        assert_eq!(err.code(), "S0203");
        let err = parse("").unwrap_err();
        assert_eq!(err.code(), "S0207");
    }
}
