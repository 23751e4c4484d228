//! Tokenization.
//!
//! The tokenizer is pulled one token at a time by the parser, which tells it
//! whether an *operand* is expected next. That single bit disambiguates the
//! context-sensitive parts of the grammar: a `/` after an operand is
//! division, a `/` where an operand is expected starts a regex literal.
//!
//! Backtick-quoted names containing `${…}` substitutions are expanded into a
//! queue of synthetic tokens (string fragments joined by `&`, substitution
//! bodies wrapped in parentheses). The substitution bodies are scanned in
//! place within the original buffer, so the buffer is never rewritten and
//! every position stays a real offset into the source.

use crate::error::{Error, ErrorKind};
use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use core::fmt;
#[cfg(feature = "serde")]
use serde::Serialize;

/// Operator spellings and their binding powers; higher binds tighter.
///
/// `!` and `~` carry no power and no symbol: they are listed so that name
/// scanning stops at them.
pub(crate) const OPERATORS: &[(&str, u8)] = &[
    (".", 75),
    ("[", 80),
    ("]", 0),
    ("{", 70),
    ("}", 0),
    ("?{", 70),
    ("}?", 0),
    ("(", 80),
    (")", 0),
    (",", 0),
    ("@", 80),
    ("#", 80),
    (";", 80),
    (":", 80),
    ("?", 20),
    ("+", 50),
    ("-", 50),
    ("*", 60),
    ("/", 60),
    ("%", 60),
    ("|", 20),
    ("=", 40),
    ("<", 40),
    (">", 40),
    ("^", 40),
    ("**", 60),
    ("..", 20),
    ("::", 10),
    (":=", 10),
    ("!=", 40),
    ("<=", 40),
    ("=<", 40),
    (">=", 40),
    ("~>", 40),
    ("=>", 80),
    ("<~", 40),
    ("~X", 40),
    ("~=", 40),
    ("and", 30),
    ("||", 30),
    ("#'", 40),
    ("or", 25),
    ("in", 40),
    ("&", 50),
    ("!", 0),
    ("~", 0),
];

/// Binding power of an operator spelling, 0 if unknown.
pub(crate) fn binding_power(id: &str) -> u8 {
    let bp = OPERATORS.iter().find(|(op, _)| *op == id);
    bp.map_or(0, |(_, bp)| *bp)
}

/// Two-character operators, tried in order before single characters.
/// `=<` is a legacy alias of `<=`.
const TWO_CHAR: &[(&str, &str)] = &[
    ("..", ".."),
    (":=", ":="),
    ("!=", "!="),
    (">=", ">="),
    ("<=", "<="),
    ("=<", "<="),
    ("**", "**"),
    ("~>", "~>"),
    ("::", "::"),
    ("<~", "<~"),
    ("~X", "~X"),
    ("||", "||"),
    ("?{", "?{"),
    ("}?", "}?"),
    ("=>", "=>"),
    ("~=", "~="),
];

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{b}')
}

/// Characters that terminate a name.
fn is_operator_char(c: char) -> bool {
    ".[]{}(),@#;:?+-*/%|=<>^&!~".contains(c)
}

fn single_char_op(c: char) -> Option<&'static str> {
    Some(match c {
        '.' => ".",
        '[' => "[",
        ']' => "]",
        '{' => "{",
        '}' => "}",
        '(' => "(",
        ')' => ")",
        ',' => ",",
        '@' => "@",
        '#' => "#",
        ';' => ";",
        ':' => ":",
        '?' => "?",
        '+' => "+",
        '-' => "-",
        '*' => "*",
        '/' => "/",
        '%' => "%",
        '|' => "|",
        '=' => "=",
        '<' => "<",
        '>' => ">",
        '^' => "^",
        '&' => "&",
        '!' => "!",
        '~' => "~",
        _ => return None,
    })
}

/// What a token is.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Field name; `lib` marks a qualified `namespace::name`
    Name {
        /// the name itself
        value: String,
        /// qualified library-style name
        lib: bool,
    },
    /// Variable: `$x` (without the `$`) or a tagged `#name` (with the `#`)
    Variable(String),
    /// String literal, escapes already decoded
    Str(String),
    /// Number literal
    Number(f64),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
    /// Operator spelling
    Operator(&'static str),
    /// Regex literal
    Regex {
        /// text between the `/` delimiters
        pattern: String,
        /// collected flags, always ending in `g`
        flags: String,
    },
    /// Doc comment (`/** … */`), kept for tooling
    Comment(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Name { value, .. } => value.fmt(f),
            Self::Variable(v) => v.fmt(f),
            Self::Str(s) => s.fmt(f),
            Self::Number(n) => n.fmt(f),
            Self::Bool(b) => b.fmt(f),
            Self::Null => "null".fmt(f),
            Self::Operator(op) => op.fmt(f),
            Self::Regex { pattern, .. } => pattern.fmt(f),
            Self::Comment(c) => c.fmt(f),
        }
    }
}

/// A token and where it ended.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// what it is
    pub kind: TokenKind,
    /// byte offset just past the token
    pub position: usize,
}

/// Queued synthetic token from a template expansion.
enum Pending {
    Str(String, usize),
    Op(&'static str, usize),
    Expr { start: usize, end: usize },
}

/// Stateful scanner over one source string.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    /// `(end, resume)` while scanning a `${…}` substitution body in place
    limit: Option<(usize, usize)>,
    pending: VecDeque<Pending>,
}

impl<'a> Lexer<'a> {
    /// Scanner at the start of the given source.
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            limit: None,
            pending: VecDeque::new(),
        }
    }

    /// Produce the next token, or `None` at the end of the input.
    ///
    /// `expect_operand` is true when the grammar expects an operand next;
    /// only then does a `/` start a regex literal.
    pub fn next(&mut self, expect_operand: bool) -> Result<Option<Token>, Error> {
        loop {
            if let Some((end, resume)) = self.limit {
                match self.scan(expect_operand, end)? {
                    Some(token) => return Ok(Some(token)),
                    None => {
                        self.limit = None;
                        self.pos = resume;
                    }
                }
                continue;
            }
            if let Some(pending) = self.pending.pop_front() {
                match pending {
                    Pending::Str(s, at) => {
                        return Ok(Some(Token {
                            kind: TokenKind::Str(s),
                            position: at,
                        }))
                    }
                    Pending::Op(op, at) => {
                        return Ok(Some(Token {
                            kind: TokenKind::Operator(op),
                            position: at,
                        }))
                    }
                    Pending::Expr { start, end } => {
                        self.limit = Some((end, self.pos));
                        self.pos = start;
                    }
                }
                continue;
            }
            return match self.scan(expect_operand, self.src.len())? {
                Some(token) => Ok(Some(token)),
                // a backtick template queues tokens instead of returning one
                None if !self.pending.is_empty() => continue,
                None => Ok(None),
            };
        }
    }

    fn rest(&self, end: usize) -> &'a str {
        &self.src[self.pos..end]
    }

    fn cur(&self, end: usize) -> Option<char> {
        self.rest(end).chars().next()
    }

    fn skip_space(&mut self, end: usize) {
        while let Some(c) = self.cur(end) {
            if is_space(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn op_token(&self, op: &'static str) -> Token {
        Token {
            kind: TokenKind::Operator(op),
            position: self.pos,
        }
    }

    fn scan(&mut self, expect_operand: bool, end: usize) -> Result<Option<Token>, Error> {
        loop {
            self.skip_space(end);
            let rest = self.rest(end);
            if rest.is_empty() {
                return Ok(None);
            }
            if let Some(tail) = rest.strip_prefix("//") {
                self.pos = match tail.find('\n') {
                    Some(i) => self.pos + 2 + i,
                    None => end,
                };
                continue;
            }
            if rest.starts_with("/**") {
                return self.doc_comment(end).map(Some);
            }
            if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(i) => self.pos += 2 + i + 2,
                    None => return Err(Error::new(ErrorKind::UnterminatedComment, self.pos)),
                }
                continue;
            }
            break;
        }

        let rest = self.rest(end);
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return Ok(None),
        };

        if expect_operand && c == '/' {
            self.pos += 1;
            return self.regex(end).map(Some);
        }
        for &(pattern, op) in TWO_CHAR {
            if rest.starts_with(pattern) {
                self.pos += 2;
                return Ok(Some(self.op_token(op)));
            }
        }
        if c == '#' {
            let next = rest[1..].chars().next();
            if matches!(next, Some('\'' | '"' | '`')) {
                // association ref: only the `#` is consumed
                self.pos += 1;
                return Ok(Some(self.op_token("#'")));
            }
            if matches!(next, Some('a'..='z')) {
                // tagged name, e.g. `#foo` or `#mod:fn`
                // (`:` does not terminate, to allow qualified names)
                let tail = &rest[1..];
                let stop = tail
                    .char_indices()
                    .find(|&(_, c)| is_space(c) || (is_operator_char(c) && c != ':'))
                    .map_or(tail.len(), |(i, _)| i);
                let value = &rest[..1 + stop];
                self.pos += value.len();
                return Ok(Some(Token {
                    kind: TokenKind::Variable(value.to_string()),
                    position: self.pos,
                }));
            }
        }
        if let Some(op) = single_char_op(c) {
            self.pos += 1;
            return Ok(Some(self.op_token(op)));
        }
        if c == '"' || c == '\'' {
            return self.string(c, end).map(Some);
        }
        if c.is_ascii_digit() {
            return self.number(end).map(Some);
        }
        if c == '`' {
            return self.backtick(end);
        }
        Ok(Some(self.name(end)))
    }

    fn doc_comment(&mut self, end: usize) -> Result<Token, Error> {
        let start = self.pos;
        // searching from `start + 2` lets `/**/` close itself
        match self.src[start + 2..end].find("*/") {
            Some(i) => {
                self.pos = start + 2 + i + 2;
                Ok(Token {
                    kind: TokenKind::Comment(self.src[start..self.pos].to_string()),
                    position: self.pos,
                })
            }
            None => Err(Error::new(ErrorKind::UnterminatedComment, start)),
        }
    }

    /// Scan a regex body; the opening `/` has already been consumed.
    ///
    /// An unescaped `/` only terminates the pattern at bracket depth zero,
    /// so `/a(b|\/)/` and `/[/]/` scan as single literals.
    fn regex(&mut self, end: usize) -> Result<Token, Error> {
        let start = self.pos;
        let mut depth: i32 = 0;
        let mut prev = '/';
        loop {
            let c = match self.cur(end) {
                Some(c) => c,
                None => return Err(Error::new(ErrorKind::UnterminatedRegex, self.pos)),
            };
            if c == '/' && prev != '\\' && depth == 0 {
                let pattern = &self.src[start..self.pos];
                if pattern.is_empty() {
                    return Err(Error::new(ErrorKind::EmptyRegex, self.pos));
                }
                self.pos += 1;
                let flag_start = self.pos;
                while matches!(self.cur(end), Some('i' | 'm')) {
                    self.pos += 1;
                }
                let mut flags = self.src[flag_start..self.pos].to_string();
                flags.push('g');
                return Ok(Token {
                    kind: TokenKind::Regex {
                        pattern: pattern.to_string(),
                        flags,
                    },
                    position: self.pos,
                });
            }
            if matches!(c, '(' | '[' | '{') && prev != '\\' {
                depth += 1;
            }
            if matches!(c, ')' | ']' | '}') && prev != '\\' {
                depth -= 1;
            }
            self.pos += c.len_utf8();
            prev = c;
        }
    }

    fn string(&mut self, quote: char, end: usize) -> Result<Token, Error> {
        self.pos += 1;
        let mut s = String::new();
        loop {
            let c = match self.cur(end) {
                Some(c) => c,
                None => return Err(Error::new(ErrorKind::UnterminatedString, self.pos)),
            };
            if c == '\\' {
                self.pos += 1;
                let e = match self.cur(end) {
                    Some(e) => e,
                    None => return Err(Error::new(ErrorKind::UnterminatedString, self.pos)),
                };
                match e {
                    '"' | '\\' | '/' => s.push(e),
                    'b' => s.push('\u{8}'),
                    'f' => s.push('\u{c}'),
                    'n' => s.push('\n'),
                    'r' => s.push('\r'),
                    't' => s.push('\t'),
                    'u' => {
                        let hex = self
                            .rest(end)
                            .get(1..5)
                            .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()));
                        let hex = match hex {
                            Some(hex) => hex,
                            None => {
                                return Err(Error::new(ErrorKind::InvalidUnicodeEscape, self.pos))
                            }
                        };
                        let code = u32::from_str_radix(hex, 16)
                            .map_err(|_| Error::new(ErrorKind::InvalidUnicodeEscape, self.pos))?;
                        match char::from_u32(code) {
                            Some(decoded) => s.push(decoded),
                            None => {
                                return Err(Error::new(ErrorKind::InvalidUnicodeEscape, self.pos))
                            }
                        }
                        self.pos += 4;
                    }
                    _ => return Err(Error::new(ErrorKind::IllegalEscape(e), self.pos)),
                }
                self.pos += e.len_utf8();
            } else if c == quote {
                self.pos += 1;
                return Ok(Token {
                    kind: TokenKind::Str(s),
                    position: self.pos,
                });
            } else {
                s.push(c);
                self.pos += c.len_utf8();
            }
        }
    }

    /// Scan a number with the JSON numeric grammar.
    fn number(&mut self, end: usize) -> Result<Token, Error> {
        let rest = self.rest(end);
        let bytes = rest.as_bytes();
        let digits = |bytes: &[u8], mut i: usize| {
            while matches!(bytes.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
            i
        };
        let mut i = 0;
        if bytes.first() == Some(&b'-') {
            i += 1;
        }
        // no leading zero unless the integer part is exactly `0`
        match bytes.get(i) {
            Some(b'0') => i += 1,
            Some(b'1'..=b'9') => i = digits(bytes, i + 1),
            _ => return Err(Error::new(ErrorKind::NumberOutOfRange(rest[..i].into()), self.pos)),
        }
        if bytes.get(i) == Some(&b'.') && matches!(bytes.get(i + 1), Some(b'0'..=b'9')) {
            i = digits(bytes, i + 2);
        }
        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            let mut j = i + 1;
            if matches!(bytes.get(j), Some(b'+' | b'-')) {
                j += 1;
            }
            if matches!(bytes.get(j), Some(b'0'..=b'9')) {
                i = digits(bytes, j + 1);
            }
        }
        let text = &rest[..i];
        let num = text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| Error::new(ErrorKind::NumberOutOfRange(text.to_string()), self.pos))?;
        self.pos += i;
        Ok(Token {
            kind: TokenKind::Number(num),
            position: self.pos,
        })
    }

    /// Scan a backtick-quoted name; expands `${…}` templates.
    fn backtick(&mut self, end: usize) -> Result<Option<Token>, Error> {
        self.pos += 1;
        let rest = self.rest(end);
        let close = match rest.find('`') {
            Some(close) => close,
            None => {
                self.pos = end;
                return Err(Error::new(ErrorKind::UnterminatedQuotedName, self.pos));
            }
        };
        let content_start = self.pos;
        let content = &rest[..close];
        self.pos += close + 1;
        if !content.contains("${") {
            return Ok(Some(Token {
                kind: TokenKind::Name {
                    value: content.to_string(),
                    lib: false,
                },
                position: self.pos,
            }));
        }

        // queue `lit & ( expr ) & lit …`; empty literal fragments are kept
        // so that substitution results still coerce to strings
        let mut cursor = 0;
        let mut first = true;
        loop {
            let found = content[cursor..]
                .find("${")
                .and_then(|i| content[cursor + i + 2..].find('}').map(|j| (i, j)));
            let (lit, expr, next) = match found {
                Some((i, j)) => {
                    let expr_start = cursor + i + 2;
                    let lit = &content[cursor..cursor + i];
                    (lit, Some((expr_start, expr_start + j)), expr_start + j + 1)
                }
                // unmatched `${` falls into the tail literal
                None => (&content[cursor..], None, content.len()),
            };
            if !first {
                self.pending
                    .push_back(Pending::Op("&", content_start + cursor));
            }
            first = false;
            self.pending
                .push_back(Pending::Str(lit.to_string(), content_start + cursor + lit.len()));
            let (expr_start, expr_end) = match expr {
                Some(range) => range,
                None => break,
            };
            self.pending
                .push_back(Pending::Op("&", content_start + expr_start));
            self.pending
                .push_back(Pending::Op("(", content_start + expr_start));
            self.pending.push_back(Pending::Expr {
                start: content_start + expr_start,
                end: content_start + expr_end,
            });
            self.pending
                .push_back(Pending::Op(")", content_start + expr_end));
            cursor = next;
        }
        Ok(None)
    }

    fn name(&mut self, end: usize) -> Token {
        let stop_at = |tail: &str| {
            tail.char_indices()
                .find(|&(_, c)| is_space(c) || is_operator_char(c))
                .map_or(tail.len(), |(i, _)| i)
        };
        let rest = self.rest(end);
        let stop = stop_at(rest);
        let value = &rest[..stop];
        self.pos += stop;
        if let Some(var) = value.strip_prefix('$') {
            return Token {
                kind: TokenKind::Variable(var.to_string()),
                position: self.pos,
            };
        }
        // qualified library-style name, e.g. `system::date`
        if self.rest(end).starts_with("::") {
            let tail = &self.rest(end)[2..];
            let stop = stop_at(tail);
            let second = &tail[..stop];
            self.pos += 2 + stop;
            return Token {
                kind: TokenKind::Name {
                    value: alloc::format!("{value}::{second}"),
                    lib: true,
                },
                position: self.pos,
            };
        }
        let kind = match value {
            "and" => TokenKind::Operator("and"),
            "or" => TokenKind::Operator("or"),
            "in" => TokenKind::Operator("in"),
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "null" => TokenKind::Null,
            _ => TokenKind::Name {
                value: value.to_string(),
                lib: false,
            },
        };
        Token {
            kind,
            position: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn tokens(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        // operand position everywhere except right after one
        let mut operand = true;
        while let Some(token) = lexer.next(operand).unwrap() {
            operand = matches!(token.kind, TokenKind::Operator(_));
            out.push(token.kind);
        }
        out
    }

    fn name(value: &str) -> TokenKind {
        TokenKind::Name {
            value: value.into(),
            lib: false,
        }
    }

    #[test]
    fn operators_and_names() {
        assert_eq!(
            tokens("a.b ~> $f"),
            [
                name("a"),
                TokenKind::Operator("."),
                name("b"),
                TokenKind::Operator("~>"),
                TokenKind::Variable("f".into()),
            ]
        );
    }

    #[test]
    fn double_char_before_single() {
        assert_eq!(
            tokens("a <= b =< c"),
            [
                name("a"),
                TokenKind::Operator("<="),
                name("b"),
                TokenKind::Operator("<="),
                name("c"),
            ]
        );
    }

    #[test]
    fn reserved_words() {
        assert_eq!(
            tokens("true and null"),
            [
                TokenKind::Bool(true),
                TokenKind::Operator("and"),
                TokenKind::Null,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(tokens(r#""a\nA""#), [TokenKind::Str("a\nA".into())]);
        let mut lexer = Lexer::new(r#""\x""#);
        let err = lexer.next(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalEscape('x'));
        let mut lexer = Lexer::new(r#""\u00GG""#);
        let err = lexer.next(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUnicodeEscape);
    }

    #[test]
    fn unterminated_string() {
        let mut lexer = Lexer::new("'abc");
        let err = lexer.next(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("0 1.5 2e3"),
            [
                TokenKind::Number(0.0),
                TokenKind::Number(1.5),
                TokenKind::Number(2e3),
            ]
        );
        // a `.` without a following digit is a path operator
        assert_eq!(
            tokens("1.a"),
            [TokenKind::Number(1.0), TokenKind::Operator("."), name("a")]
        );
        let mut lexer = Lexer::new("1e999");
        let err = lexer.next(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NumberOutOfRange("1e999".into()));
    }

    #[test]
    fn regex_only_in_operand_position() {
        let mut lexer = Lexer::new("/a(b|\\/)+/im");
        match lexer.next(true).unwrap().unwrap().kind {
            TokenKind::Regex { pattern, flags } => {
                assert_eq!(pattern, "a(b|\\/)+");
                assert_eq!(flags, "img");
            }
            kind => panic!("expected regex, got {kind:?}"),
        }
        // after an operand, `/` is division
        assert_eq!(
            tokens("a / b"),
            [name("a"), TokenKind::Operator("/"), name("b")]
        );
    }

    #[test]
    fn slash_slash_is_a_comment() {
        // `//` can never start a regex, comments win
        let mut lexer = Lexer::new("//");
        assert_eq!(lexer.next(true).unwrap(), None);
    }

    #[test]
    fn unterminated_regex() {
        let mut lexer = Lexer::new("/a[bc/");
        let err = lexer.next(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedRegex);
    }

    #[test]
    fn comments() {
        assert_eq!(tokens("a // rest\n.b"), tokens("a /* rest */ .b"));
        match &tokens("/** doc */ a")[..] {
            [TokenKind::Comment(text), rest] => {
                assert_eq!(text, "/** doc */");
                assert_eq!(*rest, name("a"));
            }
            t => panic!("expected comment, got {t:?}"),
        }
        let mut lexer = Lexer::new("/* open");
        let err = lexer.next(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedComment);
    }

    #[test]
    fn tagged_names() {
        assert_eq!(tokens("#foo"), [TokenKind::Variable("#foo".into())]);
        assert_eq!(tokens("#mod:fn"), [TokenKind::Variable("#mod:fn".into())]);
        // `#` not followed by a lowercase letter stays an operator
        assert_eq!(
            tokens("a#$i"),
            [
                name("a"),
                TokenKind::Operator("#"),
                TokenKind::Variable("i".into()),
            ]
        );
    }

    #[test]
    fn lib_names() {
        assert_eq!(
            tokens("system::date"),
            [TokenKind::Name {
                value: "system::date".into(),
                lib: true,
            }]
        );
    }

    #[test]
    fn backtick_names() {
        assert_eq!(tokens("`odd name`"), [name("odd name")]);
        let mut lexer = Lexer::new("`open");
        let err = lexer.next(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedQuotedName);
    }

    #[test]
    fn backtick_template() {
        assert_eq!(
            tokens("`a${x.y}b`"),
            [
                TokenKind::Str("a".into()),
                TokenKind::Operator("&"),
                TokenKind::Operator("("),
                name("x"),
                TokenKind::Operator("."),
                name("y"),
                TokenKind::Operator(")"),
                TokenKind::Operator("&"),
                TokenKind::Str("b".into()),
            ]
        );
    }

    #[test]
    fn trailing_whitespace() {
        assert_eq!(tokens("a  "), [name("a")]);
        assert_eq!(tokens("  "), []);
    }
}
