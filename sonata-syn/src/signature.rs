//! Lambda type signatures.
//!
//! A lambda definition may carry a signature block between its parameter
//! list and its body, e.g. `function($x)<s-:s>{ … }`. The block is a small
//! grammar of its own: one type symbol per parameter, optional modifiers,
//! choice groups and sub-signatures, and an optional return type after `:`.
//! The parser hands the raw `<…>` text to [`parse`] and translates the
//! relative offset of any failure into an absolute source position.

use crate::error::ErrorKind;
use alloc::boxed::Box;
use alloc::vec::Vec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signature failure: what went wrong and the byte offset
/// within the signature text.
pub type Error = (ErrorKind, usize);

/// Type of a single parameter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// `b` — boolean
    Bool,
    /// `n` — number
    Number,
    /// `s` — string
    Str,
    /// `l` — null
    Null,
    /// `a` — array
    Array,
    /// `o` — object
    Object,
    /// `f` — function
    Function,
    /// `j` — any JSON value
    Json,
    /// `x` — any value
    Any,
    /// `(…)` — one of several simple types
    Choice(Vec<ParamType>),
}

impl ParamType {
    fn simple(c: char) -> Option<Self> {
        Some(match c {
            'b' => Self::Bool,
            'n' => Self::Number,
            's' => Self::Str,
            'l' => Self::Null,
            'a' => Self::Array,
            'o' => Self::Object,
            'f' => Self::Function,
            'j' => Self::Json,
            'x' => Self::Any,
            _ => return None,
        })
    }
}

/// One parameter (or the return value) of a signature.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// expected type
    pub type_: ParamType,
    /// `+` — accepts one or more values of this type
    pub one_or_more: bool,
    /// `?` — may be omitted
    pub optional: bool,
    /// `-` — substituted by the context value when omitted
    pub context: bool,
    /// `<…>` — nested signature for array elements or function parameters
    pub sub: Option<Box<Signature>>,
}

impl Param {
    fn new(type_: ParamType) -> Self {
        Self {
            type_,
            one_or_more: false,
            optional: false,
            context: false,
            sub: None,
        }
    }
}

/// A parsed signature: parameter types and an optional return type.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    /// one entry per declared parameter
    pub params: Vec<Param>,
    /// declared return type, if any
    pub result: Option<Param>,
}

/// Parse a signature, including its `<` and `>` delimiters.
///
/// On failure, the returned offset is relative to the start of `sig`.
pub fn parse(sig: &str) -> Result<Signature, Error> {
    let inner = sig
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or((ErrorKind::SignatureGroup, 0))?;

    // the return section holds exactly one type
    fn place(
        sig: &mut Signature,
        in_result: bool,
        param: Param,
        c: char,
        at: usize,
    ) -> Result<(), Error> {
        if !in_result {
            sig.params.push(param);
            Ok(())
        } else if sig.result.is_none() {
            sig.result = Some(param);
            Ok(())
        } else {
            Err((ErrorKind::SignatureSymbol(c), at))
        }
    }

    let mut sig = Signature {
        params: Vec::new(),
        result: None,
    };
    let mut in_result = false;

    let mut chars = inner.char_indices();
    while let Some((i, c)) = chars.next() {
        // offsets are relative to the full text, which includes the leading '<'
        let at = i + 1;
        match c {
            ':' if !in_result => in_result = true,
            '+' | '?' | '-' => {
                let param = if in_result {
                    sig.result.as_mut()
                } else {
                    sig.params.last_mut()
                };
                let param = param.ok_or((ErrorKind::SignatureSymbol(c), at))?;
                match c {
                    '+' => param.one_or_more = true,
                    '?' => param.optional = true,
                    _ => param.context = true,
                }
            }
            '(' => {
                let mut choice = Vec::new();
                loop {
                    match chars.next() {
                        Some((_, ')')) => break,
                        Some((j, c)) => match ParamType::simple(c) {
                            Some(t) => choice.push(t),
                            None => return Err((ErrorKind::SignatureGroup, j + 1)),
                        },
                        None => return Err((ErrorKind::SignatureGroup, at)),
                    }
                }
                place(&mut sig, in_result, Param::new(ParamType::Choice(choice)), c, at)?;
            }
            '<' => {
                // sub-signature for the preceding array or function parameter
                let param = if in_result {
                    sig.result.as_mut()
                } else {
                    sig.params.last_mut()
                };
                let param = param
                    .filter(|p| matches!(p.type_, ParamType::Array | ParamType::Function))
                    .ok_or((ErrorKind::SignatureSymbol(c), at))?;
                let mut depth = 1;
                let end = loop {
                    match chars.next() {
                        Some((_, '<')) => depth += 1,
                        Some((j, '>')) => {
                            depth -= 1;
                            if depth == 0 {
                                break j;
                            }
                        }
                        Some(_) => (),
                        None => return Err((ErrorKind::SignatureGroup, at)),
                    }
                };
                let sub =
                    parse(&inner[i..=end]).map_err(|(kind, off)| (kind, at + off))?;
                param.sub = Some(Box::new(sub));
            }
            c => match ParamType::simple(c) {
                Some(t) => place(&mut sig, in_result, Param::new(t), c, at)?,
                None => return Err((ErrorKind::SignatureSymbol(c), at)),
            },
        }
    }

    Ok(sig)
}
