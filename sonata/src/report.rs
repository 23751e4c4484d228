//! Pretty-printing parse errors.
use core::ops::Range;
use sonata_syn::{Error, ErrorKind};

/// Error report: summary plus labeled source ranges.
#[derive(Debug)]
pub struct Report {
    /// error summary
    pub message: String,
    labels: Vec<(Range<usize>, String, Color)>,
}

/// Error color.
#[derive(Copy, Clone, Debug)]
pub enum Color {
    /// used for most errors
    Red = 31,
    /// used for unterminated constructs
    Yellow = 33,
}

impl Color {
    /// Format a string with ANSI colors.
    pub fn ansi(self, text: impl core::fmt::Display) -> String {
        let ansi = |i| format!("\x1b[{i}m");
        format!("{}{text}{}", ansi(self as usize), ansi(0))
    }
}

/// Build a report for a diagnostic against its source.
pub fn report(code: &str, err: &Error) -> Report {
    let color = match err.kind {
        ErrorKind::UnterminatedString
        | ErrorKind::UnterminatedComment
        | ErrorKind::UnterminatedQuotedName
        | ErrorKind::UnterminatedRegex
        | ErrorKind::ExpectedBeforeEnd(_)
        | ErrorKind::UnexpectedEnd => Color::Yellow,
        _ => Color::Red,
    };
    Report {
        message: format!("[{}] {}", err.code(), err.kind),
        labels: Vec::from([(span(code, err), err.kind.to_string(), color)]),
    }
}

/// Length of the offending token, if the diagnostic carries one.
fn token_len(err: &Error) -> usize {
    let len = match &err.kind {
        ErrorKind::Unexpected(t)
        | ErrorKind::UnknownOperator(t)
        | ErrorKind::UnknownToken(t)
        | ErrorKind::UnknownShape(t)
        | ErrorKind::NotPrefix(t)
        | ErrorKind::InvalidBindTarget(t)
        | ErrorKind::InvalidStep(t)
        | ErrorKind::NumberOutOfRange(t) => t.len(),
        ErrorKind::Expected { found, .. } => found.len(),
        ErrorKind::LambdaArgument { token, .. } => token.len(),
        _ => 1,
    };
    len.max(1)
}

/// Diagnostic positions point just past the offending token; walk back over
/// its length, snapping to character boundaries.
fn span(code: &str, err: &Error) -> Range<usize> {
    let mut end = err.position.min(code.len());
    while end > 0 && !code.is_char_boundary(end) {
        end -= 1;
    }
    let mut start = end.saturating_sub(token_len(err));
    while start > 0 && !code.is_char_boundary(start) {
        start -= 1;
    }
    if start == end {
        let mut next = (end + 1).min(code.len());
        while next < code.len() && !code.is_char_boundary(next) {
            next += 1;
        }
        if next > end {
            return end..next;
        }
        start = end.saturating_sub(1);
        while start > 0 && !code.is_char_boundary(start) {
            start -= 1;
        }
    }
    start..end
}

type CodeBlock = codesnake::Block<codesnake::CodeWidth<String>, String>;

impl Report {
    /// Convert report to a code block.
    pub fn to_block(&self, code: &str, paint: fn(Color, String) -> String) -> Option<CodeBlock> {
        use codesnake::{Block, CodeWidth, Label, LineIndex};
        let labels = self.labels.iter().cloned().map(|(range, text, color)| {
            Label::new(range)
                .with_text(text)
                .with_style(move |s| paint(color, s))
        });
        let idx = LineIndex::new(code);
        Some(Block::new(&idx, labels)?.map_code(|c| {
            let c = c.replace('\t', "    ");
            let w = unicode_width::UnicodeWidthStr::width(&*c);
            CodeWidth::new(c, core::cmp::max(w, 1))
        }))
    }
}
