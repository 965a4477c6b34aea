//! Expression segmenting around the cursor.
//!
//! Narrows the cursor's line to the innermost bracket/comma delimited piece
//! of text being edited, and remembers the call whose argument list holds
//! the cursor.

use crate::error::{ResolveError, Result};
use crate::lexer::{LexemeKind, is_closed_block_comment, lex};

/// The part of the cursor's line that precedes the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorLine<'a> {
    pub prefix: &'a str,
    /// 1-based.
    pub line: usize,
    /// Byte offset of the line start in the document.
    pub line_start: usize,
}

pub fn cursor_line(text: &str, cursor: usize) -> Result<CursorLine<'_>> {
    if cursor > text.len() {
        return Err(ResolveError::CursorOutOfRange {
            cursor,
            len: text.len(),
        });
    }
    let mut cursor = cursor;
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }

    let before = &text[..cursor];
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Ok(CursorLine {
        prefix: &text[line_start..cursor],
        line: before.matches('\n').count() + 1,
        line_start,
    })
}

/// An unmatched `(` before the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    /// Position of the `(`.
    pub open: usize,
    /// Start of the segment the callee expression lives in.
    pub callee_start: usize,
}

impl CallFrame {
    /// Callee expression including the opening parenthesis.
    pub fn callee<'a>(&self, prefix: &'a str) -> &'a str {
        &prefix[self.callee_start..=self.open]
    }

    /// Argument text from the opening parenthesis to the cursor.
    pub fn arguments<'a>(&self, prefix: &'a str) -> &'a str {
        &prefix[self.open..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments {
    /// Start of the innermost segment; it runs to the end of the prefix.
    pub inner_start: usize,
    /// Innermost enclosing call, if any.
    pub call: Option<CallFrame>,
}

impl Segments {
    pub fn inner<'a>(&self, prefix: &'a str) -> &'a str {
        &prefix[self.inner_start..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Paren,
    Square,
    Brace,
}

impl Bracket {
    fn close_char(self) -> char {
        match self {
            Bracket::Paren => ')',
            Bracket::Square => ']',
            Bracket::Brace => '}',
        }
    }
}

#[derive(Debug)]
struct Open {
    kind: Bracket,
    pos: usize,
    last_comma: Option<usize>,
    segment_start: usize,
}

fn segment_start(stack: &[Open], base: usize) -> usize {
    match stack.last() {
        Some(open) => open.last_comma.unwrap_or(open.pos) + 1,
        None => base,
    }
}

/// Segment the text before the cursor on its line.
///
/// A closing bracket with nothing open ends a finished expression (for
/// example `end)` closing a callback) and restarts segmenting after it.
pub fn segment(prefix: &str) -> Result<Segments> {
    let mut stack: Vec<Open> = Vec::new();
    let mut base = 0;

    for lexeme in lex(prefix) {
        let bracket = match lexeme.kind {
            LexemeKind::OpenParen | LexemeKind::CloseParen => Some(Bracket::Paren),
            LexemeKind::OpenBracket | LexemeKind::CloseBracket => Some(Bracket::Square),
            LexemeKind::OpenBrace | LexemeKind::CloseBrace => Some(Bracket::Brace),
            _ => None,
        };

        match lexeme.kind {
            LexemeKind::Comment => {
                if lexeme.end == prefix.len() && !is_closed_block_comment(lexeme.text(prefix)) {
                    return Err(ResolveError::InsideComment);
                }
            }
            LexemeKind::OpenParen | LexemeKind::OpenBracket | LexemeKind::OpenBrace => {
                let Some(kind) = bracket else { continue };
                let start = segment_start(&stack, base);
                stack.push(Open {
                    kind,
                    pos: lexeme.start,
                    last_comma: None,
                    segment_start: start,
                });
            }
            LexemeKind::CloseParen | LexemeKind::CloseBracket | LexemeKind::CloseBrace => {
                let Some(kind) = bracket else { continue };
                match stack.last() {
                    Some(open) if open.kind == kind => {
                        stack.pop();
                    }
                    Some(open) => {
                        return Err(ResolveError::MalformedSegment(format!(
                            "expected '{}' at column {}, found '{}'",
                            open.kind.close_char(),
                            lexeme.start,
                            kind.close_char()
                        )));
                    }
                    None => base = lexeme.end,
                }
            }
            LexemeKind::Comma => match stack.last_mut() {
                Some(open) => open.last_comma = Some(lexeme.start),
                None => base = lexeme.end,
            },
            _ => {}
        }
    }

    let call = stack
        .iter()
        .rev()
        .find(|open| open.kind == Bracket::Paren)
        .map(|open| CallFrame {
            open: open.pos,
            callee_start: open.segment_start,
        });

    Ok(Segments {
        inner_start: segment_start(&stack, base),
        call,
    })
}
