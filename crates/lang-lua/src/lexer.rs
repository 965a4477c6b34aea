//! Literal-aware lexing of Lua source lines.
//!
//! Everything downstream (segmenting, chain parsing, statement splitting)
//! works on [`Lexeme`]s so that delimiters inside string literals and
//! comments are never mistaken for structure.

use std::borrow::Cow;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    Ident,
    Number,
    /// Quoted or long-bracket string. `terminated` is false when the line
    /// ends before the closing quote.
    Str { terminated: bool },
    /// `--` to end of line, or a `--[[ ]]` block.
    Comment,
    Whitespace,
    Colon,
    Dot,
    Comma,
    Semicolon,
    /// A single `=` (not `==`, `~=`, `<=`, `>=`).
    Assign,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    /// Operators and anything else, including `..` and `...`.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub start: usize,
    pub end: usize,
}

impl Lexeme {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.range()]
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, LexemeKind::Whitespace | LexemeKind::Comment)
    }
}

pub fn lex(src: &str) -> Vec<Lexeme> {
    Lexer::new(src).collect()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Level of a long bracket opening at `at` (`[[` is 0, `[==[` is 2).
    fn long_bracket_level(&self, at: usize) -> Option<usize> {
        if self.bytes.get(at) != Some(&b'[') {
            return None;
        }
        let mut level = 0;
        let mut i = at + 1;
        while self.bytes.get(i) == Some(&b'=') {
            level += 1;
            i += 1;
        }
        (self.bytes.get(i) == Some(&b'[')).then_some(level)
    }

    /// Consume a long bracket body starting at the opening `[`. Returns
    /// whether the matching close was found.
    fn consume_long_bracket(&mut self, level: usize) -> bool {
        self.pos += level + 2;
        let close = format!("]{}]", "=".repeat(level));
        match self.src[self.pos..].find(&close) {
            Some(idx) => {
                self.pos += idx + close.len();
                true
            }
            None => {
                self.pos = self.bytes.len();
                false
            }
        }
    }

    fn consume_quoted(&mut self, quote: u8) -> bool {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => {
                    self.pos += 1;
                    if self.peek(0).is_some_and(|n| n != b'\n') {
                        self.advance_char();
                    }
                }
                b'\n' => return false,
                _ if b == quote => {
                    self.pos += 1;
                    return true;
                }
                _ => self.advance_char(),
            }
        }
        false
    }

    fn advance_char(&mut self) {
        let len = self.src[self.pos..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        self.pos += len;
    }

    fn consume_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek(0).is_some_and(&pred) {
            self.pos += 1;
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        let start = self.pos;
        let b = self.peek(0)?;

        let kind = match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                self.consume_while(|c| c.is_ascii_whitespace());
                LexemeKind::Whitespace
            }
            b'-' if self.peek(1) == Some(b'-') => {
                match self.long_bracket_level(start + 2) {
                    Some(level) => {
                        self.pos += 2;
                        self.consume_long_bracket(level);
                    }
                    None => self.consume_while(|c| c != b'\n'),
                }
                LexemeKind::Comment
            }
            b'"' | b'\'' => LexemeKind::Str {
                terminated: self.consume_quoted(b),
            },
            b'[' => match self.long_bracket_level(start) {
                Some(level) => LexemeKind::Str {
                    terminated: self.consume_long_bracket(level),
                },
                None => {
                    self.pos += 1;
                    LexemeKind::OpenBracket
                }
            },
            c if c == b'_' || c.is_ascii_alphabetic() => {
                self.consume_while(|c| c == b'_' || c.is_ascii_alphanumeric());
                LexemeKind::Ident
            }
            c if c.is_ascii_digit() => {
                self.consume_while(|c| c.is_ascii_alphanumeric() || c == b'_');
                if self.peek(0) == Some(b'.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                    self.consume_while(|c| c.is_ascii_alphanumeric() || c == b'_');
                }
                LexemeKind::Number
            }
            b'.' => {
                self.consume_while(|c| c == b'.');
                if self.pos - start == 1 {
                    LexemeKind::Dot
                } else {
                    LexemeKind::Other
                }
            }
            b':' => {
                if self.peek(1) == Some(b':') {
                    self.pos += 2;
                    LexemeKind::Other
                } else {
                    self.pos += 1;
                    LexemeKind::Colon
                }
            }
            b'=' | b'~' | b'<' | b'>' => {
                if self.peek(1) == Some(b'=') {
                    self.pos += 2;
                    LexemeKind::Other
                } else {
                    self.pos += 1;
                    if b == b'=' {
                        LexemeKind::Assign
                    } else {
                        LexemeKind::Other
                    }
                }
            }
            _ => {
                self.advance_char();
                match b {
                    b',' => LexemeKind::Comma,
                    b';' => LexemeKind::Semicolon,
                    b'(' => LexemeKind::OpenParen,
                    b')' => LexemeKind::CloseParen,
                    b']' => LexemeKind::CloseBracket,
                    b'{' => LexemeKind::OpenBrace,
                    b'}' => LexemeKind::CloseBrace,
                    _ => LexemeKind::Other,
                }
            }
        };

        Some(Lexeme {
            kind,
            start,
            end: self.pos,
        })
    }
}

/// True for a `--[[ ... ]]` comment whose closing bracket is present.
pub fn is_closed_block_comment(comment: &str) -> bool {
    let Some(body) = comment.strip_prefix("--[") else {
        return false;
    };
    let level = body.bytes().take_while(|b| *b == b'=').count();
    if body.as_bytes().get(level) != Some(&b'[') {
        return false;
    }
    let close = format!("]{}]", "=".repeat(level));
    body.len() >= level + 1 + close.len() && body[level + 1..].ends_with(&close)
}

/// A comment or long-bracket string that crosses a line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultilineSpan {
    pub range: Range<usize>,
    pub comment: bool,
    /// The closing bracket is present.
    pub closed: bool,
}

impl MultilineSpan {
    /// `offset` lies after the opening bracket and before the closing one.
    /// An unclosed span swallows everything to the end of the buffer.
    pub fn contains(&self, offset: usize) -> bool {
        self.range.start < offset && (offset < self.range.end || !self.closed)
    }
}

/// Comments and long strings of the whole buffer that span several lines.
///
/// Line-at-a-time lexing cannot see these, so callers look them up once
/// per buffer.
pub fn multiline_spans(src: &str) -> Vec<MultilineSpan> {
    lex(src)
        .into_iter()
        .filter(|l| src[l.range()].contains('\n'))
        .filter_map(|l| match l.kind {
            LexemeKind::Comment => Some(MultilineSpan {
                range: l.range(),
                comment: true,
                closed: is_closed_block_comment(l.text(src)),
            }),
            LexemeKind::Str { terminated } => Some(MultilineSpan {
                range: l.range(),
                comment: false,
                closed: terminated,
            }),
            _ => None,
        })
        .collect()
}

/// `src` with every multi-line comment and long string replaced by spaces.
/// Line breaks stay, so byte offsets and line numbers are unchanged.
pub fn blank_multiline_spans(src: &str) -> Cow<'_, str> {
    let spans = multiline_spans(src);
    if spans.is_empty() {
        return Cow::Borrowed(src);
    }

    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for span in &spans {
        out.push_str(&src[last..span.range.start]);
        out.extend(src.as_bytes()[span.range.clone()].iter().map(|&b| match b {
            b'\n' | b'\r' => b as char,
            _ => ' ',
        }));
        last = span.range.end;
    }
    out.push_str(&src[last..]);
    Cow::Owned(out)
}

/// `line` with any trailing comment removed.
pub fn strip_comment(line: &str) -> &str {
    match lex(line).iter().find(|l| l.kind == LexemeKind::Comment) {
        Some(comment) => &line[..comment.start],
        None => line,
    }
}

/// True when the line holds nothing but a comment.
pub fn is_comment_line(line: &str) -> bool {
    lex(line)
        .iter()
        .find(|l| l.kind != LexemeKind::Whitespace)
        .is_some_and(|l| l.kind == LexemeKind::Comment)
}

/// A `;`-separated statement of one line, trimmed, with its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    pub text: &'a str,
    pub offset: usize,
}

impl Statement<'_> {
    /// Byte column just past the statement's last character.
    pub fn end_column(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Split a line into statements on `;` outside literals, dropping the
/// trailing comment and empty pieces.
pub fn split_statements(line: &str) -> Vec<Statement<'_>> {
    let code = strip_comment(line);
    let mut out = Vec::new();
    let mut piece_start = 0;

    let mut push = |from: usize, to: usize| {
        let raw = &code[from..to];
        let trimmed = raw.trim_start();
        let offset = from + (raw.len() - trimmed.len());
        let text = trimmed.trim_end();
        if !text.is_empty() {
            out.push(Statement { text, offset });
        }
    };

    for lexeme in lex(code) {
        if lexeme.kind == LexemeKind::Semicolon {
            push(piece_start, lexeme.start);
            piece_start = lexeme.end;
        }
    }
    push(piece_start, code.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<LexemeKind> {
        lex(src)
            .into_iter()
            .filter(|l| !l.is_trivia())
            .map(|l| l.kind)
            .collect()
    }

    #[test]
    fn test_delimiters_inside_strings_are_opaque() {
        let src = r#"print("a:b.c(", 'x\'y')"#;
        assert_eq!(
            kinds(src),
            vec![
                LexemeKind::Ident,
                LexemeKind::OpenParen,
                LexemeKind::Str { terminated: true },
                LexemeKind::Comma,
                LexemeKind::Str { terminated: true },
                LexemeKind::CloseParen,
            ]
        );
    }

    #[test]
    fn test_long_string_and_unterminated_quote() {
        assert_eq!(kinds("[[a:b]]"), vec![LexemeKind::Str { terminated: true }]);
        assert_eq!(
            kinds("x = \"abc"),
            vec![
                LexemeKind::Ident,
                LexemeKind::Assign,
                LexemeKind::Str { terminated: false },
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a == b .. c ~= d"),
            vec![
                LexemeKind::Ident,
                LexemeKind::Other,
                LexemeKind::Ident,
                LexemeKind::Other,
                LexemeKind::Ident,
                LexemeKind::Other,
                LexemeKind::Ident,
            ]
        );
        assert_eq!(kinds("1.5"), vec![LexemeKind::Number]);
    }

    #[test]
    fn test_split_statements() {
        let stmts = split_statements("  local a = f(\";\"); a:go() -- done; really");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].text, "local a = f(\";\")");
        assert_eq!(stmts[0].offset, 2);
        assert_eq!(stmts[1].text, "a:go()");
        assert_eq!(stmts[1].end_column(), 26);
    }

    #[test]
    fn test_block_comment_closed() {
        assert!(is_closed_block_comment("--[[ note ]]"));
        assert!(is_closed_block_comment("--[==[ a ]] b ]==]"));
        assert!(!is_closed_block_comment("--[[ open"));
        assert!(!is_closed_block_comment("-- plain ]]"));
    }

    #[test]
    fn test_comment_line() {
        assert!(is_comment_line("   -- local x = 1"));
        assert!(!is_comment_line("x = 1 -- note"));
        assert_eq!(strip_comment("x = '--' -- c"), "x = '--' ");
    }

    #[test]
    fn test_multiline_spans() {
        let src = "a = 1 --[[ note\nnpc: ]] b = [==[\nx\n]==]\nc = 'q' --[[ one line ]]";
        let spans = multiline_spans(src);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].comment && spans[0].closed);
        assert_eq!(&src[spans[0].range.clone()], "--[[ note\nnpc: ]]");
        assert!(!spans[1].comment && spans[1].closed);
        assert!(spans[0].contains(src.find("npc").unwrap()));
        assert!(!spans[0].contains(spans[0].range.end));
    }

    #[test]
    fn test_unclosed_span_runs_to_end() {
        let src = "local s = [[\nnpc:";
        let spans = multiline_spans(src);
        assert_eq!(spans.len(), 1);
        assert!(!spans[0].closed);
        assert!(spans[0].contains(src.len()));
    }

    #[test]
    fn test_blank_keeps_offsets_and_lines() {
        let src = "x = 1 --[[ é\r\nlocal y = 2 ]] z = 3";
        let blanked = blank_multiline_spans(src);
        assert_eq!(blanked.len(), src.len());
        assert_eq!(blanked, format!("x = 1{}\r\n{}z = 3", " ".repeat(8), " ".repeat(15)));
        assert!(matches!(blank_multiline_spans("x = 1 -- c"), Cow::Borrowed(_)));
    }
}
