//! Chain expressions: parsing the trailing `a:b(...).c` of a segment and
//! walking it against the variable table and the catalog.

use crate::lexer::{LexemeKind, lex};
use crate::symbols::VariableTable;
use crate::types::{container_element_type, is_class_type};
use luasense_api::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Colon,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainToken<'a> {
    pub text: &'a str,
    /// Byte offset within the parsed text.
    pub offset: usize,
    /// Delimiter preceding the token; `None` for the chain root.
    pub delimiter: Option<Delimiter>,
    /// Followed by a balanced argument group.
    pub call: bool,
    /// Followed by a balanced `[...]` group.
    pub indexed: bool,
    /// A string literal.
    pub literal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain<'a> {
    pub tokens: Vec<ChainToken<'a>>,
    /// Dangling `:` or `.` after the last token.
    pub trailing: Option<Delimiter>,
    /// The chain ends with an unclosed `(`.
    pub open_call: bool,
}

impl<'a> Chain<'a> {
    /// Byte offset where the chain begins.
    pub fn start(&self) -> usize {
        self.tokens.first().map(|t| t.offset).unwrap_or(0)
    }

    pub fn root(&self) -> &ChainToken<'a> {
        &self.tokens[0]
    }

    /// A `:` or `.` member is called somewhere along the chain.
    pub fn has_method_call(&self) -> bool {
        self.tokens.iter().any(|t| t.call && t.delimiter.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Call,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Ident(usize, usize),
    Str(usize, usize),
    Colon,
    Dot,
    Group(Group),
    OpenCall,
    Break,
}

/// Lexemes with balanced bracket groups folded into single units.
fn units(text: &str) -> Vec<Unit> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut outer = Group::Call;
    let mut outer_pos = 0;

    for lexeme in lex(text) {
        match lexeme.kind {
            LexemeKind::OpenParen | LexemeKind::OpenBracket | LexemeKind::OpenBrace => {
                if depth == 0 {
                    outer = if lexeme.kind == LexemeKind::OpenBracket {
                        Group::Index
                    } else {
                        Group::Call
                    };
                    outer_pos = lexeme.start;
                }
                depth += 1;
            }
            LexemeKind::CloseParen | LexemeKind::CloseBracket | LexemeKind::CloseBrace
                if depth > 0 =>
            {
                depth -= 1;
                if depth == 0 {
                    out.push(Unit::Group(outer));
                }
            }
            _ if depth > 0 => {}
            LexemeKind::Ident => out.push(Unit::Ident(lexeme.start, lexeme.end)),
            LexemeKind::Str { .. } => out.push(Unit::Str(lexeme.start, lexeme.end)),
            LexemeKind::Colon => out.push(Unit::Colon),
            LexemeKind::Dot => out.push(Unit::Dot),
            _ => out.push(Unit::Break),
        }
    }

    if depth > 0 {
        // Only a lone `(` closing the text opens a call; anything else
        // unclosed hides what precedes it.
        let lone_open = depth == 1 && outer == Group::Call && outer_pos + 1 == text.trim_end().len();
        out.push(if lone_open { Unit::OpenCall } else { Unit::Break });
    }
    out
}

/// Parse the maximal chain expression ending at the end of `text`.
///
/// Returns `None` when `text` does not end in a chain (e.g. it ends with
/// whitespace, an operator, or a delimiter with nothing before it).
pub fn parse_trailing_chain(text: &str) -> Option<Chain<'_>> {
    let units = units(text);
    let mut idx = units.len();

    let mut trailing = None;
    let mut open_call = false;
    match units.last() {
        Some(Unit::Colon) => trailing = Some(Delimiter::Colon),
        Some(Unit::Dot) => trailing = Some(Delimiter::Dot),
        Some(Unit::OpenCall) => open_call = true,
        _ => {}
    }
    if trailing.is_some() || open_call {
        idx -= 1;
    }

    let mut tokens = Vec::new();
    loop {
        let mut call = false;
        let mut indexed = false;
        while idx > 0 {
            match units[idx - 1] {
                Unit::Group(Group::Call) => call = true,
                Unit::Group(Group::Index) => indexed = true,
                _ => break,
            }
            idx -= 1;
        }

        if idx == 0 {
            return None;
        }
        let (start, end, literal) = match units[idx - 1] {
            Unit::Ident(s, e) => (s, e, false),
            Unit::Str(s, e) => (s, e, true),
            _ => return None,
        };
        idx -= 1;

        let delimiter = match (literal, idx.checked_sub(1).map(|i| units[i])) {
            (false, Some(Unit::Colon)) => Some(Delimiter::Colon),
            (false, Some(Unit::Dot)) => Some(Delimiter::Dot),
            _ => None,
        };
        tokens.push(ChainToken {
            text: &text[start..end],
            offset: start,
            delimiter,
            call,
            indexed,
            literal,
        });

        if delimiter.is_none() {
            break;
        }
        idx -= 1;
    }

    tokens.reverse();
    Some(Chain {
        tokens,
        trailing,
        open_call,
    })
}

/// Where a chain is being resolved.
#[derive(Clone, Copy)]
pub struct ChainScope<'a> {
    pub table: &'a VariableTable,
    pub catalog: &'a dyn Catalog,
    /// 1-based line of the chain.
    pub line: usize,
    /// Byte column of the chain's first character within the line.
    pub column: usize,
}

/// Outcome of walking a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainWalk {
    /// Type reached after the last resolved token.
    pub current_type: String,
    pub matched_member: String,
    pub member_owner: String,
    /// Class the trailing fragment is completed against.
    pub receiver_class: String,
    pub fragment: String,
    pub rest_typed: String,
    pub for_constant: bool,
    pub for_variable: bool,
    /// Every token resolved.
    pub complete: bool,
}

enum Member {
    Method(String),
    Constant,
}

fn find_member(catalog: &dyn Catalog, class: &str, name: &str, delimiter: Delimiter) -> Option<Member> {
    if class.is_empty() {
        return None;
    }
    let method = || {
        catalog
            .method_details(class, name)
            .map(|m| Member::Method(m.return_type()))
    };
    match delimiter {
        Delimiter::Colon => method(),
        Delimiter::Dot => {
            if catalog.constants_for_class(class).iter().any(|c| c.name == name) {
                Some(Member::Constant)
            } else {
                method()
            }
        }
    }
}

fn index_into(type_name: &str) -> String {
    container_element_type(type_name).unwrap_or_default().to_string()
}

/// Walk `chain` left to right, resolving each token.
///
/// A method returning a Lua primitive ends the object chain: the current
/// type becomes empty while `member_owner` keeps the declaring class.
pub fn walk(chain: &Chain<'_>, scope: &ChainScope<'_>) -> ChainWalk {
    let mut out = ChainWalk::default();
    let last = chain.tokens.len().saturating_sub(1);
    let completing_last = chain.trailing.is_none()
        && !chain.open_call
        && chain.tokens.last().is_some_and(|t| !t.call && !t.indexed);

    for (i, token) in chain.tokens.iter().enumerate() {
        if token.literal {
            out.rest_typed = token.text.to_string();
            return out;
        }

        let Some(delimiter) = token.delimiter else {
            if let Some(var) = scope.table.get(token.text) {
                out.current_type = var.type_at(scope.line, scope.column + token.offset).to_string();
            } else if scope.catalog.is_valid_class_name(token.text) {
                out.current_type = token.text.to_string();
            } else {
                out.rest_typed = token.text.to_string();
                out.for_variable = chain.tokens.len() == 1 && completing_last;
                return out;
            }
            if token.indexed {
                out.current_type = index_into(&out.current_type);
            } else if token.call {
                // Calling a variable says nothing about what it returns.
                out.current_type.clear();
            }
            continue;
        };

        if i == last && completing_last {
            out.receiver_class = out.current_type.clone();
            out.fragment = token.text.to_string();
            out.for_constant = delimiter == Delimiter::Dot;
        }

        match find_member(scope.catalog, &out.current_type, token.text, delimiter) {
            Some(Member::Method(returns)) => {
                out.matched_member = token.text.to_string();
                out.member_owner = std::mem::take(&mut out.current_type);
                out.for_constant = false;
                if is_class_type(&returns) {
                    out.current_type = returns;
                }
                if token.indexed {
                    out.current_type = index_into(&out.current_type);
                }
            }
            Some(Member::Constant) => {
                out.matched_member = token.text.to_string();
                out.member_owner = out.current_type.clone();
                out.for_constant = true;
            }
            None => {
                out.rest_typed = token.text.to_string();
                return out;
            }
        }
    }

    if let Some(delimiter) = chain.trailing {
        out.receiver_class = out.current_type.clone();
        out.fragment.clear();
        out.for_constant = delimiter == Delimiter::Dot;
    }
    out.complete = true;
    out
}
