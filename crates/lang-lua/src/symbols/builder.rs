//! Variable Table Builder.
//!
//! Scans a whole buffer line by line into a [`VariableTable`]: one pass to
//! collect declarations, then type inference passes over every statement.
//! Inference is bounded: one full pass, plus exactly one more when some
//! variable is still untyped (forward references), never more.

use super::VariableTable;
use crate::chain::{ChainScope, parse_trailing_chain, walk};
use crate::lexer::{Statement, blank_multiline_spans, is_comment_line, split_statements, strip_comment};
use crate::types::container_element_type;
use luasense_api::Catalog;
use luasense_api::models::{VariableInfo, VariableScope};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

const IDENT: &str = r"[A-Za-z_]\w*";

static LOCAL_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^local\s+({IDENT}(?:\s*,\s*{IDENT})*)\s*=(?:[^=]|$)"))
        .expect("local declaration pattern")
});

static GLOBAL_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({IDENT})\s*=(?:[^=]|$)")).expect("global declaration pattern")
});

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(local\s+)?function\s+(?:{IDENT}\s*[:.]\s*)?({IDENT})\s*\("
    ))
    .expect("function declaration pattern")
});

static PARAMETER_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfunction\b\s*(?:[A-Za-z_][\w.:]*)?\s*\(([^)]*)\)")
        .expect("parameter list pattern")
});

static LEADING_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({IDENT})")).expect("leading identifier pattern"));

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:(local)\s+)?({IDENT})\s*(=)(?:[^=]|$)"))
        .expect("assignment pattern")
});

static CAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bcast(?:\s*\(\s*({IDENT})\s*\)|([A-Z]\w*))\s*\("
    ))
    .expect("cast pattern")
});

static BARE_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^{IDENT}$")).expect("identifier pattern"));

static TABLE_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^local\s+({IDENT})\s*=\s*({IDENT})\s*\[[^\]]+\]$"))
        .expect("table access pattern")
});

const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Counters from one build, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub inference_passes: usize,
    pub untyped_remaining: usize,
}

/// An assignment `[local] name = rhs`.
struct Assignment<'s> {
    name: &'s str,
    local: bool,
    rhs: &'s str,
    /// Byte offset of `rhs` within the statement.
    rhs_offset: usize,
}

fn parse_assignment(stmt: &str) -> Option<Assignment<'_>> {
    let caps = ASSIGNMENT.captures(stmt)?;
    let name = caps.get(2)?.as_str();
    if KEYWORDS.contains(&name) {
        return None;
    }
    let eq = caps.get(3)?;
    let rest = &stmt[eq.end()..];
    let rhs = rest.trim_start();
    Some(Assignment {
        name,
        local: caps.get(1).is_some(),
        rhs,
        rhs_offset: eq.end() + (rest.len() - rhs.len()),
    })
}

/// Buffer lines with their 1-based numbers. `\r\n` endings are accepted.
fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .map(|(i, line)| (i + 1, line))
}

/// Upper bound on inference passes: one full pass plus one extra round.
pub const MAX_INFERENCE_PASSES: usize = 2;

pub struct VariableTableBuilder<'a> {
    catalog: &'a dyn Catalog,
    max_passes: usize,
}

impl<'a> VariableTableBuilder<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            max_passes: MAX_INFERENCE_PASSES,
        }
    }

    /// Lower the pass limit (clamped to `1..=MAX_INFERENCE_PASSES`).
    pub fn with_max_inference_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.clamp(1, MAX_INFERENCE_PASSES);
        self
    }

    pub fn build(&self, text: &str) -> VariableTable {
        self.build_with_stats(text).0
    }

    /// Multi-line comments and long strings are blanked out before the
    /// line-by-line passes, so nothing inside them is declared or typed.
    pub fn build_with_stats(&self, text: &str) -> (VariableTable, BuildStats) {
        let code = blank_multiline_spans(text);
        let text: &str = &code;
        let mut table = VariableTable::new();
        for (line_no, line) in numbered_lines(text) {
            if !line.trim().is_empty() {
                self.collect_declarations(line_no, line, &mut table);
            }
        }

        let mut stats = BuildStats::default();
        loop {
            self.infer_pass(text, &mut table);
            stats.inference_passes += 1;
            if stats.inference_passes >= self.max_passes || table.untyped_count() == 0 {
                break;
            }
        }
        stats.untyped_remaining = table.untyped_count();

        trace!(
            variables = table.len(),
            passes = stats.inference_passes,
            untyped = stats.untyped_remaining,
            "variable table built"
        );
        (table, stats)
    }

    fn collect_declarations(&self, line_no: usize, line: &str, table: &mut VariableTable) {
        for stmt in split_statements(line) {
            let text = stmt.text;

            if let Some(caps) = FUNCTION_DECL.captures(text) {
                if let Some(name) = caps.get(2) {
                    let scope = if caps.get(1).is_some() {
                        VariableScope::Local
                    } else {
                        VariableScope::Global
                    };
                    table.declare(VariableInfo::new(name.as_str(), "function", line_no, scope));
                }
            } else if let Some(caps) = LOCAL_DECL.captures(text) {
                let initial = initial_type(text);
                for name in caps[1].split(',').map(str::trim) {
                    table.declare(VariableInfo::new(name, initial, line_no, VariableScope::Local));
                }
            } else if let Some(caps) = GLOBAL_DECL.captures(text) {
                let name = &caps[1];
                if !KEYWORDS.contains(&name) {
                    table.declare(VariableInfo::new(
                        name,
                        initial_type(text),
                        line_no,
                        VariableScope::Global,
                    ));
                }
            }

            self.declare_singletons(line_no, text, table);
        }

        for caps in PARAMETER_LIST.captures_iter(strip_comment(line)) {
            for param in caps[1].split(',').map(str::trim) {
                if BARE_IDENT.is_match(param) {
                    table.declare(VariableInfo::new(param, "", line_no, VariableScope::Function));
                }
            }
        }
    }

    /// Catalog classes used directly as a chain root, either as the whole
    /// statement or as the right-hand side of an assignment.
    fn declare_singletons(&self, line_no: usize, stmt: &str, table: &mut VariableTable) {
        let expr = match parse_assignment(stmt) {
            Some(assignment) => assignment.rhs,
            None => stmt,
        };
        let Some(caps) = LEADING_IDENT.captures(expr) else {
            return;
        };
        let name = &caps[1];
        let used_as_root = expr[name.len()..].trim_start().starts_with([':', '.']);
        if used_as_root && !table.contains(name) && self.catalog.is_valid_class_name(name) {
            table.declare(VariableInfo::new(name, name, line_no, VariableScope::Singleton));
        }
    }

    fn infer_pass(&self, text: &str, table: &mut VariableTable) {
        for (line_no, line) in numbered_lines(text) {
            if line.trim().is_empty() || is_comment_line(line) {
                continue;
            }
            for stmt in split_statements(line) {
                self.infer_statement(line_no, stmt, table);
            }
        }
    }

    /// Handlers are exclusive; the first that applies wins.
    fn infer_statement(&self, line_no: usize, stmt: Statement<'_>, table: &mut VariableTable) {
        let Some(assignment) = parse_assignment(stmt.text) else {
            self.apply_chain(line_no, stmt, None, table);
            return;
        };
        if self.apply_cast(line_no, &assignment, table) || self.apply_copy(&assignment, table) {
            return;
        }
        if !self.apply_chain(line_no, stmt, Some(&assignment), table) {
            self.apply_table_access(stmt.text, table);
        }
    }

    fn apply_cast(&self, line_no: usize, assignment: &Assignment<'_>, table: &mut VariableTable) -> bool {
        let Some(caps) = CAST.captures(assignment.rhs) else {
            return false;
        };
        let Some(class) = caps.get(1).or_else(|| caps.get(2)) else {
            return false;
        };
        set_type(table, assignment, class.as_str(), line_no);
        true
    }

    fn apply_copy(&self, assignment: &Assignment<'_>, table: &mut VariableTable) -> bool {
        if !BARE_IDENT.is_match(assignment.rhs) || KEYWORDS.contains(&assignment.rhs) {
            return false;
        }
        let source_type = table
            .get(assignment.rhs)
            .filter(|source| source.has_type())
            .map(|source| source.type_name.clone());
        if let Some(source_type) = source_type {
            table.assign_type(assignment.name, &source_type);
        }
        true
    }

    /// `[x =] root[:method(args)]*[.field]`, with at least one method call.
    fn apply_chain(
        &self,
        line_no: usize,
        stmt: Statement<'_>,
        assignment: Option<&Assignment<'_>>,
        table: &mut VariableTable,
    ) -> bool {
        let (expr, expr_offset) = match assignment {
            Some(a) => (a.rhs, a.rhs_offset),
            None => (stmt.text, 0),
        };
        let Some(chain) = parse_trailing_chain(expr) else {
            return false;
        };
        if chain.start() != 0
            || chain.trailing.is_some()
            || chain.open_call
            || chain.root().literal
            || !chain.has_method_call()
        {
            return false;
        }

        let scope = ChainScope {
            table: &*table,
            catalog: self.catalog,
            line: line_no,
            column: stmt.offset + expr_offset,
        };
        let resolved = walk(&chain, &scope);
        if !resolved.complete || resolved.current_type.is_empty() {
            return true;
        }

        let end_column = stmt.end_column();
        match assignment {
            Some(a) => {
                set_type(table, a, &resolved.current_type, line_no);
                if let Some(var) = table.get_mut(a.name) {
                    var.record_chain_type(line_no, end_column, resolved.current_type.as_str());
                }
            }
            None => {
                if let Some(root) = table.get_mut(chain.root().text) {
                    root.record_chain_result(line_no, end_column, resolved.current_type.as_str());
                }
            }
        }
        true
    }

    /// `local x = t[i]` where `t` is a `Table[K][V]`.
    fn apply_table_access(&self, stmt: &str, table: &mut VariableTable) -> bool {
        let Some(caps) = TABLE_ACCESS.captures(stmt) else {
            return false;
        };
        let element = table
            .get(&caps[2])
            .and_then(|source| container_element_type(&source.type_name))
            .map(str::to_string);
        if let Some(element) = element {
            table.assign_type(&caps[1], &element);
        }
        true
    }
}

/// Assign `type_name` to the assignment target, declaring it if pass 1 did
/// not see it. The existing scope is kept.
fn set_type(table: &mut VariableTable, assignment: &Assignment<'_>, type_name: &str, line_no: usize) {
    if !table.assign_type(assignment.name, type_name) {
        let scope = if assignment.local {
            VariableScope::Local
        } else {
            VariableScope::Global
        };
        table.declare(VariableInfo::new(assignment.name, type_name, line_no, scope));
    }
}

/// `function` for `x = function(...)`, empty otherwise.
fn initial_type(stmt: &str) -> &'static str {
    match parse_assignment(stmt) {
        Some(a) if a.rhs.starts_with("function") && a.rhs[8..].trim_start().starts_with('(') => {
            "function"
        }
        _ => "",
    }
}
