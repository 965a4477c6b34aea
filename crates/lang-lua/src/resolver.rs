//! Resolver entry point: `(text, cursor) -> ResolutionResult`.
//!
//! Pure and synchronous. The worker owns threading, staleness and the
//! variable table's lifetime; everything here only reads.

use crate::chain::{ChainScope, ChainWalk, parse_trailing_chain, walk};
use crate::error::{ResolveError, Result};
use crate::lexer::{blank_multiline_spans, multiline_spans};
use crate::segment::{CallFrame, cursor_line, segment};
use crate::symbols::VariableTable;
use luasense_api::Catalog;
use luasense_api::models::{CallSite, ResolutionResult};
use tracing::debug;

/// `rest_typed` must be longer than this to drive name completion.
pub const DEFAULT_MIN_REST_TYPED_LEN: usize = 2;

pub struct Resolver<'a> {
    catalog: &'a dyn Catalog,
    min_rest_typed_len: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            min_rest_typed_len: DEFAULT_MIN_REST_TYPED_LEN,
        }
    }

    pub fn with_min_rest_typed_len(mut self, len: usize) -> Self {
        self.min_rest_typed_len = len;
        self
    }

    /// Resolve the expression touching `cursor` (a byte offset into `text`).
    ///
    /// Comments and long strings spanning several lines are found on the
    /// whole buffer first; the rest of the analysis is per line.
    pub fn resolve(&self, text: &str, cursor: usize, table: &VariableTable) -> Result<ResolutionResult> {
        let code = blank_multiline_spans(text);
        let line = cursor_line(&code, cursor)?;
        if let Some(span) = multiline_spans(text).iter().find(|s| s.contains(cursor)) {
            return Err(if span.comment {
                ResolveError::InsideComment
            } else {
                ResolveError::InsideLongString
            });
        }
        let prefix = line.prefix;
        let segments = segment(prefix)?;

        let mut result = ResolutionResult {
            line: line.line,
            ..Default::default()
        };

        let inner = segments.inner(prefix);
        if let Some(chain) = parse_trailing_chain(inner) {
            let scope = ChainScope {
                table,
                catalog: self.catalog,
                line: line.line,
                column: segments.inner_start,
            };
            apply_walk(&mut result, walk(&chain, &scope));
        }

        if let Some(call) = segments.call {
            result.typed_inside_function = call.arguments(prefix).to_string();
            // A bare name being typed as an argument is completed on its own.
            result.evaluate_outer = !result.qualifies_for_name_completion(self.min_rest_typed_len);
            if result.evaluate_outer {
                self.resolve_call_site(&mut result, prefix, call, inner, table, line.line);
            }
        }

        debug!(
            line = result.line,
            class = %result.matched_class_name,
            method = %result.matched_method_name,
            receiver = %result.receiver_class,
            rest = %result.rest_typed,
            call = ?result.call_site,
            "resolved cursor context"
        );
        Ok(result)
    }

    fn resolve_call_site(
        &self,
        result: &mut ResolutionResult,
        prefix: &str,
        call: CallFrame,
        inner: &str,
        table: &VariableTable,
        line: usize,
    ) {
        let Some(chain) = parse_trailing_chain(call.callee(prefix)) else {
            return;
        };
        if !chain.open_call {
            return;
        }

        let scope = ChainScope {
            table,
            catalog: self.catalog,
            line,
            column: call.callee_start,
        };
        let walked = walk(&chain, &scope);
        let is_method = walked.complete
            && !walked.for_constant
            && !walked.matched_member.is_empty()
            && chain.tokens.last().is_some_and(|t| t.delimiter.is_some());
        if !is_method {
            return;
        }

        result.call_site = Some(CallSite {
            class_name: walked.member_owner.clone(),
            method_name: walked.matched_member.clone(),
        });
        if inner.trim().is_empty() {
            result.matched_class_name = walked.current_type;
            result.matched_method_name = walked.matched_member;
            result.method_owner = walked.member_owner;
        }
    }
}

fn apply_walk(result: &mut ResolutionResult, walked: ChainWalk) {
    result.matched_class_name = walked.current_type;
    result.matched_method_name = walked.matched_member;
    result.method_owner = walked.member_owner;
    result.receiver_class = walked.receiver_class;
    result.fragment = walked.fragment;
    result.rest_typed = walked.rest_typed;
    result.for_constant = walked.for_constant;
    result.for_variable = walked.for_variable;
}

/// Resolve with default settings.
pub fn resolve(
    text: &str,
    cursor: usize,
    table: &VariableTable,
    catalog: &dyn Catalog,
) -> Result<ResolutionResult> {
    Resolver::new(catalog).resolve(text, cursor, table)
}
