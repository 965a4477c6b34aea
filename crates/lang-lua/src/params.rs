//! Active-parameter highlighting inside a call's argument list.

use crate::lexer::{LexemeKind, lex};
use luasense_api::models::ParameterHighlight;
use luasense_api::{Catalog, MethodInfo};

/// Zero-based index of the argument being typed.
///
/// `typed_inside_function` starts at the call's `(`; only commas at that
/// depth count, and never inside literals.
pub fn active_parameter_index(typed_inside_function: &str) -> usize {
    let mut depth = 0usize;
    let mut commas = 0;
    for lexeme in lex(typed_inside_function) {
        match lexeme.kind {
            LexemeKind::OpenParen | LexemeKind::OpenBracket | LexemeKind::OpenBrace => depth += 1,
            LexemeKind::CloseParen | LexemeKind::CloseBracket | LexemeKind::CloseBrace => {
                depth = depth.saturating_sub(1)
            }
            LexemeKind::Comma if depth == 1 => commas += 1,
            _ => {}
        }
    }
    commas
}

/// A declared parameter and its character span within the full signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Parameters of `method` with spans relative to [`MethodInfo::signature`].
pub fn parameter_spans(method: &MethodInfo) -> Vec<ParameterSpan> {
    let args = method.args.trim();
    let inner = args.strip_prefix('(').unwrap_or(args);
    let inner = inner.strip_suffix(')').unwrap_or(inner);

    // `returns` + space + `name` + the opening parenthesis.
    let mut base = method.returns.chars().count() + 1 + method.name.chars().count();
    if method.args.trim_start().starts_with('(') {
        base += 1 + (method.args.chars().count() - method.args.trim_start().chars().count());
    }

    let mut spans = Vec::new();
    let mut offset = 0;
    for piece in inner.split(',') {
        let leading = piece.chars().take_while(|c| c.is_whitespace()).count();
        let text = piece.trim();
        if !text.is_empty() {
            let start = base + offset + leading;
            spans.push(ParameterSpan {
                text: text.to_string(),
                start,
                end: start + text.chars().count(),
            });
        }
        offset += piece.chars().count() + 1;
    }
    spans
}

/// Highlight for the parameter the cursor is in, or `None` when the method
/// takes no parameters or the cursor is past the last one.
pub fn highlight_parameter(method: &MethodInfo, typed_inside_function: &str) -> Option<ParameterHighlight> {
    let spans = parameter_spans(method);
    let last = spans.len().checked_sub(1)?;

    let mut index = active_parameter_index(typed_inside_function);
    if index > last {
        // Varargs absorb every further argument.
        if spans[last].text.ends_with("...") {
            index = last;
        } else {
            return None;
        }
    }

    let span = &spans[index];
    Some(ParameterHighlight {
        signature: method.signature(),
        description: method.description.clone(),
        start_offset: span.start,
        end_offset: span.end,
        active_parameter: index,
    })
}

/// Look up `class_name:method_name` and highlight the active parameter.
pub fn highlight_call(
    catalog: &dyn Catalog,
    class_name: &str,
    method_name: &str,
    typed_inside_function: &str,
) -> Option<ParameterHighlight> {
    let method = catalog.method_details(class_name, method_name)?;
    highlight_parameter(&method, typed_inside_function)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_position() -> MethodInfo {
        MethodInfo::new("setPosition", "(number x, number y)", "void")
    }

    #[test]
    fn test_active_index_ignores_nested_and_literal_commas() {
        assert_eq!(active_parameter_index("("), 0);
        assert_eq!(active_parameter_index("(a, "), 1);
        assert_eq!(active_parameter_index("(f(1, 2), \"x,y\", "), 2);
        assert_eq!(active_parameter_index("({1, 2, 3}"), 0);
    }

    #[test]
    fn test_spans() {
        let spans = parameter_spans(&set_position());
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (17, 25));
        assert_eq!((spans[1].start, spans[1].end), (27, 35));
    }

    #[test]
    fn test_highlight_second_parameter() {
        let hl = highlight_parameter(&set_position(), "(10, ").unwrap();
        assert_eq!(hl.active_parameter, 1);
        assert_eq!(hl.highlighted(), "number y");
        assert_eq!(hl.signature, "void setPosition(number x, number y)");
    }

    #[test]
    fn test_no_parameters() {
        let m = MethodInfo::new("getName", "()", "string");
        assert!(highlight_parameter(&m, "(").is_none());
    }

    #[test]
    fn test_past_last_parameter() {
        assert!(highlight_parameter(&set_position(), "(1, 2, ").is_none());
        let m = MethodInfo::new("log", "(string fmt, ...)", "void");
        let hl = highlight_parameter(&m, "(\"%d %d\", 1, 2").unwrap();
        assert_eq!(hl.active_parameter, 1);
        assert_eq!(hl.highlighted(), "...");
    }

    #[test]
    fn test_parenthesised_return_type() {
        let m = MethodInfo::new("getFromId", "(string id)", "(GameObject)");
        let hl = highlight_parameter(&m, "(").unwrap();
        assert_eq!(hl.highlighted(), "string id");
    }
}
