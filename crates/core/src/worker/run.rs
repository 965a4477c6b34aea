//! One resolution run: rebuild (maybe), resolve, decide, emit.

use super::WorkerContext;
use super::session::{RunTicket, SessionState, TableSnapshot};
use crate::config::CompletionConfig;
use crate::error::{LuasenseError, Result};
use luasense_api::Catalog;
use luasense_api::models::{
    CompletionMenu, CompletionRequest, MenuKind, Notification, ResolutionResult, UiEvent,
};
use luasense_lua::matching::{has_members, match_members, match_names};
use luasense_lua::params::highlight_call;
use luasense_lua::{ResolveError, Resolver, VariableTable, VariableTableBuilder};
use std::sync::Arc;
use tracing::debug;

pub(crate) async fn execute(state: &SessionState, ctx: &WorkerContext, ticket: RunTicket) {
    if ticket.token.is_cancelled() {
        return;
    }

    let table = match ensure_table(state, ctx, &ticket).await {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Variable table rebuild failed for {}: {}", state.document, e);
            return;
        }
    };

    // Yield point: after the variable table step.
    tokio::task::yield_now().await;
    if ticket.token.is_cancelled() {
        debug!(document = %state.document, generation = ticket.generation, "run superseded after rebuild");
        return;
    }

    let request = &ticket.request;
    let outcome = Resolver::new(ctx.catalog.as_ref())
        .with_min_rest_typed_len(ctx.config.min_rest_typed_len)
        .resolve(&request.text, request.cursor_offset, &table);

    // Yield point: after the chain walk.
    tokio::task::yield_now().await;
    if ticket.token.is_cancelled() {
        debug!(document = %state.document, generation = ticket.generation, "run superseded after resolution");
        return;
    }

    let events = match outcome {
        Ok(res) => {
            debug!(
                document = %state.document,
                generation = ticket.generation,
                class = %res.matched_class_name,
                method = %res.matched_method_name,
                rest = %res.rest_typed,
                "resolved"
            );
            plan_events(request, &res, &table, ctx.catalog.as_ref(), &ctx.config)
        }
        Err(e) => {
            log_unresolvable(&e);
            vec![UiEvent::CloseCompletionMenu]
        }
    };

    emit(state, ctx, &ticket, events);
}

fn log_unresolvable(err: &ResolveError) {
    match err {
        ResolveError::InsideComment => debug!("cursor inside a comment"),
        ResolveError::InsideLongString => debug!("cursor inside a long string"),
        other => debug!("request aborted: {}", other),
    }
}

/// Returns the table to resolve against, rebuilding it when the policy
/// asks for one.
async fn ensure_table(
    state: &SessionState,
    ctx: &WorkerContext,
    ticket: &RunTicket,
) -> Result<Arc<VariableTable>> {
    let text = ticket.request.text.clone();
    let line_count = text.lines().count();

    let existing = state.table.read().await.clone();
    if let Some(snapshot) = existing
        && !needs_rebuild(&ctx.config, ticket, &snapshot, line_count)
    {
        return Ok(snapshot.table);
    }

    let catalog = ctx.catalog.clone();
    let table = tokio::task::spawn_blocking(move || {
        let (table, stats) = VariableTableBuilder::new(catalog.as_ref()).build_with_stats(&text);
        debug!(
            variables = table.len(),
            passes = stats.inference_passes,
            untyped = stats.untyped_remaining,
            "variable table rebuilt"
        );
        table
    })
    .await
    .map_err(|e| LuasenseError::Internal(e.to_string()))?;

    let table = Arc::new(table);
    {
        let mut lock = state.table.write().await;
        *lock = Some(TableSnapshot {
            table: table.clone(),
            line_count,
        });
    }
    Ok(table)
}

fn needs_rebuild(
    config: &CompletionConfig,
    ticket: &RunTicket,
    snapshot: &TableSnapshot,
    line_count: usize,
) -> bool {
    let cursor = ticket.request.cursor_offset;
    let teleported = match ticket.previous_cursor {
        Some(previous) => cursor.abs_diff(previous) > config.teleport_distance,
        None => true,
    };
    teleported || (config.rebuild_on_line_change && snapshot.line_count != line_count)
}

/// Sends `events` unless the run has been superseded. The check and the
/// sends happen under the gate so a newer request cannot slip in between.
fn emit(state: &SessionState, ctx: &WorkerContext, ticket: &RunTicket, events: Vec<UiEvent>) {
    let gate = state.lock_gate();
    if gate.generation != ticket.generation || ticket.token.is_cancelled() {
        debug!(document = %state.document, generation = ticket.generation, "dropping stale outcome");
        return;
    }
    for event in events {
        let notification = Notification {
            document: state.document.clone(),
            generation: ticket.generation,
            event,
        };
        if ctx.events.send(notification).is_err() {
            debug!("notification receiver dropped");
            break;
        }
    }
}

/// Menu text the editor tracked since the last `:`/`.` keystroke, with
/// call punctuation and whitespace removed.
fn member_filter<'a>(request: &CompletionRequest, res: &'a ResolutionResult) -> std::borrow::Cow<'a, str> {
    let cleaned: String = request
        .text_after_keyword
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | ':' | '.') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        std::borrow::Cow::Borrowed(res.fragment.as_str())
    } else {
        std::borrow::Cow::Owned(cleaned)
    }
}

/// Turns a resolution into UI events.
pub(crate) fn plan_events(
    request: &CompletionRequest,
    res: &ResolutionResult,
    table: &VariableTable,
    catalog: &dyn Catalog,
    config: &CompletionConfig,
) -> Vec<UiEvent> {
    if request.for_function_parameters {
        let highlight = res.call_site.as_ref().and_then(|call| {
            highlight_call(
                catalog,
                &call.class_name,
                &call.method_name,
                &res.typed_inside_function,
            )
        });
        return match highlight {
            Some(hl) => vec![UiEvent::CloseCompletionMenu, UiEvent::HighlightParameter(hl)],
            None => vec![UiEvent::ClearParameterHighlight, UiEvent::CloseCompletionMenu],
        };
    }

    if res.has_receiver() && has_members(catalog, &res.receiver_class) {
        let for_constant = request.for_constant || res.for_constant;
        let filter = member_filter(request, res);
        let items = match_members(
            catalog,
            &res.receiver_class,
            &filter,
            for_constant,
            config.max_candidates,
        );
        if items.is_empty() {
            return vec![UiEvent::CloseCompletionMenu];
        }
        return vec![UiEvent::ShowCompletionMenu(CompletionMenu {
            kind: if for_constant {
                MenuKind::Constant
            } else {
                MenuKind::Class
            },
            anchor: request.anchor,
            class_name: Some(res.receiver_class.clone()),
            items,
        })];
    }

    if res.qualifies_for_name_completion(config.min_rest_typed_len) {
        let items = match_names(table, catalog, &res.rest_typed, config.max_candidates);
        if !items.is_empty() {
            return vec![UiEvent::ShowCompletionMenu(CompletionMenu {
                kind: MenuKind::Variable,
                anchor: request.anchor,
                class_name: None,
                items,
            })];
        }
    }

    vec![UiEvent::CloseCompletionMenu]
}

#[cfg(test)]
mod tests {
    use super::*;
    use luasense_api::MemoryCatalog;
    use luasense_api::models::Anchor;
    use luasense_lua::resolve;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_singleton("AppStateManager")
            .with_method("AppStateManager", "getPlayer", "()", "Player")
            .with_method("Player", "getName", "()", "string")
            .with_method("Player", "getHealth", "()", "number")
            .with_method("Player", "setHealth", "(number hp)", "void")
            .with_constant("Color", "RED")
            .with_constant("Color", "GREEN")
    }

    fn plan(catalog: &MemoryCatalog, request: CompletionRequest) -> Vec<UiEvent> {
        let table = VariableTableBuilder::new(catalog).build(&request.text);
        let res = resolve(&request.text, request.cursor_offset, &table, catalog).unwrap();
        plan_events(&request, &res, &table, catalog, &CompletionConfig::default())
    }

    fn menu(events: &[UiEvent]) -> &CompletionMenu {
        match events {
            [UiEvent::ShowCompletionMenu(menu)] => menu,
            other => panic!("expected a single menu, got {other:?}"),
        }
    }

    #[test]
    fn test_class_menu_with_anchor() {
        let catalog = catalog();
        let request = CompletionRequest::at_end("local p = AppStateManager:getPlayer()\np:get")
            .with_anchor(Anchor::new(10, 20));
        let events = plan(&catalog, request);
        let menu = menu(&events);
        assert_eq!(menu.kind, MenuKind::Class);
        assert_eq!(menu.anchor, Anchor::new(10, 20));
        assert_eq!(menu.class_name.as_deref(), Some("Player"));
        assert_eq!(menu.labels(), vec!["getName", "getHealth"]);
    }

    #[test]
    fn test_text_after_keyword_overrides_fragment() {
        let catalog = catalog();
        let request = CompletionRequest::at_end("local p = AppStateManager:getPlayer()\np:")
            .with_text_after_keyword("setH(");
        let events = plan(&catalog, request);
        assert_eq!(menu(&events).labels(), vec!["setHealth"]);
    }

    #[test]
    fn test_constant_menu() {
        let catalog = catalog();
        let events = plan(&catalog, CompletionRequest::at_end("x = Color.").with_constant(true));
        let menu = menu(&events);
        assert_eq!(menu.kind, MenuKind::Constant);
        assert_eq!(menu.labels(), vec!["RED", "GREEN"]);
    }

    #[test]
    fn test_empty_filter_result_closes() {
        let catalog = catalog();
        let events = plan(&catalog, CompletionRequest::at_end("local p = AppStateManager:getPlayer()\np:zzz"));
        assert_eq!(events, vec![UiEvent::CloseCompletionMenu]);
    }

    #[test]
    fn test_variable_menu() {
        let catalog = catalog();
        let events = plan(&catalog, CompletionRequest::at_end("local health = 1\nhea"));
        let menu = menu(&events);
        assert_eq!(menu.kind, MenuKind::Variable);
        assert_eq!(menu.class_name, None);
        assert_eq!(menu.labels(), vec!["health"]);
    }

    #[test]
    fn test_short_fragment_closes() {
        let catalog = catalog();
        let events = plan(&catalog, CompletionRequest::at_end("local health = 1\nhe"));
        assert_eq!(events, vec![UiEvent::CloseCompletionMenu]);
    }

    #[test]
    fn test_parameter_highlight_events() {
        let catalog = catalog();
        let request = CompletionRequest::at_end("local p = AppStateManager:getPlayer()\np:setHealth(")
            .with_function_parameters(true);
        let events = plan(&catalog, request);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], UiEvent::CloseCompletionMenu);
        match &events[1] {
            UiEvent::HighlightParameter(hl) => assert_eq!(hl.highlighted(), "number hp"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_nothing_to_highlight() {
        let catalog = catalog();
        let request = CompletionRequest::at_end("local p = AppStateManager:getPlayer()\np:getName(")
            .with_function_parameters(true);
        assert_eq!(
            plan(&catalog, request),
            vec![UiEvent::ClearParameterHighlight, UiEvent::CloseCompletionMenu]
        );
    }

    #[test]
    fn test_teleport_policy() {
        let config = CompletionConfig::default();
        let snapshot = TableSnapshot {
            table: Arc::new(VariableTable::new()),
            line_count: 1,
        };
        let ticket = |cursor, previous| RunTicket::detached(1, CompletionRequest::new("abcdef", cursor), previous);

        assert!(!needs_rebuild(&config, &ticket(3, Some(2)), &snapshot, 1));
        assert!(!needs_rebuild(&config, &ticket(2, Some(3)), &snapshot, 1));
        assert!(needs_rebuild(&config, &ticket(5, Some(2)), &snapshot, 1));
        assert!(needs_rebuild(&config, &ticket(5, None), &snapshot, 1));

        // Line count changes only matter when enabled.
        assert!(!needs_rebuild(&config, &ticket(3, Some(2)), &snapshot, 2));
        let eager = CompletionConfig {
            rebuild_on_line_change: true,
            ..CompletionConfig::default()
        };
        assert!(needs_rebuild(&eager, &ticket(3, Some(2)), &snapshot, 2));
    }
}
