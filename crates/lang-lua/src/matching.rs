//! Candidate lists for completion menus.

use crate::symbols::VariableTable;
use luasense_api::Catalog;
use luasense_api::models::CompletionItem;

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Locals and globals whose name starts with `prefix`, sorted by name.
pub fn match_variables(table: &VariableTable, prefix: &str, limit: usize) -> Vec<CompletionItem> {
    table
        .sorted()
        .into_iter()
        .filter(|v| v.scope.is_completable() && v.name.starts_with(prefix))
        .take(limit)
        .map(|v| CompletionItem::new(v.name.as_str()).with_detail(v.type_name.as_str()))
        .collect()
}

/// Catalog singletons whose name starts with `prefix`, sorted by name.
pub fn match_singletons(catalog: &dyn Catalog, prefix: &str, limit: usize) -> Vec<CompletionItem> {
    let mut names = catalog.singletons();
    names.sort();
    names
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .take(limit)
        .map(CompletionItem::new)
        .collect()
}

/// Name completion for an unresolved bare identifier. A leading uppercase
/// letter means the user is typing a singleton.
pub fn match_names(
    table: &VariableTable,
    catalog: &dyn Catalog,
    rest_typed: &str,
    limit: usize,
) -> Vec<CompletionItem> {
    if rest_typed.starts_with(|c: char| c.is_uppercase()) {
        match_singletons(catalog, rest_typed, limit)
    } else {
        match_variables(table, rest_typed, limit)
    }
}

/// Methods of `class_name` (or constants, if `for_constant`) matching
/// `prefix` case-insensitively, in catalog order.
pub fn match_members(
    catalog: &dyn Catalog,
    class_name: &str,
    prefix: &str,
    for_constant: bool,
    limit: usize,
) -> Vec<CompletionItem> {
    if for_constant {
        catalog
            .constants_for_class(class_name)
            .into_iter()
            .filter(|c| starts_with_ignore_case(&c.name, prefix))
            .take(limit)
            .map(|c| CompletionItem::new(c.name))
            .collect()
    } else {
        catalog
            .methods_for_class(class_name)
            .into_iter()
            .filter(|m| starts_with_ignore_case(&m.name, prefix))
            .take(limit)
            .map(|m| {
                let signature = m.signature();
                CompletionItem::new(m.name)
                    .with_detail(signature)
                    .with_description(m.description)
            })
            .collect()
    }
}

/// Whether `class_name` has any members at all.
pub fn has_members(catalog: &dyn Catalog, class_name: &str) -> bool {
    !class_name.is_empty()
        && (!catalog.methods_for_class(class_name).is_empty()
            || !catalog.constants_for_class(class_name).is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use luasense_api::MemoryCatalog;
    use luasense_api::models::{VariableInfo, VariableScope};

    fn table() -> VariableTable {
        [
            VariableInfo::new("playerCount", "", 1, VariableScope::Local),
            VariableInfo::new("playerName", "", 2, VariableScope::Global),
            VariableInfo::new("player", "", 3, VariableScope::Function),
            VariableInfo::new("other", "", 4, VariableScope::Local),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_variables_exclude_parameters() {
        let items = match_variables(&table(), "play", 10);
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["playerCount", "playerName"]);
    }

    #[test]
    fn test_uppercase_prefix_matches_singletons() {
        let catalog = MemoryCatalog::new()
            .with_singleton("AppStateManager")
            .with_singleton("AudioManager")
            .with_class("Apple");
        let items = match_names(&table(), &catalog, "App", 10);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "AppStateManager");
    }

    #[test]
    fn test_members_filter_case_insensitively() {
        let catalog = MemoryCatalog::new()
            .with_method("GameObject", "getName", "()", "string")
            .with_method("GameObject", "setPosition", "(number x, number y)", "void");
        let items = match_members(&catalog, "GameObject", "GETn", false, 10);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].detail.as_deref(), Some("string getName()"));
        assert!(has_members(&catalog, "GameObject"));
        assert!(!has_members(&catalog, ""));
    }

    #[test]
    fn test_limit() {
        let items = match_variables(&table(), "", 1);
        assert_eq!(items.len(), 1);
    }
}
