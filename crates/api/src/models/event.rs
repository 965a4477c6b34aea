use super::document::DocumentId;
use serde::{Deserialize, Serialize};

/// Screen position the editor wants a popup anchored at.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

impl Anchor {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MenuKind {
    Class,
    Constant,
    Variable,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    /// Signature for methods, inferred type for variables.
    pub detail: Option<String>,
    pub description: Option<String>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: None,
            description: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if !detail.is_empty() {
            self.detail = Some(detail);
        }
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = Some(description);
        }
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionMenu {
    pub kind: MenuKind,
    pub anchor: Anchor,
    /// Class whose members are listed; `None` for variable menus.
    pub class_name: Option<String>,
    pub items: Vec<CompletionItem>,
}

impl CompletionMenu {
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.label.as_str()).collect()
    }
}

/// Span of the active parameter inside `signature`, in characters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParameterHighlight {
    pub signature: String,
    pub description: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub active_parameter: usize,
}

impl ParameterHighlight {
    pub fn highlighted(&self) -> &str {
        let start = self
            .signature
            .char_indices()
            .nth(self.start_offset)
            .map(|(i, _)| i)
            .unwrap_or(self.signature.len());
        let end = self
            .signature
            .char_indices()
            .nth(self.end_offset)
            .map(|(i, _)| i)
            .unwrap_or(self.signature.len());
        &self.signature[start..end]
    }
}

/// Instructions for the UI thread.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    ShowCompletionMenu(CompletionMenu),
    CloseCompletionMenu,
    HighlightParameter(ParameterHighlight),
    ClearParameterHighlight,
}

/// A UI event tagged with the document and the run that produced it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub document: DocumentId,
    pub generation: u64,
    pub event: UiEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlighted_slice() {
        let hl = ParameterHighlight {
            signature: "void setPosition(number x, number y)".into(),
            description: String::new(),
            start_offset: 27,
            end_offset: 35,
            active_parameter: 1,
        };
        assert_eq!(hl.highlighted(), "number y");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_string(&UiEvent::CloseCompletionMenu).unwrap();
        assert_eq!(json, r#"{"event":"close_completion_menu"}"#);
    }
}
