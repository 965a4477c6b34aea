use super::event::Anchor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One resolution request from the editing thread.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// The editor saw a `.` and wants constants.
    pub for_constant: bool,
    /// The editor wants parameter highlighting instead of a menu.
    pub for_function_parameters: bool,
    pub text: Arc<str>,
    /// Member text typed since the last `:`/`.` keystroke.
    pub text_after_keyword: String,
    /// Byte offset into `text`.
    pub cursor_offset: usize,
    pub anchor: Anchor,
}

impl CompletionRequest {
    pub fn new(text: impl Into<Arc<str>>, cursor_offset: usize) -> Self {
        Self {
            for_constant: false,
            for_function_parameters: false,
            text: text.into(),
            text_after_keyword: String::new(),
            cursor_offset,
            anchor: Anchor::default(),
        }
    }

    /// Request with the cursor at the end of `text`.
    pub fn at_end(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self::new(text, cursor)
    }

    pub fn with_constant(mut self, for_constant: bool) -> Self {
        self.for_constant = for_constant;
        self
    }

    pub fn with_function_parameters(mut self, enabled: bool) -> Self {
        self.for_function_parameters = enabled;
        self
    }

    pub fn with_text_after_keyword(mut self, typed: impl Into<String>) -> Self {
        self.text_after_keyword = typed.into();
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}
