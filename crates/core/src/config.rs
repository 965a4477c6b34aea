//! Service configuration, read from a JSON file.
//!
//! Every field has a default, so `{}` is a valid configuration and a
//! partially written file only overrides what it names.

use crate::error::{LuasenseError, Result};
use luasense_lua::DEFAULT_MIN_REST_TYPED_LEN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CompletionConfig {
    /// An unresolved fragment must be strictly longer than this to trigger
    /// variable or singleton completion.
    pub min_rest_typed_len: usize,
    /// Cursor moves larger than this force a variable table rebuild.
    pub teleport_distance: usize,
    /// Also rebuild when the buffer's line count changed since the last build.
    pub rebuild_on_line_change: bool,
    /// Cap on items in one menu.
    pub max_candidates: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            min_rest_typed_len: DEFAULT_MIN_REST_TYPED_LEN,
            teleport_distance: 1,
            rebuild_on_line_change: false,
            max_candidates: 200,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    pub catalog_path: Option<PathBuf>,
    pub completion: CompletionConfig,
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
            .map_err(|e| LuasenseError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.completion.max_candidates == 0 {
            return Err(LuasenseError::Config(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }
}
