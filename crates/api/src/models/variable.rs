use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a variable was declared.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Local,
    Global,
    Singleton,
    /// Parameter of a function declaration.
    Function,
}

impl VariableScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableScope::Local => "local",
            VariableScope::Global => "global",
            VariableScope::Singleton => "singleton",
            VariableScope::Function => "function",
        }
    }

    /// Only plain locals and globals are offered by name completion.
    pub fn is_completable(&self) -> bool {
        matches!(self, VariableScope::Local | VariableScope::Global)
    }
}

impl fmt::Display for VariableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type a chain rooted at a variable resolved to at one column of a line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainPosition {
    pub column: usize,
    pub type_name: String,
    /// Result of a bare chain statement. It describes what the chain
    /// evaluated to and never retypes the root variable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub result_only: bool,
}

/// All chain types recorded for one source line, ordered by column.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainTypeEntry {
    pub line: usize,
    pub positions: Vec<ChainPosition>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: String,
    /// Inferred type, empty while unknown.
    #[serde(rename = "type")]
    pub type_name: String,
    /// 1-based line of the first declaration.
    pub declaration_line: usize,
    pub scope: VariableScope,
    pub chain_type_history: Vec<ChainTypeEntry>,
}

impl VariableInfo {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        declaration_line: usize,
        scope: VariableScope,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            declaration_line,
            scope,
            chain_type_history: Vec::new(),
        }
    }

    /// `nil` counts as untyped.
    pub fn has_type(&self) -> bool {
        !self.type_name.is_empty() && self.type_name != "nil"
    }

    /// Record the chain type seen at `line`/`column`, replacing any entry
    /// already recorded for the same spot.
    pub fn record_chain_type(&mut self, line: usize, column: usize, type_name: impl Into<String>) {
        self.upsert_position(
            line,
            ChainPosition {
                column,
                type_name: type_name.into(),
                result_only: false,
            },
        );
    }

    /// Record what a bare chain statement rooted at this variable resolved
    /// to. [`type_at`](Self::type_at) ignores these entries.
    pub fn record_chain_result(&mut self, line: usize, column: usize, type_name: impl Into<String>) {
        self.upsert_position(
            line,
            ChainPosition {
                column,
                type_name: type_name.into(),
                result_only: true,
            },
        );
    }

    fn upsert_position(&mut self, line: usize, position: ChainPosition) {
        let idx = match self
            .chain_type_history
            .binary_search_by_key(&line, |entry| entry.line)
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.chain_type_history.insert(
                    idx,
                    ChainTypeEntry {
                        line,
                        positions: Vec::new(),
                    },
                );
                idx
            }
        };

        let positions = &mut self.chain_type_history[idx].positions;
        match positions.binary_search_by_key(&position.column, |p| p.column) {
            Ok(pos) => positions[pos] = position,
            Err(pos) => positions.insert(pos, position),
        }
    }

    /// Type of this variable when used at `line`/`column`.
    ///
    /// A history entry on the same line whose column is at or before the use
    /// wins (the closest one); otherwise the static type applies. Results of
    /// bare chain statements are skipped.
    pub fn type_at(&self, line: usize, column: usize) -> &str {
        self.chain_type_history
            .iter()
            .find(|entry| entry.line == line)
            .and_then(|entry| {
                entry
                    .positions
                    .iter()
                    .rev()
                    .find(|p| p.column <= column && !p.result_only && !p.type_name.is_empty())
            })
            .map(|p| p.type_name.as_str())
            .unwrap_or(&self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_chain_type_upserts() {
        let mut info = VariableInfo::new("b", "", 1, VariableScope::Local);
        info.record_chain_type(2, 10, "ClassC");
        info.record_chain_type(1, 10, "ClassB");
        info.record_chain_type(1, 10, "ClassB");
        assert_eq!(info.chain_type_history.len(), 2);
        assert_eq!(info.chain_type_history[0].line, 1);
        assert_eq!(info.chain_type_history[0].positions.len(), 1);
    }

    #[test]
    fn test_type_at_prefers_line_history() {
        let mut info = VariableInfo::new("b", "ClassC", 1, VariableScope::Local);
        info.record_chain_type(1, 20, "ClassB");
        assert_eq!(info.type_at(1, 25), "ClassB");
        assert_eq!(info.type_at(1, 5), "ClassC");
        assert_eq!(info.type_at(3, 25), "ClassC");
    }

    #[test]
    fn test_statement_result_does_not_retype_root() {
        let mut info = VariableInfo::new("npc", "GameObject", 1, VariableScope::Local);
        info.record_chain_result(2, 24, "Component");
        assert_eq!(info.type_at(2, 30), "GameObject");
        assert_eq!(info.chain_type_history[0].positions[0].type_name, "Component");

        // An assignment at the same spot takes the entry over.
        info.record_chain_type(2, 24, "PhysicsComponent");
        assert_eq!(info.chain_type_history[0].positions.len(), 1);
        assert_eq!(info.type_at(2, 30), "PhysicsComponent");
    }

    #[test]
    fn test_nil_is_untyped() {
        let info = VariableInfo::new("x", "nil", 1, VariableScope::Global);
        assert!(!info.has_type());
    }
}
