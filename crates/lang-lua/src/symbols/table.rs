//! Variable table for a single document.

use luasense_api::models::{VariableInfo, VariableScope};
use serde::Serialize;
use std::collections::HashMap;

/// Maps variable names to what is known about them.
///
/// Names are unique per document; scoping is flattened the way the editor
/// flattens it: a later `local x` updates the existing `x` entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct VariableTable {
    variables: HashMap<String, VariableInfo>,
}

impl VariableTable {
    /// Create a new empty variable table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VariableInfo> {
        self.variables.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Insert `info` unless a variable with that name is already known.
    /// Returns whether the entry was added.
    pub fn declare(&mut self, info: VariableInfo) -> bool {
        if self.variables.contains_key(&info.name) {
            return false;
        }
        self.variables.insert(info.name.clone(), info);
        true
    }

    /// Set the type of `name` if it exists. Empty types are ignored.
    pub fn assign_type(&mut self, name: &str, type_name: &str) -> bool {
        if type_name.is_empty() {
            return false;
        }
        match self.variables.get_mut(name) {
            Some(info) => {
                info.type_name = type_name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableInfo> {
        self.variables.values()
    }

    /// Variables sorted by name.
    pub fn sorted(&self) -> Vec<&VariableInfo> {
        let mut vars: Vec<_> = self.variables.values().collect();
        vars.sort_by(|a, b| a.name.cmp(&b.name));
        vars
    }

    /// Number of non-parameter variables whose type is still unknown.
    pub fn untyped_count(&self) -> usize {
        self.variables
            .values()
            .filter(|v| v.scope != VariableScope::Function && !v.has_type())
            .count()
    }
}

impl FromIterator<VariableInfo> for VariableTable {
    fn from_iter<T: IntoIterator<Item = VariableInfo>>(iter: T) -> Self {
        let mut table = VariableTable::new();
        for info in iter {
            table.variables.insert(info.name.clone(), info);
        }
        table
    }
}
