//! Read-only API catalog abstraction.
//!
//! The resolver never owns class metadata; it queries a [`Catalog`] that is
//! injected by the caller. [`MemoryCatalog`] is the stock implementation,
//! deserialised from JSON or built fluently in tests.

use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Inheritance chains deeper than this are treated as cycles.
const MAX_ANCESTOR_DEPTH: usize = 32;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MethodInfo {
    pub name: String,
    /// Parenthesised parameter list, e.g. `"(number x, number y)"`.
    pub args: String,
    pub returns: String,
    pub description: String,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, args: impl Into<String>, returns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
            returns: returns.into(),
            description: String::new(),
        }
    }

    /// Declared return type with any surrounding parentheses removed.
    pub fn return_type(&self) -> String {
        self.returns
            .chars()
            .filter(|c| *c != '(' && *c != ')')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// `returns name(args)`, the text shown in signature help.
    pub fn signature(&self) -> String {
        format!("{} {}{}", self.returns, self.name, self.args)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConstantInfo {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    /// Globally reachable without a declaring variable.
    Singleton,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ClassEntry {
    pub kind: ClassKind,
    pub inherits: Option<String>,
    pub description: String,
    pub methods: Vec<MethodInfo>,
    pub constants: Vec<ConstantInfo>,
}

/// Class/method/constant metadata consumed by the resolver.
///
/// Implementations are synchronous and read-only.
pub trait Catalog: Send + Sync {
    /// All methods callable on `class_name`, inherited ones included.
    fn methods_for_class(&self, class_name: &str) -> Vec<MethodInfo>;

    /// All constants reachable through `class_name`, inherited ones included.
    fn constants_for_class(&self, class_name: &str) -> Vec<ConstantInfo>;

    /// Whether `name` is a known class or singleton.
    fn is_valid_class_name(&self, name: &str) -> bool;

    /// Names of all entries typed "singleton".
    fn singletons(&self) -> Vec<String>;

    /// Details of one method, `None` if the class or method is unknown.
    fn method_details(&self, class_name: &str, method_name: &str) -> Option<MethodInfo> {
        self.methods_for_class(class_name)
            .into_iter()
            .find(|m| m.name == method_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct MemoryCatalog {
    classes: HashMap<String, ClassEntry>,
}

impl MemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> ApiResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    /// Add a class to the catalog.
    pub fn with_class(mut self, name: &str) -> Self {
        self.classes.entry(name.to_string()).or_default();
        self
    }

    /// Add a singleton to the catalog.
    pub fn with_singleton(mut self, name: &str) -> Self {
        self.classes.entry(name.to_string()).or_default().kind = ClassKind::Singleton;
        self
    }

    /// Declare `base` as the superclass of `class_name`.
    pub fn inherits(mut self, class_name: &str, base: &str) -> Self {
        self.classes.entry(class_name.to_string()).or_default().inherits = Some(base.to_string());
        self
    }

    /// Add a method to a class.
    pub fn with_method(self, class_name: &str, name: &str, args: &str, returns: &str) -> Self {
        self.with_documented_method(class_name, name, args, returns, "")
    }

    /// Add a method with a description to a class.
    pub fn with_documented_method(
        mut self,
        class_name: &str,
        name: &str,
        args: &str,
        returns: &str,
        description: &str,
    ) -> Self {
        let mut method = MethodInfo::new(name, args, returns);
        method.description = description.to_string();
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .methods
            .push(method);
        self
    }

    /// Add a constant to a class.
    pub fn with_constant(mut self, class_name: &str, name: &str) -> Self {
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .constants
            .push(ConstantInfo {
                name: name.to_string(),
            });
        self
    }

    /// `class_name` followed by its ancestors, nearest first.
    fn lineage<'a>(&'a self, class_name: &'a str) -> Vec<&'a ClassEntry> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(class_name);

        while let Some(name) = current {
            if out.len() >= MAX_ANCESTOR_DEPTH || !visited.insert(name) {
                break;
            }
            let Some(entry) = self.classes.get(name) else {
                break;
            };
            out.push(entry);
            current = entry.inherits.as_deref();
        }

        out
    }
}

impl Catalog for MemoryCatalog {
    fn methods_for_class(&self, class_name: &str) -> Vec<MethodInfo> {
        let mut seen = HashSet::new();
        let mut methods = Vec::new();
        for entry in self.lineage(class_name) {
            for method in &entry.methods {
                // Overrides shadow the inherited declaration.
                if seen.insert(method.name.as_str()) {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    fn constants_for_class(&self, class_name: &str) -> Vec<ConstantInfo> {
        let mut seen = HashSet::new();
        let mut constants = Vec::new();
        for entry in self.lineage(class_name) {
            for constant in &entry.constants {
                if seen.insert(constant.name.as_str()) {
                    constants.push(constant.clone());
                }
            }
        }
        constants
    }

    fn is_valid_class_name(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    fn singletons(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .iter()
            .filter(|(_, entry)| entry.kind == ClassKind::Singleton)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
