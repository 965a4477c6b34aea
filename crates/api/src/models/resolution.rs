use serde::{Deserialize, Serialize};

/// The call whose argument list holds the cursor.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSite {
    /// Class declaring the method.
    pub class_name: String,
    pub method_name: String,
}

/// Outcome of resolving the expression touching the cursor.
///
/// An unresolved chain is a normal outcome: whatever could not be matched
/// ends up in `rest_typed`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    /// Type reached at the end of the chain walk.
    pub matched_class_name: String,
    /// Last method (or constant) name matched in the catalog.
    pub matched_method_name: String,
    /// Class that declares `matched_method_name`.
    pub method_owner: String,
    /// Class the member fragment under the cursor is completed against.
    pub receiver_class: String,
    /// Member text typed after the last `:`/`.`, empty right after the delimiter.
    pub fragment: String,
    /// Trailing identifier that matched nothing.
    pub rest_typed: String,
    /// Argument text from the open parenthesis of `call_site` up to the cursor.
    pub typed_inside_function: String,
    pub for_constant: bool,
    /// True when `rest_typed` is a bare name (no member access), i.e. a
    /// candidate for variable/singleton completion.
    pub for_variable: bool,
    pub call_site: Option<CallSite>,
    /// 1-based line holding the cursor.
    pub line: usize,
    /// Whether the enclosing call chain was resolved in this pass.
    pub evaluate_outer: bool,
}

impl ResolutionResult {
    /// A member menu can be offered against `receiver_class`.
    pub fn has_receiver(&self) -> bool {
        !self.receiver_class.is_empty()
    }

    /// `rest_typed` is long enough to drive name completion.
    pub fn qualifies_for_name_completion(&self, min_len: usize) -> bool {
        self.for_variable && self.rest_typed.chars().count() > min_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_completion_gate() {
        let mut res = ResolutionResult {
            rest_typed: "np".into(),
            for_variable: true,
            ..Default::default()
        };
        assert!(!res.qualifies_for_name_completion(2));
        res.rest_typed = "npc".into();
        assert!(res.qualifies_for_name_completion(2));
        res.for_variable = false;
        assert!(!res.qualifies_for_name_completion(2));
    }
}
