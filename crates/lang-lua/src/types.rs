//! Lua type-name helpers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lua's built-in type names plus `void`, used by the catalog for methods
/// without a return value.
pub const LUA_NATIVE_TYPES: &[&str] = &[
    "nil", "boolean", "number", "string", "function", "userdata", "thread", "table", "void",
];

static CONTAINER_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Table\[([^\[\]]+)\]\[([^\[\]]+)\]$").expect("container type pattern")
});

pub fn is_lua_native_type(type_name: &str) -> bool {
    LUA_NATIVE_TYPES.contains(&type_name.trim())
}

/// A type chains can continue from: non-empty and not a Lua native.
pub fn is_class_type(type_name: &str) -> bool {
    let t = type_name.trim();
    !t.is_empty() && !is_lua_native_type(t)
}

/// Key and value types of a `Table[K][V]` container name.
pub fn container_types(type_name: &str) -> Option<(&str, &str)> {
    let caps = CONTAINER_TYPE.captures(type_name.trim())?;
    Some((caps.get(1)?.as_str().trim(), caps.get(2)?.as_str().trim()))
}

/// Value type of a container, if it is a class that chains can continue from.
pub fn container_element_type(type_name: &str) -> Option<&str> {
    container_types(type_name)
        .map(|(_, value)| value)
        .filter(|value| is_class_type(value))
}
