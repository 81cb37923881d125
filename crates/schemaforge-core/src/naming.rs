//! Identifier and literal helpers for emitted TypeScript.

use std::sync::LazyLock;

use heck::ToUpperCamelCase;
use regex::Regex;
use serde_json::Value;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"));

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Property key as written in a class body or object literal.
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

/// Double-quoted, escaped string literal.
pub fn string_literal(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// JSON values are valid TypeScript expressions as-is.
pub fn json_literal(value: &Value) -> String {
    value.to_string()
}

/// Member name for an enum case value.
///
/// ```
/// use schemaforge_core::naming::enum_member_name;
/// assert_eq!(enum_member_name("in-progress"), "InProgress");
/// assert_eq!(enum_member_name("2fa"), "_2fa");
/// ```
pub fn enum_member_name(case: &str) -> String {
    let name = case.to_upper_camel_case();
    if name.is_empty() {
        return "Empty".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// Lowercase the first character.
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
