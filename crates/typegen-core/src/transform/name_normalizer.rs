use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use serde_json::Value;

use crate::ir::NormalizedName;

/// Initialisms upper-cased by the `WithInitialisms` naming mode.
const DEFAULT_INITIALISMS: &[&str] = &[
    "Api", "Http", "Https", "Id", "Json", "Sql", "Ssh", "Tls", "Ttl", "Uid", "Ui", "Uri", "Url",
    "Uuid", "Xml", "Yaml",
];

/// How generated identifiers are normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamingMode {
    /// Plain PascalCase.
    #[default]
    Default,
    /// PascalCase with initialisms upper-cased (`MyApi` becomes `MyAPI`).
    /// Extra initialisms extend the built-in list.
    WithInitialisms(Vec<String>),
}

/// Create a `NormalizedName` from an arbitrary string, computing all
/// casing variants.
pub fn normalize_name(name: &str) -> NormalizedName {
    let sanitized = sanitize_identifier(name);

    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        snake_case: sanitized.to_snake_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
    }
}

/// Turn a schema/property name from the document into a type identifier.
pub fn type_name(name: &str, mode: &NamingMode) -> String {
    let pascal = sanitize_identifier(name).to_pascal_case();
    match mode {
        NamingMode::Default => pascal,
        NamingMode::WithInitialisms(extra) => apply_initialisms(&pascal, extra),
    }
}

/// Join a name-hint path into a single PascalCase type name, e.g.
/// `["User", "Address"]` becomes `UserAddress`.
pub fn join_path(path: &[String]) -> String {
    path.iter()
        .map(|seg| sanitize_identifier(seg).to_pascal_case())
        .collect()
}

/// Derive an enum constant identifier from a literal value. String
/// literals go through PascalCase; numbers get an `N` prefix so the
/// identifier stays valid (`200` becomes `N200`, `-1` becomes `NMinus1`).
pub fn enum_constant_name(literal: &Value) -> String {
    match literal {
        Value::String(s) => {
            let pascal = sanitize_identifier(s).to_pascal_case();
            if pascal.is_empty() {
                "Empty".to_string()
            } else {
                pascal
            }
        }
        Value::Number(n) => {
            let spelled = n
                .to_string()
                .replace('-', "Minus")
                .replace('.', "Point");
            format!("N{spelled}")
        }
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "Null".to_string(),
        other => sanitize_identifier(&other.to_string()).to_pascal_case(),
    }
}

fn apply_initialisms(pascal: &str, extra: &[String]) -> String {
    let mut result = pascal.to_string();
    let all = DEFAULT_INITIALISMS
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().map(|s| sanitize_identifier(s).to_pascal_case()));
    for word in all {
        result = replace_word(&result, &word);
    }
    result
}

/// Replace each occurrence of `word` in `pascal` with its upper-case form,
/// but only where it ends at a word boundary (end of string or an
/// upper-case letter follows).
fn replace_word(pascal: &str, word: &str) -> String {
    let mut out = String::with_capacity(pascal.len());
    let chars: Vec<char> = pascal.chars().collect();
    let word_chars: Vec<char> = word.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let end = i + word_chars.len();
        let matches = end <= chars.len()
            && chars[i..end] == word_chars[..]
            && (end == chars.len() || chars[end].is_uppercase() || chars[end].is_ascii_digit());
        if matches {
            out.extend(word.to_uppercase().chars());
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Sanitize a string to be a valid identifier seed.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for (i, ch) in name.chars().enumerate() {
        if ch.is_alphanumeric() {
            if i == 0 && ch.is_ascii_digit() {
                result.push('_');
            }
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    if result.is_empty() {
        return "unnamed".to_string();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simple_name() {
        let n = normalize_name("orderDirection");
        assert_eq!(n.pascal_case, "OrderDirection");
        assert_eq!(n.snake_case, "order_direction");
        assert_eq!(n.screaming_snake, "ORDER_DIRECTION");
    }

    #[test]
    fn kebab_and_special_chars() {
        assert_eq!(type_name("pet-store", &NamingMode::Default), "PetStore");
        assert_eq!(
            type_name("application/json", &NamingMode::Default),
            "ApplicationJson"
        );
    }

    #[test]
    fn path_join() {
        let path = vec!["User".to_string(), "address".to_string()];
        assert_eq!(join_path(&path), "UserAddress");
    }

    #[test]
    fn initialisms() {
        let mode = NamingMode::WithInitialisms(vec![]);
        assert_eq!(type_name("myApi", &mode), "MyAPI");
        assert_eq!(type_name("userId", &mode), "UserID");
        // No boundary match inside a longer word
        assert_eq!(type_name("identifier", &mode), "Identifier");
    }

    #[test]
    fn additional_initialisms() {
        let mode = NamingMode::WithInitialisms(vec!["abc".to_string()]);
        assert_eq!(type_name("myAbc", &mode), "MyABC");
    }

    #[test]
    fn enum_constants() {
        assert_eq!(enum_constant_name(&json!("asc")), "Asc");
        assert_eq!(enum_constant_name(&json!("not-found")), "NotFound");
        assert_eq!(enum_constant_name(&json!(200)), "N200");
        assert_eq!(enum_constant_name(&json!(-1)), "NMinus1");
        assert_eq!(enum_constant_name(&json!(2.5)), "N2Point5");
    }
}
