// src/core/interpolator.rs

use crate::{constants::INPUT_PLACEHOLDER_PATTERN, models::InputDef};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

lazy_static! {
    // Matches `${{ input.<name> }}` and captures `<name>`.
    static ref INPUT_PLACEHOLDER_RE: Regex =
        Regex::new(INPUT_PLACEHOLDER_PATTERN).expect("input placeholder pattern is valid");
}

/// Replaces every `${{ input.<name> }}` token in `template`.
///
/// Precedence for each token:
/// 1. the operator's value, if the key is present in `input_values` (an empty string counts);
/// 2. the input's declared default, if it is not empty;
/// 3. otherwise the token is left exactly as written.
pub fn substitute(
    template: &str,
    input_values: &HashMap<String, String>,
    input_defs: &IndexMap<String, InputDef>,
) -> String {
    INPUT_PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let full_match = caps.get(0).map_or("", |m| m.as_str());
            let name = caps.get(1).map_or("", |m| m.as_str());

            if let Some(value) = input_values.get(name) {
                return value.clone();
            }
            match input_defs.get(name) {
                Some(def) if !def.default.is_empty() => def.default.clone(),
                _ => full_match.to_string(),
            }
        })
        .into_owned()
}

/// Substitutes a parameter value. Only strings carry placeholders; every other
/// value (numbers, booleans, nested structures) is returned as is.
pub fn substitute_value(
    value: &Value,
    input_values: &HashMap<String, String>,
    input_defs: &IndexMap<String, InputDef>,
) -> Value {
    match value {
        Value::String(s) => Value::String(substitute(s, input_values, input_defs)),
        other => other.clone(),
    }
}

/// Returns the input names referenced by `template`, in order of appearance.
pub fn input_names(template: &str) -> Vec<&str> {
    INPUT_PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Reports whether `template` contains at least one input placeholder.
pub fn has_placeholder(template: &str) -> bool {
    INPUT_PLACEHOLDER_RE.is_match(template)
}
