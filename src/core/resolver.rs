// src/core/resolver.rs

//! Case-insensitive lookup of operator-typed labels against configuration keys.
//!
//! Exact matches always win. Otherwise labels are compared after lowercasing,
//! and when several keys fold to the same lowercase form the one declared first
//! is used. A label with no match is returned untouched so that the caller's
//! own lookup misses and the entry is skipped.

use indexmap::IndexMap;

/// Resolves `label` to the canonical key it refers to, or returns it unchanged.
pub fn resolve_key<'k, I>(label: &str, canonical_keys: I) -> String
where
    I: IntoIterator<Item = &'k str>,
{
    let mut folded_match: Option<&'k str> = None;
    let lowered = label.to_lowercase();

    for key in canonical_keys {
        if key == label {
            return key.to_string();
        }
        if folded_match.is_none() && key.to_lowercase() == lowered {
            folded_match = Some(key);
        }
    }

    folded_match.unwrap_or(label).to_string()
}

/// Looks a label up in a map using the same policy as [`resolve_key`],
/// returning the canonical key together with its value.
pub fn lookup<'m, V>(label: &str, map: &'m IndexMap<String, V>) -> Option<(&'m str, &'m V)> {
    let resolved = resolve_key(label, map.keys().map(String::as_str));
    map.get_key_value(resolved.as_str())
        .map(|(key, value)| (key.as_str(), value))
}
