//! URL query parsing into per-module namespaces.
//!
//! Keys follow the `<moduleName>-<moduleKey>=<value>` convention; tokens are
//! joined by `&` or `?`. Malformed tokens are dropped, never fatal.

use std::collections::BTreeMap;

use shared::query::{decode_query_value, encode_query_value, QueryValue};

pub type ModuleQuery = BTreeMap<String, QueryValue>;
pub type QueryMap = BTreeMap<String, ModuleQuery>;

pub fn parse_query(search: &str) -> QueryMap {
    let mut out = QueryMap::new();
    for token in search.split(['&', '?']) {
        let Some((key, raw)) = token.split_once('=') else {
            continue;
        };
        let mut segments = key.split('-');
        let module = match segments.next() {
            Some(module) if !module.is_empty() => module,
            _ => continue,
        };
        let module_key = segments.collect::<Vec<_>>().join("-");
        if module_key.is_empty() {
            continue;
        }
        out.entry(module.to_string())
            .or_default()
            .insert(module_key, decode_query_value(raw));
    }
    out
}

/// Inverse of [`parse_query`]; token order is deterministic (sorted by module
/// then key).
pub fn build_search(query: &QueryMap) -> String {
    let mut parts = Vec::new();
    for (module, entries) in query {
        for (key, value) in entries {
            parts.push(format!("{module}-{key}={}", encode_query_value(value)));
        }
    }
    parts.join("&")
}

/// Produce the search string for a navigation that patches one module's keys
/// while leaving every other module's namespace untouched. Used for
/// pagination links.
pub fn extend_search(module: &str, current: &QueryMap, patch: ModuleQuery) -> String {
    let mut next = current.clone();
    let entries = next.entry(module.to_string()).or_default();
    for (key, value) in patch {
        entries.insert(key, value);
    }
    let search = build_search(&next);
    if search.is_empty() {
        search
    } else {
        format!("?{search}")
    }
}
