//! Gin-style route patterns (`/items/:id`, `/files/*path`).

use crate::request::ParamVec;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static PARAM_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[:*]([^/]+)").ok());

/// Convert a gin path (`/users/:id`) to OpenAPI form (`/users/{id}`).
pub fn to_openapi_path(pattern: &str) -> String {
    match PARAM_RE.as_ref() {
        Some(re) => re.replace_all(pattern, "{$1}").into_owned(),
        None => pattern.to_string(),
    }
}

/// Match a concrete path against a pattern, returning the bound parameters.
///
/// `:name` binds one segment, `*name` binds the remainder of the path.
pub fn match_path(pattern: &str, path: &str) -> Option<ParamVec> {
    let mut params = ParamVec::new();
    let mut pattern_segments = pattern.trim_matches('/').split('/');
    let mut path_segments = path.trim_matches('/').split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(p), rest) if p.starts_with('*') => {
                let mut tail: Vec<&str> = rest.into_iter().collect();
                tail.extend(path_segments);
                params.push((Arc::from(&p[1..]), tail.join("/")));
                return Some(params);
            }
            (Some(p), Some(s)) if p.starts_with(':') => {
                if s.is_empty() {
                    return None;
                }
                params.push((Arc::from(&p[1..]), s.to_string()));
            }
            (Some(p), Some(s)) if p == s => {}
            _ => return None,
        }
    }
}
