//! Helpers for hierarchical facet values of the form `level/segment/.../`.
//!
//! `0/Book/` is a top-level value, `1/Book/eBook/` its child.

use once_cell::sync::Lazy;
use regex::Regex;

static HIERARCHICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+/.+/$").expect("hierarchical value pattern"));

pub fn is_hierarchical(value: &str) -> bool {
    HIERARCHICAL.is_match(value)
}

/// Wrap a flat value as a top-level hierarchical one unless it already is one.
pub fn to_hierarchical(value: &str) -> String {
    if is_hierarchical(value) {
        value.to_string()
    } else {
        format!("0/{value}/")
    }
}

fn segments(value: &str) -> Option<(usize, Vec<&str>)> {
    if !is_hierarchical(value) {
        return None;
    }
    let (level, rest) = value.split_once('/')?;
    let level = level.parse().ok()?;
    let path = rest.strip_suffix('/')?;
    Some((level, path.split('/').collect()))
}

/// Strict ancestors of `value`, nearest last: `2/A/B/C/` yields `0/A/`, `1/A/B/`.
pub fn ancestors(value: &str) -> Vec<String> {
    let Some((level, parts)) = segments(value) else {
        return Vec::new();
    };
    let depth = level.min(parts.len().saturating_sub(1));
    (0..depth)
        .map(|l| format!("{}/{}/", l, parts[..=l].join("/")))
        .collect()
}

/// Candidates below `prefix` in the hierarchy, i.e. the lower-level values a
/// filter on `prefix` should also match.
pub fn descendants_of<'a>(
    prefix: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    let Some((level, parts)) = segments(prefix) else {
        return Vec::new();
    };
    candidates
        .into_iter()
        .filter(|candidate| match segments(candidate) {
            Some((l, p)) => l > level && p.len() > parts.len() && p[..parts.len()] == parts[..],
            None => false,
        })
        .collect()
}
