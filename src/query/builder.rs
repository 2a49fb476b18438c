//! Conversion of a [`StructuredQuery`] into arXiv API query syntax.

use crate::models::StructuredQuery;

/// Clause emitted when nothing narrows the search
pub const MATCH_ALL: &str = "all:*";

/// Build an arXiv `search_query` string
///
/// One clause per populated field, joined with `AND`:
/// keywords as `(all:"k1" AND all:"k2")`, `ti:`/`au:`/`abs:` phrases, and
/// categories as `(cat:a OR cat:b)`. Date bounds are not encoded: the arXiv
/// API has no date predicate, so callers must post-filter results on their
/// published timestamps.
pub fn build_query_string(query: &StructuredQuery) -> String {
    let mut parts = Vec::new();

    let keywords: Vec<String> = query
        .keywords
        .iter()
        .filter_map(|kw| quoted("all", kw))
        .collect();
    if !keywords.is_empty() {
        parts.push(format!("({})", keywords.join(" AND ")));
    }

    let fields = [
        ("ti", &query.title),
        ("au", &query.author),
        ("abs", &query.r#abstract),
    ];
    for (prefix, value) in fields {
        if let Some(clause) = value.as_deref().and_then(|v| quoted(prefix, v)) {
            parts.push(clause);
        }
    }

    let categories: Vec<String> = query
        .categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| format!("cat:{}", c))
        .collect();
    if !categories.is_empty() {
        parts.push(format!("({})", categories.join(" OR ")));
    }

    if parts.is_empty() {
        MATCH_ALL.to_string()
    } else {
        parts.join(" AND ")
    }
}

/// `prefix:"term"`, with embedded double quotes removed; `None` for blank terms
fn quoted(prefix: &str, term: &str) -> Option<String> {
    let term: String = term.chars().filter(|&c| c != '"').collect();
    let term = term.trim();
    if term.is_empty() {
        None
    } else {
        Some(format!("{}:\"{}\"", prefix, term))
    }
}
