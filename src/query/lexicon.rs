//! Static mapping from domain phrases to arXiv category codes.

/// Phrase → category codes, in lookup order
///
/// Phrases are lowercase; matching is substring containment against the
/// lowercased query, so "quantum" also fires for "quantum computing".
pub static CATEGORY_LEXICON: &[(&str, &[&str])] = &[
    ("mathematics", &["math"]),
    ("combinatorics", &["math.CO"]),
    ("algebra", &["math.AG", "math.RA"]),
    ("geometry", &["math.DG", "math.AG"]),
    ("analysis", &["math.CA", "math.FA"]),
    ("probability", &["math.PR"]),
    ("statistics", &["stat", "math.ST"]),
    ("physics", &["physics"]),
    ("quantum", &["quant-ph"]),
    ("computer science", &["cs"]),
    ("artificial intelligence", &["cs.AI"]),
    ("machine learning", &["cs.LG", "stat.ML"]),
    ("computer vision", &["cs.CV"]),
    ("nlp", &["cs.CL"]),
    ("natural language", &["cs.CL"]),
    ("cryptography", &["cs.CR"]),
    ("biology", &["q-bio"]),
    ("finance", &["q-fin"]),
    ("economics", &["econ"]),
];

/// Collect the codes of every phrase contained in `query_lower`
///
/// Codes are appended in table order and are not deduplicated.
pub fn lookup_categories(query_lower: &str) -> Vec<String> {
    CATEGORY_LEXICON
        .iter()
        .filter(|(phrase, _)| query_lower.contains(phrase))
        .flat_map(|(_, codes)| codes.iter().map(|c| c.to_string()))
        .collect()
}
