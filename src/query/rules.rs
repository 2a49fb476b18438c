//! Deterministic rule-based query parser.
//!
//! This is the correctness backstop for [`QueryParsingPipeline`](super::QueryParsingPipeline):
//! it has no external dependencies and never fails. Anything it cannot
//! recognize is simply left out of the resulting [`StructuredQuery`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::lookup_categories;
use crate::models::StructuredQuery;

/// Upper bound for a result count requested inside the query text
pub const MAX_RESULTS_FROM_TEXT: u32 = 100;

/// At most this many keywords are kept
pub const MAX_KEYWORDS: usize = 5;

static STOPWORDS: &[&str] = &[
    "find",
    "search",
    "papers",
    "articles",
    "about",
    "on",
    "the",
    "a",
    "an",
    "in",
    "by",
    "after",
    "before",
    "since",
    "until",
    "published",
    "recent",
    "latest",
    "new",
];

// Digit classes are ASCII-only: `\d` would also match other scripts' digits,
// which `str::parse` rejects.

/// Lower-bound patterns, most specific first. Each captures "<month> <year>".
static DATE_FROM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\bpublished after (\w+ [0-9]{4})\b",
        r"\bafter (\w+ [0-9]{4})\b",
        r"\bsince (\w+ [0-9]{4})\b",
    ])
});

/// Upper-bound patterns, most specific first. Each captures "<month> <year>".
static DATE_TO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\bpublished before (\w+ [0-9]{4})\b",
        r"\bbefore (\w+ [0-9]{4})\b",
        r"\buntil (\w+ [0-9]{4})\b",
    ])
});

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"\bin ([0-9]{4})\b"));

static AUTHOR_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"\bby (\w+ \w+)"));

static LIMIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(r"\b([0-9]+) (?:papers?|results?|articles?)\b"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// Rule-based natural language parser
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedParser;

impl RuleBasedParser {
    /// Parse free text into a structured query. Never fails.
    ///
    /// Extraction runs over the lowercased text in a fixed order: dates,
    /// categories, author, result limit, keywords. Keywords are always
    /// extracted, so they may repeat words already used as the author.
    pub fn parse_simple(query: &str) -> StructuredQuery {
        let text = query.to_lowercase();
        let mut result = StructuredQuery::default();

        Self::extract_dates(&text, &mut result);
        result.categories = lookup_categories(&text);

        if let Some(caps) = AUTHOR_PATTERN.captures(&text) {
            result.author = Some(caps[1].to_string());
        }

        if let Some(limit) = Self::extract_limit(&text) {
            result.max_results = limit;
        }

        result.keywords = Self::extract_keywords(&text);

        tracing::debug!(query, parsed = ?result, "Rule-based parse");
        result
    }

    /// Fill `date_from`/`date_to`
    ///
    /// Per direction the first pattern whose "<month> <year>" fragment parses
    /// wins. A bare "in <year>" only fills bounds that are still unset.
    fn extract_dates(text: &str, result: &mut StructuredQuery) {
        result.date_from = first_month_date(&DATE_FROM_PATTERNS, text);
        result.date_to = first_month_date(&DATE_TO_PATTERNS, text);

        if let Some(caps) = YEAR_PATTERN.captures(text) {
            let Ok(year) = caps[1].parse::<i32>() else {
                return;
            };
            if result.date_from.is_none() {
                result.date_from = NaiveDate::from_ymd_opt(year, 1, 1);
            }
            if result.date_to.is_none() {
                result.date_to = NaiveDate::from_ymd_opt(year, 12, 31);
            }
        }
    }

    /// First "<n> papers|results|articles", capped at [`MAX_RESULTS_FROM_TEXT`]
    fn extract_limit(text: &str) -> Option<u32> {
        let caps = LIMIT_PATTERN.captures(text)?;
        // Digit strings too long for u32 are certainly above the cap
        let n = caps[1].parse::<u32>().unwrap_or(MAX_RESULTS_FROM_TEXT);
        match n {
            0 => None,
            n => Some(n.min(MAX_RESULTS_FROM_TEXT)),
        }
    }

    fn extract_keywords(text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter(|w| !STOPWORDS.contains(w) && w.chars().count() > 2)
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect()
    }
}

fn first_month_date(patterns: &[Regex], text: &str) -> Option<NaiveDate> {
    patterns.iter().find_map(|re| {
        let fragment = re.captures(text)?.get(1)?.as_str();
        let date = parse_month_year(fragment);
        if date.is_none() {
            tracing::debug!(fragment, "Ignoring unparseable date text");
        }
        date
    })
}

/// Parse "december 2024" / "dec 2024" into the first day of that month
fn parse_month_year(fragment: &str) -> Option<NaiveDate> {
    let mut parts = fragment.split_whitespace();
    let month = month_number(parts.next()?)?;
    let year = parts.next()?.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
