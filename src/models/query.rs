//! Structured search query produced by the query parsers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default number of results when the user does not ask for a count
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Normalized representation of a search intent
///
/// Every optional field empty is a valid query meaning "match everything".
/// `date_from <= date_to` is not enforced here; see [`StructuredQuery::has_valid_date_range`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// General search terms
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Free-text fragment matched against titles
    #[serde(default)]
    pub title: Option<String>,

    /// Author name
    #[serde(default)]
    pub author: Option<String>,

    /// Free-text fragment matched against abstracts
    #[serde(default)]
    pub r#abstract: Option<String>,

    /// arXiv category codes (e.g. `math.CO`, `cs.AI`)
    #[serde(default)]
    pub categories: Vec<String>,

    /// Inclusive lower bound on the publication date
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper bound on the publication date
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    /// Maximum number of results
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl Default for StructuredQuery {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            title: None,
            author: None,
            r#abstract: None,
            categories: Vec::new(),
            date_from: None,
            date_to: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl StructuredQuery {
    /// Create an empty (match everything) query
    pub fn new() -> Self {
        Self::default()
    }

    /// Set keywords
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set title fragment
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set abstract fragment
    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.r#abstract = Some(text.into());
        self
    }

    /// Set categories
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set the lower date bound
    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    /// Set the upper date bound
    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: u32) -> Self {
        self.max_results = max;
        self
    }

    /// True when no field narrows the search
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.title.is_none()
            && self.author.is_none()
            && self.r#abstract.is_none()
            && self.categories.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// Apply a caller-imposed ceiling to `max_results`
    pub fn clamp_max_results(&mut self, ceiling: u32) {
        self.max_results = self.max_results.min(ceiling.max(1));
    }

    /// Whether any date bound is present
    pub fn has_date_filter(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// False only when both bounds are set and inverted
    pub fn has_valid_date_range(&self) -> bool {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        }
    }

    /// Whether a publication date falls inside the inclusive bounds
    pub fn matches_date(&self, published: NaiveDate) -> bool {
        if let Some(from) = self.date_from {
            if published < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if published > to {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_is_empty() {
        let query = StructuredQuery::default();
        assert!(query.is_empty());
        assert_eq!(query.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_clamp_max_results() {
        let mut query = StructuredQuery::new().max_results(100);
        query.clamp_max_results(50);
        assert_eq!(query.max_results, 50);

        let mut query = StructuredQuery::new().max_results(5);
        query.clamp_max_results(50);
        assert_eq!(query.max_results, 5);
    }

    #[test]
    fn test_date_range_validity() {
        let ok = StructuredQuery::new()
            .date_from(date(2023, 1, 1))
            .date_to(date(2023, 12, 31));
        assert!(ok.has_valid_date_range());

        let inverted = StructuredQuery::new()
            .date_from(date(2024, 1, 1))
            .date_to(date(2023, 1, 1));
        assert!(!inverted.has_valid_date_range());

        assert!(StructuredQuery::new().date_to(date(2020, 1, 1)).has_valid_date_range());
    }

    #[test]
    fn test_matches_date_inclusive() {
        let query = StructuredQuery::new()
            .date_from(date(2023, 1, 1))
            .date_to(date(2023, 12, 31));

        assert!(query.matches_date(date(2023, 1, 1)));
        assert!(query.matches_date(date(2023, 12, 31)));
        assert!(!query.matches_date(date(2022, 12, 31)));
        assert!(!query.matches_date(date(2024, 1, 1)));
    }

    #[test]
    fn test_serde_uses_iso_dates_and_abstract_name() {
        let query = StructuredQuery::new()
            .abstract_text("graph")
            .date_from(date(2024, 12, 1));
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["abstract"], "graph");
        assert_eq!(json["date_from"], "2024-12-01");
        assert_eq!(json["max_results"], 10);
    }
}
