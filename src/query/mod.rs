//! Natural language query interpretation.
//!
//! A raw request flows through [`QueryParsingPipeline`], which tries an
//! optional [`QueryTranslator`] (normally the [`LlmQueryTranslator`]) and
//! falls back to [`RuleBasedParser::parse_simple`] on any failure. The
//! resulting [`StructuredQuery`](crate::models::StructuredQuery) is turned
//! into arXiv syntax by [`build_query_string`].
//!
//! ```
//! use arxiv_assistant::query::{build_query_string, RuleBasedParser};
//!
//! let parsed = RuleBasedParser::parse_simple("machine learning papers in 2023");
//! assert_eq!(parsed.categories, vec!["cs.LG", "stat.ML"]);
//! assert_eq!(
//!     build_query_string(&parsed),
//!     r#"(all:"machine" AND all:"learning" AND all:"2023") AND (cat:cs.LG OR cat:stat.ML)"#
//! );
//! ```

mod builder;
mod lexicon;
mod llm;
mod pipeline;
mod rules;

pub use builder::{build_query_string, MATCH_ALL};
pub use lexicon::{lookup_categories, CATEGORY_LEXICON};
pub use llm::LlmQueryTranslator;
pub use pipeline::QueryParsingPipeline;
pub use rules::{RuleBasedParser, MAX_KEYWORDS, MAX_RESULTS_FROM_TEXT};

use async_trait::async_trait;
use std::time::Duration;

use crate::models::StructuredQuery;

/// A best-effort parser that may fail
///
/// Implementations must report every problem as a [`TranslateError`];
/// the pipeline decides what to do with it.
#[async_trait]
pub trait QueryTranslator: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Translate a natural language query into a structured one
    async fn translate(&self, query: &str) -> Result<StructuredQuery, TranslateError>;
}

/// Errors from the translator tier
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// No credential or endpoint; the tier is unavailable
    #[error("Translator not configured: {0}")]
    NotConfigured(String),

    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not finish in time
    #[error("Translator timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success response from the model endpoint
    #[error("API error: {0}")]
    Api(String),

    /// Model output did not match the structured query schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        TranslateError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::SchemaViolation(format!("JSON: {}", err))
    }
}
