//! Two-tier query parsing: best-effort translator, rule-based backstop.

use std::sync::Arc;
use std::time::Duration;

use super::{LlmQueryTranslator, QueryTranslator, RuleBasedParser};
use crate::config::LlmConfig;
use crate::models::StructuredQuery;
use crate::utils::HttpClient;

/// Default bound on a single translator call
pub const DEFAULT_TRANSLATOR_TIMEOUT: Duration = Duration::from_secs(20);

/// Orchestrates query parsing and owns the failure policy
///
/// [`parse`](Self::parse) never fails: every translator error, including a
/// timeout, degrades to [`RuleBasedParser::parse_simple`].
#[derive(Debug, Clone)]
pub struct QueryParsingPipeline {
    translator: Option<Arc<dyn QueryTranslator>>,
    timeout: Duration,
}

impl Default for QueryParsingPipeline {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl QueryParsingPipeline {
    /// Pipeline without a translator tier
    pub fn rule_based() -> Self {
        Self {
            translator: None,
            timeout: DEFAULT_TRANSLATOR_TIMEOUT,
        }
    }

    /// Pipeline with a translator bounded by `timeout`
    pub fn with_translator(translator: Arc<dyn QueryTranslator>, timeout: Duration) -> Self {
        Self {
            translator: Some(translator),
            timeout,
        }
    }

    /// Build from configuration; the LLM tier is enabled only when an API key is present
    pub fn from_config(config: &LlmConfig, client: HttpClient) -> Self {
        let translator = LlmQueryTranslator::new(config, client);
        if translator.is_configured() {
            tracing::info!(model = %config.model, "LLM query translation enabled");
            // Leave headroom over the request timeout so the HTTP error wins the race
            let timeout = Duration::from_secs(config.timeout_secs.saturating_add(1));
            Self::with_translator(Arc::new(translator), timeout)
        } else {
            tracing::info!("No LLM API key configured, using rule-based query parsing");
            Self::rule_based()
        }
    }

    /// Bound applied to each translator call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a translator tier is configured
    pub fn has_translator(&self) -> bool {
        self.translator.is_some()
    }

    /// Parse a natural language query
    pub async fn parse(&self, query: &str) -> StructuredQuery {
        if let Some(translator) = &self.translator {
            match tokio::time::timeout(self.timeout, translator.translate(query)).await {
                Ok(Ok(parsed)) => {
                    tracing::debug!(translator = translator.name(), parsed = ?parsed, "Translated query");
                    return parsed;
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        "{} parsing failed: {}, falling back to rule-based parser",
                        translator.name(),
                        e
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "{} parsing timed out after {:?}, falling back to rule-based parser",
                        translator.name(),
                        self.timeout
                    );
                }
            }
        }

        RuleBasedParser::parse_simple(query)
    }

    /// Parse and clamp `max_results` to a caller ceiling
    pub async fn parse_with_ceiling(&self, query: &str, ceiling: u32) -> StructuredQuery {
        let mut parsed = self.parse(query).await;
        parsed.clamp_max_results(ceiling);
        parsed
    }
}
