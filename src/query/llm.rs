//! Language-model query translator using OpenAI-compatible structured output.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{QueryTranslator, TranslateError};
use crate::config::LlmConfig;
use crate::models::{StructuredQuery, DEFAULT_MAX_RESULTS};
use crate::utils::HttpClient;

const SYSTEM_PROMPT: &str = "You are an arXiv search query parser. Convert natural language queries into structured search parameters.

Extract the following information:
- keywords: General search terms
- title: If searching specifically in titles
- author: Author names
- abstract: If searching in abstracts
- categories: arXiv category codes (e.g., math.CO for combinatorics, cs.AI for AI)
- date_from: Start date in YYYY-MM-DD format
- date_to: End date in YYYY-MM-DD format
- max_results: Number of papers requested, if stated

Common category codes:
- Mathematics: math, math.CO (combinatorics), math.AG (algebraic geometry), math.PR (probability)
- Computer Science: cs, cs.AI (AI), cs.LG (machine learning), cs.CV (computer vision), cs.CL (NLP)
- Physics: physics, quant-ph (quantum physics), hep-th (high energy theory)
- Statistics: stat, stat.ML (machine learning)
- Biology: q-bio
- Finance: q-fin
- Economics: econ

For relative dates like \"last month\" or \"after December 2024\", calculate the actual dates.";

static RESPONSE_FORMAT: Lazy<Value> = Lazy::new(|| {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "search_query",
            "schema": {
                "type": "object",
                "properties": {
                    "keywords": {"type": "array", "items": {"type": "string"}},
                    "title": {"type": "string"},
                    "author": {"type": "string"},
                    "abstract": {"type": "string"},
                    "categories": {"type": "array", "items": {"type": "string"}},
                    "date_from": {"type": "string"},
                    "date_to": {"type": "string"},
                    "max_results": {"type": "integer", "default": DEFAULT_MAX_RESULTS}
                },
                "additionalProperties": false
            }
        }
    })
});

/// Parses queries by asking a chat-completions model for a schema-constrained object
#[derive(Debug, Clone)]
pub struct LlmQueryTranslator {
    client: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl LlmQueryTranslator {
    /// Create a translator from configuration, sharing an HTTP client
    pub fn new(config: &LlmConfig, client: HttpClient) -> Self {
        Self {
            client,
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Whether a credential is available
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint_chat_completions(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Parse a query with the language model
    ///
    /// Fails with [`TranslateError::NotConfigured`] when no API key is set and
    /// with [`TranslateError::SchemaViolation`] when the reply does not
    /// validate. Nothing is swallowed; fallback is the caller's decision.
    pub async fn parse_with_llm(&self, query: &str) -> Result<StructuredQuery, TranslateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TranslateError::NotConfigured("missing OpenAI API key".to_string()))?;

        let system = format!(
            "{}\n\nToday's date is {}.",
            SYSTEM_PROMPT,
            Utc::now().date_naive()
        );
        let request = ChatCompletionsRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &system,
                },
                Message {
                    role: "user",
                    content: query,
                },
            ],
            response_format: &RESPONSE_FORMAT,
            temperature: Some(0.0),
        };

        tracing::debug!(model = %self.model, "Sending query to language model");

        let response = self
            .client
            .post(&self.endpoint_chat_completions())
            .timeout(self.timeout)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Api(format!(
                "chat.completions returned status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let envelope: ChatCompletionsResponse = serde_json::from_str(&body)?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TranslateError::SchemaViolation("empty completion".to_string()))?;

        decode_payload(&content)
    }

    fn transport_error(&self, err: reqwest::Error) -> TranslateError {
        if err.is_timeout() {
            TranslateError::Timeout(self.timeout)
        } else {
            TranslateError::from(err)
        }
    }
}

#[async_trait]
impl QueryTranslator for LlmQueryTranslator {
    fn name(&self) -> &str {
        "llm"
    }

    async fn translate(&self, query: &str) -> Result<StructuredQuery, TranslateError> {
        self.parse_with_llm(query).await
    }
}

/// Validate the model's JSON object and normalize it into a [`StructuredQuery`]
///
/// Empty strings, empty arrays, nulls and a zero `max_results` mean "not
/// provided"; blank entries inside arrays are dropped.
fn decode_payload(content: &str) -> Result<StructuredQuery, TranslateError> {
    let payload: LlmQueryPayload = serde_json::from_str(content)?;

    let max_results = match payload.max_results {
        None | Some(0) => DEFAULT_MAX_RESULTS,
        Some(n) => u32::try_from(n).map_err(|_| {
            TranslateError::SchemaViolation(format!("max_results out of range: {}", n))
        })?,
    };

    Ok(StructuredQuery {
        keywords: non_empty_list(payload.keywords),
        title: non_empty(payload.title),
        author: non_empty(payload.author),
        r#abstract: non_empty(payload.r#abstract),
        categories: non_empty_list(payload.categories),
        date_from: parse_date("date_from", payload.date_from)?,
        date_to: parse_date("date_to", payload.date_to)?,
        max_results,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn non_empty_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| non_empty(Some(s)))
        .collect()
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, TranslateError> {
    non_empty(value)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| {
                TranslateError::SchemaViolation(format!("{} {:?} is not YYYY-MM-DD: {}", field, s, e))
            })
        })
        .transpose()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LlmQueryPayload {
    keywords: Option<Vec<String>>,
    title: Option<String>,
    author: Option<String>,
    r#abstract: Option<String>,
    categories: Option<Vec<String>>,
    date_from: Option<String>,
    date_to: Option<String>,
    max_results: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            ..LlmConfig::default()
        }
    }

    fn completion(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_decode_strips_empty_values() {
        let q = decode_payload(
            r#"{"keywords": ["graphs", " "], "title": "", "author": "Fan Chung",
                "categories": [], "date_from": "2024-12-01", "date_to": "", "max_results": 0}"#,
        )
        .unwrap();

        assert_eq!(q.keywords, vec!["graphs"]);
        assert_eq!(q.title, None);
        assert_eq!(q.author.as_deref(), Some("Fan Chung"));
        assert!(q.categories.is_empty());
        assert_eq!(q.date_from, NaiveDate::from_ymd_opt(2024, 12, 1));
        assert_eq!(q.date_to, None);
        assert_eq!(q.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_decode_accepts_nulls_and_missing_fields() {
        let q = decode_payload(r#"{"abstract": null, "max_results": 25}"#).unwrap();
        assert!(q.keywords.is_empty());
        assert_eq!(q.r#abstract, None);
        assert_eq!(q.max_results, 25);
    }

    #[test]
    fn test_decode_schema_violations() {
        for bad in [
            "not json",
            r#"{"keywords": "graphs"}"#,
            r#"{"date_from": "December 2024"}"#,
            r#"{"max_results": -3}"#,
            r#"{"venue": "NeurIPS"}"#,
        ] {
            let err = decode_payload(bad).unwrap_err();
            assert!(
                matches!(err, TranslateError::SchemaViolation(_)),
                "{bad} -> {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_configured() {
        let translator =
            LlmQueryTranslator::new(&config("http://127.0.0.1:9", None), HttpClient::new().unwrap());
        assert!(!translator.is_configured());

        let err = translator.parse_with_llm("anything").await.unwrap_err();
        assert!(matches!(err, TranslateError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_parse_with_llm_against_mock_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion(
                r#"{"keywords": ["transformers"], "categories": ["cs.CV"], "date_from": "2024-01-01"}"#,
            ))
            .create_async()
            .await;

        let translator = LlmQueryTranslator::new(
            &config(&server.url(), Some("test-key")),
            HttpClient::new().unwrap(),
        );
        let q = translator
            .parse_with_llm("vision transformers since 2024")
            .await
            .unwrap();

        assert_eq!(q.keywords, vec!["transformers"]);
        assert_eq!(q.categories, vec!["cs.CV"]);
        assert_eq!(q.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_model_output_is_schema_violation() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion("Sure! Here are some papers."))
            .create_async()
            .await;

        let translator = LlmQueryTranslator::new(
            &config(&server.url(), Some("k")),
            HttpClient::new().unwrap(),
        );
        let err = translator.parse_with_llm("q").await.unwrap_err();
        assert!(matches!(err, TranslateError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn test_http_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .create_async()
            .await;

        let translator = LlmQueryTranslator::new(
            &config(&server.url(), Some("bad")),
            HttpClient::new().unwrap(),
        );
        let err = translator.parse_with_llm("q").await.unwrap_err();
        assert!(matches!(err, TranslateError::Api(_)));
    }
}
