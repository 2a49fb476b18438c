//! Paper search backends.
//!
//! The [`PaperSource`] trait is the seam between the assistant and the
//! search engine: it takes an engine query string (see
//! [`build_query_string`](crate::query::build_query_string)) and a result
//! count, looks papers up by id, and fetches PDF bytes. [`ArxivSource`]
//! talks to the arXiv export API; [`MockSource`] serves canned papers for
//! tests and demos.

mod arxiv;
pub mod mock;

pub use arxiv::{ArxivSource, ARXIV_API_URL};
pub use mock::MockSource;

use async_trait::async_trait;

use crate::models::PaperInfo;

/// A searchable paper repository
#[async_trait]
pub trait PaperSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Run an engine query, newest submissions first
    async fn search(
        &self,
        query_string: &str,
        max_results: u32,
    ) -> Result<Vec<PaperInfo>, SourceError>;

    /// Look up a single paper by (normalized) id
    async fn get_by_id(&self, id: &str) -> Result<PaperInfo, SourceError>;

    /// Fetch the PDF for a paper
    async fn fetch_pdf(&self, paper: &PaperInfo) -> Result<Vec<u8>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the source
    #[error("API error: {0}")]
    Api(String),

    /// Feed could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Paper not found
    #[error("Paper not found: {0}")]
    NotFound(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}
