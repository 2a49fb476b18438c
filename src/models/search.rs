//! Search and download result models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{PaperInfo, StructuredQuery};

/// Search results from arXiv
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Original query as the user typed it
    pub query: String,

    /// Parsed form of the query, when natural-language parsing was used
    pub parsed_query: Option<StructuredQuery>,

    /// Query string sent to the arXiv API
    pub engine_query: String,

    /// Papers found, newest first
    pub papers: Vec<PaperInfo>,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(
        query: impl Into<String>,
        parsed_query: Option<StructuredQuery>,
        engine_query: impl Into<String>,
        papers: Vec<PaperInfo>,
    ) -> Self {
        Self {
            query: query.into(),
            parsed_query,
            engine_query: engine_query.into(),
            papers,
        }
    }

    /// Number of papers returned
    pub fn total_results(&self) -> usize {
        self.papers.len()
    }
}

/// Result of a download operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// arXiv identifier
    pub arxiv_id: String,

    /// Paper title (empty when the paper could not be resolved)
    pub title: String,

    /// Path where the file was saved
    pub file_path: String,

    /// Whether the download was successful
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,
}

impl DownloadResult {
    /// Create a successful download result
    pub fn success(
        arxiv_id: impl Into<String>,
        title: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            arxiv_id: arxiv_id.into(),
            title: title.into(),
            file_path: file_path.into(),
            success: true,
            error: None,
        }
    }

    /// Create a failed download result
    pub fn error(
        arxiv_id: impl Into<String>,
        title: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            arxiv_id: arxiv_id.into(),
            title: title.into(),
            file_path: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Result of a batch download operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDownloadResult {
    /// Number of ids the caller asked for
    pub total_requested: usize,

    /// Individual download results
    pub results: Vec<DownloadResult>,

    /// Total number of successful downloads
    pub successful: usize,

    /// Total number of failed downloads
    pub failed: usize,
}

impl BatchDownloadResult {
    /// Create a new batch download result from individual results
    pub fn new(total_requested: usize, results: Vec<DownloadResult>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;

        Self {
            total_requested,
            results,
            successful,
            failed,
        }
    }

    /// Check if all downloads succeeded (and there was at least one)
    pub fn is_all_success(&self) -> bool {
        !self.results.is_empty() && self.failed == 0
    }
}

/// Which papers `search_and_download` should fetch
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadSelection {
    /// Search only
    #[default]
    None,
    /// Every paper in the result
    All,
    /// 1-based positions in the result; out-of-range entries are dropped
    Indices(Vec<usize>),
}

/// Outcome of a combined search and download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAndDownloadResult {
    /// The search that selected the papers
    pub search: SearchResult,

    /// Downloads, absent when nothing was selected
    pub download: Option<BatchDownloadResult>,

    /// Human readable summary
    pub message: String,
}

/// Statistics about the download directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadStats {
    /// Root download directory
    pub download_directory: String,

    /// Number of PDF files found
    pub total_papers: usize,

    /// Combined size in megabytes, rounded to two decimals
    pub total_size_mb: f64,

    /// `YYYY-MM` directory -> category directory -> file count
    pub organization: BTreeMap<String, BTreeMap<String, usize>>,

    /// Most recently modified file names, newest first
    pub recent_downloads: Vec<String>,
}
