//! Search and download service shared by the MCP tools and the CLI.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::models::{
    BatchDownloadResult, DownloadResult, DownloadSelection, DownloadStats, PaperInfo,
    SearchAndDownloadResult, SearchResult, DEFAULT_MAX_RESULTS,
};
use crate::query::{build_query_string, QueryParsingPipeline};
use crate::sources::{ArxivSource, PaperSource, SourceError};
use crate::store::PaperStore;
use crate::utils::{sanitize_paper_id, HttpClient, ValidationError};

/// Default upper bound on results per search
pub const DEFAULT_MAX_RESULTS_CEILING: u32 = 50;

/// Default pause between downloads in a batch
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(3);

/// Errors from the assistant service
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// The search backend failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Caller supplied an unusable argument
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// None of the requested ids resolved to a paper
    #[error("No valid papers found among: {}", .0.join(", "))]
    NoValidPapers(Vec<String>),
}

impl From<ValidationError> for AssistantError {
    fn from(err: ValidationError) -> Self {
        AssistantError::InvalidRequest(err.to_string())
    }
}

/// Natural-language arXiv search with an organized download store
#[derive(Debug, Clone)]
pub struct ArxivAssistant {
    pipeline: QueryParsingPipeline,
    source: Arc<dyn PaperSource>,
    store: PaperStore,
    max_results_ceiling: u32,
    default_max_results: u32,
    batch_delay: Duration,
}

impl ArxivAssistant {
    /// Create an assistant from its parts with default limits
    pub fn new(pipeline: QueryParsingPipeline, source: Arc<dyn PaperSource>, store: PaperStore) -> Self {
        Self {
            pipeline,
            source,
            store,
            max_results_ceiling: DEFAULT_MAX_RESULTS_CEILING,
            default_max_results: DEFAULT_MAX_RESULTS,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Wire up the arXiv source, query pipeline and store from configuration
    pub fn from_config(config: &Config) -> Result<Self, AssistantError> {
        let client = HttpClient::new()?;
        let pipeline = QueryParsingPipeline::from_config(&config.llm, client.clone());
        let source = ArxivSource::from_config(&config.arxiv, client);
        let store = PaperStore::new(&config.downloads.default_path);

        Ok(Self::new(pipeline, Arc::new(source), store)
            .with_max_results_ceiling(config.arxiv.max_results_ceiling)
            .with_default_max_results(config.arxiv.default_max_results)
            .with_batch_delay(Duration::from_secs(config.downloads.batch_delay_secs)))
    }

    /// Set the per-search result ceiling (at least 1)
    pub fn with_max_results_ceiling(mut self, ceiling: u32) -> Self {
        self.max_results_ceiling = ceiling.max(1);
        self
    }

    /// Set the result count used when a caller does not give one (at least 1)
    pub fn with_default_max_results(mut self, default: u32) -> Self {
        self.default_max_results = default.max(1);
        self
    }

    /// Set the pause between batch downloads
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn pipeline(&self) -> &QueryParsingPipeline {
        &self.pipeline
    }

    pub fn store(&self) -> &PaperStore {
        &self.store
    }

    pub fn max_results_ceiling(&self) -> u32 {
        self.max_results_ceiling
    }

    /// Result count for callers that leave it out, kept within the ceiling
    pub fn default_max_results(&self) -> u32 {
        self.default_max_results.min(self.max_results_ceiling)
    }

    /// Search arXiv
    ///
    /// With `use_natural_language` the query goes through the parsing
    /// pipeline and its `max_results` is replaced by the clamped request;
    /// otherwise the query is sent to arXiv verbatim. Twice the limit is
    /// fetched so the published-date filter still has enough to keep.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
        use_natural_language: bool,
    ) -> Result<SearchResult, AssistantError> {
        let limit = max_results.clamp(1, self.max_results_ceiling);

        let (parsed, engine_query) = if use_natural_language {
            let mut parsed = self.pipeline.parse(query).await;
            parsed.max_results = limit;
            let engine_query = build_query_string(&parsed);
            (Some(parsed), engine_query)
        } else {
            let raw = query.trim();
            if raw.is_empty() {
                return Err(AssistantError::InvalidRequest(
                    "query must not be empty".to_string(),
                ));
            }
            (None, raw.to_string())
        };

        tracing::info!("Searching arXiv: {} (limit {})", engine_query, limit);

        let mut papers = self
            .source
            .search(&engine_query, limit.saturating_mul(2))
            .await?;

        if let Some(parsed) = parsed.as_ref().filter(|p| p.has_date_filter()) {
            if parsed.has_valid_date_range() {
                papers.retain(|paper| parsed.matches_date(paper.published.date_naive()));
            } else {
                tracing::warn!(
                    "Ignoring inverted date range {:?}..{:?}",
                    parsed.date_from,
                    parsed.date_to
                );
            }
        }
        papers.truncate(limit as usize);

        tracing::debug!("Search returned {} papers", papers.len());
        Ok(SearchResult::new(query, parsed, engine_query, papers))
    }

    /// Download one paper by arXiv id
    ///
    /// Lookup and download failures are reported in the result.
    pub async fn download_by_id(&self, arxiv_id: &str, custom_dir: Option<&Path>) -> DownloadResult {
        match self.resolve(arxiv_id).await {
            Ok(paper) => self.store.save_paper(self.source.as_ref(), &paper, custom_dir).await,
            Err(AssistantError::Source(SourceError::NotFound(id))) => {
                DownloadResult::error(arxiv_id.trim(), "", format!("Paper {} not found", id))
            }
            Err(e) => DownloadResult::error(arxiv_id.trim(), "", e.to_string()),
        }
    }

    /// Download several papers, pausing between each
    ///
    /// Ids that cannot be resolved are skipped with a warning; it is an
    /// error only when none resolve.
    pub async fn batch_download(
        &self,
        arxiv_ids: &[String],
        custom_dir: Option<&Path>,
    ) -> Result<BatchDownloadResult, AssistantError> {
        let mut papers = Vec::with_capacity(arxiv_ids.len());
        for id in arxiv_ids {
            match self.resolve(id).await {
                Ok(paper) => papers.push(paper),
                Err(e) => tracing::warn!("Skipping {}: {}", id, e),
            }
        }

        if papers.is_empty() {
            return Err(AssistantError::NoValidPapers(arxiv_ids.to_vec()));
        }

        let results = self.download_papers(&papers, custom_dir).await;
        Ok(BatchDownloadResult::new(arxiv_ids.len(), results))
    }

    /// Search, then download the selected results
    pub async fn search_and_download(
        &self,
        query: &str,
        selection: DownloadSelection,
        max_results: u32,
        custom_dir: Option<&Path>,
    ) -> Result<SearchAndDownloadResult, AssistantError> {
        let search = self.search(query, max_results, true).await?;
        let found = search.papers.len();

        if found == 0 {
            return Ok(SearchAndDownloadResult {
                search,
                download: None,
                message: "No papers found".to_string(),
            });
        }

        let selected: Vec<PaperInfo> = match &selection {
            DownloadSelection::None => {
                return Ok(SearchAndDownloadResult {
                    search,
                    download: None,
                    message: "Search completed. Specify indices or use download_all=true to download papers."
                        .to_string(),
                });
            }
            DownloadSelection::All => search.papers.clone(),
            DownloadSelection::Indices(indices) => indices
                .iter()
                .filter(|&&i| (1..=found).contains(&i))
                .map(|&i| search.papers[i - 1].clone())
                .collect(),
        };

        if selected.is_empty() {
            return Ok(SearchAndDownloadResult {
                search,
                download: None,
                message: format!("Found {} papers, no valid indices selected (1-{})", found, found),
            });
        }

        let results = self.download_papers(&selected, custom_dir).await;
        let download = BatchDownloadResult::new(selected.len(), results);
        let message = format!(
            "Found {} papers, downloaded {} papers",
            found, download.successful
        );

        Ok(SearchAndDownloadResult {
            search,
            download: Some(download),
            message,
        })
    }

    /// Statistics for the download directory
    pub async fn stats(&self) -> Result<DownloadStats, AssistantError> {
        Ok(self.store.stats().await?)
    }

    async fn resolve(&self, arxiv_id: &str) -> Result<PaperInfo, AssistantError> {
        let id = sanitize_paper_id(arxiv_id)?;
        let id = ArxivSource::parse_id(&id)?;
        Ok(self.source.get_by_id(&id).await?)
    }

    async fn download_papers(
        &self,
        papers: &[PaperInfo],
        custom_dir: Option<&Path>,
    ) -> Vec<DownloadResult> {
        let mut results = Vec::with_capacity(papers.len());
        for (i, paper) in papers.iter().enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            results.push(
                self.store
                    .save_paper(self.source.as_ref(), paper, custom_dir)
                    .await,
            );
        }
        results
    }
}
