//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::PaperInfo;
use crate::sources::{ArxivSource, PaperSource, SourceError};

/// Bytes served by [`MockSource::fetch_pdf`]
pub const MOCK_PDF_BYTES: &[u8] = b"%PDF-1.4\n% mock\n%%EOF\n";

/// A mock source for testing that returns predefined papers.
///
/// Every search returns the configured papers (up to `max_results`) and
/// records the engine query it was given.
#[derive(Debug, Default)]
pub struct MockSource {
    papers: Mutex<Vec<PaperInfo>>,
    failing_pdfs: Mutex<HashSet<String>>,
    queries: Mutex<Vec<(String, u32)>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source serving these papers.
    pub fn with_papers(papers: Vec<PaperInfo>) -> Self {
        let source = Self::new();
        source.set_papers(papers);
        source
    }

    /// Replace the papers to return.
    pub fn set_papers(&self, papers: Vec<PaperInfo>) {
        *lock(&self.papers) = papers;
    }

    /// Make PDF fetches for this id fail.
    pub fn fail_pdf(&self, arxiv_id: &str) {
        lock(&self.failing_pdfs).insert(arxiv_id.to_string());
    }

    /// Engine queries received so far, with their requested counts.
    pub fn queries(&self) -> Vec<(String, u32)> {
        lock(&self.queries).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl PaperSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(
        &self,
        query_string: &str,
        max_results: u32,
    ) -> Result<Vec<PaperInfo>, SourceError> {
        lock(&self.queries).push((query_string.to_string(), max_results));

        Ok(lock(&self.papers)
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<PaperInfo, SourceError> {
        let id = ArxivSource::parse_id(id)?;
        lock(&self.papers)
            .iter()
            .find(|paper| {
                paper.arxiv_id == id
                    || ArxivSource::parse_id(&paper.arxiv_id).is_ok_and(|base| base == id)
            })
            .cloned()
            .ok_or(SourceError::NotFound(id))
    }

    async fn fetch_pdf(&self, paper: &PaperInfo) -> Result<Vec<u8>, SourceError> {
        if lock(&self.failing_pdfs).contains(&paper.arxiv_id) {
            return Err(SourceError::Api(format!(
                "PDF download for {} returned status: 500 Internal Server Error",
                paper.arxiv_id
            )));
        }
        Ok(MOCK_PDF_BYTES.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_search_limits_and_records() {
        let source = MockSource::with_papers(vec![
            PaperInfo::new("2401.00001v1", "A"),
            PaperInfo::new("2401.00002v1", "B"),
            PaperInfo::new("2401.00003v1", "C"),
        ]);

        let papers = source.search("all:*", 2).await.unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(source.queries(), vec![("all:*".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_mock_get_by_id_ignores_version() {
        let source = MockSource::with_papers(vec![PaperInfo::new("2401.00001v3", "A")]);

        let paper = source.get_by_id("2401.00001").await.unwrap();
        assert_eq!(paper.arxiv_id, "2401.00001v3");
        assert!(matches!(
            source.get_by_id("2401.99999").await,
            Err(SourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_fetch_pdf_failure() {
        let source = MockSource::new();
        let paper = PaperInfo::new("2401.00001v1", "A");
        assert_eq!(source.fetch_pdf(&paper).await.unwrap(), MOCK_PDF_BYTES);

        source.fail_pdf("2401.00001v1");
        assert!(source.fetch_pdf(&paper).await.is_err());
    }
}
