//! arXiv export API client.

use async_trait::async_trait;
use feed_rs::parser;

use crate::config::ArxivConfig;
use crate::models::PaperInfo;
use crate::sources::{PaperSource, SourceError};
use crate::utils::HttpClient;

/// Default root of the arXiv export API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org";

/// arXiv research source
///
/// Searches through the Atom API sorted by submission date, looks papers up
/// with `id_list`, and fetches PDFs from the link in each entry.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source against the public API
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &ArxivConfig, client: HttpClient) -> Self {
        Self::new(client).with_base_url(&config.api_url)
    }

    /// Point the source at a different API root (used by tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Parse an arXiv ID from various formats
    ///
    /// Handles formats like:
    /// - "2301.12345"
    /// - "2301.12345v1" (version is stripped)
    /// - "arXiv:2301.12345"
    /// - "https://arxiv.org/abs/2301.12345v1"
    /// - "https://arxiv.org/pdf/2301.12345v1.pdf"
    /// - "hep-th/9901001" (old style, archive kept)
    pub fn parse_id(id: &str) -> Result<String, SourceError> {
        let mut id = id.trim();

        // Remove URL if present
        for marker in ["/abs/", "/pdf/"] {
            if let Some(pos) = id.find(marker) {
                id = &id[pos + marker.len()..];
                break;
            }
        }

        if id
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("arxiv:"))
        {
            id = &id[6..];
        }

        let id = id.trim_end_matches('/');
        let id = id.strip_suffix(".pdf").unwrap_or(id);
        let id = strip_version(id).trim();

        if id.is_empty() {
            return Err(SourceError::InvalidRequest("Empty arXiv ID".to_string()));
        }

        Ok(id.to_string())
    }

    fn api_url(&self) -> String {
        format!("{}/api/query", self.base_url)
    }

    /// Fetch and parse an Atom feed
    async fn fetch_feed(&self, url: &str) -> Result<Vec<PaperInfo>, SourceError> {
        tracing::debug!("arXiv request: {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch arXiv results: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "arXiv API returned status: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        Self::parse_feed(bytes.as_ref())
    }

    /// Parse an arXiv Atom feed into papers
    fn parse_feed(bytes: &[u8]) -> Result<Vec<PaperInfo>, SourceError> {
        let feed = parser::parse(bytes)
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        feed.entries.iter().map(Self::parse_entry).collect()
    }

    /// Parse arXiv Atom feed entry into PaperInfo
    fn parse_entry(entry: &feed_rs::model::Entry) -> Result<PaperInfo, SourceError> {
        // The API reports bad requests as a single entry under /api/errors
        if entry.id.contains("/api/errors") {
            let message = entry
                .summary
                .as_ref()
                .map(|s| s.content.trim().to_string())
                .unwrap_or_else(|| entry.id.clone());
            return Err(SourceError::InvalidRequest(message));
        }

        let arxiv_id = entry
            .id
            .split("/abs/")
            .nth(1)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SourceError::Parse(format!("Unexpected entry id: {}", entry.id)))?;

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let abstract_text = entry
            .summary
            .as_ref()
            .map(|s| s.content.trim().to_string())
            .unwrap_or_default();

        let mut paper = PaperInfo::new(arxiv_id, title)
            .authors(entry.authors.iter().map(|a| a.name.trim().to_string()))
            .abstract_text(abstract_text)
            .categories(entry.categories.iter().map(|c| c.term.clone()));

        if let Some(published) = entry.published {
            paper = paper.published(published);
        }
        if let Some(updated) = entry.updated {
            paper = paper.updated(updated);
        }

        let pdf_link = entry.links.iter().find(|link| {
            link.media_type.as_deref() == Some("application/pdf")
                || link.title.as_deref() == Some("pdf")
        });
        if let Some(link) = pdf_link {
            paper = paper.pdf_url(link.href.replace("http://", "https://"));
        }

        Ok(paper)
    }
}

/// Strip a trailing `vN` version suffix
fn strip_version(id: &str) -> &str {
    match id.rfind('v') {
        Some(pos)
            if pos > 0
                && pos + 1 < id.len()
                && id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &id[..pos]
        }
        _ => id,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl PaperSource for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(
        &self,
        query_string: &str,
        max_results: u32,
    ) -> Result<Vec<PaperInfo>, SourceError> {
        let url = format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            self.api_url(),
            urlencoding::encode(query_string),
            max_results
        );

        let papers = self.fetch_feed(&url).await?;
        tracing::debug!("arXiv returned {} papers", papers.len());
        Ok(papers)
    }

    async fn get_by_id(&self, id: &str) -> Result<PaperInfo, SourceError> {
        let id = Self::parse_id(id)?;
        let url = format!(
            "{}?id_list={}&max_results=1",
            self.api_url(),
            urlencoding::encode(&id)
        );

        self.fetch_feed(&url)
            .await?
            .into_iter()
            .next()
            .ok_or(SourceError::NotFound(id))
    }

    async fn fetch_pdf(&self, paper: &PaperInfo) -> Result<Vec<u8>, SourceError> {
        tracing::debug!("Fetching PDF {}", paper.pdf_url);

        let response = self.client.get(&paper.pdf_url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(paper.arxiv_id.clone()));
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "PDF download for {} returned status: {}",
                paper.arxiv_id, status
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:knots</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-03-02T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2403.01234v2</id>
    <updated>2024-03-05T10:00:00Z</updated>
    <published>2024-03-01T18:00:00Z</published>
    <title>Knot Invariants
  from Braids</title>
    <summary>  We study knots.
</summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/2403.01234v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2403.01234v2" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="math.GT" scheme="http://arxiv.org/schemas/atom"/>
    <category term="math.GT" scheme="http://arxiv.org/schemas/atom"/>
    <category term="math.QA" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/hep-th/9901001v1</id>
    <updated>1999-01-01T00:00:00Z</updated>
    <published>1999-01-01T00:00:00Z</published>
    <title>Strings</title>
    <summary>Old style id.</summary>
    <author><name>Ed Witten</name></author>
    <category term="hep-th" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: id_list=bogus</title>
  <id>http://arxiv.org/api/err</id>
  <updated>2024-03-02T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_bogus</id>
    <title>Error</title>
    <summary>incorrect id format for bogus</summary>
    <updated>2024-03-02T00:00:00-05:00</updated>
  </entry>
</feed>"#;

    const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: id_list=2401.99999</title>
  <id>http://arxiv.org/api/empty</id>
  <updated>2024-03-02T00:00:00-05:00</updated>
</feed>"#;

    fn source(url: &str) -> ArxivSource {
        ArxivSource::new(HttpClient::new().unwrap()).with_base_url(url)
    }

    #[test]
    fn test_parse_id() {
        // Basic formats
        assert_eq!(ArxivSource::parse_id("2301.12345").unwrap(), "2301.12345");
        assert_eq!(
            ArxivSource::parse_id("arxiv:2301.12345").unwrap(),
            "2301.12345"
        );
        assert_eq!(
            ArxivSource::parse_id("arXiv:2301.12345").unwrap(),
            "2301.12345"
        );
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/abs/2301.12345v1").unwrap(),
            "2301.12345"
        );
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/pdf/2301.12345v3.pdf").unwrap(),
            "2301.12345"
        );

        // With version
        assert_eq!(ArxivSource::parse_id("2301.12345v2").unwrap(), "2301.12345");
        assert_eq!(ArxivSource::parse_id(" 2301.12345 ").unwrap(), "2301.12345");
    }

    #[test]
    fn test_parse_id_old_format() {
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/abs/hep-th/9901001v2").unwrap(),
            "hep-th/9901001"
        );
        // A 'v' inside the archive name is not a version
        assert_eq!(
            ArxivSource::parse_id("solv-int/9901001").unwrap(),
            "solv-int/9901001"
        );
    }

    #[test]
    fn test_parse_id_errors() {
        assert!(matches!(
            ArxivSource::parse_id(""),
            Err(SourceError::InvalidRequest(_))
        ));
        assert!(ArxivSource::parse_id("   ").is_err());
        assert!(ArxivSource::parse_id("arxiv:").is_err());
    }

    #[test]
    fn test_parse_feed() {
        let papers = ArxivSource::parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(papers.len(), 2);

        let paper = &papers[0];
        assert_eq!(paper.arxiv_id, "2403.01234v2");
        assert_eq!(paper.title, "Knot Invariants from Braids");
        assert_eq!(paper.r#abstract, "We study knots.");
        assert_eq!(paper.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(paper.categories, vec!["math.GT", "math.QA"]);
        assert_eq!(paper.pdf_url, "https://arxiv.org/pdf/2403.01234v2");
        assert_eq!(paper.published.to_rfc3339(), "2024-03-01T18:00:00+00:00");
        assert_eq!(paper.updated.to_rfc3339(), "2024-03-05T10:00:00+00:00");

        let old = &papers[1];
        assert_eq!(old.arxiv_id, "hep-th/9901001v1");
        assert_eq!(old.pdf_url, "https://arxiv.org/pdf/hep-th/9901001v1");
    }

    #[test]
    fn test_parse_feed_error_entry() {
        let result = ArxivSource::parse_feed(ERROR_FEED.as_bytes());
        assert!(matches!(result, Err(SourceError::InvalidRequest(msg)) if msg.contains("bogus")));
    }

    #[test]
    fn test_parse_feed_garbage() {
        assert!(matches!(
            ArxivSource::parse_feed(b"not a feed"),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_search_with_mockito() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "all:\"knots\"".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("max_results".into(), "20".into()),
                Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
                Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let papers = source(&server.url())
            .search("all:\"knots\"", 20)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].arxiv_id, "2403.01234v2");
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let result = source(&server.url()).search("all:*", 10).await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::UrlEncoded("id_list".into(), "2403.01234".into()))
            .with_status(200)
            .with_body(FEED)
            .create_async()
            .await;

        let paper = source(&server.url())
            .get_by_id("arXiv:2403.01234v2")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(paper.arxiv_id, "2403.01234v2");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(EMPTY_FEED)
            .create_async()
            .await;

        let result = source(&server.url()).get_by_id("2401.99999").await;
        assert!(matches!(result, Err(SourceError::NotFound(id)) if id == "2401.99999"));
    }

    #[tokio::test]
    async fn test_fetch_pdf() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/pdf/2403.01234v2")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.5 test")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/pdf/2403.00000v1")
            .with_status(404)
            .create_async()
            .await;

        let arxiv = source(&server.url());

        let paper = PaperInfo::new("2403.01234v2", "Knots")
            .pdf_url(format!("{}/pdf/2403.01234v2", server.url()));
        let bytes = arxiv.fetch_pdf(&paper).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.5 test");

        let missing = PaperInfo::new("2403.00000v1", "Gone")
            .pdf_url(format!("{}/pdf/2403.00000v1", server.url()));
        assert!(matches!(
            arxiv.fetch_pdf(&missing).await,
            Err(SourceError::NotFound(_))
        ));
    }
}
