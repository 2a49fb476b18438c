//! Paper records returned by the arXiv search collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Abstracts longer than this are truncated in tool summaries
const SUMMARY_ABSTRACT_CHARS: usize = 500;

/// Information about an arXiv paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperInfo {
    /// arXiv identifier, including the version suffix when the feed carries one
    pub arxiv_id: String,

    /// Paper title
    pub title: String,

    /// Author names in feed order
    pub authors: Vec<String>,

    /// Abstract text
    pub r#abstract: String,

    /// arXiv categories, primary first
    pub categories: Vec<String>,

    /// First submission timestamp
    pub published: DateTime<Utc>,

    /// Last update timestamp
    pub updated: DateTime<Utc>,

    /// Direct PDF URL
    pub pdf_url: String,
}

impl PaperInfo {
    /// Create a paper with required fields; timestamps default to the Unix epoch
    pub fn new(arxiv_id: impl Into<String>, title: impl Into<String>) -> Self {
        let arxiv_id = arxiv_id.into();
        Self {
            pdf_url: format!("https://arxiv.org/pdf/{}", arxiv_id),
            arxiv_id,
            title: title.into(),
            authors: Vec::new(),
            r#abstract: String::new(),
            categories: Vec::new(),
            published: DateTime::<Utc>::UNIX_EPOCH,
            updated: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Set authors
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.r#abstract = text.into();
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

    /// Set the published timestamp (also used as `updated` if that was never set)
    pub fn published(mut self, published: DateTime<Utc>) -> Self {
        if self.updated == DateTime::<Utc>::UNIX_EPOCH {
            self.updated = published;
        }
        self.published = published;
        self
    }

    /// Set the updated timestamp
    pub fn updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = updated;
        self
    }

    /// Set PDF URL
    pub fn pdf_url(mut self, url: impl Into<String>) -> Self {
        self.pdf_url = url.into();
        self
    }

    /// Build the tool-facing summary with a 1-based index
    pub fn summary(&self, index: usize) -> PaperSummary {
        let r#abstract = if self.r#abstract.chars().count() > SUMMARY_ABSTRACT_CHARS {
            let head: String = self.r#abstract.chars().take(SUMMARY_ABSTRACT_CHARS).collect();
            format!("{}...", head)
        } else {
            self.r#abstract.clone()
        };

        PaperSummary {
            index,
            arxiv_id: self.arxiv_id.clone(),
            title: self.title.clone(),
            authors: self.authors.clone(),
            r#abstract,
            categories: self.categories.clone(),
            published: self.published.to_rfc3339(),
            updated: self.updated.to_rfc3339(),
            pdf_url: self.pdf_url.clone(),
        }
    }
}

/// Compact paper representation returned by the search tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSummary {
    /// 1-based position in the result list, used by `search_and_download`
    pub index: usize,
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub r#abstract: String,
    pub categories: Vec<String>,
    pub published: String,
    pub updated: String,
    pub pdf_url: String,
}
