//! Core data models for queries, papers and download operations.

mod paper;
mod query;
mod search;

pub use paper::{PaperInfo, PaperSummary};
pub use query::{StructuredQuery, DEFAULT_MAX_RESULTS};
pub use search::{
    BatchDownloadResult, DownloadResult, DownloadSelection, DownloadStats, SearchAndDownloadResult,
    SearchResult,
};
