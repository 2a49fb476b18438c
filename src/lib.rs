//! # arXiv Assistant
//!
//! A Model Context Protocol (MCP) server and CLI for searching and
//! downloading arXiv papers with natural language queries.
//!
//! ## Architecture
//!
//! - [`query`]: natural language parsing (LLM tier with rule-based fallback)
//!   and arXiv query-string construction
//! - [`models`]: structured queries, paper records and download results
//! - [`sources`]: the arXiv export API client behind the [`PaperSource`] trait
//! - [`store`]: organized on-disk PDF storage and statistics
//! - [`assistant`]: the search/download service used by tools and CLI
//! - [`mcp`]: MCP protocol implementation and server
//! - [`config`]: configuration management
//! - [`utils`]: HTTP client and input validation

pub mod assistant;
pub mod config;
pub mod mcp;
pub mod models;
pub mod query;
pub mod sources;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use assistant::{ArxivAssistant, AssistantError};
pub use models::{PaperInfo, StructuredQuery};
pub use query::QueryParsingPipeline;
pub use sources::{ArxivSource, PaperSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
