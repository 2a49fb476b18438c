//! Utility modules shared by the sources, store and query translator.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and a user agent
//! - [`sanitize_paper_id`]: screen user-supplied arXiv ids
//! - [`sanitize_filename`]: turn titles into safe file stems

mod http;
mod validate;

pub use http::HttpClient;
pub use validate::{sanitize_filename, sanitize_paper_id, ValidationError, MAX_FILENAME_BYTES};
