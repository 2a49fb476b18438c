//! Tool handlers backed by the [`ArxivAssistant`].
//!
//! Missing required arguments are reported as tool errors. Failures while
//! running a tool are returned as `{"success": false, "error": ...}` so the
//! client can show them to the user.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use super::tools::ToolHandler;
use crate::assistant::ArxivAssistant;
use crate::models::{
    BatchDownloadResult, DownloadResult, DownloadSelection, DownloadStats, SearchResult,
};

fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing '{}' parameter", name))
}

fn max_results_arg(args: &Value, default: u32) -> u32 {
    args.get("max_results")
        .and_then(|v| v.as_u64())
        .map(|n| n.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(default)
}

fn custom_dir_arg(args: &Value) -> Option<PathBuf> {
    args.get("custom_dir")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

fn search_json(result: &SearchResult) -> Value {
    let papers: Vec<_> = result
        .papers
        .iter()
        .enumerate()
        .map(|(i, paper)| paper.summary(i + 1))
        .collect();

    json!({
        "success": true,
        "query": result.query,
        "parsed_query": result.parsed_query,
        "engine_query": result.engine_query,
        "total_results": result.total_results(),
        "papers": papers,
    })
}

fn download_json(result: &DownloadResult) -> Value {
    json!({
        "success": result.success,
        "arxiv_id": result.arxiv_id,
        "title": result.title,
        "file_path": if result.success { Some(&result.file_path) } else { None },
        "error": result.error,
    })
}

fn batch_json(batch: &BatchDownloadResult) -> Value {
    let results: Vec<_> = batch.results.iter().map(download_json).collect();
    json!({
        "success": true,
        "total_requested": batch.total_requested,
        "successful_downloads": batch.successful,
        "failed_downloads": batch.failed,
        "results": results,
    })
}

fn stats_json(stats: &DownloadStats) -> Value {
    json!({
        "success": true,
        "download_directory": stats.download_directory,
        "total_papers": stats.total_papers,
        "total_size_mb": stats.total_size_mb,
        "organization": stats.organization,
        "recent_downloads": stats.recent_downloads,
    })
}

/// Handler for `search_arxiv`
#[derive(Debug)]
pub struct SearchArxivHandler {
    pub assistant: Arc<ArxivAssistant>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchArxivHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let query = required_str(&args, "query")?;
        let max_results = max_results_arg(&args, self.assistant.default_max_results());
        let use_natural_language = args
            .get("use_natural_language")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        match self
            .assistant
            .search(query, max_results, use_natural_language)
            .await
        {
            Ok(result) => Ok(search_json(&result)),
            Err(e) => Ok(json!({
                "success": false,
                "error": e.to_string(),
                "query": query,
            })),
        }
    }
}

/// Handler for `download_paper`
#[derive(Debug)]
pub struct DownloadPaperHandler {
    pub assistant: Arc<ArxivAssistant>,
}

#[async_trait::async_trait]
impl ToolHandler for DownloadPaperHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let arxiv_id = required_str(&args, "arxiv_id")?;
        let custom_dir = custom_dir_arg(&args);

        let result = self
            .assistant
            .download_by_id(arxiv_id, custom_dir.as_deref())
            .await;

        Ok(download_json(&result))
    }
}

/// Handler for `batch_download`
#[derive(Debug)]
pub struct BatchDownloadHandler {
    pub assistant: Arc<ArxivAssistant>,
}

#[async_trait::async_trait]
impl ToolHandler for BatchDownloadHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let arxiv_ids: Vec<String> = args
            .get("arxiv_ids")
            .and_then(|v| v.as_array())
            .ok_or("Missing 'arxiv_ids' parameter")?
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect();
        let custom_dir = custom_dir_arg(&args);

        match self
            .assistant
            .batch_download(&arxiv_ids, custom_dir.as_deref())
            .await
        {
            Ok(batch) => Ok(batch_json(&batch)),
            Err(e) => Ok(json!({
                "success": false,
                "error": e.to_string(),
                "requested_ids": arxiv_ids,
            })),
        }
    }
}

/// Handler for `search_and_download`
#[derive(Debug)]
pub struct SearchAndDownloadHandler {
    pub assistant: Arc<ArxivAssistant>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchAndDownloadHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let query = required_str(&args, "query")?;
        let max_results = max_results_arg(&args, self.assistant.default_max_results());
        let custom_dir = custom_dir_arg(&args);

        let download_all = args
            .get("download_all")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let indices: Option<Vec<usize>> = args.get("indices").and_then(|v| v.as_array()).map(|a| {
            a.iter()
                .filter_map(|v| v.as_u64())
                .map(|i| i as usize)
                .collect()
        });

        let selection = match (download_all, indices) {
            (true, _) => DownloadSelection::All,
            (false, Some(indices)) if !indices.is_empty() => DownloadSelection::Indices(indices),
            _ => DownloadSelection::None,
        };

        match self
            .assistant
            .search_and_download(query, selection, max_results, custom_dir.as_deref())
            .await
        {
            Ok(outcome) => {
                let mut response = json!({
                    "success": true,
                    "message": outcome.message,
                    "search_result": search_json(&outcome.search),
                });
                if let Some(download) = &outcome.download {
                    response["download_result"] = batch_json(download);
                }
                Ok(response)
            }
            Err(e) => Ok(json!({
                "success": false,
                "error": e.to_string(),
                "query": query,
            })),
        }
    }
}

/// Handler for `get_download_stats`
#[derive(Debug)]
pub struct DownloadStatsHandler {
    pub assistant: Arc<ArxivAssistant>,
}

#[async_trait::async_trait]
impl ToolHandler for DownloadStatsHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        match self.assistant.stats().await {
            Ok(stats) => Ok(stats_json(&stats)),
            Err(e) => Ok(json!({
                "success": false,
                "error": e.to_string(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_results_arg() {
        assert_eq!(max_results_arg(&json!({}), 10), 10);
        assert_eq!(max_results_arg(&json!({}), 4), 4);
        assert_eq!(max_results_arg(&json!({"max_results": 25}), 4), 25);
        assert_eq!(max_results_arg(&json!({"max_results": -3}), 10), 10);
        assert_eq!(max_results_arg(&json!({"max_results": "7"}), 10), 10);
    }

    #[test]
    fn test_custom_dir_arg() {
        assert_eq!(custom_dir_arg(&json!({})), None);
        assert_eq!(custom_dir_arg(&json!({"custom_dir": "  "})), None);
        assert_eq!(
            custom_dir_arg(&json!({"custom_dir": "/tmp/papers"})),
            Some(PathBuf::from("/tmp/papers"))
        );
    }

    #[test]
    fn test_download_json_hides_path_on_failure() {
        let failed = DownloadResult::error("2401.00001", "", "boom");
        let value = download_json(&failed);
        assert_eq!(value["success"], false);
        assert!(value["file_path"].is_null());
        assert_eq!(value["error"], "boom");
    }
}
