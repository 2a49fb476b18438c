//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::handlers::{
    BatchDownloadHandler, DownloadPaperHandler, DownloadStatsHandler, SearchAndDownloadHandler,
    SearchArxivHandler,
};
use crate::assistant::ArxivAssistant;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_arxiv")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry holding the arXiv search and download tools
    pub fn new(assistant: Arc<ArxivAssistant>) -> Self {
        let mut registry = Self::default();
        registry.register_arxiv_tools(&assistant);
        registry
    }

    fn register_arxiv_tools(&mut self, assistant: &Arc<ArxivAssistant>) {
        let ceiling = assistant.max_results_ceiling();
        let default_max_results = assistant.default_max_results();

        self.register(Tool {
            name: "search_arxiv".to_string(),
            description: "Search arXiv papers using natural language (e.g. \"combinatorics papers \
                          after December 2024\") or an arXiv query string (e.g. \
                          \"cat:quant-ph AND ti:quantum\"). Results are newest first and carry a \
                          1-based index for search_and_download."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural language request or arXiv query string"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": format!("Maximum number of results (max {})", ceiling),
                        "default": default_max_results
                    },
                    "use_natural_language": {
                        "type": "boolean",
                        "description": "Parse the query as natural language; false sends it to arXiv verbatim",
                        "default": true
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchArxivHandler {
                assistant: assistant.clone(),
            }),
        });

        self.register(Tool {
            name: "download_paper".to_string(),
            description: "Download a paper PDF by its arXiv ID (e.g. \"2312.01234\" or \
                          \"math.CO/0601001\")"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "arxiv_id": {
                        "type": "string",
                        "description": "arXiv identifier, with or without version"
                    },
                    "custom_dir": {
                        "type": "string",
                        "description": "Download directory (defaults to the configured one)"
                    }
                },
                "required": ["arxiv_id"]
            }),
            handler: Arc::new(DownloadPaperHandler {
                assistant: assistant.clone(),
            }),
        });

        self.register(Tool {
            name: "batch_download".to_string(),
            description: "Download several papers by arXiv ID, pausing between downloads"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "arxiv_ids": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "arXiv identifiers"
                    },
                    "custom_dir": {
                        "type": "string",
                        "description": "Download directory (defaults to the configured one)"
                    }
                },
                "required": ["arxiv_ids"]
            }),
            handler: Arc::new(BatchDownloadHandler {
                assistant: assistant.clone(),
            }),
        });

        self.register(Tool {
            name: "search_and_download".to_string(),
            description: "Search arXiv with a natural language query and download the selected \
                          results"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural language search query"
                    },
                    "indices": {
                        "type": "array",
                        "items": { "type": "integer" },
                        "description": "1-based indices of results to download, e.g. [1, 3, 5]"
                    },
                    "download_all": {
                        "type": "boolean",
                        "description": "Download every result",
                        "default": false
                    },
                    "max_results": {
                        "type": "integer",
                        "description": format!("Maximum number of search results (max {})", ceiling),
                        "default": default_max_results
                    },
                    "custom_dir": {
                        "type": "string",
                        "description": "Download directory (defaults to the configured one)"
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchAndDownloadHandler {
                assistant: assistant.clone(),
            }),
        });

        self.register(Tool {
            name: "get_download_stats".to_string(),
            description: "Statistics about downloaded papers: count, size and layout by month \
                          and category"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(DownloadStatsHandler {
                assistant: assistant.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, sorted by name
    pub fn all(&self) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParsingPipeline;
    use crate::sources::MockSource;
    use crate::store::PaperStore;

    fn registry() -> ToolRegistry {
        let assistant = ArxivAssistant::new(
            QueryParsingPipeline::rule_based(),
            Arc::new(MockSource::new()),
            PaperStore::new("./downloads"),
        );
        ToolRegistry::new(Arc::new(assistant))
    }

    #[test]
    fn test_registry_has_five_tools() {
        let registry = registry();
        let names: Vec<_> = registry.all().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "batch_download",
                "download_paper",
                "get_download_stats",
                "search_and_download",
                "search_arxiv"
            ]
        );
    }

    #[test]
    fn test_schemas_declare_required_arguments() {
        let registry = registry();
        let search = registry.get("search_arxiv").unwrap();
        assert_eq!(search.input_schema["required"], serde_json::json!(["query"]));
        assert_eq!(
            search.input_schema["properties"]["max_results"]["description"],
            "Maximum number of results (max 50)"
        );
    }

    #[tokio::test]
    async fn test_missing_arguments_are_errors() {
        let registry = registry();
        let args = serde_json::json!({});

        for name in ["search_arxiv", "download_paper", "batch_download", "search_and_download"] {
            let err = registry.execute(name, args.clone()).await.unwrap_err();
            assert!(err.starts_with("Missing '"), "{}: {}", name, err);
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = registry()
            .execute("read_paper", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, "Tool 'read_paper' not found");
    }
}
