//! Configuration management.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults (which consult `OPENAI_API_KEY` and `ARXIV_DOWNLOAD_DIR`), an
//! optional TOML file, and `ARXIV_ASSISTANT_*` environment variables.
//!
//! ```toml
//! [llm]
//! api_key = "sk-..."
//! model = "gpt-4o-mini"
//! base_url = "https://api.openai.com"
//! timeout_secs = 20
//!
//! [arxiv]
//! api_url = "http://export.arxiv.org"
//! max_results_ceiling = 50
//! default_max_results = 10
//!
//! [downloads]
//! default_path = "./downloads"
//! batch_delay_secs = 3
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `ARXIV_ASSISTANT_LLM__MODEL=gpt-4o`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ARXIV_ASSISTANT";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "arxiv-assistant.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Query translation model settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// arXiv API settings
    #[serde(default)]
    pub arxiv: ArxivConfig,

    /// Download settings
    #[serde(default)]
    pub downloads: DownloadConfig,
}

impl Config {
    /// Render as TOML with the API key masked
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if shown.llm.api_key.is_some() {
            shown.llm.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; the LLM tier is disabled without one
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// Base URL, without the `/v1/chat/completions` suffix
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout_secs: 20,
        }
    }
}

/// arXiv API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    /// Export API root
    pub api_url: String,

    /// Upper bound on results for a single search
    pub max_results_ceiling: u32,

    /// Result count when the request names none
    pub default_max_results: u32,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_url: "http://export.arxiv.org".to_string(),
            max_results_ceiling: 50,
            default_max_results: crate::models::DEFAULT_MAX_RESULTS,
        }
    }
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Root of the organized paper store
    pub default_path: PathBuf,

    /// Pause between downloads in a batch, in seconds
    pub batch_delay_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_path: default_download_dir(),
            batch_delay_secs: 3,
        }
    }
}

fn default_download_dir() -> PathBuf {
    std::env::var("ARXIV_DOWNLOAD_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./downloads"))
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Defaults plus environment overrides, no file
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(environment())
        .build()?
        .try_deserialize()
}

/// Resolve the effective configuration
///
/// An explicit path must exist; otherwise the first file found by
/// [`find_config_file`] is used, falling back to [`get_config`].
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config, config::ConfigError> {
    match explicit.map(Path::to_path_buf).or_else(find_config_file) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config(&path)
        }
        None => get_config(),
    }
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("arxiv-assistant").join("config.toml"))
        .filter(|path| path.is_file())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 20);
        assert_eq!(config.arxiv.max_results_ceiling, 50);
        assert_eq!(config.arxiv.default_max_results, 10);
        assert_eq!(config.downloads.batch_delay_secs, 3);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
api_key = "test-key"
model = "gpt-4o"

[arxiv]
max_results_ceiling = 25

[downloads]
default_path = "/tmp/papers"
batch_delay_secs = 0
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com");
        assert_eq!(config.arxiv.max_results_ceiling, 25);
        assert_eq!(config.arxiv.default_max_results, 10);
        assert_eq!(config.downloads.default_path, PathBuf::from("/tmp/papers"));
        assert_eq!(config.downloads.batch_delay_secs, 0);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/arxiv-assistant.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_to_toml_masks_api_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());

        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[llm]"));
        assert!(rendered.contains("max_results_ceiling = 50"));
    }
}
