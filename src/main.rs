use anyhow::Result;
use arxiv_assistant::assistant::ArxivAssistant;
use arxiv_assistant::config::{resolve_config, Config};
use arxiv_assistant::mcp::server::McpServer;
use arxiv_assistant::models::{
    BatchDownloadResult, DownloadResult, DownloadStats, PaperInfo, StructuredQuery,
};
use arxiv_assistant::query::{build_query_string, RuleBasedParser};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// arXiv Assistant - Search and download arXiv papers with natural language queries
#[derive(Parser, Debug)]
#[command(name = "arxiv-assistant")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search and download arXiv papers with natural language queries", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search arXiv with a natural language query
    #[command(alias = "s")]
    Search {
        /// Natural language request, or an arXiv query string with --raw
        query: String,

        /// Maximum number of results [default: arxiv.default_max_results]
        #[arg(long, short)]
        max_results: Option<u32>,

        /// Send the query to arXiv verbatim
        #[arg(long)]
        raw: bool,
    },

    /// Show how a query is interpreted, without searching
    Parse {
        /// Natural language request
        query: String,

        /// Skip the LLM tier
        #[arg(long)]
        rules_only: bool,
    },

    /// Download a paper by arXiv ID
    #[command(alias = "d")]
    Download {
        /// arXiv identifier (e.g. 2312.01234)
        arxiv_id: String,

        /// Download directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Download several papers, pausing between each
    BatchDownload {
        /// arXiv identifiers
        #[arg(required = true)]
        arxiv_ids: Vec<String>,

        /// Download directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show statistics about downloaded papers
    Stats,

    /// Run the MCP server
    Serve {
        /// Run in streamable HTTP mode instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    // stdout carries MCP frames in stdio mode, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("arxiv_assistant={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(cli.config.as_deref())?;
    let format = cli.output.resolve();

    match cli.command {
        Some(Commands::Search {
            query,
            max_results,
            raw,
        }) => {
            let assistant = ArxivAssistant::from_config(&config)?;
            let max_results = max_results.unwrap_or_else(|| assistant.default_max_results());
            let result = assistant.search(&query, max_results, !raw).await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if !cli.quiet {
                    println!("Query: {}", result.engine_query);
                    println!("Found {} papers", result.total_results());
                    println!();
                }
                output_papers(&result.papers, format);
            }
        }

        Some(Commands::Parse { query, rules_only }) => {
            let parsed = if rules_only {
                RuleBasedParser::parse_simple(&query)
            } else {
                let assistant = ArxivAssistant::from_config(&config)?;
                assistant
                    .pipeline()
                    .parse_with_ceiling(&query, assistant.max_results_ceiling())
                    .await
            };
            output_parsed(&parsed, format)?;
        }

        Some(Commands::Download { arxiv_id, dir }) => {
            let assistant = ArxivAssistant::from_config(&config)?;
            let result = assistant.download_by_id(&arxiv_id, dir.as_deref()).await;
            output_downloads(std::slice::from_ref(&result), format)?;
            if !result.success {
                std::process::exit(1);
            }
        }

        Some(Commands::BatchDownload { arxiv_ids, dir }) => {
            let assistant = ArxivAssistant::from_config(&config)?;
            let batch = assistant.batch_download(&arxiv_ids, dir.as_deref()).await?;
            output_batch(&batch, format, cli.quiet)?;
        }

        Some(Commands::Stats) => {
            let assistant = ArxivAssistant::from_config(&config)?;
            let stats = assistant.stats().await?;
            output_stats(&stats, format)?;
        }

        Some(Commands::Serve { http, port, host }) => {
            let assistant = Arc::new(ArxivAssistant::from_config(&config)?);
            let server = McpServer::new(assistant)?;

            if http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                // Wait for the server to finish
                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        Some(Commands::Config) => {
            print_config(&config)?;
        }

        None => {
            // No command provided - show help
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  search <query>        - Search arXiv in natural language");
            println!("  parse <query>         - Show how a query is interpreted");
            println!("  download <id>         - Download a paper");
            println!("  batch-download <ids>  - Download several papers");
            println!("  stats                 - Show download statistics");
            println!("  serve                 - Run MCP server");
        }
    }

    Ok(())
}

fn print_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Shorten to `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn output_papers(papers: &[PaperInfo], format: OutputFormat) {
    match format {
        OutputFormat::Plain => {
            for (i, paper) in papers.iter().enumerate() {
                println!("{}. {} [{}]", i + 1, paper.title, paper.arxiv_id);
                println!("   Authors: {}", paper.authors.join(", "));
                println!("   Published: {}", paper.published.format("%Y-%m-%d"));
                println!("   Categories: {}", paper.categories.join(", "));
                println!("   PDF: {}", paper.pdf_url);
                println!();
            }
        }
        _ => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["#", "arXiv ID", "Title", "Authors", "Published"]);

            for (i, paper) in papers.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&paper.arxiv_id),
                    Cell::new(truncate(&paper.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(truncate(&paper.authors.join(", "), 30)),
                    Cell::new(paper.published.format("%Y-%m-%d")),
                ]);
            }
            println!("{table}");
        }
    }
}

fn output_parsed(parsed: &StructuredQuery, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(parsed)?);
        return Ok(());
    }

    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    let rows = [
        ("Keywords", parsed.keywords.join(", ")),
        ("Title", parsed.title.clone().unwrap_or_default()),
        ("Author", parsed.author.clone().unwrap_or_default()),
        ("Abstract", parsed.r#abstract.clone().unwrap_or_default()),
        ("Categories", parsed.categories.join(", ")),
        ("From", date(parsed.date_from)),
        ("To", date(parsed.date_to)),
        ("Max results", parsed.max_results.to_string()),
        ("arXiv query", build_query_string(parsed)),
    ];

    if format == OutputFormat::Plain {
        for (name, value) in rows {
            println!("{}: {}", name, value);
        }
    } else {
        let mut table = comfy_table::Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Field", "Value"]);
        for (name, value) in rows {
            table.add_row(vec![name.to_string(), value]);
        }
        println!("{table}");
    }
    Ok(())
}

fn output_downloads(results: &[DownloadResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Plain => {
            for result in results {
                match &result.error {
                    None => println!("{} -> {}", result.arxiv_id, result.file_path),
                    Some(e) => println!("{} failed: {}", result.arxiv_id, e),
                }
            }
        }
        _ => {
            let mut table = comfy_table::Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["arXiv ID", "Title", "Status"]);
            for result in results {
                let status = match &result.error {
                    None => result.file_path.clone(),
                    Some(e) => format!("FAILED: {}", e),
                };
                table.add_row(vec![
                    result.arxiv_id.clone(),
                    truncate(&result.title, 40),
                    status,
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_batch(batch: &BatchDownloadResult, format: OutputFormat, quiet: bool) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(batch)?);
        return Ok(());
    }

    output_downloads(&batch.results, format)?;
    if !quiet {
        println!(
            "Requested {}, downloaded {}, failed {}",
            batch.total_requested, batch.successful, batch.failed
        );
    }
    Ok(())
}

fn output_stats(stats: &DownloadStats, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("Download directory: {}", stats.download_directory);
    println!("Total papers: {}", stats.total_papers);
    println!("Total size: {:.2} MB", stats.total_size_mb);

    if !stats.organization.is_empty() {
        let mut table = comfy_table::Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Month", "Category", "Papers"]);
        for (month, categories) in &stats.organization {
            for (category, count) in categories {
                table.add_row(vec![month.clone(), category.clone(), count.to_string()]);
            }
        }
        println!("{table}");
    }

    if !stats.recent_downloads.is_empty() {
        println!("Recent downloads:");
        for name in &stats.recent_downloads {
            println!("  {}", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["arxiv-assistant"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["arxiv-assistant", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["arxiv-assistant", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["arxiv-assistant", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);

        let cli = Cli::parse_from(["arxiv-assistant", "--output", "plain"]);
        assert_eq!(cli.output, OutputFormat::Plain);
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::parse_from(["arxiv-assistant", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["arxiv-assistant", "search", "quantum computing after 2024"]);
        match &cli.command {
            Some(Commands::Search {
                query,
                max_results,
                raw,
            }) => {
                assert_eq!(query, "quantum computing after 2024");
                assert_eq!(*max_results, None);
                assert!(!*raw);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_raw() {
        let cli = Cli::parse_from([
            "arxiv-assistant",
            "search",
            "cat:quant-ph AND ti:quantum",
            "--raw",
            "-m",
            "25",
        ]);
        match &cli.command {
            Some(Commands::Search {
                max_results, raw, ..
            }) => {
                assert_eq!(*max_results, Some(25));
                assert!(*raw);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_batch_download_requires_ids() {
        assert!(Cli::try_parse_from(["arxiv-assistant", "batch-download"]).is_err());

        let cli = Cli::parse_from([
            "arxiv-assistant",
            "batch-download",
            "2312.01234",
            "2401.05678",
            "--dir",
            "/tmp/papers",
        ]);
        match &cli.command {
            Some(Commands::BatchDownload { arxiv_ids, dir }) => {
                assert_eq!(arxiv_ids, &vec!["2312.01234", "2401.05678"]);
                assert_eq!(dir.as_deref(), Some(std::path::Path::new("/tmp/papers")));
            }
            _ => panic!("Expected BatchDownload command"),
        }
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["arxiv-assistant", "serve"]);
        match &cli.command {
            Some(Commands::Serve { http, port, host }) => {
                assert!(!*http);
                assert_eq!(*port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Serve command"),
        }

        let cli = Cli::parse_from(["arxiv-assistant", "serve", "--http", "-p", "8080"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Serve {
                http: true,
                port: 8080,
                ..
            })
        ));
    }

    #[test]
    fn test_cli_parse_and_config_commands() {
        let cli = Cli::parse_from(["arxiv-assistant", "parse", "papers by John Smith", "--rules-only"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Parse {
                rules_only: true,
                ..
            })
        ));

        let cli = Cli::parse_from(["arxiv-assistant", "config"]);
        assert!(matches!(cli.command, Some(Commands::Config)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
