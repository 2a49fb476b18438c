//! Basic usage example for the arXiv assistant library.
//!
//! Parses a natural language request, shows the arXiv query it becomes, and
//! runs the search against the live arXiv API. Set `OPENAI_API_KEY` to let
//! the language model interpret the request; without it the rule-based
//! parser is used.

use arxiv_assistant::config::get_config;
use arxiv_assistant::ArxivAssistant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = get_config()?;
    let assistant = ArxivAssistant::from_config(&config)?;

    let request = "quantum error correction papers published after January 2024";

    let result = assistant.search(request, 5, true).await?;
    println!("Request:     {}", request);
    if let Some(parsed) = &result.parsed_query {
        println!("Parsed:      {:?}", parsed);
    }
    println!("arXiv query: {}\n", result.engine_query);
    println!("Found {} papers:", result.total_results());

    for (i, paper) in result.papers.iter().enumerate() {
        println!(
            "{}. {} [{}] ({})",
            i + 1,
            paper.title,
            paper.arxiv_id,
            paper.published.format("%Y-%m-%d")
        );
        println!("   {}", paper.authors.join(", "));
    }

    Ok(())
}
