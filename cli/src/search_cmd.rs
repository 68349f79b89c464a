use anyhow::Context;
use anyhow::Result;
use owo_colors::OwoColorize;
use quarry_core::Quarry;

#[derive(Debug, clap::Parser)]
pub struct SearchArgs {
    /// Search query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Number of results to return (1-50)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print the response as JSON
    #[arg(long)]
    pub json: bool,
}

pub(crate) async fn run(quarry: &Quarry, args: SearchArgs) -> Result<()> {
    let response = quarry
        .search(&args.query, args.limit)
        .await
        .context("Search failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("{} No results found", "✗".bright_red());
        return Ok(());
    }

    let cached = if response.cache_hit { " (cached)" } else { "" };
    println!(
        "{} Found {} results in {:.2}ms{cached}\n",
        "✓".bright_green(),
        response.total.to_string().bright_cyan(),
        response.took_ms,
    );

    for result in &response.results {
        let candidate = &result.candidate;
        println!(
            "{}. {} {}",
            (result.rank + 1).to_string().bright_yellow(),
            candidate.title.bold(),
            format!("[{}]", candidate.id).dimmed()
        );
        println!("   score: {:.4}", result.fused_score);
        println!("   {}\n", candidate.snippet());
    }

    Ok(())
}
