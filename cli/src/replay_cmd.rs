use anyhow::Context;
use anyhow::Result;
use owo_colors::OwoColorize;
use quarry_analytics::AnalyticsSummary;
use quarry_core::Quarry;
use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
pub struct ReplayArgs {
    /// File with one query per line; blank lines are skipped
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the analytics summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub(crate) async fn run(quarry: &Quarry, args: ReplayArgs) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match quarry.search(line, None).await {
            Ok(response) => eprintln!(
                "{} {line:?}: {} results in {:.2}ms",
                "✓".bright_green(),
                response.total,
                response.took_ms
            ),
            Err(err) => eprintln!("{} {line:?}: {err}", "✗".bright_red()),
        }
    }

    let summary = quarry.analytics();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &AnalyticsSummary) {
    println!("{}", "Query analytics".bold());
    println!("  total: {}", summary.total_count.to_string().bright_cyan());
    for (event_type, count) in &summary.count_by_type {
        println!("  {event_type}: {count}");
    }
    println!("  average: {:.2}ms", summary.average_elapsed_ms);

    if !summary.top_queries.is_empty() {
        println!("{}", "Top queries".bold());
        for (i, top) in summary.top_queries.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, top.query, top.count);
        }
    }
}
