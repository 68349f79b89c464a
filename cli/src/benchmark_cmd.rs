use anyhow::Context;
use anyhow::Result;
use owo_colors::OwoColorize;
use quarry_core::Quarry;
use quarry_protocol::StrategyKind;
use quarry_retrieval::BenchmarkRun;

#[derive(Debug, clap::Parser)]
pub struct BenchmarkArgs {
    /// Query to run through every strategy
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Results per strategy (1-50)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print the full run as JSON
    #[arg(long)]
    pub json: bool,
}

pub(crate) async fn run(quarry: &Quarry, args: BenchmarkArgs) -> Result<()> {
    let run = quarry
        .benchmark(&args.query, args.limit)
        .await
        .context("Benchmark failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    print_reports(&run);
    print_overlap(&run);
    Ok(())
}

fn print_reports(run: &BenchmarkRun) {
    println!(
        "{} Benchmark for {:?} (limit {}, embedding {:.2}ms)\n",
        "▶".bright_blue(),
        run.query,
        run.limit,
        run.summary.total_embedding_ms
    );

    for (report, summary) in run.strategies.iter().zip(&run.summary.methods) {
        let status = if report.is_failure() {
            "✗".bright_red().to_string()
        } else {
            "✓".bright_green().to_string()
        };
        println!("{status} {}", report.method.bold());
        println!("  {}", report.description.dimmed());
        println!(
            "  latency: {:.2}ms  results: {}  avg score: {:.4}",
            summary.latency_ms,
            summary.result_count.to_string().bright_cyan(),
            summary.avg_score
        );
        if let Some(err) = &report.error {
            println!("  {} {err}", "error:".bright_red());
        }
        for result in &report.results {
            println!(
                "    {}. {} ({:.4}) {}",
                result.rank + 1,
                result.candidate.title,
                result.fused_score,
                result.candidate.snippet().dimmed()
            );
        }
        println!();
    }
}

fn print_overlap(run: &BenchmarkRun) {
    println!("{}", "Overlap (% of row results found in column)".bold());
    let header: String = StrategyKind::ALL
        .iter()
        .map(|kind| format!("{:>10}", kind.as_str()))
        .collect();
    println!("{:>10}{header}", "");

    for (row, cells) in run.overlap.rows() {
        let line: String = cells
            .values()
            .map(|cell| format!("{:>9.1}%", cell.pct))
            .collect();
        println!("{:>10}{line}", row.as_str());
    }
}
