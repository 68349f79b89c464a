mod ask_cmd;
mod benchmark_cmd;
mod replay_cmd;
mod search_cmd;
mod service;

pub use ask_cmd::AskArgs;
pub use benchmark_cmd::BenchmarkArgs;
pub use replay_cmd::ReplayArgs;
pub use search_cmd::SearchArgs;
pub use service::ServiceArgs;

use anyhow::Result;
use clap::Parser;
use clap::Subcommand;

/// Search, benchmark and answer questions over a JSON document corpus.
#[derive(Debug, Parser)]
#[command(name = "quarry", version)]
pub struct QuarryCli {
    #[clap(flatten)]
    pub service: ServiceArgs,

    #[command(subcommand)]
    pub command: QuarryCommand,
}

#[derive(Debug, Subcommand)]
pub enum QuarryCommand {
    /// Hybrid search: vector similarity boosted by keyword matches
    Search(SearchArgs),

    /// Run every retrieval strategy and compare latency and overlap
    Benchmark(BenchmarkArgs),

    /// Answer a question grounded in the most relevant documents
    Ask(AskArgs),

    /// Run each line of a file as a search, then print query analytics
    Replay(ReplayArgs),
}

impl QuarryCli {
    pub async fn run(self) -> Result<()> {
        let quarry = self.service.open().await?;
        match self.command {
            QuarryCommand::Search(args) => search_cmd::run(&quarry, args).await,
            QuarryCommand::Benchmark(args) => benchmark_cmd::run(&quarry, args).await,
            QuarryCommand::Ask(args) => ask_cmd::run(&quarry, args).await,
            QuarryCommand::Replay(args) => replay_cmd::run(&quarry, args).await,
        }
    }
}
