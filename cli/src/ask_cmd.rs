use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use owo_colors::OwoColorize;
use quarry_answer::CancellationToken;
use quarry_answer::ChannelSink;
use quarry_answer::StreamOutcome;
use quarry_core::Quarry;
use quarry_protocol::AnswerEvent;
use quarry_protocol::SourceRef;
use std::io::Write;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 64;

#[derive(Debug, clap::Parser)]
pub struct AskArgs {
    /// Question to answer from the corpus
    #[arg(value_name = "QUESTION")]
    pub question: String,

    /// Print tokens as they are generated; Ctrl-C stops generation
    #[arg(long)]
    pub stream: bool,
}

pub(crate) async fn run(quarry: &Quarry, args: AskArgs) -> Result<()> {
    if args.stream {
        return run_stream(quarry, &args.question).await;
    }

    let result = quarry
        .ask(&args.question)
        .await
        .context("Failed to answer")?;

    println!("{}\n", result.answer);
    print_sources(&result.sources);
    println!(
        "{}",
        format!(
            "{} · {} tokens · {:.2}ms",
            result.meta.model, result.meta.tokens_used, result.meta.took_ms
        )
        .dimmed()
    );
    Ok(())
}

async fn run_stream(quarry: &Quarry, question: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let (sink, rx) = ChannelSink::channel(EVENT_BUFFER);
    let ask = async {
        let outcome = quarry.ask_stream(question, &[], &sink, &cancel).await;
        drop(sink);
        outcome
    };
    let (outcome, printed) = tokio::join!(ask, print_events(rx));
    ctrl_c.abort();
    printed?;

    match outcome.context("Failed to answer")? {
        StreamOutcome::Completed { meta, .. } => {
            println!(
                "{}",
                format!(
                    "{} · {} sources · {:.2}ms",
                    meta.model, meta.sources_used, meta.took_ms
                )
                .dimmed()
            );
            Ok(())
        }
        StreamOutcome::Cancelled => {
            eprintln!("{} Generation cancelled", "✗".bright_yellow());
            Ok(())
        }
        StreamOutcome::Failed(err) => bail!("Generation failed: {err}"),
    }
}

async fn print_events(mut rx: mpsc::Receiver<AnswerEvent>) -> Result<()> {
    let mut stdout = std::io::stdout();
    let mut sources = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            AnswerEvent::Sources { sources: refs } => sources = refs,
            AnswerEvent::Token { content } => {
                write!(stdout, "{content}")?;
                stdout.flush()?;
            }
            AnswerEvent::Done { .. } => {
                writeln!(stdout, "\n")?;
                print_sources(&sources);
            }
            AnswerEvent::Error { kind, message } => {
                writeln!(stdout)?;
                eprintln!("{} {kind}: {message}", "✗".bright_red());
            }
        }
    }
    Ok(())
}

fn print_sources(sources: &[SourceRef]) {
    if sources.is_empty() {
        println!("{}", "No sources were found for this question.".dimmed());
        return;
    }
    println!("{}", "Sources:".bold());
    for (i, source) in sources.iter().enumerate() {
        println!(
            "  {}. {} {} ({:.4})",
            i + 1,
            source.title,
            format!("[{}]", source.id).dimmed(),
            source.relevance_score
        );
    }
    println!();
}
