//! FleetPulse - Driver Sentiment Engine CLI
//!
//! Runs the asynchronous feedback pipeline over the in-memory backend.
//! Submissions are read as JSON lines from stdin; once the input ends and
//! the queue drains, the aggregate analytics report is printed to stdout.

use clap::{Parser, Subcommand};
use fleetpulse_core::{
    EngineConfig, FeedbackSubmission, LexiconAnalyzer, SentimentAnalyzer, SentimentEngine,
};
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fleetpulse",
    version,
    about = "Driver sentiment engine: scores feedback and tracks per-driver EMA reputation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline over JSON feedback submissions read from stdin,
    /// one object per line, e.g.
    /// {"driverId":"D1","feedbackType":"driver","text":"very rude","rating":1}
    Run,

    /// Score a piece of text with the lexicon analyzer and exit
    Score {
        /// Text to score
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr so the report on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Score { text } => {
            let score = LexiconAnalyzer::new().analyze(&text);
            println!("{score:.1}");
        }
        Command::Run => run_pipeline().await?,
    }
    Ok(())
}

async fn run_pipeline() -> anyhow::Result<()> {
    let config = EngineConfig::from_env()?;
    let engine = SentimentEngine::in_memory(config);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut accepted = 0u64;
    let mut rejected = 0u64;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<FeedbackSubmission>(line) {
            Ok(submission) => match engine.feedback().submit(submission) {
                Ok(_) => accepted += 1,
                Err(e) => {
                    rejected += 1;
                    warn!(error = %e, "submission rejected");
                }
            },
            Err(e) => {
                rejected += 1;
                warn!(error = %e, "malformed submission line");
            }
        }
    }

    engine.wait_until_drained().await;

    let report = engine.metrics().analytics_report().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let stats = engine.queue().stats();
    info!(
        accepted,
        rejected,
        completed = stats.completed,
        failed = stats.failed,
        "pipeline drained"
    );

    engine.shutdown().await;
    Ok(())
}
