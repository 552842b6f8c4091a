//! UQA CLI - Command-line interface
//!
//! Usage:
//!   uqa ask <question> [--id <id>]
//!   uqa config

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use uqa_core::{config::AppConfig, PredictionRequest, RequestId};
use uqa_rag::PredictionPipeline;

#[derive(Parser)]
#[command(name = "uqa")]
#[command(about = "ITMO University question answering CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a multiple-choice question and print the prediction as JSON
    Ask {
        /// Question with enumerated options; `-` reads it from stdin
        question: String,

        /// Request identifier echoed in the output
        #[arg(long, default_value = "1")]
        id: String,
    },
    /// Print the effective configuration with secrets masked
    Config,
}

/// Numeric ids stay numbers, anything else is kept as text
fn parse_id(raw: &str) -> RequestId {
    raw.parse::<i64>()
        .map(RequestId::from)
        .unwrap_or_else(|_| RequestId::Text(raw.to_string()))
}

fn read_question(arg: String) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read question from stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Ask { question, id } => {
            let request = PredictionRequest::new(parse_id(&id), read_question(question)?);
            let pipeline = PredictionPipeline::from_config(&config);
            let response = pipeline.predict(&request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}
