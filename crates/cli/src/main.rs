//! # taxbot: Indonesian tax-law chatbot and dataset tooling
//!
//! This is the main entry point for the `taxbot` command-line interface.

mod batch;
mod chat;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "taxbot.log";

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a YAML configuration file (defaults to ./config.yml when present)
    #[arg(long, global = true, env = "TAXBOT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive chatbot
    Chat,
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
    },
    /// Split, embed and store the law corpus
    Ingest,
    /// Preview stored chunks and export them all to a file
    Dump,
    /// Merge every JSON / JSON Lines file in a directory into one file
    Merge,
    /// Normalise Pasal, Sumber and Isi fields of extracted law records
    Clean,
    /// Generate synthetic questions and answers from law records
    Synth,
    /// Generate questions from sliding windows of stored chunks
    WindowQuestions,
    /// Randomly select questions for answer sampling
    Select,
    /// Sample several answers per selected question
    Answers,
    /// Collect pairwise preferences between sampled answers
    Pair,
    /// Label sampled answers as good or bad
    Label,
    /// Convert synthetic Q&A records into chat-format training data
    Convert,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Chat => "Chat",
            Commands::Ask { .. } => "Ask",
            Commands::Ingest => "Ingest",
            Commands::Dump => "Dump",
            Commands::Merge => "Merge",
            Commands::Clean => "Clean",
            Commands::Synth => "Synth",
            Commands::WindowQuestions => "Window questions",
            Commands::Select => "Select",
            Commands::Answers => "Answers",
            Commands::Pair => "Pair",
            Commands::Label => "Label",
            Commands::Convert => "Convert",
        }
    }
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Log to a file so the chat output stays clean. Earlier runs are kept.
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)?;
    let subscriber = fmt::Subscriber::builder()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(e) = run(&cli).await {
        eprintln!("{} failed: {e:#}", cli.command.name());
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = config::get_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Chat => chat::run_chat(&config).await,
        Commands::Ask { question } => chat::run_ask(&config, question).await,
        Commands::Ingest => batch::handle_ingest(&config).await,
        Commands::Dump => batch::handle_dump(&config).await,
        Commands::Merge => batch::handle_merge(&config),
        Commands::Clean => batch::handle_clean(&config),
        Commands::Synth => batch::handle_synth(&config).await,
        Commands::WindowQuestions => batch::handle_window_questions(&config).await,
        Commands::Select => batch::handle_select(&config),
        Commands::Answers => batch::handle_answers(&config).await,
        Commands::Pair => batch::handle_pair(&config),
        Commands::Label => batch::handle_label(&config),
        Commands::Convert => batch::handle_convert(&config),
    }
}
