//! The interactive chatbot and the one-shot `ask` command.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, BufRead, Write},
    path::Path,
    sync::Arc,
    time::Instant,
};
use taxrag::{
    providers::{
        ai::HttpEmbedder,
        factory::create_provider,
        store::SqliteStore,
    },
    AnswerMode, ChatTurn, TaxBot, TaxBotBuilder,
};
use tracing::{error, info};

/// Opens the law-chunk store described by `config`, creating its directory if needed.
pub async fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    if let Some(parent) = Path::new(&config.store.path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory '{}'", parent.display()))?;
        }
    }
    let embedder = HttpEmbedder::new(
        config.embedding.api_url.clone(),
        config.embedding.model_name.clone(),
        config.embedding.api_key.clone(),
    )?;
    Ok(SqliteStore::open(&config.store.path, Arc::new(embedder)).await?)
}

/// Builds the chatbot from configuration.
pub async fn build_bot(config: &AppConfig) -> Result<TaxBot> {
    let store = open_store(config).await?;
    let provider = create_provider(&config.inference)?;
    Ok(TaxBotBuilder::new()
        .ai_provider(provider)
        .store(Arc::new(store))
        .top_k(config.retrieval.top_k)
        .thresholds(config.thresholds()?)
        .decoding(config.decoding)
        .build()?)
}

fn print_turn(out: &mut impl Write, turn: &ChatTurn) -> io::Result<()> {
    if turn.mode == AnswerMode::None {
        writeln!(out, "{}", turn.answer.text)
    } else {
        writeln!(out, "=== Chatbot Response ===")?;
        writeln!(out, "{}", turn.answer.text)
    }
}

/// Runs the read-answer loop until `exit`, `quit` or end of input.
pub async fn repl<R: BufRead, W: Write>(bot: &TaxBot, mut input: R, mut out: W) -> Result<()> {
    loop {
        write!(out, "User: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            writeln!(out, "Bye!")?;
            return Ok(());
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            writeln!(out, "Bye!")?;
            return Ok(());
        }

        let start = Instant::now();
        match bot.answer(question).await {
            Ok(turn) => print_turn(&mut out, &turn)?,
            Err(e) => {
                error!("Turn failed: {e}");
                writeln!(out, "Error: {e}")?;
            }
        }
        writeln!(
            out,
            "Total Runtime : {:.2} detik",
            start.elapsed().as_secs_f64()
        )?;
    }
}

pub async fn run_chat(config: &AppConfig) -> Result<()> {
    let bot = build_bot(config).await?;
    info!("Chatbot ready.");
    let stdin = io::stdin();
    let result = repl(&bot, stdin.lock(), io::stdout()).await;
    bot.close();
    result
}

pub async fn run_ask(config: &AppConfig, question: &str) -> Result<()> {
    let bot = build_bot(config).await?;
    let start = Instant::now();
    let turn = bot.answer(question).await?;
    let mut out = io::stdout();
    print_turn(&mut out, &turn)?;
    for source in &turn.sources {
        writeln!(out, "Sumber: {source}")?;
    }
    writeln!(
        out,
        "Total Runtime : {:.2} detik",
        start.elapsed().as_secs_f64()
    )?;
    bot.close();
    Ok(())
}
