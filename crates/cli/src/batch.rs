//! Handlers for the batch dataset commands. File paths and models come from the
//! `paths`, `batch` and `*inference` configuration sections.

use crate::{chat::open_store, config::AppConfig};
use anyhow::Result;
use std::{
    io,
    path::Path,
    sync::Arc,
    time::Duration,
};
use taxrag::{
    dataset::{
        answers::{sample_answers, SampledAnswer, SamplingSettings},
        checkpoint::CheckpointWriter,
        clean::clean_file,
        convert::convert_file,
        corpus::{ingest_corpus, TextSplitter},
        export::{export_chunks, preview_chunks},
        io as dataset_io,
        judge::TerminalJudge,
        label::label_answers,
        merge::{merge_directory, MergeOptions},
        pairing::collect_preferences,
        questions::{generate_window_questions, WindowQuestionRecord},
        select::{select_questions, SelectedQuestion},
        synth::{synthesize, SynthSettings},
    },
    errors::PromptError,
    generation::RetryPolicy,
    providers::{
        ai::AiProvider,
        factory::{create_provider, ProviderConfig},
        store::VectorStore,
    },
};
use tracing::info;

/// Creates the engine described by `config` and checks that it is reachable.
async fn connect_engine(config: &ProviderConfig) -> Result<Arc<dyn AiProvider>> {
    let provider = create_provider(config)?;
    match provider.probe().await {
        Ok(status) => {
            info!("Inference engine at {} is up ({status}).", config.api_url);
            Ok(provider)
        }
        Err(e) => Err(PromptError::EngineUnavailable {
            url: config.api_url.clone(),
            reason: e.to_string(),
        }
        .into()),
    }
}

fn retry_policy(config: &AppConfig) -> RetryPolicy {
    RetryPolicy {
        extra_attempts: config.batch.retry_extra_attempts,
        delay: Duration::from_millis(config.batch.retry_delay_ms),
        ..RetryPolicy::default()
    }
}

pub async fn handle_ingest(config: &AppConfig) -> Result<()> {
    let store = open_store(config).await?;
    let splitter = TextSplitter::new(config.batch.chunk_size, config.batch.chunk_overlap);
    let count = ingest_corpus(
        &store,
        Path::new(&config.paths.corpus_dir),
        &splitter,
        config.batch.reset_store,
    )
    .await?;
    println!("Saved {count} chunks to '{}'.", config.store.path);
    Ok(())
}

pub async fn handle_dump(config: &AppConfig) -> Result<()> {
    let store = open_store(config).await?;
    let documents = store.get().await?;
    preview_chunks(&documents, config.batch.preview_chunks, &mut io::stdout().lock())?;

    let output = &config.paths.chunk_export;
    let count = export_chunks(&store, Path::new(output)).await?;
    println!("Exported {count} chunks to '{output}'.");
    Ok(())
}

pub fn handle_merge(config: &AppConfig) -> Result<()> {
    let options = MergeOptions {
        flatten_newlines: config.batch.flatten_newlines,
    };
    let output = &config.paths.merge_output;
    let count = merge_directory(
        Path::new(&config.paths.merge_input_dir),
        Path::new(output),
        &options,
    )?;
    println!("Merged {count} records into '{output}'.");
    Ok(())
}

pub fn handle_clean(config: &AppConfig) -> Result<()> {
    let output = &config.paths.clean_output;
    let count = clean_file(Path::new(&config.paths.clean_input), Path::new(output))?;
    println!("Cleaned {count} records into '{output}'.");
    Ok(())
}

pub async fn handle_synth(config: &AppConfig) -> Result<()> {
    let engine = connect_engine(&config.dataset_inference).await?;
    let records = dataset_io::read_records(Path::new(&config.paths.synth_input))?;
    let mut writer = CheckpointWriter::open(
        Path::new(&config.paths.synth_output),
        config.batch.checkpoint_interval,
    )?;
    let settings = SynthSettings {
        kind: config.batch.synth_kind,
        question_temperature: config.batch.question_temperature,
        answer_temperature: config.batch.answer_temperature,
        retry: retry_policy(config),
        ..SynthSettings::default()
    };

    let pairs = synthesize(
        engine.as_ref(),
        &config.decoding,
        &records,
        &mut writer,
        &settings,
    )
    .await;
    // Keep whatever was buffered even when the loop stopped early.
    let written = writer.finish()?;
    let pairs = pairs?;
    println!(
        "Processed {written} records, {pairs} Q&A pairs saved to '{}'.",
        config.paths.synth_output
    );
    Ok(())
}

pub async fn handle_window_questions(config: &AppConfig) -> Result<()> {
    let engine = connect_engine(&config.dataset_inference).await?;
    let store = open_store(config).await?;
    let documents = store.get().await?;
    println!("Total chunks: {}", documents.len());

    let mut writer = CheckpointWriter::<WindowQuestionRecord>::open(
        Path::new(&config.paths.window_questions),
        config.batch.checkpoint_interval,
    )?;
    let produced = generate_window_questions(
        engine.as_ref(),
        &config.decoding.with_temperature(config.batch.question_temperature),
        &documents,
        &mut writer,
        &retry_policy(config),
    )
    .await;
    writer.finish()?;
    println!(
        "{} windows produced questions, saved to '{}'.",
        produced?, config.paths.window_questions
    );
    Ok(())
}

pub fn handle_select(config: &AppConfig) -> Result<()> {
    let records: Vec<WindowQuestionRecord> =
        dataset_io::read_jsonl(Path::new(&config.paths.window_questions))?;
    let selected = select_questions(
        &records,
        config.batch.questions_per_kind,
        &mut rand::thread_rng(),
    );
    dataset_io::write_jsonl(Path::new(&config.paths.selected_questions), &selected)?;
    println!(
        "Saved {} questions to '{}'.",
        selected.len(),
        config.paths.selected_questions
    );
    Ok(())
}

pub async fn handle_answers(config: &AppConfig) -> Result<()> {
    let engine = connect_engine(&config.inference).await?;
    let store = open_store(config).await?;
    let questions: Vec<SelectedQuestion> =
        dataset_io::read_jsonl(Path::new(&config.paths.selected_questions))?;
    let settings = SamplingSettings {
        answers_per_question: config.batch.answers_per_question,
        top_k: config.retrieval.top_k,
        thresholds: config.thresholds()?,
        ..SamplingSettings::default()
    };

    let written = sample_answers(
        engine.as_ref(),
        &store,
        &config.sampling_decoding,
        &questions,
        Path::new(&config.paths.sampled_answers),
        &settings,
    )
    .await?;
    println!(
        "Saved {written} answers to '{}'.",
        config.paths.sampled_answers
    );
    Ok(())
}

pub fn handle_pair(config: &AppConfig) -> Result<()> {
    let answers: Vec<SampledAnswer> =
        dataset_io::read_jsonl(Path::new(&config.paths.sampled_answers))?;
    let stdin = io::stdin();
    let mut judge = TerminalJudge::new(stdin.lock(), io::stdout());
    let decided = collect_preferences(&answers, Path::new(&config.paths.pairs_output), &mut judge)?;
    println!(
        "Recorded {decided} decisions in '{}'.",
        config.paths.pairs_output
    );
    Ok(())
}

pub fn handle_label(config: &AppConfig) -> Result<()> {
    let mut answers: Vec<SampledAnswer> = Vec::new();
    for path in &config.paths.label_inputs {
        answers.extend(dataset_io::read_jsonl::<SampledAnswer>(Path::new(path))?);
    }
    let stdin = io::stdin();
    let mut judge = TerminalJudge::new(stdin.lock(), io::stdout());
    let labelled = label_answers(
        &answers,
        Path::new(&config.paths.label_output),
        config.batch.label_interval,
        &mut judge,
    )?;
    println!(
        "Saved {labelled} labels to '{}'.",
        config.paths.label_output
    );
    Ok(())
}

pub fn handle_convert(config: &AppConfig) -> Result<()> {
    let output = &config.paths.convert_output;
    let count = convert_file(Path::new(&config.paths.convert_input), Path::new(output))?;
    println!("Converted {count} records into '{output}'.");
    Ok(())
}
