//! Samples several answers per selected question for preference collection.

use super::{io, select::SelectedQuestion, DatasetError};
use crate::{
    classify::classify,
    generation::generate,
    prompts::dataset::PREFERENCE_SYSTEM_PROMPT,
    providers::{ai::AiProvider, store::VectorStore},
    types::{ConfidenceThresholds, DecodingConfig},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, time::Duration};
use tracing::{info, warn};

/// One sampled answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledAnswer {
    pub context: String,
    pub source: String,
    pub question: String,
    pub answer: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SamplingSettings {
    pub answers_per_question: usize,
    pub top_k: usize,
    pub thresholds: ConfidenceThresholds,
    /// Pause after each question.
    pub delay: Duration,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            answers_per_question: 5,
            top_k: 3,
            thresholds: ConfidenceThresholds::default(),
            delay: Duration::from_millis(1500),
        }
    }
}

/// Fills the preference system prompt with a context and its sources.
pub fn preference_system_prompt(context: &str, source: &str) -> String {
    PREFERENCE_SYSTEM_PROMPT
        .replace("{source}", source)
        .replace("{context}", context)
}

/// Generates answers for every question not yet present in `output` and appends them
/// question by question. Failed generations are logged and left out.
///
/// Returns the number of answers written this run.
pub async fn sample_answers(
    engine: &dyn AiProvider,
    store: &dyn VectorStore,
    decoding: &DecodingConfig,
    questions: &[SelectedQuestion],
    output: &Path,
    settings: &SamplingSettings,
) -> Result<usize, DatasetError> {
    let done: HashSet<String> = io::read_jsonl_or_empty::<SampledAnswer>(output)?
        .into_iter()
        .map(|a| a.question)
        .collect();
    info!(
        "Total questions: {} | already answered: {}",
        questions.len(),
        done.len()
    );

    let mut written = 0;
    for (idx, q) in questions.iter().enumerate() {
        if done.contains(&q.prompt) {
            continue;
        }

        let retrieval = classify(store, &q.prompt, settings.top_k, &settings.thresholds).await?;
        let context = retrieval.combined_context();
        let source = if retrieval.sources.is_empty() {
            "none".to_string()
        } else {
            retrieval.sources.join("; ")
        };
        let system_prompt = preference_system_prompt(&context, &source);

        let mut outputs = Vec::with_capacity(settings.answers_per_question);
        for i in 0..settings.answers_per_question {
            match generate(engine, decoding, &system_prompt, &q.prompt).await {
                Ok(answer) => outputs.push(SampledAnswer {
                    context: context.clone(),
                    source: source.clone(),
                    question: q.prompt.clone(),
                    answer: answer.text,
                    model: engine.name().to_string(),
                }),
                Err(e) => warn!(sample = i, "Answer generation failed: {e}"),
            }
        }

        if !outputs.is_empty() {
            io::append_jsonl(output, &outputs)?;
            written += outputs.len();
            info!("Saved {} answers for question {}.", outputs.len(), idx + 1);
        }

        if !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
        }
    }

    Ok(written)
}
