//! Synthetic question and answer generation from law records.
//!
//! Each input record yields exactly one output line, so a restarted run resumes at the
//! line count of the output file.

use super::{checkpoint::CheckpointWriter, questions::extract_numbered_questions, DatasetError};
use crate::{
    generation::{complete_with_retry, render_prompt, RetryPolicy},
    prompts::dataset::{
        ANSWER_COMPLEX_PROMPT, ANSWER_SPECIFIC_PROMPT, QUESTION_COMPLEX_PROMPT,
        QUESTION_SPECIFIC_PROMPT,
    },
    providers::ai::AiProvider,
    types::DecodingConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

/// Whether a synthetic pair targets a single paragraph or a whole article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Specific,
    Complex,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuestionKind::Specific => "specific",
            QuestionKind::Complex => "complex",
        })
    }
}

impl QuestionKind {
    fn question_template(self) -> &'static str {
        match self {
            QuestionKind::Specific => QUESTION_SPECIFIC_PROMPT,
            QuestionKind::Complex => QUESTION_COMPLEX_PROMPT,
        }
    }

    fn answer_template(self) -> &'static str {
        match self {
            QuestionKind::Specific => ANSWER_SPECIFIC_PROMPT,
            QuestionKind::Complex => ANSWER_COMPLEX_PROMPT,
        }
    }
}

/// One synthetic training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub instruction: String,
    pub output: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthStatus {
    Ok,
    /// The record had no text.
    Skipped,
    /// No questions could be extracted.
    Failed,
}

/// The output line for one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthRecord {
    pub index: usize,
    pub source: String,
    pub status: SynthStatus,
    pub pairs: Vec<QaPair>,
}

#[derive(Debug, Clone)]
pub struct SynthSettings {
    pub kind: QuestionKind,
    pub questions_per_record: usize,
    pub question_temperature: f32,
    pub answer_temperature: f32,
    pub retry: RetryPolicy,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            kind: QuestionKind::Specific,
            questions_per_record: 5,
            question_temperature: 0.9,
            answer_temperature: 0.2,
            retry: RetryPolicy::default(),
        }
    }
}

/// Reads a string field under either of its spellings (`isi` / `Isi`).
fn field<'a>(record: &'a Value, lower: &str, upper: &str) -> &'a str {
    record
        .get(lower)
        .or_else(|| record.get(upper))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Asks for questions about `isi`, retrying until at least one can be extracted.
pub async fn generate_questions(
    engine: &dyn AiProvider,
    decoding: &DecodingConfig,
    isi: &str,
    settings: &SynthSettings,
) -> Vec<String> {
    let prompt = render_prompt(None, &settings.kind.question_template().replace("{isi}", isi));
    let decoding = decoding.with_temperature(settings.question_temperature);
    let attempts = settings.retry.extra_attempts.saturating_add(1);

    for attempt in 1..=attempts {
        match engine.complete(&prompt, &decoding).await {
            Ok(raw) => {
                let questions = extract_numbered_questions(&raw, settings.questions_per_record);
                if !questions.is_empty() {
                    return questions;
                }
                let preview: String = raw.chars().take(100).collect();
                warn!(attempt, "No questions extracted from: {preview}...");
            }
            Err(e) => warn!(attempt, "Question generation failed: {e}"),
        }
        if attempt < attempts && !settings.retry.delay.is_zero() {
            tokio::time::sleep(settings.retry.delay).await;
        }
    }
    Vec::new()
}

/// Generates questions and answers for one law record.
pub async fn synthesize_record(
    engine: &dyn AiProvider,
    decoding: &DecodingConfig,
    index: usize,
    record: &Value,
    settings: &SynthSettings,
) -> SynthRecord {
    let isi = field(record, "isi", "Isi").trim();
    let sumber = field(record, "sumber", "Sumber").trim().to_string();
    let mut out = SynthRecord {
        index,
        source: sumber.clone(),
        status: SynthStatus::Skipped,
        pairs: Vec::new(),
    };
    if isi.is_empty() {
        warn!(index, "Empty text, skipping record");
        return out;
    }

    let questions = generate_questions(engine, decoding, isi, settings).await;
    if questions.is_empty() {
        out.status = SynthStatus::Failed;
        return out;
    }

    let answer_decoding = decoding.with_temperature(settings.answer_temperature);
    for question in questions {
        let prompt = settings
            .kind
            .answer_template()
            .replace("{sumber}", &sumber)
            .replace("{question}", &question)
            .replace("{isi}", isi);
        let answer = complete_with_retry(
            engine,
            &render_prompt(None, &prompt),
            &answer_decoding,
            &settings.retry,
        )
        .await;
        out.pairs.push(QaPair {
            kind: settings.kind,
            instruction: question,
            output: answer.text,
            source: sumber.clone(),
        });
    }
    out.status = SynthStatus::Ok;
    out
}

/// Runs synthesis over `records`, starting at the writer's resume offset.
///
/// Returns the number of pairs produced this run.
pub async fn synthesize(
    engine: &dyn AiProvider,
    decoding: &DecodingConfig,
    records: &[Value],
    writer: &mut CheckpointWriter<SynthRecord>,
    settings: &SynthSettings,
) -> Result<usize, DatasetError> {
    let start = writer.resume_offset();
    info!(
        "Synthesizing {} pairs for {} records (starting at {start}).",
        settings.kind,
        records.len()
    );

    let mut pairs = 0;
    let mut failed = 0;
    for (index, record) in records.iter().enumerate().skip(start) {
        let out = synthesize_record(engine, decoding, index, record, settings).await;
        if out.status == SynthStatus::Failed {
            failed += 1;
        }
        pairs += out.pairs.len();
        info!(index, source = %out.source, status = ?out.status, pairs = out.pairs.len(), "Processed record");
        writer.push(out)?;
    }

    info!("Synthesis finished: {pairs} pairs, {failed} failed records.");
    Ok(pairs)
}
