//! Question extraction from free-form model output, and the sliding-window question
//! generator that feeds preference data collection.

use super::{checkpoint::CheckpointWriter, DatasetError};
use crate::{
    generation::{render_prompt, RetryPolicy},
    prompts::dataset::WINDOW_QUESTION_PROMPT,
    providers::ai::AiProvider,
    types::{DecodingConfig, StoredDocument},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Chunks joined into one window.
pub const WINDOW_SIZE: usize = 3;
/// Windows shorter than this are skipped.
pub const MIN_WINDOW_CHARS: usize = 100;
/// Windows are truncated to this many characters.
pub const MAX_WINDOW_CHARS: usize = 2000;

struct QuestionPatterns {
    numbered: Regex,
    bullet: Regex,
}

fn patterns() -> Option<&'static QuestionPatterns> {
    static PATTERNS: OnceLock<Option<QuestionPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(QuestionPatterns {
                numbered: Regex::new(r"^\s*(\d+)[.)]\s*(.+\?)\s*$").ok()?,
                bullet: Regex::new(r"^\s*[\d\-*•]+[.)]\s*").ok()?,
            })
        })
        .as_ref()
}

/// Extracts up to `limit` questions from a numbered list.
///
/// Lines like `1. Apa itu pajak?` are taken first; any other line ending in `?` is
/// accepted with its bullet stripped when longer than ten characters.
pub fn extract_numbered_questions(raw: &str, limit: usize) -> Vec<String> {
    let Some(p) = patterns() else {
        return Vec::new();
    };
    let mut questions = Vec::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = p.numbered.captures(line) {
            questions.push(caps[2].trim().to_string());
            continue;
        }
        if line.ends_with('?') {
            let question = p.bullet.replace(line, "");
            if question.chars().count() > 10 {
                questions.push(question.into_owned());
            }
        }
    }
    questions.truncate(limit);
    questions
}

/// One specific and one case-study question about a window of chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowQuestions {
    pub specific: String,
    pub case_study: String,
}

/// Parses the `Spesifik: ..` / `Studi Kasus: ..` answer to [`WINDOW_QUESTION_PROMPT`].
///
/// Returns `None` when the model declined or either question is missing.
pub fn parse_window_questions(raw: &str) -> Option<WindowQuestions> {
    if declines_window(raw) {
        return None;
    }
    let mut specific = None;
    let mut case_study = None;
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        let value = || {
            line.split_once(':')
                .map_or(line, |(_, rest)| rest)
                .trim()
                .to_string()
        };
        if lower.starts_with("spesifik") {
            specific = Some(value());
        } else if lower.starts_with("studi") {
            case_study = Some(value());
        }
    }
    match (specific, case_study) {
        (Some(s), Some(c)) if !s.is_empty() && !c.is_empty() => Some(WindowQuestions {
            specific: s,
            case_study: c,
        }),
        _ => None,
    }
}

/// Whether the model answered that the window supports no questions.
pub fn declines_window(raw: &str) -> bool {
    raw.to_lowercase().contains("tidak ada pertanyaan")
}

/// One output line of the window question generator. Windows that produced no
/// questions keep `null` questions so the line count stays equal to windows processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowQuestionRecord {
    pub window_start_chunk: usize,
    pub window_end_chunk: usize,
    pub text: String,
    pub question_spesifik: Option<String>,
    pub question_studi_kasus: Option<String>,
}

/// Joins the window starting at `start` and truncates it. `None` when too short.
pub fn window_text(documents: &[StoredDocument], start: usize) -> Option<String> {
    let end = (start + WINDOW_SIZE).min(documents.len());
    let text = documents[start..end]
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    if text.chars().count() < MIN_WINDOW_CHARS {
        return None;
    }
    Some(text.chars().take(MAX_WINDOW_CHARS).collect())
}

/// Asks for the questions of one window. Engine errors and unparseable output are
/// retried; a decline is accepted as is.
async fn ask_window(
    engine: &dyn AiProvider,
    prompt: &str,
    decoding: &DecodingConfig,
    policy: &RetryPolicy,
    start: usize,
) -> Option<WindowQuestions> {
    let attempts = policy.extra_attempts.saturating_add(1);
    for attempt in 1..=attempts {
        match engine.complete(prompt, decoding).await {
            Ok(raw) => {
                if let Some(questions) = parse_window_questions(&raw) {
                    return Some(questions);
                }
                if declines_window(&raw) {
                    debug!(start, "No questions for window");
                    return None;
                }
                let preview: String = raw.chars().take(100).collect();
                warn!(start, attempt, "Unparseable window questions: {preview}...");
            }
            Err(e) => warn!(start, attempt, "Question generation failed: {e}"),
        }
        if attempt < attempts && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }
    warn!(start, attempts, "Giving up on window");
    None
}

/// Asks `engine` for two questions per window of three consecutive stored chunks,
/// resuming from the windows already in `writer`'s file.
///
/// Returns the number of windows that produced questions this run.
pub async fn generate_window_questions(
    engine: &dyn AiProvider,
    decoding: &DecodingConfig,
    documents: &[StoredDocument],
    writer: &mut CheckpointWriter<WindowQuestionRecord>,
    policy: &RetryPolicy,
) -> Result<usize, DatasetError> {
    let windows = documents.len().saturating_sub(WINDOW_SIZE - 1);
    info!(
        "Generating questions for {windows} windows over {} chunks.",
        documents.len()
    );

    let mut produced = 0;
    for start in writer.resume_offset()..windows {
        let mut record = WindowQuestionRecord {
            window_start_chunk: start,
            window_end_chunk: start + WINDOW_SIZE - 1,
            text: String::new(),
            question_spesifik: None,
            question_studi_kasus: None,
        };

        if let Some(text) = window_text(documents, start) {
            let prompt = render_prompt(None, &WINDOW_QUESTION_PROMPT.replace("{text}", &text));
            record.text = text;
            if let Some(q) = ask_window(engine, &prompt, decoding, policy, start).await {
                record.question_spesifik = Some(q.specific);
                record.question_studi_kasus = Some(q.case_study);
                produced += 1;
            }
            if !policy.delay.is_zero() {
                tokio::time::sleep(policy.delay).await;
            }
        } else {
            debug!(start, "Window too short, skipping");
        }

        writer.push(record)?;
    }

    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_numbered_questions_up_to_limit() {
        let raw = "Berikut pertanyaannya:\n1. Apa itu pajak?\n2) Siapa yang wajib membayar?\n3. Kapan batas waktunya?\n";
        let questions = extract_numbered_questions(raw, 2);
        assert_eq!(questions, vec!["Apa itu pajak?", "Siapa yang wajib membayar?"]);
    }

    #[test]
    fn falls_back_to_lines_ending_in_question_mark() {
        let raw = "- Bagaimana cara menghitung PPh?\nApa?\n";
        assert_eq!(
            extract_numbered_questions(raw, 5),
            vec!["- Bagaimana cara menghitung PPh?"]
        );
        let raw = "-) Bagaimana cara menghitung PPh?";
        assert_eq!(
            extract_numbered_questions(raw, 5),
            vec!["Bagaimana cara menghitung PPh?"]
        );
    }

    #[test]
    fn never_panics_on_garbage() {
        assert!(extract_numbered_questions("", 5).is_empty());
        assert!(extract_numbered_questions("???\n\u{0}\n1.", 5).is_empty());
    }

    #[test]
    fn parses_window_questions() {
        let raw = "Spesifik: Berapa tarif PPN?\nStudi Kasus: Bagaimana jika faktur terlambat?";
        let parsed = parse_window_questions(raw).unwrap();
        assert_eq!(parsed.specific, "Berapa tarif PPN?");
        assert_eq!(parsed.case_study, "Bagaimana jika faktur terlambat?");
        assert!(parse_window_questions("Tidak ada pertanyaan yang bisa diajukan.").is_none());
        assert!(parse_window_questions("Spesifik: Berapa tarif PPN?").is_none());
    }

    #[test]
    fn detects_declined_windows() {
        assert!(declines_window("TIDAK ADA PERTANYAAN."));
        assert!(!declines_window("Spesifik: Berapa tarif PPN?"));
        assert!(!declines_window(""));
    }
}
