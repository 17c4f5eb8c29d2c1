//! Binary good/bad labelling of single answers (KTO-style preference data).

use super::{
    answers::{preference_system_prompt, SampledAnswer},
    checkpoint::CheckpointWriter,
    io,
    judge::{AnswerView, Judge, Rating},
    DatasetError,
};
use crate::providers::ai::chat_template::ChatMessage;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path};
use tracing::info;

/// One labelled example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub prompt: Vec<ChatMessage>,
    pub completion: ChatMessage,
    pub label: bool,
}

impl LabeledExample {
    pub fn new(answer: &SampledAnswer, label: bool) -> Self {
        Self {
            prompt: vec![
                ChatMessage::system(preference_system_prompt(&answer.context, &answer.source)),
                ChatMessage::user(user_turn(&answer.question)),
            ],
            completion: ChatMessage::assistant(answer.answer.clone()),
            label,
        }
    }

    fn key(&self) -> Option<(String, String)> {
        let user = self.prompt.iter().find(|m| m.role == "user")?;
        Some((user.content.clone(), self.completion.content.clone()))
    }
}

fn user_turn(question: &str) -> String {
    format!("Q: {question}\nA:")
}

/// Asks `judge` to rate every answer not yet labelled in `output`. Labels are appended
/// every `interval` examples and once more at the end. Skipped answers are not
/// recorded and come up again on the next run.
///
/// Returns the number of examples labelled this run.
pub fn label_answers(
    answers: &[SampledAnswer],
    output: &Path,
    interval: usize,
    judge: &mut dyn Judge,
) -> Result<usize, DatasetError> {
    let done: HashSet<(String, String)> = io::read_jsonl_or_empty::<LabeledExample>(output)?
        .iter()
        .filter_map(LabeledExample::key)
        .collect();
    info!(
        "Labelling {} answers ({} already labelled).",
        answers.len(),
        done.len()
    );

    let mut writer = CheckpointWriter::open(output, interval)?;
    for (idx, answer) in answers.iter().enumerate() {
        if done.contains(&(user_turn(&answer.question), answer.answer.clone())) {
            continue;
        }
        let view = AnswerView {
            position: idx + 1,
            total: answers.len(),
            context: &answer.context,
            question: &answer.question,
            answer: &answer.answer,
        };
        let label = match judge.rate(&view) {
            Ok(Rating::Good) => true,
            Ok(Rating::Bad) => false,
            Ok(Rating::Skip) => continue,
            Err(e) => {
                writer.flush()?;
                return Err(e);
            }
        };
        writer.push(LabeledExample::new(answer, label))?;
    }

    writer.finish()
}
