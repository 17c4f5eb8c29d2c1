//! Conversion of synthetic Q&A records into chat-format training records.

use super::{io, DatasetError};
use crate::{prompts::dataset::TRAINING_SYSTEM_PROMPT, providers::ai::chat_template::ChatMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// An instruction/output pair as produced by synthesis or hand-written datasets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstructionRecord {
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub source: String,
}

fn default_type() -> String {
    "specific".to_string()
}

/// One training record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub messages: Vec<ChatMessage>,
}

/// Builds the system, user and assistant turns for one record. Specific answers get
/// a trailing `Source:` line.
pub fn to_chat_record(record: &InstructionRecord) -> ChatRecord {
    let system = TRAINING_SYSTEM_PROMPT.replace("{type}", &record.kind);
    let assistant = if record.kind == "specific" {
        format!("{}\nSource: {}", record.output, record.source)
    } else {
        record.output.clone()
    };
    ChatRecord {
        messages: vec![
            ChatMessage::system(system),
            ChatMessage::user(record.instruction.clone()),
            ChatMessage::assistant(assistant),
        ],
    }
}

/// Expands a raw input line: synthesis output lines carry their pairs in `pairs`,
/// anything else is read as a single instruction record.
fn expand(value: Value) -> Result<Vec<InstructionRecord>, serde_json::Error> {
    match value.get("pairs") {
        Some(Value::Array(pairs)) => pairs
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect(),
        _ => Ok(vec![serde_json::from_value(value)?]),
    }
}

/// Converts every record in `input` and writes JSON Lines to `output`. Returns the
/// number of training records written.
pub fn convert_file(input: &Path, output: &Path) -> Result<usize, DatasetError> {
    let mut records = Vec::new();
    for value in io::read_records(input)? {
        match expand(value) {
            Ok(expanded) => records.extend(expanded.iter().map(to_chat_record)),
            Err(e) => warn!("Skipping record that is not an instruction pair: {e}"),
        }
    }
    io::write_jsonl(output, &records)?;
    info!(
        "Conversion done, saved to '{}', total records: {}",
        output.display(),
        records.len()
    );
    Ok(records.len())
}
