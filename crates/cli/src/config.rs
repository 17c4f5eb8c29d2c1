//! # Application Configuration
//!
//! Loads the `taxbot` configuration in layers: built-in defaults, then an optional
//! `config.yml` (with `${VAR}` substitution), then `TAXBOT_`-prefixed environment
//! variables such as `TAXBOT_RETRIEVAL__TOP_K=5`.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use taxrag::{
    constants::{
        DEFAULT_COMPLEX_THRESHOLD, DEFAULT_SPECIFIC_THRESHOLD, DEFAULT_STORE_FILE, DEFAULT_TOP_K,
    },
    dataset::synth::QuestionKind,
    errors::PromptError,
    providers::factory::{ProviderConfig, ProviderKind},
    types::{ConfidenceThresholds, DecodingConfig},
};
use thiserror::Error;
use tracing::info;

/// The configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    General(String),
    #[error("{0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    /// The engine serving the fine-tuned chatbot model.
    pub inference: ProviderConfig,
    /// The engine used by the dataset generation commands.
    pub dataset_inference: ProviderConfig,
    pub retrieval: RetrievalConfig,
    /// Decoding of the chatbot and `ask`.
    pub decoding: DecodingConfig,
    /// Decoding of `answers`, sampled more loosely than the chatbot.
    pub sampling_decoding: DecodingConfig,
    pub paths: PathsConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub specific_threshold: f32,
    pub complex_threshold: f32,
}

/// Input and output files of the batch commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of per-paragraph law JSON files for `ingest`.
    pub corpus_dir: String,
    pub merge_input_dir: String,
    pub merge_output: String,
    pub clean_input: String,
    pub clean_output: String,
    pub synth_input: String,
    pub synth_output: String,
    pub window_questions: String,
    pub selected_questions: String,
    pub sampled_answers: String,
    pub pairs_output: String,
    pub label_inputs: Vec<String>,
    pub label_output: String,
    pub convert_input: String,
    pub convert_output: String,
    /// Destination of `dump`.
    pub chunk_export: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub synth_kind: QuestionKind,
    pub checkpoint_interval: usize,
    pub label_interval: usize,
    pub questions_per_kind: usize,
    pub answers_per_question: usize,
    pub question_temperature: f32,
    pub answer_temperature: f32,
    pub retry_extra_attempts: u32,
    pub retry_delay_ms: u64,
    pub flatten_newlines: bool,
    pub reset_store: bool,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks printed by `dump` before exporting.
    pub preview_chunks: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                path: DEFAULT_STORE_FILE.to_string(),
            },
            embedding: EmbeddingConfig {
                api_url: "http://localhost:11434/api/embed".to_string(),
                model_name: "all-indo-e5-small-v4".to_string(),
                api_key: None,
            },
            inference: ProviderConfig {
                kind: ProviderKind::LlamaCpp,
                api_url: "http://127.0.0.1:8080".to_string(),
                model: Some("taxbot".to_string()),
                api_key: None,
                timeout_secs: 300,
            },
            dataset_inference: ProviderConfig {
                kind: ProviderKind::Ollama,
                api_url: "http://localhost:11434".to_string(),
                model: Some("gemma3:4b".to_string()),
                api_key: None,
                timeout_secs: 300,
            },
            retrieval: RetrievalConfig {
                top_k: DEFAULT_TOP_K,
                specific_threshold: DEFAULT_SPECIFIC_THRESHOLD,
                complex_threshold: DEFAULT_COMPLEX_THRESHOLD,
            },
            decoding: DecodingConfig::default(),
            sampling_decoding: DecodingConfig::answer_sampling(),
            paths: PathsConfig {
                corpus_dir: "dataset/uu_per_ayat".to_string(),
                merge_input_dir: "dataset/qa_dataset".to_string(),
                merge_output: "dataset/dataset_merged.jsonl".to_string(),
                clean_input: "dataset/dataset_uu_gabung.json".to_string(),
                clean_output: "dataset/dataset_uu_gabung_clean.json".to_string(),
                synth_input: "dataset/dataset_uu_gabung_clean.json".to_string(),
                synth_output: "dataset/qa_generated.jsonl".to_string(),
                window_questions: "dataset/generated_question_dataset.jsonl".to_string(),
                selected_questions: "dataset/selected_questions.jsonl".to_string(),
                sampled_answers: "dataset/generated_responses.jsonl".to_string(),
                pairs_output: "dataset/paired_responses.jsonl".to_string(),
                label_inputs: vec!["dataset/generated_responses.jsonl".to_string()],
                label_output: "dataset/labeled_responses.jsonl".to_string(),
                convert_input: "dataset/qa_generated.jsonl".to_string(),
                convert_output: "dataset/uu_chat_dataset.jsonl".to_string(),
                chunk_export: "dataset/exported_chunks.json".to_string(),
            },
            batch: BatchConfig {
                synth_kind: QuestionKind::Specific,
                checkpoint_interval: 10,
                label_interval: 5,
                questions_per_kind: 50,
                answers_per_question: 5,
                question_temperature: 0.9,
                answer_temperature: 0.2,
                retry_extra_attempts: 2,
                retry_delay_ms: 1000,
                flatten_newlines: false,
                reset_store: true,
                chunk_size: 500,
                chunk_overlap: 100,
                preview_chunks: 5,
            },
        }
    }
}

impl AppConfig {
    /// The validated confidence thresholds.
    pub fn thresholds(&self) -> Result<ConfidenceThresholds, PromptError> {
        ConfidenceThresholds::new(
            self.retrieval.specific_threshold,
            self.retrieval.complex_threshold,
        )
    }
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the configuration.
///
/// An explicit `config_path` must exist; without one, `config.yml` in the working
/// directory is used when present. Nested keys are overridden by `TAXBOT_...`
/// variables (e.g. `TAXBOT_INFERENCE__API_URL`).
pub fn get_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    // Layer 1: Programmatic defaults.
    let defaults = ConfigBuilder::try_from(&AppConfig::default())?;
    let mut builder = ConfigBuilder::builder().add_source(defaults);

    // Layer 2: The YAML file, if any.
    let path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);
    match read_and_substitute(path)? {
        Some(content) => {
            info!("Loading configuration from '{path}'.");
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None if config_path.is_some() => {
            return Err(ConfigError::NotFound(format!(
                "Config file not found at '{path}'."
            )));
        }
        None => info!("'{path}' not found, using built-in defaults."),
    }

    // Layer 3: Prefixed environment variables.
    let settings = builder
        .add_source(
            Environment::with_prefix("TAXBOT")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
