//! # AI Provider Factory
//!
//! Builds an inference engine from its configuration so that the chatbot and every
//! batch command construct providers the same way.

use crate::{
    errors::PromptError,
    providers::ai::{llama_cpp::LlamaCppProvider, ollama::OllamaProvider, AiProvider},
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::info;

/// The inference engines this crate knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    LlamaCpp,
    Ollama,
}

/// Connection settings for one inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

/// Creates the inference engine described by `config`.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn AiProvider>, PromptError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let provider: Arc<dyn AiProvider> = match config.kind {
        ProviderKind::LlamaCpp => {
            info!("Configuring llama.cpp provider at {}", config.api_url);
            Arc::new(LlamaCppProvider::new(
                config.api_url.clone(),
                config.api_key.clone(),
                config.model.clone(),
                timeout,
            )?)
        }
        ProviderKind::Ollama => {
            let model = config.model.clone().ok_or_else(|| {
                PromptError::MissingAiProvider(
                    "a model name is required for the ollama provider".to_string(),
                )
            })?;
            info!("Configuring Ollama provider at {} with model '{model}'", config.api_url);
            Arc::new(OllamaProvider::new(config.api_url.clone(), model, timeout)?)
        }
    };
    Ok(provider)
}
