use crate::{
    errors::PromptError,
    providers::ai::{chat_template::IM_END, AiProvider},
    types::DecodingConfig,
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};
use tracing::debug;

// --- Ollama request and response structures ---

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Serialize, Debug)]
struct GenerateOptions<'a> {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
    stop: Vec<&'a str>,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize, Debug)]
struct VersionResponse {
    version: String,
}

// --- Ollama provider implementation ---

/// A provider for a local Ollama daemon.
///
/// Prompts are sent in `raw` mode because they are already rendered with the chat
/// template; plain generation prompts from the batch tooling work the same way.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: ReqwestClient,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` for `model` served at `base_url`
    /// (e.g. `http://127.0.0.1:11434`).
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        decoding: &DecodingConfig,
    ) -> Result<String, PromptError> {
        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream: false,
            options: GenerateOptions {
                num_predict: decoding.max_tokens,
                temperature: decoding.temperature,
                top_p: decoding.top_p,
                repeat_penalty: decoding.repeat_penalty,
                stop: vec![IM_END],
            },
        };
        debug!(model = %self.model, "--> Sending generate request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(error_text));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        Ok(generated.response)
    }

    async fn probe(&self) -> Result<String, PromptError> {
        let url = format!("{}/api/version", self.base_url);
        let unavailable = |reason: String| PromptError::EngineUnavailable {
            url: url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("status={}", response.status())));
        }
        let version: VersionResponse = response
            .json()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(version.version)
    }
}
