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

// --- llama.cpp server request and response structures ---

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
    stop: Vec<&'a str>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize, Debug)]
struct HealthResponse {
    #[serde(default)]
    status: String,
}

// --- llama.cpp provider implementation ---

/// A provider for a llama.cpp `server` instance hosting a GGUF model.
#[derive(Clone, Debug)]
pub struct LlamaCppProvider {
    client: ReqwestClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlamaCppProvider {
    /// Creates a new `LlamaCppProvider` for the server at `base_url`
    /// (e.g. `http://127.0.0.1:8080`).
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.unwrap_or_else(|| "llama.cpp".to_string()),
        })
    }
}

#[async_trait]
impl AiProvider for LlamaCppProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        decoding: &DecodingConfig,
    ) -> Result<String, PromptError> {
        let request_body = CompletionRequest {
            prompt,
            n_predict: decoding.max_tokens,
            temperature: decoding.temperature,
            top_p: decoding.top_p,
            repeat_penalty: decoding.repeat_penalty,
            stop: vec![IM_END],
            stream: false,
        };
        debug!(
            n_predict = request_body.n_predict,
            temperature = request_body.temperature,
            "--> Sending completion request to llama.cpp"
        );

        let mut request_builder = self
            .client
            .post(format!("{}/completion", self.base_url));
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(error_text));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        debug!("<-- llama.cpp returned {} chars", completion.content.len());
        Ok(completion.content)
    }

    async fn probe(&self) -> Result<String, PromptError> {
        let url = format!("{}/health", self.base_url);
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
        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(health.status)
    }
}
