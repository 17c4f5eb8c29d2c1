//! # Embeddings Provider
//!
//! This module maps text to vectors by calling an external embeddings API. Both the
//! OpenAI-compatible `/v1/embeddings` shape (llama.cpp, text-embeddings-inference) and
//! Ollama's `/api/embed` shape are supported.

use crate::errors::PromptError;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

/// A trait for anything that can turn text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptError>;
}

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize, Debug)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize, Debug)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}

// --- Ollama-specific response structure ---

#[derive(Deserialize, Debug)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

/// An [`Embedder`] backed by an HTTP embeddings endpoint.
#[derive(Clone, Debug)]
pub struct HttpEmbedder {
    client: ReqwestClient,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(
        api_url: String,
        model: String,
        api_key: Option<String>,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            model,
            api_key,
        })
    }

    fn is_ollama(&self) -> bool {
        self.api_url.trim_end_matches('/').ends_with("/api/embed")
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    /// Dispatches on the URL: `/api/embed` endpoints get the Ollama payload, everything
    /// else the OpenAI-compatible one. Both payloads share `{model, input}`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptError> {
        let request_body = OpenAIEmbeddingRequest {
            model: &self.model,
            input: text,
        };
        debug!(model = %self.model, chars = text.len(), "--> Sending request to embeddings API");

        let mut request_builder = self.client.post(&self.api_url).json(&request_body);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(error_text));
        }

        let vector = if self.is_ollama() {
            let ollama_response: OllamaEmbeddingResponse = response
                .json()
                .await
                .map_err(PromptError::AiDeserialization)?;
            ollama_response.embeddings.into_iter().next()
        } else {
            let openai_response: OpenAIEmbeddingResponse = response
                .json()
                .await
                .map_err(PromptError::AiDeserialization)?;
            openai_response.data.into_iter().next().map(|d| d.embedding)
        };

        vector.ok_or_else(|| PromptError::AiApi("Embeddings API returned no vectors".to_string()))
    }
}
