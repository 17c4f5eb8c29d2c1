use thiserror::Error;

/// Errors raised while talking to the inference engine or the embedding endpoint.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI API: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI API response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI API returned an error: {0}")]
    AiApi(String),
    #[error("Inference engine is not reachable at {url}: {reason}")]
    EngineUnavailable { url: String, reason: String },
    #[error("Missing provider configuration: {0}")]
    MissingAiProvider(String),
    #[error("Vector store is not configured")]
    MissingVectorStore,
    #[error("Invalid confidence thresholds: {0}")]
    InvalidThresholds(String),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
