pub mod chat_template;
pub mod embedding;
pub mod llama_cpp;
pub mod ollama;

use crate::{errors::PromptError, types::DecodingConfig};
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use embedding::{Embedder, HttpEmbedder};
use std::fmt::Debug;

/// A trait for interacting with a causal language model inference engine.
///
/// Implementations receive a fully rendered prompt (see [`chat_template`]) and return
/// the raw continuation. They never retry; retry policy belongs to the caller.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// A short name used in logs and generated records (e.g. the model identifier).
    fn name(&self) -> &str;

    /// Generates a continuation for `prompt` with the given sampling parameters.
    async fn complete(&self, prompt: &str, decoding: &DecodingConfig)
        -> Result<String, PromptError>;

    /// Checks that the engine is reachable and returns a version or status string.
    ///
    /// Batch commands call this once at startup and abort when it fails.
    async fn probe(&self) -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
