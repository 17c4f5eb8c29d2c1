//! # Inference Invocation
//!
//! Renders the chat prompt, calls the inference engine with the configured sampling
//! parameters and trims the result. The chatbot calls [`generate`] once per turn;
//! batch commands use [`complete_with_retry`], which never fails.

use crate::{
    constants::GENERATION_FAILURE_PLACEHOLDER,
    errors::PromptError,
    providers::ai::{
        chat_template::{format_chat, ChatMessage},
        AiProvider,
    },
    types::{DecodingConfig, GeneratedAnswer},
};
use std::time::Duration;
use tracing::{debug, warn};

/// Renders an optional system turn and a user turn as ChatML, leaving the assistant
/// turn open.
pub fn render_prompt(system_prompt: Option<&str>, user_message: &str) -> String {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(user_message));
    format_chat(&messages)
}

/// Runs one inference call and returns the trimmed continuation.
pub async fn generate(
    engine: &dyn AiProvider,
    decoding: &DecodingConfig,
    system_prompt: &str,
    user_question: &str,
) -> Result<GeneratedAnswer, PromptError> {
    let prompt = render_prompt(Some(system_prompt), user_question);
    debug!(
        engine = engine.name(),
        prompt_chars = prompt.len(),
        "--> Sending prompt to inference engine"
    );
    let raw = engine.complete(&prompt, decoding).await?;
    Ok(GeneratedAnswer {
        text: raw.trim().to_string(),
    })
}

/// How often and how patiently batch generation retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts made after the first one.
    pub extra_attempts: u32,
    /// Trimmed outputs shorter than this count as failures.
    pub min_chars: usize,
    /// Returned when every attempt failed.
    pub placeholder: String,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            extra_attempts: 2,
            min_chars: 10,
            placeholder: GENERATION_FAILURE_PLACEHOLDER.to_string(),
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy without pauses, for tests and fast local engines.
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Sends an already rendered prompt up to `1 + extra_attempts` times.
///
/// Returns the first output of at least `min_chars` trimmed characters, or the
/// policy's placeholder. Failures are logged, never returned.
pub async fn complete_with_retry(
    engine: &dyn AiProvider,
    prompt: &str,
    decoding: &DecodingConfig,
    policy: &RetryPolicy,
) -> GeneratedAnswer {
    let attempts = policy.extra_attempts.saturating_add(1);
    for attempt in 1..=attempts {
        match engine.complete(prompt, decoding).await {
            Ok(raw) => {
                let text = raw.trim();
                if text.chars().count() >= policy.min_chars {
                    return GeneratedAnswer {
                        text: text.to_string(),
                    };
                }
                warn!(
                    attempt,
                    chars = text.chars().count(),
                    "Generated output too short or empty"
                );
            }
            Err(e) => warn!(attempt, error = %e, "Generation attempt failed"),
        }
        if attempt < attempts && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }

    warn!(
        attempts,
        engine = engine.name(),
        "All generation attempts failed, using placeholder"
    );
    GeneratedAnswer {
        text: policy.placeholder.clone(),
    }
}
