//! # Indonesian Tax-Law RAG
//!
//! This crate answers questions about Indonesian tax law with retrieval-augmented
//! generation. A question is matched against law chunks in a vector store, the best
//! match decides an answer mode (SPECIFIC, COMPLEX or NONE), and a mode-specific prompt
//! is sent to a local inference engine. The [`dataset`] module holds the offline tooling
//! that builds the knowledge base and prepares preference training data.

pub mod classify;
pub mod constants;
pub mod dataset;
pub mod errors;
pub mod generation;
pub mod prompts;
pub mod providers;
pub mod types;

pub use errors::PromptError;
pub use providers::store::SearchError;
pub use types::{
    AnswerMode, AssembledPrompt, ChunkMetadata, Confidence, ConfidenceThresholds,
    DecodingConfig, GeneratedAnswer, PromptContext, RetrievedChunk, Retrieval, ScoreConvention,
    StoredDocument, TaxBot, TaxBotBuilder,
};

use crate::constants::{GENERATION_FAILURE_PLACEHOLDER, REFUSAL_MESSAGE};
use serde::Serialize;
use tracing::{error, info};

/// The states one chatbot turn moves through. `Responded` is always terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnState {
    AwaitQuestion,
    Retrieving,
    ClassifiedNone,
    ClassifiedSpecific,
    ClassifiedComplex,
    Prompting,
    Generating,
    Responded,
}

impl TurnState {
    fn classified(mode: AnswerMode) -> Self {
        match mode {
            AnswerMode::Specific => TurnState::ClassifiedSpecific,
            AnswerMode::Complex => TurnState::ClassifiedComplex,
            AnswerMode::None => TurnState::ClassifiedNone,
        }
    }
}

/// The result of one chatbot turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub mode: AnswerMode,
    pub answer: GeneratedAnswer,
    /// Citation labels of the chunks the answer was grounded on. Empty for NONE.
    pub sources: Vec<String>,
    /// Every state visited, in order.
    pub trail: Vec<TurnState>,
}

impl ChatTurn {
    /// The state the turn ended in.
    pub fn state(&self) -> TurnState {
        self.trail.last().copied().unwrap_or(TurnState::AwaitQuestion)
    }
}

impl TaxBot {
    /// Retrieves and classifies context for `question` with one similarity search.
    pub async fn retrieve(&self, question: &str) -> Result<Retrieval, SearchError> {
        classify::classify(self.store.as_ref(), question, self.top_k, &self.thresholds).await
    }

    /// Answers one question.
    ///
    /// NONE-mode questions get the fixed refusal without an inference call. A failed
    /// inference call is logged and answered with the failure placeholder; the
    /// interactive turn does not retry. Only store failures are returned as errors.
    pub async fn answer(&self, question: &str) -> Result<ChatTurn, SearchError> {
        let mut trail = vec![TurnState::AwaitQuestion, TurnState::Retrieving];
        info!("Received question: {question:?}");

        let retrieval = self.retrieve(question).await?;
        trail.push(TurnState::classified(retrieval.mode));

        let ctx = PromptContext {
            question: question.to_string(),
            combined_context: retrieval.combined_context(),
            combined_sources: retrieval.combined_sources(),
            mode: retrieval.mode,
        };

        let system_prompt = match prompts::assemble(&ctx) {
            AssembledPrompt::Refusal(text) => {
                info!("No relevant context found, refusing.");
                trail.push(TurnState::Responded);
                return Ok(ChatTurn {
                    mode: AnswerMode::None,
                    answer: GeneratedAnswer { text },
                    sources: Vec::new(),
                    trail,
                });
            }
            AssembledPrompt::Instruction(text) => text,
        };
        trail.push(TurnState::Prompting);

        trail.push(TurnState::Generating);
        let answer = match generation::generate(
            self.ai_provider.as_ref(),
            &self.decoding,
            &system_prompt,
            question,
        )
        .await
        {
            Ok(answer) => answer,
            Err(e) => {
                error!("Generation failed: {e}");
                GeneratedAnswer {
                    text: GENERATION_FAILURE_PLACEHOLDER.to_string(),
                }
            }
        };
        trail.push(TurnState::Responded);
        info!(mode = %retrieval.mode, chars = answer.text.len(), "Answered question");

        Ok(ChatTurn {
            mode: retrieval.mode,
            answer,
            sources: retrieval.sources,
            trail,
        })
    }

    /// Returns `true` when `answer` is the fixed refusal.
    pub fn is_refusal(answer: &str) -> bool {
        answer == REFUSAL_MESSAGE
    }

    /// Releases the inference engine and store handles.
    pub fn close(self) {
        info!(engine = self.ai_provider.name(), "Shutting down chatbot.");
        drop(self);
    }
}
