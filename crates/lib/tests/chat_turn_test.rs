//! # Chatbot Turn Tests
//!
//! Drives `TaxBot::answer` end to end with a mock inference engine, checking the mode
//! routing, the refusal path and the state trail of each turn.

use std::sync::Arc;
use taxrag::constants::{GENERATION_FAILURE_PLACEHOLDER, REFUSAL_MESSAGE};
use taxrag::prompts::parse_source_line;
use taxrag::providers::store::NewChunk;
use taxrag::{
    AnswerMode, ChunkMetadata, Confidence, PromptError, RetrievedChunk, TaxBot, TaxBotBuilder,
    TurnState,
};
use taxrag_test_utils::{setup_tracing, InMemoryStore, MockAiProvider, TestSetup};

const QUESTION: &str = "Apa yang dimaksud dengan Pajak?";

fn kup_metadata() -> ChunkMetadata {
    ChunkMetadata {
        law: "UU Nomor 28 Tahun 2007".to_string(),
        chapter: "BAB I".to_string(),
        article: "1".to_string(),
        paragraph: "1".to_string(),
        source: "UU KUP".to_string(),
    }
}

fn kup_chunk(confidence: f32) -> RetrievedChunk {
    RetrievedChunk {
        text: "Isi: Pajak adalah kontribusi wajib kepada negara yang terutang oleh orang pribadi atau badan."
            .to_string(),
        metadata: kup_metadata(),
        confidence: Confidence::new(confidence),
    }
}

fn bot(provider: &MockAiProvider, chunks: Vec<RetrievedChunk>) -> TaxBot {
    TaxBotBuilder::new()
        .ai_provider(Arc::new(provider.clone()))
        .store(Arc::new(InMemoryStore::new(chunks)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_specific_question_is_answered_with_a_citation() {
    setup_tracing();

    // 1. Arrange: a confident match and a programmed answer.
    let provider = MockAiProvider::new();
    provider.add_response(
        QUESTION,
        "  Pajak adalah kontribusi wajib kepada negara, sesuai dengan Pasal 1 UU KUP.\nSource: Pasal 1 Ayat 1 UU Nomor 28 Tahun 2007\n",
    );
    let bot = bot(&provider, vec![kup_chunk(0.91)]);

    // 2. Act
    let turn = bot.answer(QUESTION).await.unwrap();

    // 3. Assert: the SPECIFIC prompt was sent once and the answer is trimmed.
    assert_eq!(turn.mode, AnswerMode::Specific);
    assert!(turn.answer.text.starts_with("Pajak adalah kontribusi wajib"));
    assert!(!turn.answer.text.ends_with('\n'));
    assert!(parse_source_line(&turn.answer.text).is_some());
    assert_eq!(turn.sources.len(), 1);
    assert_eq!(
        turn.trail,
        vec![
            TurnState::AwaitQuestion,
            TurnState::Retrieving,
            TurnState::ClassifiedSpecific,
            TurnState::Prompting,
            TurnState::Generating,
            TurnState::Responded,
        ]
    );
    assert_eq!(turn.state(), TurnState::Responded);

    let calls = provider.get_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("<|im_start|>system\nJawab pertanyaan berdasarkan konteks berikut:"));
    assert!(calls[0].contains("Source: Pasal {pasal} Ayat {ayat} UU {uu}"));
    assert!(calls[0].ends_with(&format!("<|im_start|>user\n{QUESTION}<|im_end|>\n<|im_start|>assistant\n")));
}

#[tokio::test]
async fn test_moderate_match_uses_the_complex_prompt() {
    setup_tracing();

    let provider = MockAiProvider::new();
    provider.add_response(QUESTION, "Summary:\nAnalisis.\n[[ Conclusion ]]\nKesimpulan.");
    let bot = bot(&provider, vec![kup_chunk(0.4)]);

    let turn = bot.answer(QUESTION).await.unwrap();

    assert_eq!(turn.mode, AnswerMode::Complex);
    assert_eq!(turn.trail[2], TurnState::ClassifiedComplex);
    assert!(provider.get_calls()[0].contains("Sources Used:"));
}

#[tokio::test]
async fn test_unrelated_question_is_refused_without_inference() {
    setup_tracing();

    // 1. Arrange: the only chunk is far below the COMPLEX band.
    let provider = MockAiProvider::new();
    let bot = bot(&provider, vec![kup_chunk(0.05)]);

    // 2. Act
    let turn = bot.answer("Bagaimana cara memasak rendang?").await.unwrap();

    // 3. Assert: exact refusal and the engine was never called.
    assert_eq!(turn.mode, AnswerMode::None);
    assert_eq!(turn.answer.text, REFUSAL_MESSAGE);
    assert!(TaxBot::is_refusal(&turn.answer.text));
    assert!(turn.sources.is_empty());
    assert_eq!(
        turn.trail,
        vec![
            TurnState::AwaitQuestion,
            TurnState::Retrieving,
            TurnState::ClassifiedNone,
            TurnState::Responded,
        ]
    );
    assert!(provider.get_calls().is_empty());
}

#[tokio::test]
async fn test_inference_failure_yields_the_placeholder() {
    setup_tracing();

    let provider = MockAiProvider::new();
    provider.push_error("connection reset");
    let bot = bot(&provider, vec![kup_chunk(0.9)]);

    let turn = bot.answer(QUESTION).await.unwrap();

    assert_eq!(turn.mode, AnswerMode::Specific);
    assert_eq!(turn.answer.text, GENERATION_FAILURE_PLACEHOLDER);
    assert_eq!(turn.state(), TurnState::Responded);
    // The interactive path does not retry.
    assert_eq!(provider.get_calls().len(), 1);
}

#[tokio::test]
async fn test_turns_are_independent() {
    setup_tracing();

    let provider = MockAiProvider::new();
    provider.push_response("Jawaban pertama yang cukup panjang.");
    provider.push_response("Jawaban kedua yang cukup panjang.");
    let bot = bot(&provider, vec![kup_chunk(0.9)]);

    let first = bot.answer(QUESTION).await.unwrap();
    let second = bot.answer("Apa itu Wajib Pajak?").await.unwrap();

    assert_eq!(first.answer.text, "Jawaban pertama yang cukup panjang.");
    assert_eq!(second.answer.text, "Jawaban kedua yang cukup panjang.");
    let calls = provider.get_calls();
    assert!(!calls[1].contains(QUESTION));
}

#[tokio::test]
async fn test_answer_against_the_sqlite_store() {
    setup_tracing();

    // 1. Setup: an in-memory store whose embedder only knows the word "pajak".
    let setup = TestSetup::new(&["pajak"]).await.unwrap();
    setup
        .store
        .add(&[NewChunk {
            text: "Isi: Pajak adalah kontribusi wajib kepada negara.".to_string(),
            metadata: kup_metadata(),
        }])
        .await
        .unwrap();

    let provider = MockAiProvider::new();
    provider.add_response(QUESTION, "Pajak adalah kontribusi wajib.\nSource: Pasal 1 Ayat 1 UU Nomor 28 Tahun 2007");
    let bot = TaxBotBuilder::new()
        .ai_provider(Arc::new(provider.clone()))
        .store(Arc::new(setup.store.clone()))
        .top_k(3)
        .build()
        .unwrap();

    // 2. Act
    let related = bot.answer(QUESTION).await.unwrap();
    let unrelated = bot.answer("Resep rendang padang").await.unwrap();

    // 3. Assert
    assert_eq!(related.mode, AnswerMode::Specific);
    assert_eq!(unrelated.mode, AnswerMode::None);
    assert_eq!(unrelated.answer.text, REFUSAL_MESSAGE);
    assert_eq!(provider.get_calls().len(), 1);
}

#[test]
fn test_builder_requires_engine_and_store() {
    let missing_engine = TaxBotBuilder::new().build();
    assert!(matches!(
        missing_engine,
        Err(PromptError::MissingAiProvider(_))
    ));

    let missing_store = TaxBotBuilder::new()
        .ai_provider(Arc::new(MockAiProvider::new()))
        .build();
    assert!(matches!(missing_store, Err(PromptError::MissingVectorStore)));
}
