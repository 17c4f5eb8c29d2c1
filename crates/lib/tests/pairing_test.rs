//! # Preference Data Tests
//!
//! Covers answer sampling, pairwise preference collection and binary labelling,
//! including resumption after an interrupted session.

use std::collections::HashSet;
use taxrag::constants::NO_CONTEXT_MESSAGE;
use taxrag::dataset::{
    answers::{sample_answers, SampledAnswer, SamplingSettings},
    io,
    judge::{Preference, Rating},
    label::{label_answers, LabeledExample},
    pairing::{collect_preferences, PairRecord},
    select::{SelectedKind, SelectedQuestion},
};
use taxrag::{ChunkMetadata, Confidence, DecodingConfig, RetrievedChunk};
use taxrag_test_utils::{setup_tracing, InMemoryStore, MockAiProvider, ScriptedJudge};
use tempfile::tempdir;

fn sampled(question: &str, answer: &str) -> SampledAnswer {
    SampledAnswer {
        context: format!("Konteks untuk {question}"),
        source: "UU Nomor 7 Tahun 2021 Pasal 7 Ayat 1".to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        model: "taxbot".to_string(),
    }
}

fn sampling_settings(answers_per_question: usize) -> SamplingSettings {
    SamplingSettings {
        answers_per_question,
        delay: std::time::Duration::ZERO,
        ..SamplingSettings::default()
    }
}

fn question(prompt: &str) -> SelectedQuestion {
    SelectedQuestion {
        kind: SelectedKind::Specific,
        prompt: prompt.to_string(),
    }
}

#[tokio::test]
async fn test_sample_answers_appends_per_question_and_resumes() {
    setup_tracing();

    // 1. Arrange
    let dir = tempdir().unwrap();
    let output = dir.path().join("generated_responses.jsonl");
    let store = InMemoryStore::new(vec![RetrievedChunk {
        text: "Tarif PPN sebesar 11%.".to_string(),
        metadata: ChunkMetadata {
            law: "UU Nomor 7 Tahun 2021".to_string(),
            article: "7".to_string(),
            paragraph: "1".to_string(),
            source: "UU HPP".to_string(),
            ..ChunkMetadata::default()
        },
        confidence: Confidence::new(0.9),
    }]);
    let provider = MockAiProvider::new();
    provider.push_error("engine busy");
    provider.add_response("Berapa tarif PPN?", "Tarif PPN adalah 11%.");
    provider.add_response("Siapa pemungut PPN?", "Pengusaha Kena Pajak memungut PPN.");
    let questions = vec![question("Berapa tarif PPN?"), question("Siapa pemungut PPN?")];

    // 2. Act
    let written = sample_answers(
        &provider,
        &store,
        &DecodingConfig::default(),
        &questions,
        &output,
        &sampling_settings(2),
    )
    .await
    .unwrap();

    // 3. Assert: the failed sample is left out, the rest share the retrieved context.
    assert_eq!(written, 3);
    let answers: Vec<SampledAnswer> = io::read_jsonl(&output).unwrap();
    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0].question, "Berapa tarif PPN?");
    assert_eq!(answers[1].question, "Siapa pemungut PPN?");
    assert_eq!(answers[0].model, "mock");
    assert!(answers[0].context.starts_with("Konteks 1:\nUU Nomor 7 Tahun 2021 Pasal 7 Ayat 1"));
    assert_eq!(
        answers[0].source,
        "UU Nomor 7 Tahun 2021 Pasal 7 Ayat 1 (Sumber: UU HPP; Relevance Score: 0.90)"
    );
    assert!(provider.get_calls()[0].contains("Sumber konteks: UU Nomor 7 Tahun 2021"));

    // A second run skips questions that already have answers.
    let calls_before = provider.get_calls().len();
    let written = sample_answers(
        &provider,
        &store,
        &DecodingConfig::default(),
        &questions,
        &output,
        &sampling_settings(2),
    )
    .await
    .unwrap();
    assert_eq!(written, 0);
    assert_eq!(provider.get_calls().len(), calls_before);
}

#[tokio::test]
async fn test_sample_answers_without_relevant_context() {
    setup_tracing();

    let dir = tempdir().unwrap();
    let output = dir.path().join("responses.jsonl");
    let provider = MockAiProvider::new();
    provider.add_response("resep", "Maaf, saya tidak memiliki pemahaman tentang hal itu.");

    sample_answers(
        &provider,
        &InMemoryStore::default(),
        &DecodingConfig::answer_sampling(),
        &[question("Bagaimana resep rendang?")],
        &output,
        &sampling_settings(1),
    )
    .await
    .unwrap();

    let answers: Vec<SampledAnswer> = io::read_jsonl(&output).unwrap();
    assert_eq!(answers[0].context, NO_CONTEXT_MESSAGE);
    assert_eq!(answers[0].source, "none");
    let decodings = provider.get_decodings();
    assert_eq!(decodings, vec![DecodingConfig::answer_sampling()]);
    assert_eq!(decodings[0].temperature, 0.3);
    assert_eq!(decodings[0].repeat_penalty, 1.1);
}

#[test]
fn test_preferences_cover_every_pair_and_resume_without_duplicates() {
    setup_tracing();

    // 1. Arrange: three answers to one question (3 pairs) and two to another (1 pair).
    let dir = tempdir().unwrap();
    let output = dir.path().join("paired_responses.jsonl");
    let answers = vec![
        sampled("Berapa tarif PPN?", "Jawaban A1"),
        sampled("Siapa pemungut PPN?", "Jawaban B1"),
        sampled("Berapa tarif PPN?", "Jawaban A2"),
        sampled("Berapa tarif PPN?", "Jawaban A3"),
        sampled("Siapa pemungut PPN?", "Jawaban B2"),
    ];

    // 2. Act: the first session ends after two decisions.
    let mut first = ScriptedJudge::with_preferences([Preference::A, Preference::B]);
    let interrupted = collect_preferences(&answers, &output, &mut first);
    assert!(interrupted.is_err());

    let mut second = ScriptedJudge::with_preferences([Preference::B, Preference::A]);
    let decided = collect_preferences(&answers, &output, &mut second).unwrap();

    // 3. Assert
    assert_eq!(decided, 2);
    assert_eq!(
        first.asked,
        vec!["Berapa tarif PPN?#0", "Berapa tarif PPN?#1", "Berapa tarif PPN?#2"]
    );
    assert_eq!(
        second.asked,
        vec!["Berapa tarif PPN?#2", "Siapa pemungut PPN?#0"]
    );

    let records: Vec<PairRecord> = io::read_jsonl(&output).unwrap();
    assert_eq!(records.len(), 4);
    let keys: HashSet<(String, usize)> = records
        .iter()
        .map(|r| (r.question.clone(), r.pair_index))
        .collect();
    assert_eq!(keys.len(), 4);

    assert_eq!(records[0].answer_a, "Jawaban A1");
    assert_eq!(records[0].answer_b, "Jawaban A2");
    assert_eq!(records[0].answer_b_preferred, 0);
    assert_eq!(records[1].answer_b, "Jawaban A3");
    assert_eq!(records[1].answer_b_preferred, 1);
    assert_eq!(records[2].answer_a, "Jawaban A2");
    assert_eq!(records[3].question, "Siapa pemungut PPN?");
    assert_eq!(records[3].answer_b, "Jawaban B2");

    // Nothing is left to ask.
    let mut third = ScriptedJudge::default();
    assert_eq!(collect_preferences(&answers, &output, &mut third).unwrap(), 0);
    assert!(third.asked.is_empty());
}

#[test]
fn test_single_answer_questions_produce_no_pairs() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("pairs.jsonl");
    let mut judge = ScriptedJudge::default();

    let decided =
        collect_preferences(&[sampled("Apa itu NPWP?", "Jawaban")], &output, &mut judge).unwrap();

    assert_eq!(decided, 0);
    assert!(!output.exists());
}

#[test]
fn test_labelling_skips_are_asked_again() {
    setup_tracing();

    // 1. Arrange
    let dir = tempdir().unwrap();
    let output = dir.path().join("labeled_responses.jsonl");
    let answers = vec![
        sampled("Berapa tarif PPN?", "Tarif PPN 11%."),
        sampled("Berapa tarif PPN?", "Tarif PPN 10%."),
        sampled("Apa itu NPWP?", "Nomor Pokok Wajib Pajak."),
    ];

    // 2. Act
    let mut first = ScriptedJudge::with_ratings([Rating::Good, Rating::Skip, Rating::Bad]);
    let labelled = label_answers(&answers, &output, 5, &mut first).unwrap();

    let mut second = ScriptedJudge::with_ratings([Rating::Bad]);
    let relabelled = label_answers(&answers, &output, 5, &mut second).unwrap();

    // 3. Assert
    assert_eq!(labelled, 2);
    assert_eq!(relabelled, 1);
    assert_eq!(second.asked, vec!["Berapa tarif PPN?|Tarif PPN 10%."]);

    let examples: Vec<LabeledExample> = io::read_jsonl(&output).unwrap();
    let labels: Vec<(String, bool)> = examples
        .iter()
        .map(|e| (e.completion.content.clone(), e.label))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Tarif PPN 11%.".to_string(), true),
            ("Nomor Pokok Wajib Pajak.".to_string(), false),
            ("Tarif PPN 10%.".to_string(), false),
        ]
    );

    let first_example = &examples[0];
    assert_eq!(first_example.prompt[0].role, "system");
    assert!(first_example.prompt[0]
        .content
        .contains("Konteks untuk Berapa tarif PPN?"));
    assert_eq!(first_example.prompt[1].content, "Q: Berapa tarif PPN?\nA:");
    assert_eq!(first_example.completion.role, "assistant");
}

#[test]
fn test_interrupted_labelling_keeps_completed_labels() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("labels.jsonl");
    let answers = vec![
        sampled("Apa itu PPh?", "Pajak Penghasilan."),
        sampled("Apa itu PPN?", "Pajak Pertambahan Nilai."),
    ];

    let mut judge = ScriptedJudge::with_ratings([Rating::Good]);
    assert!(label_answers(&answers, &output, 10, &mut judge).is_err());

    let examples: Vec<LabeledExample> = io::read_jsonl(&output).unwrap();
    assert_eq!(examples.len(), 1);
    assert!(examples[0].label);
}
