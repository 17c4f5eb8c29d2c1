//! # Retrieval Classification
//!
//! Turns one similarity search into an answer mode plus the context and citation
//! strings the prompt assembler embeds.
//!
//! Scores are always compared as [`Confidence`] (higher is better). Stores that report
//! distances convert before anything here sees them.

use crate::{
    constants::{CONTEXT_SEPARATOR, NO_CONTEXT_MESSAGE},
    providers::store::{SearchError, VectorStore},
    types::{AnswerMode, Confidence, ConfidenceThresholds, RetrievedChunk, Retrieval},
};
use tracing::info;

/// Maps the best confidence of a result set to an answer mode.
///
/// `None` means the search returned nothing.
pub fn classify_confidence(
    best: Option<Confidence>,
    thresholds: &ConfidenceThresholds,
) -> AnswerMode {
    match best {
        Some(c) if c.value() >= thresholds.specific => AnswerMode::Specific,
        Some(c) if c.value() >= thresholds.complex => AnswerMode::Complex,
        _ => AnswerMode::None,
    }
}

/// Returns the highest confidence in `chunks`.
pub fn best_confidence(chunks: &[RetrievedChunk]) -> Option<Confidence> {
    chunks
        .iter()
        .map(|c| c.confidence)
        .fold(None, |best, c| match best {
            Some(b) if b >= c => Some(b),
            _ => Some(c),
        })
}

/// Renders the numbered context block for one chunk (1-based `position`).
pub fn format_context(position: usize, chunk: &RetrievedChunk) -> String {
    format!(
        "Konteks {position}:\n{citation}\n(Sumber: {source}, Skor: {score})\n\nIsi dan/atau Penjelasan:\n{text}",
        citation = chunk.metadata.citation(),
        source = chunk.metadata.source,
        score = chunk.confidence,
        text = chunk.text.trim()
    )
}

/// Renders the citation label for one chunk.
pub fn format_source(chunk: &RetrievedChunk) -> String {
    format!(
        "{} (Sumber: {}; Relevance Score: {})",
        chunk.metadata.citation(),
        chunk.metadata.source,
        chunk.confidence
    )
}

/// Classifies an already retrieved result set.
pub fn classify_chunks(chunks: &[RetrievedChunk], thresholds: &ConfidenceThresholds) -> Retrieval {
    let mode = classify_confidence(best_confidence(chunks), thresholds);
    if mode == AnswerMode::None {
        return Retrieval {
            contexts: vec![NO_CONTEXT_MESSAGE.to_string()],
            sources: Vec::new(),
            mode,
        };
    }

    Retrieval {
        contexts: chunks
            .iter()
            .enumerate()
            .map(|(i, c)| format_context(i + 1, c))
            .collect(),
        sources: chunks.iter().map(format_source).collect(),
        mode,
    }
}

/// Issues one similarity search for `query` and classifies the result.
pub async fn classify(
    store: &dyn VectorStore,
    query: &str,
    top_k: usize,
    thresholds: &ConfidenceThresholds,
) -> Result<Retrieval, SearchError> {
    let chunks = store.similarity_search(query, top_k).await?;
    let retrieval = classify_chunks(&chunks, thresholds);
    info!(
        mode = %retrieval.mode,
        chunks = chunks.len(),
        best = ?best_confidence(&chunks).map(Confidence::value),
        "Classified retrieval"
    );
    Ok(retrieval)
}

impl Retrieval {
    /// Context blocks joined with the standard separator.
    pub fn combined_context(&self) -> String {
        self.contexts.join(CONTEXT_SEPARATOR)
    }

    /// Citation labels, one per line.
    pub fn combined_sources(&self) -> String {
        self.sources.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    fn chunk(score: f32) -> RetrievedChunk {
        RetrievedChunk {
            text: "Pajak adalah kontribusi wajib kepada negara.".to_string(),
            metadata: ChunkMetadata {
                law: "UU Nomor 28 Tahun 2007".to_string(),
                chapter: "BAB I".to_string(),
                article: "1".to_string(),
                paragraph: "1".to_string(),
                source: "UU KUP".to_string(),
            },
            confidence: Confidence::new(score),
        }
    }

    #[test]
    fn bands_follow_thresholds() {
        let t = ConfidenceThresholds::default();
        assert_eq!(classify_confidence(None, &t), AnswerMode::None);
        assert_eq!(classify_confidence(Some(Confidence::new(0.29)), &t), AnswerMode::None);
        assert_eq!(classify_confidence(Some(Confidence::new(0.3)), &t), AnswerMode::Complex);
        assert_eq!(classify_confidence(Some(Confidence::new(0.49)), &t), AnswerMode::Complex);
        assert_eq!(classify_confidence(Some(Confidence::new(0.5)), &t), AnswerMode::Specific);
        assert_eq!(classify_confidence(Some(Confidence::new(1.0)), &t), AnswerMode::Specific);
    }

    #[test]
    fn best_confidence_ignores_order() {
        let chunks = vec![chunk(0.2), chunk(0.7), chunk(0.4)];
        assert_eq!(best_confidence(&chunks), Some(Confidence::new(0.7)));
        assert_eq!(best_confidence(&[]), None);
    }

    #[test]
    fn none_mode_replaces_context_with_placeholder() {
        let retrieval = classify_chunks(&[chunk(0.1)], &ConfidenceThresholds::default());
        assert_eq!(retrieval.mode, AnswerMode::None);
        assert_eq!(retrieval.contexts, vec![NO_CONTEXT_MESSAGE.to_string()]);
        assert!(retrieval.sources.is_empty());
    }

    #[test]
    fn context_block_carries_metadata_and_text() {
        let block = format_context(1, &chunk(0.82));
        assert!(block.starts_with("Konteks 1:\nUU Nomor 28 Tahun 2007 Pasal 1 Ayat 1\n"));
        assert!(block.contains("(Sumber: UU KUP, Skor: 0.82)"));
        assert!(block.ends_with("Pajak adalah kontribusi wajib kepada negara."));
    }
}
