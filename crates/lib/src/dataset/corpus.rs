//! # Corpus Ingestion
//!
//! Builds the knowledge base: per-paragraph law records (`UU`, `BAB`, `Pasal`, `Ayat`,
//! `Sumber`, `Isi`, `Penjelasan`) are rendered to text, split into overlapping chunks
//! and embedded into the vector store.

use super::{io, merge::list_input_files, DatasetError};
use crate::{
    providers::store::{NewChunk, SqliteStore},
    types::ChunkMetadata,
};
use serde_json::Value;
use std::{collections::VecDeque, path::Path};
use tracing::{debug, info};

/// A law paragraph ready to be chunked.
#[derive(Debug, Clone, PartialEq)]
pub struct LawDocument {
    pub text: String,
    pub metadata: ChunkMetadata,
}

fn string_field(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl LawDocument {
    pub fn from_record(record: &Value) -> Self {
        Self {
            text: format!(
                "Isi: {}\nPenjelasan: {}",
                string_field(record, "Isi"),
                string_field(record, "Penjelasan")
            ),
            metadata: ChunkMetadata {
                law: string_field(record, "UU"),
                chapter: string_field(record, "BAB"),
                article: string_field(record, "Pasal"),
                paragraph: string_field(record, "Ayat"),
                source: string_field(record, "Sumber"),
            },
        }
    }
}

/// Loads every law record from the `.json` files in `dir`.
pub fn load_documents(dir: &Path) -> Result<Vec<LawDocument>, DatasetError> {
    let mut documents = Vec::new();
    for path in list_input_files(dir)?
        .into_iter()
        .filter(|p| io::is_json_array_path(p))
    {
        let records = io::read_json_records(&path)?;
        documents.extend(records.iter().map(LawDocument::from_record));
    }
    info!("Loaded {} documents from '{}'", documents.len(), dir.display());
    Ok(documents)
}

/// A recursive character splitter: text is split on the first separator that occurs
/// in it, pieces are merged back up to `chunk_size` characters with up to
/// `chunk_overlap` characters repeated between consecutive chunks, and pieces that are
/// still too long are split again with the next separator.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(500, 100)
    }
}

fn len(s: &str) -> usize {
    s.chars().count()
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size),
            separators: ["\n\n", "\n", " ", ""].map(String::from).to_vec(),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = "";
        let mut remaining: &[String] = &[];
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() {
                break;
            }
            if text.contains(s.as_str()) {
                separator = s;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut good = Vec::new();
        for piece in splits {
            if len(&piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge(&good, separator));
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }
        if !good.is_empty() {
            chunks.extend(self.merge(&good, separator));
        }
        chunks
    }

    fn merge(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = len(separator);
        let join = |current: &VecDeque<&str>| -> Option<String> {
            let doc = current.iter().copied().collect::<Vec<_>>().join(separator);
            let doc = doc.trim();
            (!doc.is_empty()).then(|| doc.to_string())
        };

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;
        for piece in splits {
            let piece_len = len(piece);
            let joiner = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { sep_len };
            if total + piece_len + joiner(&current) > self.chunk_size {
                if let Some(doc) = join(&current) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap
                    || (total + piece_len + joiner(&current) > self.chunk_size && total > 0)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total -= len(first) + if current.is_empty() { 0 } else { sep_len };
                }
            }
            current.push_back(piece);
            total += piece_len + if current.len() > 1 { sep_len } else { 0 };
        }
        if let Some(doc) = join(&current) {
            docs.push(doc);
        }
        docs
    }

    /// Splits every document, copying its metadata to each chunk.
    pub fn split_documents(&self, documents: &[LawDocument]) -> Vec<NewChunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split(&doc.text).into_iter().map(|text| NewChunk {
                    text,
                    metadata: doc.metadata.clone(),
                })
            })
            .collect()
    }
}

/// Loads, splits and embeds the corpus in `dir` into `store`, optionally clearing the
/// store first. Returns the number of chunks stored.
pub async fn ingest_corpus(
    store: &SqliteStore,
    dir: &Path,
    splitter: &TextSplitter,
    reset: bool,
) -> Result<usize, DatasetError> {
    let documents = load_documents(dir)?;
    let chunks = splitter.split_documents(&documents);
    info!(
        "Split {} documents into {} chunks.",
        documents.len(),
        chunks.len()
    );

    if reset {
        store.reset().await?;
    }
    for batch in chunks.chunks(64) {
        store.add(batch).await?;
        debug!("Stored batch of {} chunks.", batch.len());
    }
    info!("Saved {} chunks to the store.", chunks.len());
    Ok(chunks.len())
}
