//! # Vector Store
//!
//! The boundary to the persisted law chunks: nearest-neighbour search for the chatbot
//! and a full dump for the batch tooling.

pub mod sql;
pub mod sqlite;

use crate::{
    errors::PromptError,
    types::{RetrievedChunk, StoredDocument},
};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub use sqlite::{NewChunk, SqliteStore};

/// Custom error types for the search process.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error("Failed to open the vector store at '{path}': {reason}")]
    Connection { path: String, reason: String },
    #[error("Embedding generation failed: {0}")]
    Embedding(PromptError),
}

/// Read access to the embedded law chunks.
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Returns up to `k` chunks nearest to `query`, best first.
    ///
    /// Every returned chunk carries a direction-normalised confidence.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, SearchError>;

    /// Returns every stored chunk in insertion order.
    async fn get(&self) -> Result<Vec<StoredDocument>, SearchError>;
}
