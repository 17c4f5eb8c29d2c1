use super::{sql, SearchError, VectorStore};
use crate::{
    providers::ai::Embedder,
    types::{ChunkMetadata, Confidence, RetrievedChunk, ScoreConvention, StoredDocument},
};
use async_trait::async_trait;
use std::{
    fmt::{self, Debug},
    sync::Arc,
};
use tracing::{debug, info};
use turso::{params, Database, Row, Value as TursoValue};
use uuid::Uuid;

/// A chunk waiting to be embedded and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl NewChunk {
    /// A stable identifier derived from the chunk's citation and text, so re-ingesting
    /// the same corpus updates rows instead of duplicating them.
    pub fn id(&self) -> String {
        let key = format!("{}\u{1f}{}", self.metadata.citation(), self.text);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }
}

/// A [`VectorStore`] backed by a local Turso/SQLite file.
///
/// Cloning shares the underlying database, which also makes a `":memory:"` store
/// usable from several handles in tests.
#[derive(Clone)]
pub struct SqliteStore {
    pub db: Database,
    embedder: Arc<dyn Embedder>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `db_path` and ensures the schema exists.
    pub async fn open(db_path: &str, embedder: Arc<dyn Embedder>) -> Result<Self, SearchError> {
        let connection_error = |e: turso::Error| SearchError::Connection {
            path: db_path.to_string(),
            reason: e.to_string(),
        };
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(connection_error)?;
        let conn = db.connect().map_err(connection_error)?;
        conn.execute(sql::CREATE_LAW_CHUNKS_TABLE, ()).await?;
        info!("Opened law chunk store at '{db_path}'.");

        Ok(Self { db, embedder })
    }

    /// Removes every stored chunk.
    pub async fn reset(&self) -> Result<(), SearchError> {
        let conn = self.db.connect()?;
        conn.execute(sql::DELETE_ALL_CHUNKS, ()).await?;
        info!("Cleared all chunks from the store.");
        Ok(())
    }

    /// Embeds and upserts `chunks`, preserving their order. Returns the number written.
    pub async fn add(&self, chunks: &[NewChunk]) -> Result<usize, SearchError> {
        let conn = self.db.connect()?;
        let mut next_seq = {
            let mut rows = conn.query(sql::NEXT_SEQ, ()).await?;
            match rows.next().await? {
                Some(row) => match row.get_value(0)? {
                    TursoValue::Integer(n) => n,
                    _ => 0,
                },
                None => 0,
            }
        };

        for chunk in chunks {
            let vector = self
                .embedder
                .embed(&chunk.text)
                .await
                .map_err(SearchError::Embedding)?;
            let vector_bytes = vector_to_bytes(&vector);
            let meta = &chunk.metadata;

            conn.execute(
                sql::UPSERT_LAW_CHUNK,
                params![
                    chunk.id(),
                    next_seq,
                    chunk.text.clone(),
                    meta.law.clone(),
                    meta.chapter.clone(),
                    meta.article.clone(),
                    meta.paragraph.clone(),
                    meta.source.clone(),
                    vector_bytes.as_slice()
                ],
            )
            .await?;
            next_seq += 1;
        }

        debug!("Stored {} chunks.", chunks.len());
        Ok(chunks.len())
    }
}

impl Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("embedder", &self.embedder)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, SearchError> {
        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(SearchError::Embedding)?;

        // Turso's vector functions expect the vector as a string literal within the query.
        let vector_literal = format!(
            "vector32('[{}]')",
            query_vector
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let conn = self.db.connect()?;
        let mut rows = conn
            .query(&sql::similarity_search(&vector_literal, k), ())
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let distance = match row.get_value(6)? {
                TursoValue::Real(f) => f as f32,
                TursoValue::Integer(n) => n as f32,
                _ => f32::MAX,
            };
            results.push(RetrievedChunk {
                text: text_at(&row, 0)?,
                metadata: metadata_at(&row, 1)?,
                confidence: Confidence::from_score(distance, ScoreConvention::CosineDistance),
            });
        }

        debug!(
            "Similarity search returned {} chunks (best confidence: {:?}).",
            results.len(),
            results.first().map(|c| c.confidence.value())
        );
        Ok(results)
    }

    async fn get(&self) -> Result<Vec<StoredDocument>, SearchError> {
        let conn = self.db.connect()?;
        let mut rows = conn.query(sql::SELECT_ALL_CHUNKS, ()).await?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            documents.push(StoredDocument {
                id: text_at(&row, 0)?,
                text: text_at(&row, 1)?,
                metadata: metadata_at(&row, 2)?,
            });
        }
        Ok(documents)
    }
}

fn text_at(row: &Row, idx: usize) -> Result<String, turso::Error> {
    Ok(match row.get_value(idx)? {
        TursoValue::Text(s) => s,
        _ => String::new(),
    })
}

/// Reads five consecutive metadata columns starting at `first`.
fn metadata_at(row: &Row, first: usize) -> Result<ChunkMetadata, turso::Error> {
    Ok(ChunkMetadata {
        law: text_at(row, first)?,
        chapter: text_at(row, first + 1)?,
        article: text_at(row, first + 2)?,
        paragraph: text_at(row, first + 3)?,
        source: text_at(row, first + 4)?,
    })
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}
